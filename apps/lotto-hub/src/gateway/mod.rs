//! Real-time value-set push over WebSocket.
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `connection` | Per-client outbound queue and close signal |
//! | `registry` | Lock-guarded set of live connections |
//! | `fanout` | Broadcast queue, dispatch loop, shutdown |
//! | `producer` | Periodic value-set producer |
//! | `server` | `/ws` upgrade and per-connection read/write loops |
//! | `responders` | `/ws/random` and `/ws/crawl`, outside the hub |

pub mod connection;
pub mod fanout;
pub mod producer;
pub mod registry;
pub mod responders;
pub mod server;
