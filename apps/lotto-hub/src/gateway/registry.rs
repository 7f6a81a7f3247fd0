//! Registry of live hub connections.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;

use super::connection::{Connection, ConnectionId};

struct Inner {
    connections: BTreeMap<ConnectionId, Arc<Connection>>,
    /// Set by `drain`; later registrations are refused.
    sealed: bool,
}

/// Set of connected clients behind a single lock.
///
/// Registration, removal, and snapshots all serialize on the same mutex.
/// Snapshots are copies, so callers do their I/O with the lock released.
pub struct ConnectionRegistry {
    inner: Mutex<Inner>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                connections: BTreeMap::new(),
                sealed: false,
            }),
        }
    }

    /// Register a connection. Returns `false` if the registry has been
    /// drained or the connection is already present.
    pub fn add(&self, conn: Arc<Connection>) -> bool {
        let mut inner = self.inner.lock();
        if inner.sealed || inner.connections.contains_key(&conn.id) {
            return false;
        }
        inner.connections.insert(conn.id, conn);
        true
    }

    /// Unregister a connection. Only the first caller gets it back, which
    /// makes that caller responsible for closing it.
    pub fn remove(&self, id: ConnectionId) -> Option<Arc<Connection>> {
        self.inner.lock().connections.remove(&id)
    }

    /// Point-in-time copy of the registered connections in id order, so the
    /// connection created first comes first regardless of when it registered.
    pub fn snapshot(&self) -> Vec<Arc<Connection>> {
        self.inner.lock().connections.values().cloned().collect()
    }

    /// Seal the registry and remove every connection.
    pub fn drain(&self) -> Vec<Arc<Connection>> {
        let mut inner = self.inner.lock();
        inner.sealed = true;
        std::mem::take(&mut inner.connections).into_values().collect()
    }

    pub fn contains(&self, id: ConnectionId) -> bool {
        self.inner.lock().connections.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_sealed(&self) -> bool {
        self.inner.lock().sealed
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
