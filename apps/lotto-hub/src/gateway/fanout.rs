//! Broadcast hub: a bounded queue of value sets and the loop that fans
//! each one out to every registered connection.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use lotto_common::ValueSet;
use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

use crate::error::HubError;

use super::connection::{Connection, ConnectionError};
use super::registry::ConnectionRegistry;

/// What `enqueue` does when the queue is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backpressure {
    /// Evict the oldest queued value set to make room.
    DropOldest,
    /// Wait up to `timeout` for room, then fail with [`HubError::QueueFull`].
    Block { timeout: Duration },
}

/// Successful outcome of [`BroadcastHub::enqueue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enqueued {
    Queued,
    DroppedOldest,
}

/// Result of one fan-out iteration.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DispatchReport {
    pub delivered: usize,
    pub pruned: usize,
}

/// Point-in-time hub counters.
#[derive(Debug, Clone, Copy)]
pub struct HubStats {
    pub connections: usize,
    pub queued: usize,
    pub queue_capacity: usize,
    /// Value sets taken off the queue and fanned out since startup.
    pub dispatched: u64,
    /// Connections removed after a failed write.
    pub pruned: u64,
}

struct QueueState {
    items: VecDeque<ValueSet>,
    closed: bool,
}

/// Bounded FIFO with a single consumer.
struct BroadcastQueue {
    state: Mutex<QueueState>,
    capacity: usize,
    backpressure: Backpressure,
    items_ready: Notify,
    space_ready: Notify,
}

impl BroadcastQueue {
    fn new(capacity: usize, backpressure: Backpressure) -> Self {
        let capacity = capacity.max(1);
        Self {
            state: Mutex::new(QueueState {
                items: VecDeque::with_capacity(capacity),
                closed: false,
            }),
            capacity,
            backpressure,
            items_ready: Notify::new(),
            space_ready: Notify::new(),
        }
    }

    async fn push(&self, values: ValueSet) -> Result<Enqueued, HubError> {
        let deadline = match self.backpressure {
            Backpressure::Block { timeout } => Some(Instant::now() + timeout),
            Backpressure::DropOldest => None,
        };

        loop {
            // Registered before the state check so a pop or close between
            // the check and the await still wakes us.
            let space = self.space_ready.notified();
            tokio::pin!(space);
            space.as_mut().enable();

            {
                let mut state = self.state.lock();
                if state.closed {
                    return Err(HubError::ShuttingDown);
                }
                if state.items.len() < self.capacity {
                    state.items.push_back(values);
                    drop(state);
                    self.items_ready.notify_one();
                    return Ok(Enqueued::Queued);
                }
                if deadline.is_none() {
                    state.items.pop_front();
                    state.items.push_back(values);
                    drop(state);
                    self.items_ready.notify_one();
                    return Ok(Enqueued::DroppedOldest);
                }
            }

            if let Some(deadline) = deadline {
                if time::timeout_at(deadline, space).await.is_err() {
                    return Err(HubError::QueueFull);
                }
            }
        }
    }

    /// Next value set, or `None` once the queue is closed.
    async fn pop(&self) -> Option<ValueSet> {
        loop {
            let ready = self.items_ready.notified();
            tokio::pin!(ready);
            ready.as_mut().enable();

            {
                let mut state = self.state.lock();
                if state.closed {
                    return None;
                }
                if let Some(values) = state.items.pop_front() {
                    drop(state);
                    self.space_ready.notify_one();
                    return Some(values);
                }
            }

            ready.await;
        }
    }

    /// Close the queue and discard whatever is left. Returns the number of
    /// discarded value sets.
    fn close(&self) -> usize {
        let discarded = {
            let mut state = self.state.lock();
            state.closed = true;
            let n = state.items.len();
            state.items.clear();
            n
        };
        self.items_ready.notify_waiters();
        self.space_ready.notify_waiters();
        discarded
    }

    fn len(&self) -> usize {
        self.state.lock().items.len()
    }
}

/// Owns the connection registry and the broadcast queue.
///
/// Producers call [`enqueue`](Self::enqueue); exactly one task runs
/// [`run`](Self::run), which drains the queue in order and writes each
/// value set to a registry snapshot. A connection whose write fails is
/// removed and closed.
pub struct BroadcastHub {
    registry: ConnectionRegistry,
    queue: BroadcastQueue,
    shutdown: CancellationToken,
    stopped: AtomicBool,
    running: AtomicBool,
    dispatched: AtomicU64,
    pruned: AtomicU64,
}

impl BroadcastHub {
    pub fn new(capacity: usize, backpressure: Backpressure) -> Self {
        Self {
            registry: ConnectionRegistry::new(),
            queue: BroadcastQueue::new(capacity, backpressure),
            shutdown: CancellationToken::new(),
            stopped: AtomicBool::new(false),
            running: AtomicBool::new(false),
            dispatched: AtomicU64::new(0),
            pruned: AtomicU64::new(0),
        }
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.registry
    }

    /// Queue a value set for broadcast.
    pub async fn enqueue(&self, values: ValueSet) -> Result<Enqueued, HubError> {
        let outcome = self.queue.push(values).await?;
        if outcome == Enqueued::DroppedOldest {
            tracing::warn!(%values, "broadcast queue full, dropped oldest value set");
        }
        Ok(outcome)
    }

    /// The dispatch loop. Returns once [`shutdown`](Self::shutdown) is called.
    pub async fn run(&self) -> Result<(), HubError> {
        if self.running.swap(true, Ordering::AcqRel) {
            return Err(HubError::AlreadyRunning);
        }
        tracing::info!("dispatch loop started");

        loop {
            let values = tokio::select! {
                biased;
                () = self.shutdown.cancelled() => break,
                next = self.queue.pop() => match next {
                    Some(values) => values,
                    None => break,
                },
            };
            self.dispatch(&values);
        }

        self.running.store(false, Ordering::Release);
        tracing::info!("dispatch loop stopped");
        Ok(())
    }

    /// Write one value set to every registered connection.
    pub fn dispatch(&self, values: &ValueSet) -> DispatchReport {
        let payload: Arc<str> = Arc::from(values.to_json());
        let mut report = DispatchReport::default();

        for conn in self.registry.snapshot() {
            match conn.send(payload.clone()) {
                Ok(()) => report.delivered += 1,
                Err(err) => {
                    if self.prune(&conn, err) {
                        report.pruned += 1;
                    }
                }
            }
        }

        self.dispatched.fetch_add(1, Ordering::Relaxed);
        tracing::debug!(
            %values,
            delivered = report.delivered,
            pruned = report.pruned,
            "value set dispatched"
        );
        report
    }

    /// Send one value set to a single connection, pruning it on failure.
    pub fn send_to(&self, conn: &Connection, values: &ValueSet) -> Result<(), ConnectionError> {
        let result = conn.send(Arc::from(values.to_json()));
        if let Err(err) = result {
            self.prune(conn, err);
        }
        result
    }

    /// Unregister and close a connection whose handler has finished.
    /// Returns `true` if it was still registered.
    pub fn disconnect(&self, conn: &Connection) -> bool {
        let removed = self.registry.remove(conn.id);
        conn.close();
        removed.is_some()
    }

    fn prune(&self, conn: &Connection, reason: ConnectionError) -> bool {
        let Some(removed) = self.registry.remove(conn.id) else {
            return false;
        };
        removed.close();
        self.pruned.fetch_add(1, Ordering::Relaxed);
        tracing::warn!(conn_id = %removed.id, %reason, "pruned connection after failed write");
        true
    }

    /// Stop the hub: discard queued value sets, close every connection, and
    /// make `run` return. Returns the number of connections closed; calls
    /// after the first return `0`.
    pub fn shutdown(&self) -> usize {
        if self.stopped.swap(true, Ordering::AcqRel) {
            return 0;
        }
        self.shutdown.cancel();
        let discarded = self.queue.close();

        let closed = self
            .registry
            .drain()
            .iter()
            .filter(|conn| conn.close())
            .count();

        tracing::info!(closed, discarded, "hub shut down");
        closed
    }

    pub fn is_shutting_down(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Token cancelled by [`shutdown`](Self::shutdown).
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    pub fn stats(&self) -> HubStats {
        HubStats {
            connections: self.registry.len(),
            queued: self.queue.len(),
            queue_capacity: self.queue.capacity,
            dispatched: self.dispatched.load(Ordering::Relaxed),
            pruned: self.pruned.load(Ordering::Relaxed),
        }
    }
}

/// Handle to a spawned dispatch loop.
pub struct Dispatcher {
    hub: Arc<BroadcastHub>,
    handle: JoinHandle<()>,
}

impl Dispatcher {
    pub fn start(hub: Arc<BroadcastHub>) -> Self {
        let task_hub = hub.clone();
        let handle = tokio::spawn(async move {
            if let Err(err) = task_hub.run().await {
                tracing::warn!(%err, "dispatch loop not started");
            }
        });
        Self { hub, handle }
    }

    /// Shut the hub down and wait for the loop to return.
    pub async fn stop(self) -> usize {
        let closed = self.hub.shutdown();
        if let Err(err) = self.handle.await {
            tracing::error!(%err, "dispatch task failed");
        }
        closed
    }
}
