//! Async lock runtime: shared core, peer channels and the servicing task.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, instrument, trace};

use crate::config::{LockConfig, Sleep, TokioSleep};
use crate::core::LockCore;
use crate::messages::{Message, PeerId};

/// One peer's handle on the distributed lock.
///
/// Construction via [`start`](Self::start) spawns the background servicing
/// task, which keeps answering other peers' Requests, Releases and Acks even
/// while this peer is idle - required for global progress. The task is
/// aborted when the handle is dropped.
///
/// Exactly two tasks touch the underlying [`LockCore`]: the owning peer's
/// application task (through [`acquire`](Self::acquire) /
/// [`release`](Self::release)) and the servicing task. A std mutex
/// serializes them; no lock is ever held across an await point.
pub struct LamportLock<S: Sleep = TokioSleep> {
    core: Arc<Mutex<LockCore>>,
    outboxes: Vec<mpsc::Sender<Message>>,
    poll_interval: Duration,
    sleep: S,
    service: JoinHandle<()>,
}

impl<S: Sleep> LamportLock<S> {
    /// Start participating in the lock protocol as peer `peer`.
    ///
    /// `outboxes` holds the inbound-queue send handle of every peer in the
    /// set, indexed by peer id (the own entry is present but never sent to);
    /// `inbox` is the receiving end of the own entry.
    ///
    /// Peer-count capacity is only the floor (every peer depositing one
    /// message at once). Sustained acquire/release traffic keeps requests,
    /// releases and acks in flight between servicing wakes, so channels
    /// need headroom for that backlog - the demo and tests use 512.
    ///
    /// # Panics
    /// Panics if `peer` is not a valid index into `outboxes`.
    #[must_use]
    pub fn start(
        peer: PeerId,
        outboxes: Vec<mpsc::Sender<Message>>,
        inbox: mpsc::Receiver<Message>,
        config: LockConfig<S>,
    ) -> Self {
        let core = Arc::new(Mutex::new(LockCore::new(peer, outboxes.len())));

        let service = tokio::spawn(run_service(
            peer,
            Arc::clone(&core),
            outboxes.clone(),
            inbox,
            config.poll_interval,
            config.sleep.clone(),
        ));

        Self {
            core,
            outboxes,
            poll_interval: config.poll_interval,
            sleep: config.sleep,
            service,
        }
    }

    /// Own peer identity.
    #[must_use]
    pub fn peer(&self) -> PeerId {
        self.core.lock().unwrap().peer()
    }

    /// Whether this peer currently holds the lock.
    #[must_use]
    pub fn holds_lock(&self) -> bool {
        self.core.lock().unwrap().holds_lock()
    }

    /// Acquire the lock, waiting as long as it takes.
    ///
    /// Broadcasts the own Request and then polls the lock predicate at the
    /// configured interval. There is no timeout or cancellation path: under
    /// the reliable-delivery assumption acquisition cannot fail, only stall
    /// if that assumption is violated.
    pub async fn acquire(&self) {
        let request = {
            // Broadcast under the same exclusive section as the local
            // enqueue, so our own predicate check cannot race ahead of
            // the sends.
            let mut core = self.core.lock().unwrap();
            let request = core.begin_request();
            broadcast(&self.outboxes, request);
            request
        };
        debug!(peer = request.origin, time = request.time, "requested lock");

        loop {
            if self.holds_lock() {
                debug!(peer = request.origin, "acquired lock");
                return;
            }
            self.sleep.sleep(self.poll_interval).await;
        }
    }

    /// Release the lock.
    ///
    /// # Panics
    /// Panics if this peer does not currently hold the lock. That is a
    /// usage-contract violation: continuing would corrupt the shared
    /// protocol state, so the peer aborts instead.
    pub fn release(&self) {
        let mut core = self.core.lock().unwrap();
        assert!(
            core.holds_lock(),
            "cannot release a lock this peer does not hold"
        );
        let release = core.finish_release();
        broadcast(&self.outboxes, release);
        debug!(peer = release.origin, time = release.time, "released lock");
    }
}

impl<S: Sleep> Drop for LamportLock<S> {
    fn drop(&mut self) {
        self.service.abort();
    }
}

/// Send `message` to every peer except its origin.
///
/// Sends are non-blocking. A full or closed inbox means the capacity
/// contract or the delivery assumption no longer holds, and the protocol
/// state is unrecoverable.
fn broadcast(outboxes: &[mpsc::Sender<Message>], message: Message) {
    for (peer, outbox) in outboxes.iter().enumerate() {
        if peer != message.origin {
            outbox
                .try_send(message)
                .expect("peer inbox rejected a send: delivery assumption violated");
        }
    }
}

/// Perpetual servicing loop: drain the inbox, then sleep a fixed interval.
/// Processing (including the Ack reply) happens under the same exclusive
/// section as the state update.
///
/// The whole inbox is drained per wake: a one-message-per-wake drain falls
/// behind as soon as traffic outpaces the interval, and the backlog would
/// eventually overrun any fixed channel capacity. Draining fully bounds the
/// backlog by a single interval's burst.
#[instrument(skip_all, fields(peer = peer))]
async fn run_service<S: Sleep>(
    peer: PeerId,
    core: Arc<Mutex<LockCore>>,
    outboxes: Vec<mpsc::Sender<Message>>,
    mut inbox: mpsc::Receiver<Message>,
    poll_interval: Duration,
    sleep: S,
) {
    debug!(peer, "service task started");

    loop {
        {
            let mut core = core.lock().unwrap();
            loop {
                match inbox.try_recv() {
                    Ok(message) => {
                        trace!(
                            peer,
                            kind = ?message.kind,
                            origin = message.origin,
                            time = message.time,
                            "processing message"
                        );
                        if let Some(ack) = core.process(message) {
                            outboxes[message.origin]
                                .try_send(ack)
                                .expect("peer inbox rejected an ack: delivery assumption violated");
                        }
                    }
                    Err(mpsc::error::TryRecvError::Empty) => break,
                    Err(mpsc::error::TryRecvError::Disconnected) => {
                        debug!(peer, "inbox closed, service task stopping");
                        return;
                    }
                }
            }
        }
        sleep.sleep(poll_interval).await;
    }
}
