//! Pure state machine core for the Lamport lock - no I/O, no async
//!
//! This module contains the state transition logic that is shared between:
//! - The async runtime implementation (`lock.rs`)
//! - The Stateright model checker tests
//!
//! By extracting this logic, we ensure the model checker verifies the exact
//! same state transitions as the production code. The caller performs all
//! message sends; the core only produces the messages to send.

use crate::messages::{LogicalTime, Message, MessageKind, PeerId};
use crate::queue::RequestQueue;

/// Pure per-peer lock state - logical clock, seen-time vector and
/// pending-request queue.
///
/// All transitions are synchronous; callers that share an instance across
/// tasks must serialize access themselves (see [`LamportLock`]).
///
/// [`LamportLock`]: crate::LamportLock
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct LockCore {
    /// Own peer identity
    peer: PeerId,
    /// Lamport clock: incremented on every locally originated send,
    /// max-merged on receipt
    clock: LogicalTime,
    /// Highest logical time observed in any message from each peer
    seen: Vec<LogicalTime>,
    /// Known pending Requests, own and received
    pending: RequestQueue,
}

impl LockCore {
    /// Create the state for one peer of an `num_peers`-strong set.
    ///
    /// # Panics
    /// Panics if `peer` is not a valid index into the peer set.
    #[must_use]
    pub fn new(peer: PeerId, num_peers: usize) -> Self {
        assert!(peer < num_peers, "peer index out of range");
        Self {
            peer,
            clock: 1,
            seen: vec![0; num_peers],
            pending: RequestQueue::new(),
        }
    }

    /// Own peer identity.
    #[must_use]
    pub fn peer(&self) -> PeerId {
        self.peer
    }

    /// Current logical clock value.
    #[must_use]
    pub fn clock(&self) -> LogicalTime {
        self.clock
    }

    /// Number of known pending requests, own included.
    #[must_use]
    pub fn pending_requests(&self) -> usize {
        self.pending.len()
    }

    /// Highest logical time observed in any message from `peer`.
    ///
    /// # Panics
    /// Panics if `peer` is not a valid index into the peer set.
    #[must_use]
    pub fn last_seen(&self, peer: PeerId) -> LogicalTime {
        self.seen[peer]
    }

    /// Start a lock request: advance the clock, enqueue the own Request and
    /// return it.
    ///
    /// The caller must broadcast the returned message to every other peer
    /// within the same exclusive section, so the local enqueue cannot be
    /// observed ahead of the sends.
    pub fn begin_request(&mut self) -> Message {
        self.clock += 1;
        let request = Message {
            kind: MessageKind::Request,
            origin: self.peer,
            time: self.clock,
        };
        self.pending.push(request);
        request
    }

    /// Finish holding the lock: advance the clock, dequeue the own Request
    /// and return the Release to broadcast.
    ///
    /// # Panics
    /// Panics if the queue front is not this peer's own Request. The caller
    /// must have verified [`holds_lock`](Self::holds_lock) first; anything
    /// else is a protocol logic defect.
    pub fn finish_release(&mut self) -> Message {
        self.clock += 1;
        let front = self
            .pending
            .pop()
            .expect("release with no pending request");
        assert_eq!(
            front.origin, self.peer,
            "release while another peer's request is at the queue front"
        );
        Message {
            kind: MessageKind::Release,
            origin: self.peer,
            time: self.clock,
        }
    }

    /// Process one received message, returning the Ack to send back to
    /// `message.origin` if the message was a Request.
    ///
    /// Updates the seen-time vector and max-merges the clock for every kind.
    /// The merge deliberately does not add one on receipt: the original
    /// algorithm's tie-break outcomes depend on it.
    pub fn process(&mut self, message: Message) -> Option<Message> {
        self.seen[message.origin] = message.time;
        self.clock = self.clock.max(message.time);

        match message.kind {
            MessageKind::Request => {
                self.pending.push(message);
                // Ack so idle peers still advance the requester's seen-times
                self.clock += 1;
                Some(Message {
                    kind: MessageKind::Ack,
                    origin: self.peer,
                    time: self.clock,
                })
            }
            MessageKind::Release => {
                self.pending.remove_origin(message.origin);
                None
            }
            MessageKind::Ack => None,
        }
    }

    /// Whether this peer currently holds the lock.
    ///
    /// True iff the own Request is at the front of the queue and every other
    /// peer has been seen at a logical time at least that Request's - which
    /// proves no earlier-ordered Request can still arrive.
    #[must_use]
    pub fn holds_lock(&self) -> bool {
        let Some(front) = self.pending.peek() else {
            return false;
        };
        if front.origin != self.peer {
            return false;
        }
        self.seen
            .iter()
            .enumerate()
            .all(|(peer, &time)| peer == self.peer || time >= front.time)
    }
}
