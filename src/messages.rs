//! Lock protocol messages

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Peer identity: an index into the peer set, unique among participants.
pub type PeerId = usize;

/// Lamport logical time.
pub type LogicalTime = u64;

/// The three message kinds exchanged to coordinate lock ownership.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MessageKind {
    /// Request lock acquisition
    Request,
    /// Release the currently held lock
    Release,
    /// Acknowledge a lock request
    Ack,
}

/// A lock coordination message.
///
/// Ordered by `(time, origin)` - logical time ascending with the origin peer
/// as the tie-break. Peer identities are unique, so the order is total and
/// the front of a request queue is always unambiguous.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Message {
    /// Message kind
    pub kind: MessageKind,
    /// Originating peer
    pub origin: PeerId,
    /// Logical time at the origin when the message was sent
    pub time: LogicalTime,
}

impl PartialOrd for Message {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Message {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        // Queue priority is decided by (time, origin) alone; the trailing
        // kind comparison only keeps Ord consistent with the derived
        // PartialEq and Hash for messages of differing kinds.
        (self.time, self.origin, self.kind).cmp(&(other.time, other.origin, other.kind))
    }
}
