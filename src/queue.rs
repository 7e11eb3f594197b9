//! Pending-request priority queue

use std::collections::BTreeSet;

use crate::messages::{Message, PeerId};

/// Priority queue of pending lock Requests, ordered by `(time, origin)`.
///
/// Backed by a `BTreeSet`: the message order is total (peer identities are
/// unique) and each peer has at most one Request outstanding, so set
/// semantics lose nothing. This also gives O(log n) push/pop, native
/// removal by origin, and structural equality/hash so the state machine
/// containing the queue can be model checked.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct RequestQueue {
    entries: BTreeSet<Message>,
}

impl RequestQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a Request.
    pub fn push(&mut self, message: Message) {
        self.entries.insert(message);
    }

    /// Remove and return the smallest entry.
    pub fn pop(&mut self) -> Option<Message> {
        self.entries.pop_first()
    }

    /// The smallest entry, without removing it.
    #[must_use]
    pub fn peek(&self) -> Option<&Message> {
        self.entries.first()
    }

    /// Remove every entry originating from `peer`.
    ///
    /// The queue invariant allows at most one matching entry, but removal
    /// tolerates any number.
    pub fn remove_origin(&mut self, peer: PeerId) {
        self.entries.retain(|m| m.origin != peer);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
