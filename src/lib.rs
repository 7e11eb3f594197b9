//! Lamport distributed mutual-exclusion lock
//!
//! This library implements Lamport's classic distributed mutual-exclusion
//! algorithm: N symmetric peers, communicating only by message passing,
//! cooperatively simulate a single lock. Logical clocks and a deterministic
//! total order over requests guarantee that at most one peer holds the lock
//! at a time and that requests are granted in an order consistent with
//! logical time.
//!
//! # Architecture
//!
//! - [`LockCore`]: pure state machine - logical clock, seen-time vector and
//!   pending-request queue, with no I/O or synchronization
//! - [`LamportLock`]: async runtime wrapper - owns the shared core, the
//!   outbound channels to every peer, and the background servicing task
//!
//! The same [`LockCore`] transitions driven by the tokio runtime are
//! exhaustively verified by the Stateright model checker tests.
//!
//! # Quick Start
//!
//! ```ignore
//! use lamport_lock::{LamportLock, LockConfig, Message};
//! use tokio::sync::mpsc;
//!
//! // The harness allocates one inbound channel per peer. Capacity must
//! // cover the in-flight backlog of the workload, not just one deposit
//! // per peer - give it generous headroom.
//! let (senders, mut receivers): (Vec<_>, Vec<_>) =
//!     (0..n).map(|_| mpsc::channel::<Message>(512)).unzip();
//!
//! // Each peer task:
//! let lock = LamportLock::start(peer, senders.clone(), inbox, LockConfig::default());
//! lock.acquire().await;
//! // ... critical section ...
//! lock.release();
//! ```
//!
//! # Assumptions
//!
//! The protocol assumes reliable, non-duplicating, FIFO-per-pair message
//! delivery and a fixed peer set with no crashes while requesting or holding
//! the lock. Violating those assumptions voids the correctness argument;
//! failures surface as panics, never as recoverable errors.

#![warn(clippy::pedantic)]

pub mod config;
pub mod core;
mod lock;
mod messages;
mod queue;

pub use self::core::LockCore;
pub use config::{LockConfig, Sleep, TokioSleep};
pub use lock::LamportLock;
pub use messages::{LogicalTime, Message, MessageKind, PeerId};
pub use queue::RequestQueue;
