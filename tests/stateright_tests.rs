//! Stateright model checker tests for the Lamport lock
//!
//! These tests exhaustively verify the production [`LockCore`] state machine:
//! the model actors embed the exact core the tokio runtime drives, so every
//! transition the checker explores is a transition the real code can take.
//!
//! Two model variants:
//! - hold-forever: every peer requests once and keeps the lock when granted;
//!   used to check mutual exclusion, since "holding" is then an observable
//!   stable state
//! - release-on-grant: every peer releases as soon as it is granted; used to
//!   check that every peer eventually acquires

use std::borrow::Cow;
use std::sync::Arc;

use lamport_lock::{LockCore, Message, PeerId};
use stateright::actor::{Actor, ActorModel, Id, Network, Out};
use stateright::{Checker, Model};

/// One peer of the lock protocol. Actor index == peer id.
#[derive(Clone, Debug)]
struct LockPeer {
    num_peers: usize,
    release_on_grant: bool,
}

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
struct LockPeerState {
    core: LockCore,
    /// Whether this peer has been granted the lock at some point
    granted: bool,
}

impl LockPeer {
    fn broadcast(&self, from: PeerId, message: Message, o: &mut Out<Self>) {
        for peer in 0..self.num_peers {
            if peer != from {
                o.send(Id::from(peer), message);
            }
        }
    }
}

impl Actor for LockPeer {
    type Msg = Message;
    type State = LockPeerState;
    type Timer = ();
    type Storage = ();
    type Random = ();

    fn on_start(
        &self,
        id: Id,
        _storage: &Option<Self::Storage>,
        o: &mut Out<Self>,
    ) -> Self::State {
        let peer = usize::from(id);
        let mut core = LockCore::new(peer, self.num_peers);

        // Every peer requests the lock immediately.
        let request = core.begin_request();
        self.broadcast(peer, request, o);

        LockPeerState {
            core,
            granted: false,
        }
    }

    fn on_msg(
        &self,
        _id: Id,
        state: &mut Cow<Self::State>,
        src: Id,
        msg: Self::Msg,
        o: &mut Out<Self>,
    ) {
        let state = state.to_mut();

        if let Some(ack) = state.core.process(msg) {
            o.send(src, ack);
        }

        if !state.granted && state.core.holds_lock() {
            state.granted = true;
            if self.release_on_grant {
                let peer = state.core.peer();
                let release = state.core.finish_release();
                self.broadcast(peer, release, o);
            }
        }
    }
}

fn lock_model(
    num_peers: usize,
    release_on_grant: bool,
) -> ActorModel<LockPeer, usize, ()> {
    // Ordered network: the protocol assumes FIFO delivery per sender/receiver
    // pair, exactly what the tokio mpsc channels provide.
    let mut model = ActorModel::new(num_peers, ()).init_network(Network::new_ordered([]));

    for _ in 0..num_peers {
        model = model.actor(LockPeer {
            num_peers,
            release_on_grant,
        });
    }

    // Safety: at no reachable state do two peers satisfy the lock predicate.
    model = model.property(
        stateright::Expectation::Always,
        "mutual exclusion",
        |_, state| {
            let holders = state
                .actor_states
                .iter()
                .filter(|s: &&Arc<LockPeerState>| s.core.holds_lock())
                .count();
            holders <= 1
        },
    );

    // The clock never falls behind any processed message's logical time.
    model = model.property(
        stateright::Expectation::Always,
        "clock dominates seen times",
        |model, state| {
            state.actor_states.iter().all(|s: &Arc<LockPeerState>| {
                (0..model.cfg).all(|peer| s.core.clock() >= s.core.last_seen(peer))
            })
        },
    );

    if release_on_grant {
        // Liveness: every peer that requested is eventually granted.
        model = model.property(
            stateright::Expectation::Eventually,
            "every peer acquires",
            |_, state| {
                state
                    .actor_states
                    .iter()
                    .all(|s: &Arc<LockPeerState>| s.granted)
            },
        );
    }

    model
}

#[test]
fn check_mutual_exclusion_two_peers() {
    let model = lock_model(2, false);
    let checker = model.checker().threads(num_cpus::get()).spawn_bfs().join();
    checker.assert_properties();
    println!(
        "Two peers, hold forever: {} states explored",
        checker.unique_state_count()
    );
}

#[test]
fn check_mutual_exclusion_three_peers() {
    let model = lock_model(3, false);
    let checker = model.checker().threads(num_cpus::get()).spawn_bfs().join();
    checker.assert_properties();
    println!(
        "Three peers, hold forever: {} states explored",
        checker.unique_state_count()
    );
}

#[test]
fn check_progress_two_peers() {
    let model = lock_model(2, true);
    let checker = model.checker().threads(num_cpus::get()).spawn_bfs().join();
    checker.assert_properties();
    println!(
        "Two peers, release on grant: {} states explored",
        checker.unique_state_count()
    );
}

#[test]
fn check_progress_three_peers() {
    let model = lock_model(3, true);
    let checker = model.checker().threads(num_cpus::get()).spawn_bfs().join();
    checker.assert_properties();
    println!(
        "Three peers, release on grant: {} states explored",
        checker.unique_state_count()
    );
}
