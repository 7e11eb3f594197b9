//! Demo harness: N peers repeatedly fight over the distributed lock.
//!
//! Each worker acquires the lock, writes its id into a shared cell, holds
//! the lock for a jittered work duration, then checks the cell was not
//! overwritten - which would mean two peers held the lock at once.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use clap::Parser;
use lamport_lock::{LamportLock, LockConfig, Message, PeerId};
use tokio::sync::mpsc;
use tracing::info;

/// One in-flight message per peer would suffice for a single acquire cycle,
/// but bursts pile up faster than the servicing loop drains them, so leave
/// plenty of headroom.
const INBOX_CAPACITY: usize = 512;

#[derive(Parser, Debug)]
#[command(name = "lamport-demo")]
#[command(about = "Run the Lamport distributed lock demo")]
struct Args {
    /// Number of peers contending for the lock
    #[arg(short, long, default_value_t = 8)]
    peers: usize,

    /// Acquire/release cycles per peer
    #[arg(short, long, default_value_t = 1)]
    rounds: usize,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    assert!(args.peers >= 2, "need at least two peers");

    let (senders, receivers): (Vec<_>, Vec<_>) = (0..args.peers)
        .map(|_| mpsc::channel::<Message>(INBOX_CAPACITY))
        .unzip();

    let cell = Arc::new(AtomicUsize::new(0));

    let workers: Vec<_> = receivers
        .into_iter()
        .enumerate()
        .map(|(peer, inbox)| {
            let lock = LamportLock::start(peer, senders.clone(), inbox, LockConfig::default());
            let cell = Arc::clone(&cell);
            let rounds = args.rounds;
            tokio::spawn(async move {
                for round in 0..rounds {
                    worker_cycle(&lock, peer, round, &cell).await;
                }
                // Hand the lock back so every peer's servicing task stays
                // alive until all workers are done.
                lock
            })
        })
        .collect();

    let mut locks = Vec::with_capacity(args.peers);
    for worker in workers {
        locks.push(worker.await.expect("worker panicked"));
    }

    info!(
        peers = args.peers,
        rounds = args.rounds,
        "all peers completed without overlap"
    );
}

async fn worker_cycle(
    lock: &LamportLock,
    peer: PeerId,
    round: usize,
    cell: &AtomicUsize,
) {
    lock.acquire().await;
    info!(peer, round, "acquired lock");

    cell.store(peer, Ordering::SeqCst);

    let hold = Duration::from_millis(rand::random_range(50..150));
    tokio::time::sleep(hold).await;

    let observed = cell.load(Ordering::SeqCst);

    lock.release();
    info!(peer, round, "released lock");

    assert_eq!(
        observed, peer,
        "shared cell was overwritten while peer {peer} held the lock"
    );
}
