//! Engine behaviour under concurrent callers.

#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]

use futures::future::join_all;
use std::collections::BTreeSet;
use std::sync::Arc;
use ticket_queue_core::{QueueEngine, TicketStatus};
use ticket_queue_sqlite::SqliteQueueStore;
use ticket_queue_testing::{QueueHarness, test_clock};

const JOINERS: u64 = 200;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_joins_issue_every_ticket_once() {
    let harness = QueueHarness::new();

    let handles: Vec<_> = (0..JOINERS)
        .map(|i| {
            let engine = harness.engine.clone();
            tokio::spawn(async move { engine.join(&format!("guest {i}")).await })
        })
        .collect();

    let tickets: BTreeSet<u64> = join_all(handles)
        .await
        .into_iter()
        .map(|joined| joined.expect("task panicked").expect("join failed").ticket.get())
        .collect();

    assert_eq!(tickets, (1..=JOINERS).collect::<BTreeSet<_>>());
    harness.assert_invariants().await;

    let state = harness.engine.state().await.expect("state");
    assert_eq!(state.last_ticket.get(), JOINERS);
    assert_eq!(state.length, JOINERS);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn a_single_ticket_is_called_while_joins_and_advances_race() {
    let harness = QueueHarness::new();

    let joiners = (0..50).map(|i| {
        let engine = harness.engine.clone();
        tokio::spawn(async move {
            engine.join(&format!("guest {i}")).await.expect("join");
        })
    });
    let advancers = (0..30).map(|i| {
        let engine = harness.engine.clone();
        tokio::spawn(async move {
            if i % 2 == 0 {
                engine.advance().await.expect("advance");
            } else {
                engine.advance_if_possible().await.expect("advance");
            }
        })
    });
    let observer = {
        let harness = harness.clone();
        tokio::spawn(async move {
            for _ in 0..50 {
                harness.assert_invariants().await;
                tokio::task::yield_now().await;
            }
        })
    };

    for handle in joiners.chain(advancers) {
        handle.await.expect("task panicked");
    }
    observer.await.expect("invariant violated during the race");

    harness.assert_invariants().await;
    let called = harness
        .store
        .entries()
        .await
        .into_iter()
        .filter(|entry| entry.status == TicketStatus::Called)
        .count();
    assert!(called <= 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_joins_on_sqlite() {
    let store = SqliteQueueStore::in_memory().await.expect("open");
    store.migrate().await.expect("migrate");
    let engine = QueueEngine::new(Arc::new(store), Arc::new(test_clock()));

    let handles: Vec<_> = (0..50)
        .map(|i| {
            let engine = engine.clone();
            tokio::spawn(async move { engine.join(&format!("guest {i}")).await })
        })
        .collect();

    let mut tickets: Vec<u64> = join_all(handles)
        .await
        .into_iter()
        .map(|joined| joined.expect("task panicked").expect("join failed").ticket.get())
        .collect();
    tickets.sort_unstable();

    assert_eq!(tickets, (1..=50).collect::<Vec<_>>());
    assert_eq!(engine.state().await.expect("state").length, 50);
}
