//! Property tests for ticket issuance, positions and advance ordering.

#![allow(clippy::expect_used)]
#![allow(clippy::unwrap_used)]

use proptest::prelude::*;
use ticket_queue_core::{TicketNumber, TicketStatus};
use ticket_queue_testing::QueueHarness;

#[derive(Debug, Clone)]
enum Op {
    Join(String),
    Advance,
    AdvanceIfPossible,
    Reset,
}

prop_compose! {
    fn arb_name()(name in "[A-Za-z][A-Za-z ]{0,20}") -> String {
        name
    }
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => arb_name().prop_map(Op::Join),
        2 => Just(Op::Advance),
        2 => Just(Op::AdvanceIfPossible),
        1 => Just(Op::Reset),
    ]
}

proptest! {
    #[test]
    fn joins_issue_consecutive_tickets_and_positions(names in prop::collection::vec(arb_name(), 1..40)) {
        tokio_test::block_on(async {
            let harness = QueueHarness::new();
            let receipts = harness.join_all(&names).await.expect("joins");

            for (k, receipt) in receipts.iter().enumerate() {
                assert_eq!(receipt.ticket.get(), k as u64 + 1);
                assert_eq!(receipt.position, k as u64);
                assert_eq!(receipt.current_ticket, TicketNumber::NONE);
            }
            let state = harness.engine.state().await.expect("state");
            assert_eq!(state.length, names.len() as u64);
            assert_eq!(state.last_ticket.get(), names.len() as u64);
        });
    }

    #[test]
    fn advance_walks_tickets_in_order(joins in 0usize..25, advances in 0usize..30) {
        tokio_test::block_on(async {
            let harness = QueueHarness::new();
            harness
                .join_all((0..joins).map(|i| format!("guest {i}")))
                .await
                .expect("joins");

            let mut previous = TicketNumber::NONE;
            for _ in 0..advances {
                let state = harness.engine.advance().await.expect("advance");
                assert!(state.current_ticket >= previous);
                if previous.get() < joins as u64 {
                    assert_eq!(state.current_ticket, previous.next());
                } else {
                    assert_eq!(state.current_ticket, previous);
                }
                previous = state.current_ticket;
            }
            harness.assert_invariants().await;
        });
    }

    #[test]
    fn invariants_hold_for_any_operation_sequence(ops in prop::collection::vec(arb_op(), 0..60)) {
        tokio_test::block_on(async {
            let harness = QueueHarness::new();
            let mut issued: u64 = 0;

            for op in ops {
                match op {
                    Op::Join(name) => {
                        let receipt = harness.engine.join(&name).await.expect("join");
                        issued += 1;
                        assert_eq!(receipt.ticket.get(), issued);
                    }
                    Op::Advance => {
                        let before = harness.engine.state().await.expect("state");
                        let state = harness.engine.advance().await.expect("advance");
                        assert!(state.current_ticket >= before.current_ticket);
                        assert_eq!(state.last_ticket, before.last_ticket);
                    }
                    Op::AdvanceIfPossible => {
                        let entries_before = harness.store.entries().await;
                        let meta_before = harness.store.meta().await;
                        match harness.engine.advance_if_possible().await.expect("advance") {
                            Some(state) => {
                                let previous = meta_before.unwrap_or_default().current_ticket;
                                assert!(state.current_ticket > previous);
                            }
                            None => {
                                assert_eq!(harness.store.entries().await, entries_before);
                                assert_eq!(harness.store.meta().await, meta_before);
                            }
                        }
                    }
                    Op::Reset => {
                        harness.engine.reset().await.expect("reset");
                        issued = 0;
                    }
                }

                harness.assert_invariants().await;
                let state = harness.engine.state().await.expect("state");
                let active = harness
                    .store
                    .entries()
                    .await
                    .iter()
                    .filter(|entry| entry.status != TicketStatus::Done)
                    .count();
                assert_eq!(state.length, active as u64);
                assert_eq!(state.last_ticket.get(), issued);
            }
        });
    }
}
