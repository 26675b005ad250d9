// Accusation Tests
// Tests for accusation counting and the quorum halt rule

use utxomesh::ledger::NodeId;
use utxomesh::sync::{Accusation, AccusationLedger, AccusationOutcome, DEFAULT_MAX_FAULTY};

#[test]
fn test_default_threshold() {
    let ledger = AccusationLedger::default();
    assert_eq!(ledger.max_faulty(), DEFAULT_MAX_FAULTY);
}

#[test]
fn test_flag_broadcasts_once() {
    let mut ledger = AccusationLedger::new(1);
    let offender = NodeId::new(7);

    let first = ledger.flag_byzantine(offender);
    assert_eq!(first.broadcast(), Some(Accusation::new(offender)));
    assert!(!first.should_halt());
    assert_eq!(ledger.count(offender), 1);

    let second = ledger.flag_byzantine(offender);
    assert_eq!(second, AccusationOutcome::AlreadyAccused);
    assert_eq!(ledger.count(offender), 1);
}

#[test]
fn test_ignored_node_never_flagged() {
    let mut ledger = AccusationLedger::new(1);
    ledger.ignore(NodeId::new(0));

    assert_eq!(ledger.flag_byzantine(NodeId::new(0)), AccusationOutcome::AlreadyAccused);
    assert_eq!(ledger.count(NodeId::new(0)), 0);
}

#[test]
fn test_quorum_reached_on_second_accusation() {
    let mut ledger = AccusationLedger::new(1);
    let notice = Accusation::new(NodeId::new(7));

    let first = ledger.receive(&notice);
    assert!(!first.should_halt());
    assert!(first.broadcast().is_none());

    let second = ledger.receive(&notice);
    assert!(second.should_halt());
    assert_eq!(
        second,
        AccusationOutcome::Counted {
            broadcast: None,
            count: 2,
            halt: true
        }
    );
}

#[test]
fn test_local_flag_plus_received_notice_halts() {
    let mut ledger = AccusationLedger::new(1);
    let offender = NodeId::new(3);

    assert!(!ledger.flag_byzantine(offender).should_halt());
    assert!(ledger.receive(&Accusation::new(offender)).should_halt());
}

#[test]
fn test_received_notice_suppresses_own_accusation() {
    let mut ledger = AccusationLedger::new(2);
    let offender = NodeId::new(4);

    ledger.receive(&Accusation::new(offender));

    assert!(ledger.is_ignored(offender));
    assert_eq!(ledger.flag_byzantine(offender), AccusationOutcome::AlreadyAccused);
}

#[test]
fn test_counts_are_per_accused() {
    let mut ledger = AccusationLedger::new(1);

    ledger.receive(&Accusation::new(NodeId::new(1)));
    let outcome = ledger.receive(&Accusation::new(NodeId::new(2)));

    assert!(!outcome.should_halt());
    assert_eq!(ledger.accused(), vec![(NodeId::new(1), 1), (NodeId::new(2), 1)]);
}

#[test]
fn test_zero_tolerance_halts_on_first() {
    let mut ledger = AccusationLedger::new(0);
    assert!(ledger.flag_byzantine(NodeId::new(5)).should_halt());
}
