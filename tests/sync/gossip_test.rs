// Gossip Tests
// Tests for batch validation, application and flooding decisions

use utxomesh::ledger::{LedgerState, NodeId, OutputId};
use utxomesh::sync::{
    ConflictKind, GossipConfig, GossipEngine, GossipEvent, TransactionBatch, ValidationMode,
};
use utxomesh::transaction::{Transaction, TransactionFactory};

fn engine(node: u32) -> GossipEngine {
    GossipEngine::new(
        NodeId::new(node),
        LedgerState::with_genesis(10, 10_000),
        GossipConfig::default(),
    )
}

/// Legit transfer and conflicting double spend of node 0's genesis output
fn double_spend() -> (Transaction, Transaction) {
    let ledger = LedgerState::with_genesis(10, 10_000);
    let factory = TransactionFactory::new(NodeId::new(0));
    let source = factory.find_own_output(&ledger).unwrap().clone();
    (
        factory.build_transfer(&source, NodeId::new(3)),
        factory
            .build_conflicting(&source.id(), source.amount(), NodeId::new(7))
            .unwrap(),
    )
}

fn floods(events: &[GossipEvent]) -> usize {
    events.iter().filter(|e| matches!(e, GossipEvent::Flood(_))).count()
}

fn conflicts(events: &[GossipEvent]) -> Vec<NodeId> {
    events
        .iter()
        .filter_map(|e| match e {
            GossipEvent::Conflict(c) => Some(c.offender),
            _ => None,
        })
        .collect()
}

// ============================================================================
// CONFIGURATION
// ============================================================================

#[test]
fn test_config_defaults() {
    let config = GossipConfig::default();

    assert_eq!(config.validation, ValidationMode::Relaxed);
    assert_eq!(config.filter_capacity, 10_000);
    assert_eq!(config.filter_error_rate, 0.001);
}

#[test]
fn test_validation_mode_parse() {
    assert_eq!("STRICT".parse::<ValidationMode>().unwrap(), ValidationMode::Strict);
    assert_eq!(ValidationMode::Relaxed.to_string(), "relaxed");
    assert!("lenient".parse::<ValidationMode>().is_err());
}

// ============================================================================
// APPLICATION AND FLOODING
// ============================================================================

#[test]
fn test_fresh_batch_applied_and_flooded() {
    let (t1, _) = double_spend();
    let mut node = engine(3);

    let events = node.process_batch(NodeId::new(0), &TransactionBatch::single(t1.clone()));

    assert_eq!(events[0], GossipEvent::Applied(t1.tx_id().to_string()));
    assert_eq!(floods(&events), 1);
    assert!(node.seen().contains(t1.tx_id()));
    assert!(node.spent_filter().contains(&OutputId::new("GEN:0", 0)));
    assert!(!node.ledger().contains(&OutputId::new("GEN:0", 0)));
    assert_eq!(node.ledger().total_value(), 100_000);
}

#[test]
fn test_flood_carries_batch_unmodified() {
    let (t1, _) = double_spend();
    let batch = TransactionBatch::single(t1);
    let mut node = engine(3);

    let events = node.process_batch(NodeId::new(0), &batch);

    assert!(events.contains(&GossipEvent::Flood(batch)));
}

#[test]
fn test_same_batch_twice_is_idempotent() {
    let (t1, _) = double_spend();
    let batch = TransactionBatch::single(t1);
    let mut node = engine(5);

    node.process_batch(NodeId::new(3), &batch);
    let ledger_after_first = node.ledger().clone();
    let seen_after_first = node.seen().clone();

    let events = node.process_batch(NodeId::new(4), &batch);

    assert_eq!(node.ledger(), &ledger_after_first);
    assert_eq!(node.seen(), &seen_after_first);
    assert_eq!(floods(&events), 0);
    assert!(conflicts(&events).is_empty());
    assert_eq!(node.stats().duplicates_skipped, 1);
}

#[test]
fn test_first_of_conflicting_pair_accepted_silently() {
    let (_, t2) = double_spend();
    let mut node = engine(7);

    let events = node.process_batch(NodeId::new(0), &TransactionBatch::single(t2));

    assert!(conflicts(&events).is_empty());
    assert_eq!(node.stats().transactions_applied, 1);
}

// ============================================================================
// CONFLICTS
// ============================================================================

#[test]
fn test_second_spend_accuses_its_sender() {
    let (t1, t2) = double_spend();
    let mut node = engine(5);

    node.process_batch(NodeId::new(3), &TransactionBatch::single(t1.clone()));
    let events = node.process_batch(NodeId::new(7), &TransactionBatch::single(t2.clone()));

    assert_eq!(conflicts(&events), vec![NodeId::new(7)]);
    assert_eq!(floods(&events), 0);
    // t2 is not applied: its output never appears
    assert!(!node.ledger().contains(&t2.outputs()[0].id()));
    assert!(node.ledger().contains(&t1.outputs()[1].id()));
    assert!(node.seen().contains(t2.tx_id()));
}

#[test]
fn test_conflict_reports_spent_input() {
    let (t1, t2) = double_spend();
    let mut node = engine(5);

    node.process_batch(NodeId::new(3), &TransactionBatch::single(t1));
    let events = node.process_batch(NodeId::new(7), &TransactionBatch::single(t2));

    let GossipEvent::Conflict(conflict) = &events[0] else {
        panic!("expected a conflict, got {:?}", events);
    };
    assert_eq!(conflict.kind, ConflictKind::SpentInput(OutputId::new("GEN:0", 0)));
}

#[test]
fn test_conflict_abandons_rest_of_batch() {
    let (t1, t2) = double_spend();
    let ledger = LedgerState::with_genesis(10, 10_000);
    let other = TransactionFactory::new(NodeId::new(1));
    let source = other.find_own_output(&ledger).unwrap().clone();
    let t3 = other.build_transfer(&source, NodeId::new(2));

    let mut node = engine(5);
    node.process_batch(NodeId::new(3), &TransactionBatch::single(t1));
    let events = node.process_batch(NodeId::new(7), &TransactionBatch::new(vec![t2, t3.clone()]));

    let GossipEvent::Conflict(conflict) = &events[0] else {
        panic!("expected a conflict, got {:?}", events);
    };
    assert_eq!(conflict.dropped, 1);
    assert!(!node.seen().contains(t3.tx_id()));
    assert!(node.ledger().contains(&OutputId::new("GEN:1", 0)));
    assert_eq!(node.stats().transactions_dropped, 1);
}

#[test]
fn test_transactions_before_conflict_stay_applied() {
    let (t1, t2) = double_spend();
    let ledger = LedgerState::with_genesis(10, 10_000);
    let other = TransactionFactory::new(NodeId::new(1));
    let source = other.find_own_output(&ledger).unwrap().clone();
    let t3 = other.build_transfer(&source, NodeId::new(2));

    let mut node = engine(5);
    node.process_batch(NodeId::new(3), &TransactionBatch::single(t1));
    let events = node.process_batch(NodeId::new(7), &TransactionBatch::new(vec![t3.clone(), t2]));

    assert_eq!(events[0], GossipEvent::Applied(t3.tx_id().to_string()));
    assert_eq!(conflicts(&events), vec![NodeId::new(7)]);
    assert_eq!(floods(&events), 0);
    assert!(!node.ledger().contains(&OutputId::new("GEN:1", 0)));
}

// ============================================================================
// VALIDATION MODES
// ============================================================================

#[test]
fn test_relaxed_tolerates_missing_inputs() {
    let (t1, _) = double_spend();
    let mut node = GossipEngine::new(NodeId::new(5), LedgerState::new(), GossipConfig::default());

    let events = node.process_batch(NodeId::new(3), &TransactionBatch::single(t1.clone()));

    assert!(conflicts(&events).is_empty());
    assert_eq!(node.ledger().len(), t1.outputs().len());
}

#[test]
fn test_strict_rejects_missing_inputs() {
    let (t1, _) = double_spend();
    let config = GossipConfig::new().with_validation(ValidationMode::Strict);
    let mut node = GossipEngine::new(NodeId::new(5), LedgerState::new(), config);

    let events = node.process_batch(NodeId::new(3), &TransactionBatch::single(t1));

    let GossipEvent::Conflict(conflict) = &events[0] else {
        panic!("expected a conflict, got {:?}", events);
    };
    assert_eq!(conflict.offender, NodeId::new(3));
    assert_eq!(conflict.kind, ConflictKind::MissingInput(OutputId::new("GEN:0", 0)));
    assert!(node.ledger().is_empty());
}

// ============================================================================
// LOCAL APPLICATION
// ============================================================================

#[test]
fn test_apply_local_skips_filter() {
    let (t1, t2) = double_spend();
    let mut node = engine(0);

    node.apply_local(&t1);
    node.apply_local(&t2);

    assert!(node.spent_filter().is_empty());
    assert!(node.seen().contains(t1.tx_id()));
    assert!(node.seen().contains(t2.tx_id()));

    // Both come back as duplicates when flooded in
    let events = node.process_batch(NodeId::new(3), &TransactionBatch::single(t1));
    assert!(matches!(events[0], GossipEvent::Duplicate(_)));
}
