// Transaction Model Tests

use utxomesh::ledger::{NodeId, Output, OutputId, OwnerToken};
use utxomesh::transaction::{fresh_tx_id, Transaction};

fn spend(tx_id: &str, input: &str) -> Transaction {
    Transaction::new(
        tx_id,
        vec![input.parse().unwrap()],
        vec![Output::new(tx_id, 0, 1, OwnerToken::for_node(NodeId::new(0)))],
        0.0,
    )
}

#[test]
fn test_fresh_ids_are_unique_hex() {
    let a = fresh_tx_id();
    let b = fresh_tx_id();

    assert_ne!(a, b);
    assert_eq!(a.len(), 32);
    assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn test_conflicts_with_shared_input() {
    let t1 = spend("t1", "GEN:0:0");
    let t2 = spend("t2", "GEN:0:0");
    let t3 = spend("t3", "GEN:1:0");

    assert!(t1.conflicts_with(&t2));
    assert!(!t1.conflicts_with(&t3));
}

#[test]
fn test_output_value_sums_outputs() {
    let tx = Transaction::new(
        "t",
        vec![OutputId::new("GEN:0", 0)],
        vec![
            Output::new("t", 0, 30, OwnerToken::for_node(NodeId::new(0))),
            Output::new("t", 1, 12, OwnerToken::for_node(NodeId::new(1))),
        ],
        0.0,
    );
    assert_eq!(tx.output_value(), 42);
}

#[test]
fn test_output_value_saturates() {
    let tx = Transaction::new(
        "t",
        vec![OutputId::new("GEN:0", 0)],
        vec![
            Output::new("t", 0, u64::MAX, OwnerToken::for_node(NodeId::new(0))),
            Output::new("t", 1, 5, OwnerToken::for_node(NodeId::new(1))),
        ],
        0.0,
    );
    assert_eq!(tx.output_value(), u64::MAX);
}

#[test]
fn test_short_id_truncates() {
    let tx = spend("0123456789abcdef", "GEN:0:0");
    assert_eq!(tx.short_id(), "01234567");

    let tx = spend("abc", "GEN:0:0");
    assert_eq!(tx.short_id(), "abc");
}
