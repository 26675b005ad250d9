// Runner Tests
// Tests for driving a single session over the local transport

use std::time::Duration;
use utxomesh::config::NodeConfig;
use utxomesh::ledger::{LedgerState, NodeId};
use utxomesh::node::{run_node, NodeSession, StopReason};
use utxomesh::sync::{Accusation, Message, TransactionBatch};
use utxomesh::transaction::{Transaction, TransactionFactory};
use utxomesh::transport::{LocalNetwork, Topology, Transport};

fn config() -> NodeConfig {
    NodeConfig::new().with_participants(3).with_max_faulty(1)
}

fn legit_from_starter() -> Transaction {
    let ledger = LedgerState::with_genesis(3, 10_000);
    let factory = TransactionFactory::new(NodeId::new(0));
    let source = factory.find_own_output(&ledger).unwrap().clone();
    factory.build_transfer(&source, NodeId::new(1))
}

#[tokio::test]
async fn test_follower_floods_then_halts_on_quorum() {
    let mut network = LocalNetwork::new(&Topology::fully_connected(3));
    let mut t0 = network.take_transport(NodeId::new(0)).unwrap();
    let mut t2 = network.take_transport(NodeId::new(2)).unwrap();
    let mut t1 = network.take_transport(NodeId::new(1)).unwrap();
    let inject = network.injector(NodeId::new(1)).unwrap();

    let session = NodeSession::new(NodeId::new(1), config()).unwrap();
    let handle = tokio::spawn(async move {
        run_node(session, &mut t1, Some(Duration::from_secs(5))).await
    });

    let tx = legit_from_starter();
    inject
        .send(NodeId::new(0), &TransactionBatch::single(tx.clone()).into())
        .unwrap();

    for peer in [&mut t0, &mut t2] {
        let (_, message) = peer.recv().await.unwrap().unwrap();
        assert_eq!(message, Message::from(TransactionBatch::single(tx.clone())));
    }

    let notice = Message::from(Accusation::new(NodeId::new(2)));
    inject.send(NodeId::new(0), &notice).unwrap();
    inject.send(NodeId::new(0), &notice).unwrap();

    let summary = handle.await.unwrap().unwrap();
    assert_eq!(
        summary.stop_reason,
        Some(StopReason::Quorum {
            accused: NodeId::new(2),
            count: 2
        })
    );
    assert_eq!(summary.number_transaction, 3);
    assert_eq!(summary.applied_transactions, 1);
    assert!(summary.bytes_sent > 0);
}

#[tokio::test]
async fn test_malformed_message_is_skipped() {
    let mut network = LocalNetwork::new(&Topology::fully_connected(3));
    let mut t1 = network.take_transport(NodeId::new(1)).unwrap();
    let inject = network.injector(NodeId::new(1)).unwrap();

    inject.send_raw(NodeId::new(0), vec![0xff; 4]).unwrap();
    let notice = Message::from(Accusation::new(NodeId::new(2)));
    inject.send(NodeId::new(0), &notice).unwrap();
    inject.send(NodeId::new(0), &notice).unwrap();

    let session = NodeSession::new(NodeId::new(1), config()).unwrap();
    let summary = run_node(session, &mut t1, Some(Duration::from_secs(5))).await.unwrap();

    assert!(matches!(summary.stop_reason, Some(StopReason::Quorum { .. })));
    assert_eq!(t1.stats().malformed_received, 1);
}

#[tokio::test]
async fn test_idle_follower_stops() {
    let mut network = LocalNetwork::new(&Topology::fully_connected(3));
    let mut t1 = network.take_transport(NodeId::new(1)).unwrap();

    let session = NodeSession::new(NodeId::new(1), config()).unwrap();
    let summary = run_node(session, &mut t1, Some(Duration::from_millis(50))).await.unwrap();

    assert_eq!(summary.stop_reason, Some(StopReason::Idle));
    assert_eq!(summary.number_transaction, 0);
    assert_eq!(summary.bytes_sent, 0);
}

#[tokio::test]
async fn test_closed_transport_stops_node() {
    let mut network = LocalNetwork::new(&Topology::fully_connected(3));
    let mut t1 = network.take_transport(NodeId::new(1)).unwrap();
    drop(network);

    let session = NodeSession::new(NodeId::new(1), config()).unwrap();
    let summary = run_node(session, &mut t1, None).await.unwrap();

    assert_eq!(summary.stop_reason, Some(StopReason::TransportClosed));
}

#[tokio::test]
async fn test_starter_sends_one_transaction_to_each_peer() {
    let mut network = LocalNetwork::new(&Topology::fully_connected(3));
    let mut t0 = network.take_transport(NodeId::new(0)).unwrap();
    let mut t1 = network.take_transport(NodeId::new(1)).unwrap();
    let mut t2 = network.take_transport(NodeId::new(2)).unwrap();

    let session = NodeSession::new(NodeId::new(0), config()).unwrap();
    let summary = run_node(session, &mut t0, Some(Duration::from_millis(50))).await.unwrap();

    let mut outputs = Vec::new();
    for peer in [&mut t1, &mut t2] {
        let (_, message) = peer.recv().await.unwrap().unwrap();
        let Message::TransactionBatch(batch) = message else {
            panic!("expected a batch");
        };
        assert_eq!(batch.len(), 1);
        outputs.push(batch.transactions()[0].outputs().len());
    }
    outputs.sort();

    // legit transfer has change plus payment, the double spend one output
    assert_eq!(outputs, vec![1, 2]);
    assert_eq!(summary.number_transaction, 2);
    assert_eq!(summary.stop_reason, Some(StopReason::Idle));
}

#[tokio::test]
async fn test_starter_without_enough_peers_fails() {
    let mut network = LocalNetwork::new(&Topology::from_edges(3, &[(0, 1), (1, 2)]).unwrap());
    let mut t0 = network.take_transport(NodeId::new(0)).unwrap();

    let session = NodeSession::new(NodeId::new(0), config()).unwrap();
    let result = run_node(session, &mut t0, Some(Duration::from_millis(50))).await;

    assert!(result.is_err());
}
