// Node Session - all protocol state of one node, owned by its handler loop
//
// The session is transport-agnostic: it consumes decoded inbound messages
// and returns the messages to send. Nothing here is shared between nodes.

use crate::config::{ConfigError, NodeConfig};
use crate::ledger::{LedgerState, NodeId};
use crate::node::summary::{RunSummary, StopReason};
use crate::sync::{
    Accusation, AccusationLedger, AccusationOutcome, GossipEngine, GossipEvent, Message,
    ProtocolError, TransactionBatch,
};
use crate::transaction::{FactoryError, Transaction, TransactionFactory};
use crate::transport::TransportError;
use chrono::{DateTime, Utc};
use rand::seq::SliceRandom;
use rand::Rng;
use thiserror::Error;

/// Node-level errors
#[derive(Error, Debug)]
pub enum NodeError {
    #[error("Starter needs at least two peers, found {0}")]
    NotEnoughPeers(usize),

    #[error("Starter peers must be distinct, got node {0} twice")]
    DuplicatePeer(NodeId),

    #[error("Node {0} was already started")]
    AlreadyStarted(NodeId),

    #[error("Topology has {found} nodes, expected {expected}")]
    TopologyMismatch { expected: u32, found: usize },

    #[error("Node task failed: {0}")]
    TaskFailed(String),

    #[error(transparent)]
    Factory(#[from] FactoryError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Role of a node in a run
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    /// Issues the legitimate and the conflicting transaction
    Starter,
    /// Only gossips
    Follower,
}

/// Lifecycle state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Created,
    Running,
    Stopped(StopReason),
}

/// A message addressed to one peer
#[derive(Clone, Debug, PartialEq)]
pub struct Outgoing {
    pub to: NodeId,
    pub message: Message,
}

impl Outgoing {
    fn new(to: NodeId, message: impl Into<Message>) -> Self {
        Self {
            to,
            message: message.into(),
        }
    }
}

/// The demonstration transactions issued by the starter
#[derive(Clone, Debug, PartialEq)]
pub struct StarterIssue {
    pub legit: Transaction,
    pub legit_to: NodeId,
    pub double: Transaction,
    pub double_to: NodeId,
}

/// Explicit per-node protocol state
#[derive(Debug)]
pub struct NodeSession {
    node_id: NodeId,
    config: NodeConfig,
    engine: GossipEngine,
    accusations: AccusationLedger,
    state: SessionState,
    transaction_counter: u64,
    started_at: DateTime<Utc>,
    stopped_at: Option<DateTime<Utc>>,
    issued: Option<StarterIssue>,
}

impl NodeSession {
    /// Create a session with genesis already applied
    pub fn new(node_id: NodeId, config: NodeConfig) -> Result<Self, NodeError> {
        config.validate()?;
        let ledger = LedgerState::with_genesis(config.participants, config.genesis_amount);
        let engine = GossipEngine::new(node_id, ledger, config.gossip.clone());
        let accusations = AccusationLedger::new(config.max_faulty);

        Ok(Self {
            node_id,
            config,
            engine,
            accusations,
            state: SessionState::Created,
            transaction_counter: 0,
            started_at: Utc::now(),
            stopped_at: None,
            issued: None,
        })
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn node_id(&self) -> NodeId {
        self.node_id
    }

    pub fn role(&self) -> Role {
        if self.node_id == self.config.starter {
            Role::Starter
        } else {
            Role::Follower
        }
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn engine(&self) -> &GossipEngine {
        &self.engine
    }

    pub fn ledger(&self) -> &LedgerState {
        self.engine.ledger()
    }

    pub fn accusations(&self) -> &AccusationLedger {
        &self.accusations
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_stopped(&self) -> bool {
        matches!(self.state, SessionState::Stopped(_))
    }

    pub fn transaction_counter(&self) -> u64 {
        self.transaction_counter
    }

    /// What the starter issued, if this node is the starter and has started
    pub fn issued(&self) -> Option<&StarterIssue> {
        self.issued.as_ref()
    }

    // ========================================================================
    // LIFECYCLE
    // ========================================================================

    /// Start the node
    ///
    /// Records the start time. The starter additionally picks two distinct
    /// random peers and issues the double spend to them.
    pub fn start<R: Rng + ?Sized>(
        &mut self,
        peers: &[NodeId],
        rng: &mut R,
    ) -> Result<Vec<Outgoing>, NodeError> {
        if self.state != SessionState::Created {
            return Err(NodeError::AlreadyStarted(self.node_id));
        }
        self.started_at = Utc::now();

        match self.role() {
            Role::Follower => {
                self.state = SessionState::Running;
                tracing::debug!(node = %self.node_id, "follower started");
                Ok(Vec::new())
            }
            Role::Starter => {
                let chosen: Vec<NodeId> = peers.choose_multiple(rng, 2).copied().collect();
                if chosen.len() < 2 {
                    return Err(NodeError::NotEnoughPeers(chosen.len()));
                }
                self.issue_double_spend(chosen[0], chosen[1])
            }
        }
    }

    /// Starter role with fixed peers: legit transfer to `a`, conflicting
    /// spend of the same input to `b`
    ///
    /// Both transactions are applied locally before anything is sent.
    pub fn issue_double_spend(&mut self, a: NodeId, b: NodeId) -> Result<Vec<Outgoing>, NodeError> {
        if self.state != SessionState::Created {
            return Err(NodeError::AlreadyStarted(self.node_id));
        }
        if a == b {
            return Err(NodeError::DuplicatePeer(a));
        }
        self.accusations.ignore(self.node_id);

        let factory = TransactionFactory::new(self.node_id);
        let source = factory.find_own_output(self.engine.ledger())?.clone();

        let legit = factory.build_transfer(&source, a);
        let double = factory.build_conflicting(&source.id(), source.amount(), b)?;

        self.engine.apply_local(&legit);
        self.engine.apply_local(&double);

        tracing::info!(
            node = %self.node_id,
            tx = legit.short_id(),
            to = %a,
            "sent legit transaction"
        );
        tracing::info!(
            node = %self.node_id,
            tx = double.short_id(),
            to = %b,
            "sent double-spend transaction"
        );

        let outgoing = vec![
            Outgoing::new(a, TransactionBatch::single(legit.clone())),
            Outgoing::new(b, TransactionBatch::single(double.clone())),
        ];
        self.transaction_counter += 2;
        self.issued = Some(StarterIssue {
            legit,
            legit_to: a,
            double,
            double_to: b,
        });
        self.state = SessionState::Running;
        Ok(outgoing)
    }

    /// Stop the node: record the end time; further messages are ignored
    ///
    /// Stopping is terminal. A second call keeps the first reason.
    pub fn stop(&mut self, reason: StopReason) -> RunSummary {
        if !self.is_stopped() {
            self.stopped_at = Some(Utc::now());
            self.state = SessionState::Stopped(reason);
            tracing::info!(node = %self.node_id, %reason, "node stopped");
        }
        self.summary()
    }

    /// Summary of the run so far (latency up to now if still running)
    pub fn summary(&self) -> RunSummary {
        let end = self.stopped_at.unwrap_or_else(Utc::now);
        let latency = (end - self.started_at)
            .num_microseconds()
            .map(|us| us as f64 / 1_000_000.0)
            .unwrap_or(0.0);
        let stats = self.engine.stats();

        RunSummary {
            node_id: self.node_id,
            number_transaction: self.transaction_counter,
            latency,
            bytes_sent: 0,
            stop_reason: match self.state {
                SessionState::Stopped(reason) => Some(reason),
                _ => None,
            },
            applied_transactions: stats.transactions_applied,
            conflicts_detected: stats.conflicts_detected,
            duplicates_skipped: stats.duplicates_skipped,
            ledger_outputs: self.engine.ledger().len(),
            ledger_value: self.engine.ledger().total_value(),
        }
    }

    // ========================================================================
    // MESSAGE HANDLING
    // ========================================================================

    /// Handle one decoded message from peer `from`
    ///
    /// `peers` is the current peer list, used for flooding and accusation
    /// broadcast. Returns the messages to send. Once stopped, every message
    /// is ignored.
    pub fn handle(&mut self, from: NodeId, message: Message, peers: &[NodeId]) -> Vec<Outgoing> {
        if self.is_stopped() {
            return Vec::new();
        }
        if self.state == SessionState::Created {
            self.state = SessionState::Running;
        }

        match message {
            Message::TransactionBatch(batch) => self.on_batch(from, batch, peers),
            Message::Accusation(accusation) => {
                self.on_accusation(from, accusation);
                Vec::new()
            }
        }
    }

    fn on_batch(&mut self, from: NodeId, batch: TransactionBatch, peers: &[NodeId]) -> Vec<Outgoing> {
        self.transaction_counter += 1;
        tracing::debug!(node = %self.node_id, from = %from, txs = batch.len(), "received batch");

        let mut outgoing = Vec::new();
        for event in self.engine.process_batch(from, &batch) {
            match event {
                GossipEvent::Applied(_) | GossipEvent::Duplicate(_) => {}
                GossipEvent::Conflict(conflict) => {
                    outgoing.extend(self.flag_byzantine(conflict.offender, peers));
                }
                GossipEvent::Flood(batch) => {
                    for peer in peers {
                        outgoing.push(Outgoing::new(*peer, batch.clone()));
                        self.transaction_counter += 1;
                    }
                }
            }
        }
        outgoing
    }

    /// Raise a local accusation against `node_id`
    ///
    /// Returns the accusation broadcast (empty if the node was already
    /// accused). Halts this node if the count now exceeds the threshold; the
    /// broadcast is still returned in that case.
    pub fn flag_byzantine(&mut self, node_id: NodeId, peers: &[NodeId]) -> Vec<Outgoing> {
        if self.is_stopped() {
            return Vec::new();
        }
        let outcome = self.accusations.flag_byzantine(node_id);
        let Some(notice) = outcome.broadcast() else {
            return Vec::new();
        };

        tracing::warn!(node = %self.node_id, accused = %node_id, "accusation raised");
        let outgoing = peers.iter().map(|p| Outgoing::new(*p, notice)).collect();
        self.check_quorum(node_id, outcome);
        outgoing
    }

    fn on_accusation(&mut self, from: NodeId, accusation: Accusation) {
        let accused = accusation.accused_node_id();
        let outcome = self.accusations.receive(&accusation);
        tracing::info!(
            node = %self.node_id,
            from = %from,
            accused = %accused,
            count = self.accusations.count(accused),
            "accusation received"
        );
        self.check_quorum(accused, outcome);
    }

    fn check_quorum(&mut self, accused: NodeId, outcome: AccusationOutcome) {
        if let AccusationOutcome::Counted {
            count, halt: true, ..
        } = outcome
        {
            self.stop(StopReason::Quorum { accused, count });
        }
    }
}
