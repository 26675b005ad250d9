// Gossip Engine - The heart of transaction dissemination
//
// Validates incoming transaction batches against the spent-output filter,
// applies accepted transactions to the ledger, and decides whether the batch
// is flooded onward. A batch is always processed to completion before the
// next one starts.

use crate::ledger::{
    LedgerState, NodeId, OutputId, SeenTransactions, SpentFilter, DEFAULT_FILTER_CAPACITY,
    DEFAULT_FILTER_ERROR_RATE,
};
use crate::sync::protocol::TransactionBatch;
use crate::transaction::Transaction;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How strictly incoming transactions are checked against the ledger
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValidationMode {
    /// Only the spent-output filter is consulted; missing inputs are tolerated
    #[default]
    Relaxed,
    /// Inputs must also be unspent in the local ledger
    Strict,
}

impl fmt::Display for ValidationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationMode::Relaxed => write!(f, "relaxed"),
            ValidationMode::Strict => write!(f, "strict"),
        }
    }
}

impl FromStr for ValidationMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "relaxed" => Ok(ValidationMode::Relaxed),
            "strict" => Ok(ValidationMode::Strict),
            other => Err(format!("unknown validation mode: {other}")),
        }
    }
}

/// Configuration for the gossip engine
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GossipConfig {
    /// Ledger containment check policy
    pub validation: ValidationMode,
    /// Number of spent ids the filter is sized for
    pub filter_capacity: usize,
    /// Target false-positive rate of the filter
    pub filter_error_rate: f64,
}

impl Default for GossipConfig {
    fn default() -> Self {
        Self {
            validation: ValidationMode::Relaxed,
            filter_capacity: DEFAULT_FILTER_CAPACITY,
            filter_error_rate: DEFAULT_FILTER_ERROR_RATE,
        }
    }
}

impl GossipConfig {
    /// Create a new config builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the validation mode
    pub fn with_validation(mut self, validation: ValidationMode) -> Self {
        self.validation = validation;
        self
    }

    /// Set the filter capacity
    pub fn with_filter_capacity(mut self, capacity: usize) -> Self {
        self.filter_capacity = capacity;
        self
    }

    /// Set the filter error rate
    pub fn with_filter_error_rate(mut self, rate: f64) -> Self {
        self.filter_error_rate = rate;
        self
    }
}

/// Why a transaction was rejected as conflicting
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ConflictKind {
    /// The input was already consumed by an earlier transaction
    SpentInput(OutputId),
    /// Strict mode only: the input is not unspent in the local ledger
    MissingInput(OutputId),
}

/// A conflicting transaction and the peer that delivered it
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Conflict {
    /// Peer that sent the batch
    pub offender: NodeId,
    /// Offending transaction
    pub tx_id: String,
    /// What was wrong with it
    pub kind: ConflictKind,
    /// Transactions in the batch after the offending one, dropped unprocessed
    pub dropped: usize,
}

/// Events produced by the gossip engine
#[derive(Clone, Debug, PartialEq)]
pub enum GossipEvent {
    /// A transaction was applied to the ledger
    Applied(String),
    /// A transaction was already seen and skipped
    Duplicate(String),
    /// A conflicting spend was detected; the sender must be accused
    Conflict(Conflict),
    /// Forward the batch, unmodified, to every peer
    Flood(TransactionBatch),
}

/// Statistics about the gossip engine
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GossipStats {
    pub batches_processed: u64,
    pub transactions_applied: u64,
    pub duplicates_skipped: u64,
    pub conflicts_detected: u64,
    pub transactions_dropped: u64,
    pub floods_issued: u64,
}

/// The gossip engine - owns the node's ledger, filter and seen set
#[derive(Clone, Debug)]
pub struct GossipEngine {
    /// Our node ID
    node_id: NodeId,
    /// Unspent outputs
    ledger: LedgerState,
    /// Consumed output ids
    spent: SpentFilter,
    /// Transactions already handled
    seen: SeenTransactions,
    /// Configuration
    config: GossipConfig,
    /// Statistics
    stats: GossipStats,
}

impl GossipEngine {
    /// Create a new gossip engine over an existing ledger
    pub fn new(node_id: NodeId, ledger: LedgerState, config: GossipConfig) -> Self {
        let spent = SpentFilter::new(config.filter_capacity, config.filter_error_rate);
        Self {
            node_id,
            ledger,
            spent,
            seen: SeenTransactions::new(),
            config,
            stats: GossipStats::default(),
        }
    }

    /// Our node id
    pub fn node_id(&self) -> NodeId {
        self.node_id
    }

    /// Get the ledger
    pub fn ledger(&self) -> &LedgerState {
        &self.ledger
    }

    /// Get the spent-output filter
    pub fn spent_filter(&self) -> &SpentFilter {
        &self.spent
    }

    /// Get the seen-transaction set
    pub fn seen(&self) -> &SeenTransactions {
        &self.seen
    }

    /// Get the configuration
    pub fn config(&self) -> &GossipConfig {
        &self.config
    }

    /// Get statistics
    pub fn stats(&self) -> &GossipStats {
        &self.stats
    }

    // ========================================================================
    // LOCAL APPLICATION
    // ========================================================================

    /// Apply a locally issued transaction without gossip checks
    ///
    /// Marks it seen and applies it to the ledger. The spent filter is left
    /// untouched, so the issuer itself never flags its own transactions.
    pub fn apply_local(&mut self, tx: &Transaction) {
        self.seen.mark(tx.tx_id());
        self.ledger.apply(tx);
    }

    // ========================================================================
    // BATCH PROCESSING
    // ========================================================================

    /// Process a batch delivered by `sender`
    ///
    /// Per transaction, in order: skip if seen; mark seen; reject the rest of
    /// the batch on a conflicting input; otherwise record the inputs as spent
    /// and apply. The batch is flooded only if something was applied and no
    /// conflict cut it short.
    pub fn process_batch(&mut self, sender: NodeId, batch: &TransactionBatch) -> Vec<GossipEvent> {
        self.stats.batches_processed += 1;

        let mut events = Vec::new();
        let mut applied = 0usize;

        for (position, tx) in batch.iter().enumerate() {
            if !self.seen.mark(tx.tx_id()) {
                self.stats.duplicates_skipped += 1;
                events.push(GossipEvent::Duplicate(tx.tx_id().to_string()));
                continue;
            }

            if let Some(kind) = self.find_conflict(tx) {
                let dropped = batch.len() - position - 1;
                self.stats.conflicts_detected += 1;
                self.stats.transactions_dropped += dropped as u64;

                tracing::warn!(
                    node = %self.node_id,
                    sender = %sender,
                    tx = tx.short_id(),
                    ?kind,
                    dropped,
                    "double spend detected"
                );

                events.push(GossipEvent::Conflict(Conflict {
                    offender: sender,
                    tx_id: tx.tx_id().to_string(),
                    kind,
                    dropped,
                }));
                return events;
            }

            for input in tx.inputs() {
                self.spent.insert(input);
            }
            let outcome = self.ledger.apply(tx);

            tracing::debug!(
                node = %self.node_id,
                sender = %sender,
                tx = tx.short_id(),
                removed = outcome.inputs_removed,
                missing = outcome.inputs_missing,
                inserted = outcome.outputs_inserted,
                "transaction applied"
            );

            applied += 1;
            self.stats.transactions_applied += 1;
            events.push(GossipEvent::Applied(tx.tx_id().to_string()));
        }

        if applied > 0 {
            self.stats.floods_issued += 1;
            events.push(GossipEvent::Flood(batch.clone()));
        }

        events
    }

    fn find_conflict(&self, tx: &Transaction) -> Option<ConflictKind> {
        if let Some(input) = tx.inputs().iter().find(|i| self.spent.contains(i)) {
            return Some(ConflictKind::SpentInput(input.clone()));
        }

        match self.config.validation {
            ValidationMode::Relaxed => None,
            ValidationMode::Strict => self
                .ledger
                .missing_inputs(tx)
                .first()
                .map(|id| ConflictKind::MissingInput((*id).clone())),
        }
    }
}
