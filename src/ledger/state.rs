// Ledger State - the node's local view of spendable value

use crate::ledger::utxo::{Output, OutputId, OwnerToken};
use crate::transaction::Transaction;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Integer identifier of a node in the mesh
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(u32);

impl NodeId {
    /// Create a node id
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw integer
    pub fn as_u32(&self) -> u32 {
        self.0
    }
}

impl From<u32> for NodeId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Prefix of the creating-transaction id used for genesis outputs
pub const GENESIS_PREFIX: &str = "GEN";

/// What happened when a transaction was applied
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ApplyOutcome {
    /// Inputs that were present and removed
    pub inputs_removed: usize,
    /// Inputs that were not present (tolerated)
    pub inputs_missing: usize,
    /// Outputs inserted
    pub outputs_inserted: usize,
}

/// Mapping of unspent output id to output
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerState {
    utxos: HashMap<OutputId, Output>,
}

impl LedgerState {
    /// Create an empty ledger
    pub fn new() -> Self {
        Self {
            utxos: HashMap::new(),
        }
    }

    /// Create a ledger holding one genesis output per participant
    pub fn with_genesis(participants: u32, amount: u64) -> Self {
        let mut ledger = Self::new();
        ledger.init_genesis(participants, amount);
        ledger
    }

    /// Insert one output of `amount` for each of `participants` nodes
    ///
    /// Output `n` is `GEN:<n>:0`, owned by node `n`.
    pub fn init_genesis(&mut self, participants: u32, amount: u64) {
        for nid in 0..participants {
            let owner = OwnerToken::for_node(NodeId::new(nid));
            let output = Output::new(format!("{}:{}", GENESIS_PREFIX, nid), 0, amount, owner);
            self.utxos.insert(output.id(), output);
        }
    }

    /// Apply a transaction: remove all inputs, then insert all outputs
    ///
    /// Missing inputs are skipped. There is no failure path.
    pub fn apply(&mut self, tx: &Transaction) -> ApplyOutcome {
        let mut outcome = ApplyOutcome::default();

        for input in tx.inputs() {
            if self.utxos.remove(input).is_some() {
                outcome.inputs_removed += 1;
            } else {
                outcome.inputs_missing += 1;
            }
        }

        for output in tx.outputs() {
            self.utxos.insert(output.id(), output.clone());
            outcome.outputs_inserted += 1;
        }

        outcome
    }

    /// Inputs of `tx` that are not currently unspent here
    pub fn missing_inputs<'a>(&self, tx: &'a Transaction) -> Vec<&'a OutputId> {
        tx.inputs()
            .iter()
            .filter(|id| !self.utxos.contains_key(*id))
            .collect()
    }

    /// Get an output by id
    pub fn get(&self, id: &OutputId) -> Option<&Output> {
        self.utxos.get(id)
    }

    /// Check whether an output is unspent
    pub fn contains(&self, id: &OutputId) -> bool {
        self.utxos.contains_key(id)
    }

    /// Number of unspent outputs
    pub fn len(&self) -> usize {
        self.utxos.len()
    }

    /// Check if the ledger is empty
    pub fn is_empty(&self) -> bool {
        self.utxos.is_empty()
    }

    /// Sum of all unspent amounts, saturating at `u64::MAX`
    ///
    /// Amounts arrive unchecked from peers, so the sum may not fit.
    pub fn total_value(&self) -> u64 {
        self.utxos
            .values()
            .fold(0u64, |acc, o| acc.saturating_add(o.amount()))
    }

    /// Outputs owned by a node, ordered by id
    pub fn owned_by(&self, node_id: NodeId) -> Vec<&Output> {
        let mut owned: Vec<&Output> = self
            .utxos
            .values()
            .filter(|o| o.is_owned_by(node_id))
            .collect();
        owned.sort_by_key(|o| o.id());
        owned
    }

    /// Iterate over all unspent outputs
    pub fn iter(&self) -> impl Iterator<Item = &Output> {
        self.utxos.values()
    }
}
