use crate::ledger::{Output, OutputId};
use rand::RngCore;
use serde::{Deserialize, Serialize};

/// Generate a fresh random transaction id (128 bits, hex encoded)
pub fn fresh_tx_id() -> String {
    let mut bytes = [0u8; 16];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Current wall-clock time as floating-point epoch seconds
pub fn epoch_seconds() -> f64 {
    chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

/// A transfer of value: consumes outputs, creates new ones
///
/// Inputs name outputs, not transactions. Output ids are fresh and never
/// reused across transactions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    tx_id: String,
    inputs: Vec<OutputId>,
    outputs: Vec<Output>,
    ts: f64,
}

impl Transaction {
    /// Create a transaction from parts
    pub fn new(
        tx_id: impl Into<String>,
        inputs: Vec<OutputId>,
        outputs: Vec<Output>,
        ts: f64,
    ) -> Self {
        Self {
            tx_id: tx_id.into(),
            inputs,
            outputs,
            ts,
        }
    }

    /// Get the transaction id
    pub fn tx_id(&self) -> &str {
        &self.tx_id
    }

    /// Consumed output ids, in order
    pub fn inputs(&self) -> &[OutputId] {
        &self.inputs
    }

    /// Created outputs, in order
    pub fn outputs(&self) -> &[Output] {
        &self.outputs
    }

    /// Creation time (epoch seconds)
    pub fn ts(&self) -> f64 {
        self.ts
    }

    /// Total value of the created outputs, saturating at `u64::MAX`
    pub fn output_value(&self) -> u64 {
        self.outputs
            .iter()
            .fold(0u64, |acc, o| acc.saturating_add(o.amount()))
    }

    /// Check whether this transaction consumes any input `other` consumes
    pub fn conflicts_with(&self, other: &Transaction) -> bool {
        self.inputs.iter().any(|i| other.inputs.contains(i))
    }

    /// Short id prefix for log lines
    pub fn short_id(&self) -> &str {
        let end = self.tx_id.char_indices().nth(8).map(|(i, _)| i).unwrap_or(self.tx_id.len());
        &self.tx_id[..end]
    }
}
