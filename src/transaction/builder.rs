use crate::ledger::{LedgerState, NodeId, Output, OutputId, OwnerToken};
use crate::transaction::model::{epoch_seconds, fresh_tx_id, Transaction};
use thiserror::Error;

/// Errors that can occur when building a transaction
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FactoryError {
    #[error("Node {0} owns no spendable output")]
    NoSpendableOutput(NodeId),

    #[error("Missing inputs: a transaction must consume at least one output")]
    MissingInputs,

    #[error("Missing outputs: a transaction must create at least one output")]
    MissingOutputs,
}

/// Builder for arbitrary transactions
#[derive(Debug, Default)]
pub struct TransactionBuilder {
    tx_id: Option<String>,
    inputs: Vec<OutputId>,
    outputs: Vec<(u64, OwnerToken)>,
    ts: Option<f64>,
}

impl TransactionBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the transaction id (optional - generated if not provided)
    pub fn tx_id(mut self, tx_id: impl Into<String>) -> Self {
        self.tx_id = Some(tx_id.into());
        self
    }

    /// Consume an output
    pub fn input(mut self, id: OutputId) -> Self {
        self.inputs.push(id);
        self
    }

    /// Create an output of `amount` for `owner`
    pub fn output(mut self, amount: u64, owner: OwnerToken) -> Self {
        self.outputs.push((amount, owner));
        self
    }

    /// Set the timestamp (optional - now if not provided)
    pub fn ts(mut self, ts: f64) -> Self {
        self.ts = Some(ts);
        self
    }

    /// Build the transaction
    ///
    /// Created outputs are indexed in the order they were added and carry
    /// the transaction's own id.
    pub fn build(self) -> Result<Transaction, FactoryError> {
        if self.inputs.is_empty() {
            return Err(FactoryError::MissingInputs);
        }
        if self.outputs.is_empty() {
            return Err(FactoryError::MissingOutputs);
        }

        let tx_id = self.tx_id.unwrap_or_else(fresh_tx_id);
        let outputs = self
            .outputs
            .into_iter()
            .enumerate()
            .map(|(index, (amount, owner))| Output::new(tx_id.clone(), index as u32, amount, owner))
            .collect();

        Ok(Transaction::new(
            tx_id,
            self.inputs,
            outputs,
            self.ts.unwrap_or_else(epoch_seconds),
        ))
    }
}

/// Builds the starter's demonstration transactions
#[derive(Debug, Clone, Copy)]
pub struct TransactionFactory {
    node_id: NodeId,
}

impl TransactionFactory {
    /// Create a factory acting on behalf of `node_id`
    pub fn new(node_id: NodeId) -> Self {
        Self { node_id }
    }

    /// The node this factory spends for
    pub fn node_id(&self) -> NodeId {
        self.node_id
    }

    /// First output (by id) the node owns in `ledger`
    pub fn find_own_output<'a>(&self, ledger: &'a LedgerState) -> Result<&'a Output, FactoryError> {
        ledger
            .owned_by(self.node_id)
            .into_iter()
            .next()
            .ok_or(FactoryError::NoSpendableOutput(self.node_id))
    }

    /// Split `source` in two: floor(amount/2) back to self, the rest to `to`
    ///
    /// Each created output gets its own fresh creating-id at index 0.
    pub fn build_transfer(&self, source: &Output, to: NodeId) -> Transaction {
        let keep = source.amount() / 2;
        let send = source.amount() - keep;

        let change = Output::new(fresh_tx_id(), 0, keep, OwnerToken::for_node(self.node_id));
        let payment = Output::new(fresh_tx_id(), 0, send, OwnerToken::for_node(to));

        Transaction::new(
            fresh_tx_id(),
            vec![source.id()],
            vec![change, payment],
            epoch_seconds(),
        )
    }

    /// A second, independent transaction spending `input` again, all to `to`
    pub fn build_conflicting(
        &self,
        input: &OutputId,
        amount: u64,
        to: NodeId,
    ) -> Result<Transaction, FactoryError> {
        TransactionBuilder::new()
            .input(input.clone())
            .output(amount, OwnerToken::for_node(to))
            .build()
    }
}
