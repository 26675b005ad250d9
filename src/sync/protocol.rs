// Protocol - Message types exchanged between nodes
//
// Two message kinds travel over the transport:
// - TransactionBatch: an ordered run of transactions to validate and apply
// - Accusation: notice that a node was caught double-spending
//
// Inbound messages form a closed enum; handlers dispatch with `match`.

use crate::ledger::NodeId;
use crate::transaction::Transaction;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest encoded message accepted from the wire
pub const MAX_MESSAGE_BYTES: usize = 16 * 1024 * 1024;

/// Types of messages in the protocol
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageType {
    TransactionBatch,
    Accusation,
}

/// Protocol errors
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Serialization failed: {0}")]
    SerializationFailed(String),

    #[error("Deserialization failed: {0}")]
    DeserializationFailed(String),

    #[error("Message too large: {0} bytes")]
    MessageTooLarge(usize),
}

/// Wrapper for all message types
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Message {
    TransactionBatch(TransactionBatch),
    Accusation(Accusation),
}

impl Message {
    /// Get the message type
    pub fn message_type(&self) -> MessageType {
        match self {
            Message::TransactionBatch(_) => MessageType::TransactionBatch,
            Message::Accusation(_) => MessageType::Accusation,
        }
    }

    /// Serialize to bytes
    pub fn to_bytes(&self) -> Result<Vec<u8>, ProtocolError> {
        let bytes = postcard::to_allocvec(self)
            .map_err(|e| ProtocolError::SerializationFailed(e.to_string()))?;
        if bytes.len() > MAX_MESSAGE_BYTES {
            return Err(ProtocolError::MessageTooLarge(bytes.len()));
        }
        Ok(bytes)
    }

    /// Deserialize from bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ProtocolError> {
        if bytes.len() > MAX_MESSAGE_BYTES {
            return Err(ProtocolError::MessageTooLarge(bytes.len()));
        }
        postcard::from_bytes(bytes).map_err(|e| ProtocolError::DeserializationFailed(e.to_string()))
    }

    /// Serialize to a JSON string
    pub fn to_json(&self) -> Result<String, ProtocolError> {
        serde_json::to_string(self).map_err(|e| ProtocolError::SerializationFailed(e.to_string()))
    }

    /// Deserialize from a JSON string
    pub fn from_json(json: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(json).map_err(|e| ProtocolError::DeserializationFailed(e.to_string()))
    }
}

impl From<TransactionBatch> for Message {
    fn from(batch: TransactionBatch) -> Self {
        Message::TransactionBatch(batch)
    }
}

impl From<Accusation> for Message {
    fn from(accusation: Accusation) -> Self {
        Message::Accusation(accusation)
    }
}

// ============================================================================
// TRANSACTION BATCH
// ============================================================================

/// An ordered sequence of transactions delivered as one unit
///
/// Forwarded unmodified when flooded; receivers deduplicate per transaction.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionBatch {
    transactions: Vec<Transaction>,
}

impl TransactionBatch {
    /// Create a batch
    pub fn new(transactions: Vec<Transaction>) -> Self {
        Self { transactions }
    }

    /// A batch holding a single transaction
    pub fn single(tx: Transaction) -> Self {
        Self {
            transactions: vec![tx],
        }
    }

    /// Transactions in arrival order
    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// Number of transactions
    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    /// Check if the batch is empty
    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Iterate over the transactions
    pub fn iter(&self) -> impl Iterator<Item = &Transaction> {
        self.transactions.iter()
    }
}

// ============================================================================
// ACCUSATION
// ============================================================================

/// Notice that `accused_node_id` sent a conflicting spend
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Accusation {
    accused_node_id: NodeId,
}

impl Accusation {
    /// Create an accusation against a node
    pub fn new(accused_node_id: NodeId) -> Self {
        Self { accused_node_id }
    }

    /// The accused node
    pub fn accused_node_id(&self) -> NodeId {
        self.accused_node_id
    }
}
