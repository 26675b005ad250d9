// Transport Traits and Core Types
// The capabilities a node needs from whatever carries its messages

use crate::ledger::NodeId;
use crate::sync::Message;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::hash::Hash;
use thiserror::Error;

// ============================================================================
// TRANSPORT ERRORS
// ============================================================================

/// Errors that can occur in the transport layer
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("Unknown peer: node {0}")]
    UnknownPeer(NodeId),

    #[error("Malformed message from node {from}: {reason}")]
    MalformedMessage { from: NodeId, reason: String },

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Transport closed")]
    Closed,
}

impl TransportError {
    /// Check if the error concerns a single inbound message only
    ///
    /// Such errors are dropped by the receiver; the transport stays usable.
    pub fn is_per_message(&self) -> bool {
        matches!(self, Self::MalformedMessage { .. })
    }
}

// ============================================================================
// TRANSPORT STATISTICS
// ============================================================================

/// Statistics for transport operations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportStats {
    /// Total bytes sent
    pub bytes_sent: u64,
    /// Total bytes received
    pub bytes_received: u64,
    /// Total messages sent
    pub messages_sent: u64,
    /// Total messages received
    pub messages_received: u64,
    /// Inbound messages dropped because they failed to decode
    pub malformed_received: u64,
}

// ============================================================================
// TRANSPORT TRAIT
// ============================================================================

/// Abstract transport for one node
///
/// Delivery is reliable and point-to-point; ordering across different senders
/// is not guaranteed. Inbound messages are decoded before they are handed
/// out, so malformed input never reaches protocol state.
#[allow(async_fn_in_trait)]
pub trait Transport {
    /// Handle identifying a peer on this transport
    type Peer: Clone + Eq + Hash + Debug;

    /// Id of the node this transport belongs to
    fn local_node_id(&self) -> NodeId;

    /// Current peers (read-only)
    fn peers(&self) -> Vec<Self::Peer>;

    /// Map a peer handle to its integer node id
    fn node_id_of(&self, peer: &Self::Peer) -> Option<NodeId>;

    /// Map a node id back to a peer handle
    fn peer_for(&self, node_id: NodeId) -> Option<Self::Peer>;

    /// Send a message to one peer; returns the encoded size
    async fn send(&mut self, peer: &Self::Peer, message: &Message) -> Result<usize, TransportError>;

    /// Wait for the next inbound message
    ///
    /// `None` once no sender can reach this node any more.
    async fn recv(&mut self) -> Option<Result<(Self::Peer, Message), TransportError>>;

    /// Get transport statistics
    fn stats(&self) -> TransportStats;
}
