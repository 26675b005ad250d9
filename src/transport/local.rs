// Local Transport - in-process channels standing in for the network
//
// Every node gets an unbounded inbox; a node's transport holds senders to
// the inboxes of its topology peers only. Messages cross the channel as
// encoded bytes, so decoding happens at the same boundary as on a real wire.

use crate::ledger::NodeId;
use crate::sync::Message;
use crate::transport::topology::Topology;
use crate::transport::traits::{Transport, TransportError, TransportStats};
use std::collections::HashMap;
use tokio::sync::mpsc;

/// Bytes in flight from one node to another
#[derive(Debug, Clone)]
pub struct Envelope {
    from: NodeId,
    bytes: Vec<u8>,
}

impl Envelope {
    /// Sender node id
    pub fn from(&self) -> NodeId {
        self.from
    }

    /// Encoded message
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Peer handle on the local transport
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LocalPeer {
    node_id: NodeId,
}

/// A node's endpoint on the local network
pub struct ChannelTransport {
    node_id: NodeId,
    peers: HashMap<NodeId, mpsc::UnboundedSender<Envelope>>,
    inbox: mpsc::UnboundedReceiver<Envelope>,
    stats: TransportStats,
}

impl ChannelTransport {
    /// Peer node ids, ascending
    pub fn peer_ids(&self) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self.peers.keys().copied().collect();
        ids.sort();
        ids
    }
}

impl Transport for ChannelTransport {
    type Peer = LocalPeer;

    fn local_node_id(&self) -> NodeId {
        self.node_id
    }

    fn peers(&self) -> Vec<LocalPeer> {
        self.peer_ids()
            .into_iter()
            .map(|node_id| LocalPeer { node_id })
            .collect()
    }

    fn node_id_of(&self, peer: &LocalPeer) -> Option<NodeId> {
        Some(peer.node_id)
    }

    fn peer_for(&self, node_id: NodeId) -> Option<LocalPeer> {
        self.peers
            .contains_key(&node_id)
            .then_some(LocalPeer { node_id })
    }

    async fn send(&mut self, peer: &LocalPeer, message: &Message) -> Result<usize, TransportError> {
        let sender = self
            .peers
            .get(&peer.node_id)
            .ok_or(TransportError::UnknownPeer(peer.node_id))?;

        let bytes = message
            .to_bytes()
            .map_err(|e| TransportError::SerializationError(e.to_string()))?;
        let len = bytes.len();

        // A peer that already stopped has dropped its inbox; the message is
        // simply lost, as with a remote process that exited.
        if sender
            .send(Envelope {
                from: self.node_id,
                bytes,
            })
            .is_err()
        {
            tracing::trace!(node = %self.node_id, peer = %peer.node_id, "peer inbox closed");
        }

        self.stats.messages_sent += 1;
        self.stats.bytes_sent += len as u64;
        Ok(len)
    }

    async fn recv(&mut self) -> Option<Result<(LocalPeer, Message), TransportError>> {
        let envelope = self.inbox.recv().await?;
        self.stats.messages_received += 1;
        self.stats.bytes_received += envelope.bytes.len() as u64;

        match Message::from_bytes(&envelope.bytes) {
            Ok(message) => Some(Ok((LocalPeer { node_id: envelope.from }, message))),
            Err(e) => {
                self.stats.malformed_received += 1;
                Some(Err(TransportError::MalformedMessage {
                    from: envelope.from,
                    reason: e.to_string(),
                }))
            }
        }
    }

    fn stats(&self) -> TransportStats {
        self.stats.clone()
    }
}

/// Handle for pushing raw bytes into a node's inbox from outside the mesh
#[derive(Clone)]
pub struct Injector {
    target: NodeId,
    sender: mpsc::UnboundedSender<Envelope>,
}

impl Injector {
    /// Node whose inbox this injector feeds
    pub fn target(&self) -> NodeId {
        self.target
    }

    /// Deliver raw bytes as if sent by `from`
    pub fn send_raw(&self, from: NodeId, bytes: Vec<u8>) -> Result<(), TransportError> {
        self.sender
            .send(Envelope { from, bytes })
            .map_err(|_| TransportError::Closed)
    }

    /// Deliver an encoded message as if sent by `from`
    pub fn send(&self, from: NodeId, message: &Message) -> Result<(), TransportError> {
        let bytes = message
            .to_bytes()
            .map_err(|e| TransportError::SerializationError(e.to_string()))?;
        self.send_raw(from, bytes)
    }
}

/// In-process network wiring one `ChannelTransport` per topology node
pub struct LocalNetwork {
    transports: HashMap<NodeId, ChannelTransport>,
    injectors: HashMap<NodeId, Injector>,
}

impl LocalNetwork {
    /// Wire up every node of `topology`
    pub fn new(topology: &Topology) -> Self {
        let mut senders = HashMap::new();
        let mut inboxes = HashMap::new();
        for node in topology.nodes() {
            let (tx, rx) = mpsc::unbounded_channel();
            senders.insert(node, tx);
            inboxes.insert(node, rx);
        }

        let mut transports = HashMap::new();
        for (node, inbox) in inboxes {
            let peers = topology
                .peers(node)
                .into_iter()
                .filter_map(|p| senders.get(&p).map(|s| (p, s.clone())))
                .collect();
            transports.insert(
                node,
                ChannelTransport {
                    node_id: node,
                    peers,
                    inbox,
                    stats: TransportStats::default(),
                },
            );
        }

        let injectors = senders
            .into_iter()
            .map(|(target, sender)| (target, Injector { target, sender }))
            .collect();

        Self {
            transports,
            injectors,
        }
    }

    /// Take ownership of a node's transport
    pub fn take_transport(&mut self, node_id: NodeId) -> Option<ChannelTransport> {
        self.transports.remove(&node_id)
    }

    /// Take every remaining transport, ordered by node id
    pub fn take_all(&mut self) -> Vec<ChannelTransport> {
        let mut all: Vec<ChannelTransport> = self.transports.drain().map(|(_, t)| t).collect();
        all.sort_by_key(|t| t.node_id);
        all
    }

    /// Injector for a node's inbox
    pub fn injector(&self, node_id: NodeId) -> Option<Injector> {
        self.injectors.get(&node_id).cloned()
    }
}
