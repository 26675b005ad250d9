// Topology - read-only peer graph handed to the transport

use crate::ledger::NodeId;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::path::Path;
use thiserror::Error;

/// Errors from building or loading a topology
#[derive(Error, Debug)]
pub enum TopologyError {
    #[error("Failed to read topology file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse topology: {0}")]
    Parse(String),

    #[error("Node {0} lists itself as a peer")]
    SelfLoop(NodeId),

    #[error("Node {from} lists unknown peer {to}")]
    UnknownPeer { from: NodeId, to: NodeId },
}

/// Undirected peer graph as an adjacency list
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Topology {
    adjacency: BTreeMap<NodeId, BTreeSet<NodeId>>,
}

impl Topology {
    /// Every node connected to every other node
    pub fn fully_connected(nodes: u32) -> Self {
        let mut topology = Self::with_nodes(nodes);
        for a in 0..nodes {
            for b in (a + 1)..nodes {
                topology.connect(NodeId::new(a), NodeId::new(b));
            }
        }
        topology
    }

    /// Each node connected to its two neighbours on a cycle
    pub fn ring(nodes: u32) -> Self {
        let mut topology = Self::with_nodes(nodes);
        if nodes > 1 {
            for a in 0..nodes {
                topology.connect(NodeId::new(a), NodeId::new((a + 1) % nodes));
            }
        }
        topology
    }

    /// Build from explicit undirected edges
    pub fn from_edges(nodes: u32, edges: &[(u32, u32)]) -> Result<Self, TopologyError> {
        let mut topology = Self::with_nodes(nodes);
        for &(a, b) in edges {
            let (a, b) = (NodeId::new(a), NodeId::new(b));
            if a == b {
                return Err(TopologyError::SelfLoop(a));
            }
            for (from, to) in [(a, b), (b, a)] {
                if !topology.adjacency.contains_key(&to) {
                    return Err(TopologyError::UnknownPeer { from, to });
                }
            }
            topology.connect(a, b);
        }
        Ok(topology)
    }

    /// Parse a YAML adjacency list (`<node>: [<peer>, ...]`)
    ///
    /// Edges are symmetrised, so a one-sided listing still connects both ends.
    pub fn from_yaml_str(text: &str) -> Result<Self, TopologyError> {
        let raw: BTreeMap<u32, Vec<u32>> =
            serde_yaml::from_str(text).map_err(|e| TopologyError::Parse(e.to_string()))?;

        let mut topology = Self::default();
        for node in raw.keys() {
            topology.adjacency.entry(NodeId::new(*node)).or_default();
        }
        for (node, peers) in &raw {
            let from = NodeId::new(*node);
            for peer in peers {
                let to = NodeId::new(*peer);
                if from == to {
                    return Err(TopologyError::SelfLoop(from));
                }
                if !topology.adjacency.contains_key(&to) {
                    return Err(TopologyError::UnknownPeer { from, to });
                }
                topology.connect(from, to);
            }
        }
        Ok(topology)
    }

    /// Load a YAML adjacency list from disk
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, TopologyError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&text)
    }

    /// Encode as a YAML adjacency list, the format `from_yaml_str` reads
    pub fn to_yaml_string(&self) -> Result<String, TopologyError> {
        let raw: BTreeMap<u32, Vec<u32>> = self
            .adjacency
            .iter()
            .map(|(node, peers)| (node.as_u32(), peers.iter().map(|p| p.as_u32()).collect()))
            .collect();
        serde_yaml::to_string(&raw).map_err(|e| TopologyError::Parse(e.to_string()))
    }

    /// All node ids, ascending
    pub fn nodes(&self) -> Vec<NodeId> {
        self.adjacency.keys().copied().collect()
    }

    /// Number of nodes
    pub fn len(&self) -> usize {
        self.adjacency.len()
    }

    /// Check if the graph has no nodes
    pub fn is_empty(&self) -> bool {
        self.adjacency.is_empty()
    }

    /// Peers of a node, ascending
    pub fn peers(&self, node: NodeId) -> Vec<NodeId> {
        self.adjacency
            .get(&node)
            .map(|p| p.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Check whether every node can reach every other node
    pub fn is_connected(&self) -> bool {
        let Some(&start) = self.adjacency.keys().next() else {
            return true;
        };
        let mut visited = BTreeSet::from([start]);
        let mut queue = VecDeque::from([start]);
        while let Some(node) = queue.pop_front() {
            for peer in &self.adjacency[&node] {
                if visited.insert(*peer) {
                    queue.push_back(*peer);
                }
            }
        }
        visited.len() == self.adjacency.len()
    }

    fn with_nodes(nodes: u32) -> Self {
        Self {
            adjacency: (0..nodes).map(|n| (NodeId::new(n), BTreeSet::new())).collect(),
        }
    }

    fn connect(&mut self, a: NodeId, b: NodeId) {
        self.adjacency.entry(a).or_default().insert(b);
        self.adjacency.entry(b).or_default().insert(a);
    }
}
