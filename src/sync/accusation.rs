// Accusation Ledger - Byzantine accusation counting and quorum halting
//
// Each node counts accusation notices per accused node. A node raises at most
// one accusation of its own per accused node (the ignore set guards this),
// but every notice received from a peer is counted, whoever sent it. Once the
// count for any node exceeds the tolerated number of faulty nodes, the local
// node halts.

use crate::ledger::NodeId;
use crate::sync::protocol::Accusation;
use std::collections::{HashMap, HashSet};

/// Default number of faulty nodes the network tolerates
pub const DEFAULT_MAX_FAULTY: u32 = 1;

/// Result of raising or receiving an accusation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccusationOutcome {
    /// Node already accused locally; nothing happened
    AlreadyAccused,
    /// Counted; `broadcast` is set when the notice must go to every peer
    Counted {
        broadcast: Option<Accusation>,
        count: u32,
        halt: bool,
    },
}

impl AccusationOutcome {
    /// Whether the local node must stop
    pub fn should_halt(&self) -> bool {
        matches!(self, AccusationOutcome::Counted { halt: true, .. })
    }

    /// Notice to broadcast to all peers, if any
    pub fn broadcast(&self) -> Option<Accusation> {
        match self {
            AccusationOutcome::Counted { broadcast, .. } => *broadcast,
            AccusationOutcome::AlreadyAccused => None,
        }
    }
}

/// Per-node accusation counters and the local ignore set
#[derive(Clone, Debug)]
pub struct AccusationLedger {
    max_faulty: u32,
    counts: HashMap<NodeId, u32>,
    ignored: HashSet<NodeId>,
}

impl Default for AccusationLedger {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FAULTY)
    }
}

impl AccusationLedger {
    /// Create a ledger halting once a count exceeds `max_faulty`
    pub fn new(max_faulty: u32) -> Self {
        Self {
            max_faulty,
            counts: HashMap::new(),
            ignored: HashSet::new(),
        }
    }

    /// The tolerance threshold
    pub fn max_faulty(&self) -> u32 {
        self.max_faulty
    }

    /// Put a node in the ignore set without counting (used for self)
    pub fn ignore(&mut self, node_id: NodeId) {
        self.ignored.insert(node_id);
    }

    /// Check whether a node is in the ignore set
    pub fn is_ignored(&self, node_id: NodeId) -> bool {
        self.ignored.contains(&node_id)
    }

    /// Current accusation count for a node
    pub fn count(&self, node_id: NodeId) -> u32 {
        self.counts.get(&node_id).copied().unwrap_or(0)
    }

    /// All nodes with at least one accusation, ordered by id
    pub fn accused(&self) -> Vec<(NodeId, u32)> {
        let mut accused: Vec<(NodeId, u32)> = self.counts.iter().map(|(n, c)| (*n, *c)).collect();
        accused.sort();
        accused
    }

    /// Raise a local accusation against `node_id`
    ///
    /// No-op if the node is already ignored. Otherwise the node is ignored,
    /// counted, and a notice is returned for broadcast.
    pub fn flag_byzantine(&mut self, node_id: NodeId) -> AccusationOutcome {
        if self.ignored.contains(&node_id) {
            return AccusationOutcome::AlreadyAccused;
        }
        self.ignored.insert(node_id);
        let count = self.increment(node_id);

        AccusationOutcome::Counted {
            broadcast: Some(Accusation::new(node_id)),
            count,
            halt: count > self.max_faulty,
        }
    }

    /// Count an accusation notice received from a peer
    ///
    /// Every notice counts, including repeats from the same sender.
    pub fn receive(&mut self, accusation: &Accusation) -> AccusationOutcome {
        let node_id = accusation.accused_node_id();
        self.ignored.insert(node_id);
        let count = self.increment(node_id);

        AccusationOutcome::Counted {
            broadcast: None,
            count,
            halt: count > self.max_faulty,
        }
    }

    fn increment(&mut self, node_id: NodeId) -> u32 {
        let count = self.counts.entry(node_id).or_insert(0);
        *count = count.saturating_add(1);
        *count
    }
}
