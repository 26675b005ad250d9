// Seen-Transaction Set - exact duplicate suppression

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Exact set of transaction ids already handled by this node
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeenTransactions {
    ids: HashSet<String>,
}

impl SeenTransactions {
    /// Create an empty set
    pub fn new() -> Self {
        Self {
            ids: HashSet::new(),
        }
    }

    /// Mark a transaction id as seen
    /// Returns true if the id was new
    pub fn mark(&mut self, tx_id: &str) -> bool {
        if self.ids.contains(tx_id) {
            return false;
        }
        self.ids.insert(tx_id.to_string())
    }

    /// Check whether a transaction id was already handled
    pub fn contains(&self, tx_id: &str) -> bool {
        self.ids.contains(tx_id)
    }

    /// Number of ids seen
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Check if no id was seen yet
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}
