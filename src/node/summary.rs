// Run Summary - per-node end-of-run record for external aggregation

use crate::ledger::NodeId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors from writing a summary
#[derive(Error, Debug)]
pub enum SummaryError {
    #[error("Failed to write summary: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to encode summary: {0}")]
    Encode(String),
}

/// Why a node stopped
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum StopReason {
    /// Accusations against `accused` exceeded the tolerated faulty count
    Quorum { accused: NodeId, count: u32 },
    /// No inbound message arrived within the runner's idle timeout
    Idle,
    /// Nothing can reach this node any more
    TransportClosed,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Quorum { accused, count } => {
                write!(f, "quorum against node {} ({} accusations)", accused, count)
            }
            StopReason::Idle => write!(f, "idle"),
            StopReason::TransportClosed => write!(f, "transport closed"),
        }
    }
}

/// End-of-run figures for one node
///
/// Field names `number_transaction`, `latency` and `bytes_sent` are the ones
/// the aggregation tooling reads.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub node_id: NodeId,
    /// Batch messages received plus batch messages sent
    pub number_transaction: u64,
    /// Seconds from start to stop
    pub latency: f64,
    pub bytes_sent: u64,
    /// `None` while the node is still running
    pub stop_reason: Option<StopReason>,
    pub applied_transactions: u64,
    pub conflicts_detected: u64,
    /// Transactions skipped because they were already seen
    pub duplicates_skipped: u64,
    pub ledger_outputs: usize,
    /// Saturates at `u64::MAX`
    pub ledger_value: u64,
}

impl RunSummary {
    /// Attach the transport's byte count
    pub fn with_bytes_sent(mut self, bytes: u64) -> Self {
        self.bytes_sent = bytes;
        self
    }

    /// File name used when writing into an output directory
    pub fn file_name(&self) -> String {
        format!("node-{}.yml", self.node_id)
    }

    /// Encode as YAML
    pub fn to_yaml(&self) -> Result<String, SummaryError> {
        serde_yaml::to_string(self).map_err(|e| SummaryError::Encode(e.to_string()))
    }

    /// Write `node-<id>.yml` into `dir`, creating it if needed
    pub fn write_to_dir(&self, dir: impl AsRef<Path>) -> Result<PathBuf, SummaryError> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)?;
        let path = dir.join(self.file_name());
        std::fs::write(&path, self.to_yaml()?)?;
        Ok(path)
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[Node {}] Summary:", self.node_id)?;
        writeln!(f, "    Transaction counter: {}", self.number_transaction)?;
        writeln!(f, "    Latency (s): {:.2}", self.latency)?;
        match &self.stop_reason {
            Some(reason) => write!(f, "    Stopped: {}", reason),
            None => write!(f, "    Still running"),
        }
    }
}
