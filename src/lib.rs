// utxomesh - UTXO gossip ledger with Bloom-filter double-spend detection
//
// Every node keeps a local view of unspent outputs, floods transaction
// batches to its peers, and accuses a peer that relays a spend of an output
// it has already seen spent. Nodes halt once accusations against a single
// peer exceed the tolerated faulty count.

pub mod config;
pub mod ledger;
pub mod node;
pub mod sync;
pub mod transaction;
pub mod transport;

pub use config::{ConfigError, NodeConfig};
pub use ledger::{LedgerState, NodeId};
pub use node::{run_node, simulate, NodeError, NodeSession, RunSummary, StopReason};
