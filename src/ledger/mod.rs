// Ledger module - THE LOCAL VIEW OF VALUE
// Unspent outputs, the spent-output Bloom filter, and the seen-transaction set

mod filter;
mod seen;
mod state;
mod utxo;

pub use filter::{SpentFilter, DEFAULT_FILTER_CAPACITY, DEFAULT_FILTER_ERROR_RATE};
pub use seen::SeenTransactions;
pub use state::{ApplyOutcome, LedgerState, NodeId, GENESIS_PREFIX};
pub use utxo::{LedgerError, Output, OutputId, OwnerToken};
