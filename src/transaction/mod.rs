// Transaction module - THE UNIT OF GOSSIP
// Transaction model, builders for the starter role, and the starter's spends

mod builder;
mod model;

pub use builder::{FactoryError, TransactionBuilder, TransactionFactory};
pub use model::{epoch_seconds, fresh_tx_id, Transaction};
