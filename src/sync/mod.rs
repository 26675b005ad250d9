// Sync module - HOW NODES TALK
// Wire messages, the gossip engine, and the accusation protocol

mod accusation;
mod gossip;
mod protocol;

pub use accusation::{AccusationLedger, AccusationOutcome, DEFAULT_MAX_FAULTY};
pub use gossip::{
    Conflict, ConflictKind, GossipConfig, GossipEngine, GossipEvent, GossipStats, ValidationMode,
};
pub use protocol::{
    Accusation, Message, MessageType, ProtocolError, TransactionBatch, MAX_MESSAGE_BYTES,
};
