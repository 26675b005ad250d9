// Transport module - THE WIRE (abstract)
// The transport capability trait, an in-process channel network, and the
// read-only peer topology it is wired from

mod local;
mod topology;
mod traits;

pub use local::{ChannelTransport, Envelope, Injector, LocalNetwork, LocalPeer};
pub use topology::{Topology, TopologyError};
pub use traits::{Transport, TransportError, TransportStats};
