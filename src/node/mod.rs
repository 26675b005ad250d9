// Node module - ONE PARTICIPANT, START TO STOP
// Per-node session state, the handler loop that drives it over a transport,
// and the end-of-run summary

mod runner;
mod session;
mod simulation;
mod summary;

pub use runner::run_node;
pub use session::{NodeError, NodeSession, Outgoing, Role, SessionState, StarterIssue};
pub use simulation::simulate;
pub use summary::{RunSummary, StopReason, SummaryError};
