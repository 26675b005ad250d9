// Simulation - one task per node over an in-process network

use crate::config::NodeConfig;
use crate::ledger::NodeId;
use crate::node::runner::run_node;
use crate::node::session::{NodeError, NodeSession};
use crate::node::summary::RunSummary;
use crate::transport::{LocalNetwork, Topology, Transport};

/// Run every node of `topology` to completion and collect their summaries
///
/// Summaries are ordered by node id. Without an idle timeout in `config`,
/// followers only stop on quorum, so a run without a Byzantine trigger
/// would not return.
pub async fn simulate(config: &NodeConfig, topology: &Topology) -> Result<Vec<RunSummary>, NodeError> {
    config.validate()?;
    let expected: Vec<NodeId> = (0..config.participants).map(NodeId::new).collect();
    if topology.nodes() != expected {
        return Err(NodeError::TopologyMismatch {
            expected: config.participants,
            found: topology.len(),
        });
    }
    if !topology.is_connected() {
        tracing::warn!("topology is not connected; some nodes will never hear of the double spend");
    }

    let idle = config.idle_timeout();
    let mut network = LocalNetwork::new(topology);
    let mut handles = Vec::new();

    for mut transport in network.take_all() {
        let session = NodeSession::new(transport.local_node_id(), config.clone())?;
        handles.push(tokio::spawn(async move {
            run_node(session, &mut transport, idle).await
        }));
    }
    // Drop the injectors' senders so finished peers can observe a closed inbox.
    drop(network);

    let mut summaries = Vec::with_capacity(handles.len());
    for handle in handles {
        let summary = handle
            .await
            .map_err(|e| NodeError::TaskFailed(e.to_string()))??;
        summaries.push(summary);
    }
    summaries.sort_by_key(|s| s.node_id);
    Ok(summaries)
}
