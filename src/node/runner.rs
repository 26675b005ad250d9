// Node Runner - drives a session over a transport until it stops
//
// One runner per node; the session is owned by the runner and never shared.
// Inbound messages are handled one at a time, to completion, in arrival
// order. Outgoing messages are sent before the next message is read.

use crate::node::session::{NodeError, NodeSession, Outgoing};
use crate::node::summary::{RunSummary, StopReason};
use crate::transport::{Transport, TransportError};
use std::time::Duration;

/// Run `session` over `transport` until it stops
///
/// Stops on quorum, when the transport closes, or (runner policy, outside
/// the protocol) after `idle_timeout` without any inbound message.
pub async fn run_node<T: Transport>(
    mut session: NodeSession,
    transport: &mut T,
    idle_timeout: Option<Duration>,
) -> Result<RunSummary, NodeError> {
    let peer_ids: Vec<_> = transport
        .peers()
        .iter()
        .filter_map(|p| transport.node_id_of(p))
        .collect();

    tracing::debug!(node = %session.node_id(), peers = peer_ids.len(), role = ?session.role(), "node starting");

    let outgoing = {
        let mut rng = rand::thread_rng();
        session.start(&peer_ids, &mut rng)?
    };
    dispatch(transport, outgoing).await?;

    while !session.is_stopped() {
        let next = match idle_timeout {
            Some(limit) => match tokio::time::timeout(limit, transport.recv()).await {
                Ok(next) => next,
                Err(_) => {
                    session.stop(StopReason::Idle);
                    break;
                }
            },
            None => transport.recv().await,
        };

        match next {
            None => {
                session.stop(StopReason::TransportClosed);
            }
            Some(Err(e)) if e.is_per_message() => {
                tracing::warn!(node = %session.node_id(), error = %e, "dropping inbound message");
            }
            Some(Err(e)) => return Err(e.into()),
            Some(Ok((peer, message))) => {
                let Some(from) = transport.node_id_of(&peer) else {
                    tracing::warn!(node = %session.node_id(), ?peer, "message from unmapped peer");
                    continue;
                };
                let outgoing = session.handle(from, message, &peer_ids);
                dispatch(transport, outgoing).await?;
            }
        }
    }

    let summary = session.summary().with_bytes_sent(transport.stats().bytes_sent);
    tracing::info!(
        node = %summary.node_id,
        number_transaction = summary.number_transaction,
        latency = summary.latency,
        bytes_sent = summary.bytes_sent,
        "run summary"
    );
    Ok(summary)
}

async fn dispatch<T: Transport>(transport: &mut T, outgoing: Vec<Outgoing>) -> Result<(), TransportError> {
    for Outgoing { to, message } in outgoing {
        let peer = transport.peer_for(to).ok_or(TransportError::UnknownPeer(to))?;
        transport.send(&peer, &message).await?;
    }
    Ok(())
}
