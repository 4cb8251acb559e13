//! Outbound peer calls.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tracing::{trace, warn};
use watchout_protocols::{decode_line, encode_line, PeerInfo, PeerRequest, PeerResponse};
use watchout_sync::QuorumBarrier;

use crate::error::{Error, Result};

/// Sends requests to other peers.
///
/// Failures of background calls are logged and the call is treated as never
/// answered.
#[derive(Debug, Clone, Default)]
pub struct PeerClient;

impl PeerClient {
    pub fn new() -> Self {
        Self
    }

    /// Send `request` to `peer` and wait for the reply.
    pub async fn call(&self, peer: &PeerInfo, request: &PeerRequest) -> Result<PeerResponse> {
        let endpoint = peer.endpoint();
        let stream = TcpStream::connect(&endpoint)
            .await
            .map_err(|e| Error::Network(format!("connect to {endpoint}: {e}")))?;
        let (reader, mut writer) = stream.into_split();

        writer.write_all(encode_line(request)?.as_bytes()).await?;
        writer.flush().await?;

        let mut reader = BufReader::new(reader);
        let mut line = String::new();
        if reader.read_line(&mut line).await? == 0 {
            return Err(Error::Network(format!(
                "{endpoint} closed the connection before answering {}",
                request.name()
            )));
        }

        match decode_line::<PeerResponse>(&line)? {
            PeerResponse::Error { error } => Err(Error::Network(format!(
                "{endpoint} rejected {}: {error}",
                request.name()
            ))),
            reply => {
                trace!(peer = peer.id, rpc = request.name(), ?reply, "peer replied");
                Ok(reply)
            }
        }
    }

    /// Send `request` in the background and hand the reply to `on_reply`.
    pub fn spawn_call<F>(&self, peer: PeerInfo, request: PeerRequest, on_reply: F) -> JoinHandle<()>
    where
        F: FnOnce(PeerResponse) + Send + 'static,
    {
        let client = self.clone();
        tokio::spawn(async move {
            match client.call(&peer, &request).await {
                Ok(reply) => on_reply(reply),
                Err(e) => warn!("{} to player {} failed: {}", request.name(), peer.id, e),
            }
        })
    }

    /// Send `request` to every peer without waiting for replies.
    pub fn notify_all(&self, peers: &[PeerInfo], request: &PeerRequest) {
        for peer in peers {
            self.spawn_call(peer.clone(), request.clone(), |_| {});
        }
    }

    /// Send `request` to every peer, adding each reply that `collect` maps
    /// to a value into `barrier`.
    pub fn fan_out<T, F>(
        &self,
        peers: &[PeerInfo],
        request: &PeerRequest,
        barrier: &Arc<QuorumBarrier<T>>,
        collect: F,
    ) where
        T: Clone + Send + Sync + 'static,
        F: Fn(PeerResponse) -> Option<T> + Clone + Send + 'static,
    {
        for peer in peers {
            let barrier = Arc::clone(barrier);
            let collect = collect.clone();
            let rpc = request.name();
            let id = peer.id;
            self.spawn_call(peer.clone(), request.clone(), move |reply| {
                match collect(reply) {
                    Some(value) => {
                        barrier.add(value);
                    }
                    None => warn!("unexpected reply to {} from player {}", rpc, id),
                }
            });
        }
    }
}

/// `collect` for calls answered with a plain acknowledgement.
pub fn ack(reply: PeerResponse) -> Option<()> {
    matches!(reply, PeerResponse::Ack).then_some(())
}
