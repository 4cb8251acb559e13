//! Inbound peer calls.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tracing::{debug, error, info, warn};
use watchout_protocols::{decode_line, encode_line, PeerRequest, PeerResponse};

use crate::error::Result;
use crate::node::Node;

/// Accepts peer connections and dispatches every request to a [`Node`].
///
/// Each connection runs on its own task, so handlers execute concurrently.
pub struct PeerServer {
    listener: TcpListener,
}

impl PeerServer {
    /// Bind the listening socket. The port is known before registration.
    pub async fn bind(addr: impl ToSocketAddrs) -> Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener })
    }

    /// Address the server is listening on.
    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Serve requests until the task is dropped.
    pub async fn serve(self, node: Arc<Node>) -> Result<()> {
        info!("Peer RPC listening on {}", self.local_addr()?);
        loop {
            match self.listener.accept().await {
                Ok((stream, addr)) => {
                    let node = Arc::clone(&node);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, node).await {
                            warn!("Peer connection error from {}: {}", addr, e);
                        }
                    });
                }
                Err(e) => {
                    error!("Failed to accept peer connection: {}", e);
                }
            }
        }
    }
}

async fn handle_connection(stream: TcpStream, node: Arc<Node>) -> Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    while reader.read_line(&mut line).await? > 0 {
        let reply = match decode_line::<PeerRequest>(&line) {
            Ok(request) => {
                debug!(rpc = request.name(), "peer request");
                node.handle(request)
            }
            Err(e) => PeerResponse::Error {
                error: format!("invalid request: {e}"),
            },
        };

        writer.write_all(encode_line(&reply)?.as_bytes()).await?;
        line.clear();
    }

    Ok(())
}
