//! Start-of-round signal from the registry's broadcast hub.

use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::net::TcpStream;
use tracing::info;

use crate::error::{Error, Result};
use crate::node::Node;

/// Text that starts a round.
pub const START: &str = "start";

/// Follow the hub at `addr`, starting an election on every `start` message.
///
/// Returns when the hub closes the connection.
pub async fn subscribe(addr: &str, node: Arc<Node>) -> Result<()> {
    let stream = TcpStream::connect(addr)
        .await
        .map_err(|e| Error::Network(format!("connect to broadcast hub {addr}: {e}")))?;
    info!("Subscribed to broadcasts at {}", addr);

    let mut lines = BufReader::new(stream).lines();
    while let Some(line) = lines.next_line().await? {
        dispatch(&node, line.trim());
    }
    info!("Broadcast hub closed the connection");
    Ok(())
}

fn dispatch(node: &Arc<Node>, message: &str) {
    match message {
        "" => {}
        START => {
            info!("Player {}: start signal received", node.id());
            node.on_start_signal();
        }
        other => info!("Administrator says: {}", other),
    }
}
