//! Broadcast hub: fan administrator messages out to every player.
//!
//! Players connect over TCP and receive each published message as one line.
//! Nothing is buffered for players that connect later.

use std::net::SocketAddr;

use tokio::io::AsyncWriteExt;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use crate::error::Result;

const CHANNEL_CAPACITY: usize = 64;

/// Publishes messages to every connected subscriber.
#[derive(Debug, Clone)]
pub struct BroadcastHub {
    tx: broadcast::Sender<String>,
}

impl Default for BroadcastHub {
    fn default() -> Self {
        Self::new()
    }
}

impl BroadcastHub {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    /// Send `message` to every subscriber connected right now.
    ///
    /// Returns how many subscribers it was queued for.
    pub fn publish(&self, message: &str) -> usize {
        let message = message.replace(['\r', '\n'], " ");
        let delivered = self.tx.send(message.clone()).unwrap_or(0);
        info!("Broadcast {:?} to {} subscribers", message, delivered);
        delivered
    }

    /// Number of connected subscribers.
    pub fn subscribers(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Accept subscribers on `listener` until the task is dropped.
    pub async fn serve(self, listener: TcpListener) -> Result<()> {
        info!("Broadcast hub listening on {}", listener.local_addr()?);
        loop {
            match listener.accept().await {
                Ok((stream, addr)) => {
                    let rx = self.tx.subscribe();
                    tokio::spawn(async move {
                        if let Err(e) = forward(stream, rx).await {
                            debug!("Subscriber {} left: {}", addr, e);
                        }
                    });
                }
                Err(e) => {
                    error!("Failed to accept subscriber: {}", e);
                }
            }
        }
    }
}

async fn forward(mut stream: TcpStream, mut rx: broadcast::Receiver<String>) -> Result<()> {
    let addr: Option<SocketAddr> = stream.peer_addr().ok();
    debug!("Subscriber connected: {:?}", addr);
    loop {
        match rx.recv().await {
            Ok(message) => {
                stream.write_all(message.as_bytes()).await?;
                stream.write_all(b"\n").await?;
            }
            Err(broadcast::error::RecvError::Lagged(missed)) => {
                warn!("Subscriber {:?} missed {} messages", addr, missed);
            }
            Err(broadcast::error::RecvError::Closed) => return Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncBufReadExt, BufReader};
    use tokio::time::{sleep, timeout, Duration};

    #[tokio::test]
    async fn subscribers_receive_each_message_as_a_line() {
        let hub = BroadcastHub::new();
        assert_eq!(hub.publish("nobody listens"), 0);

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(hub.clone().serve(listener));

        let stream = TcpStream::connect(addr).await.unwrap();
        let mut lines = BufReader::new(stream).lines();

        timeout(Duration::from_secs(5), async {
            while hub.subscribers() == 0 {
                sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .unwrap();

        assert_eq!(hub.publish("start"), 1);
        assert_eq!(hub.publish("two\nlines"), 1);
        assert_eq!(lines.next_line().await.unwrap().as_deref(), Some("start"));
        assert_eq!(lines.next_line().await.unwrap().as_deref(), Some("two lines"));
    }
}
