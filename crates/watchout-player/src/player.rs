//! Bringing a player up.

use tracing::{info, warn};
use watchout_grid::GridPos;
use watchout_protocols::{PeerInfo, RegisterRequest};

use crate::config::PlayerConfig;
use crate::error::Result;
use crate::node::Node;
use crate::registration::RegistryClient;
use crate::rpc::PeerServer;
use crate::{signal, telemetry};

/// Register, join the game and play rounds until the process is stopped.
///
/// Fails before any coordination starts if registration fails.
pub async fn run(config: PlayerConfig) -> Result<()> {
    let server = PeerServer::bind(("0.0.0.0", config.port)).await?;
    let port = server.local_addr()?.port();

    let registry = RegistryClient::new(config.registry_url.clone());
    let registration = registry
        .register(&RegisterRequest {
            id: config.id,
            address: config.advertise_addr.clone(),
            port,
        })
        .await?;

    let me = PeerInfo {
        id: config.id,
        address: config.advertise_addr.clone(),
        port,
        position: GridPos::try_new(registration.x.into(), registration.y.into())?,
    };
    info!("Starting {}", me);

    let node = Node::new(me, config.timing);
    node.adopt_registration(registration.players);

    tokio::spawn({
        let node = node.clone();
        async move {
            if let Err(e) = server.serve(node).await {
                warn!("Peer server stopped: {}", e);
            }
        }
    });

    telemetry::spawn(config.id, registry, config.report_interval);

    let phases = node.present_to_peers().await?;

    tokio::spawn({
        let node = node.clone();
        let addr = config.broadcast_addr.clone();
        async move {
            if let Err(e) = signal::subscribe(&addr, node).await {
                warn!("No start signals will be received: {}", e);
            }
        }
    });

    node.bootstrap(&phases).await?;
    node.run_rounds().await
}
