//! TCP front end
//!
//! Every accepted connection gets its own `SimGateway`, so services opened
//! and streams started by one client are invisible to the others.

use crate::application::{SimConfig, SimGateway};
use crate::error::Result;
use log::{error, info};
use meridian_core::Event;
use meridian_gateway::{ClientFrame, TcpLink};
use tokio::net::TcpListener;

pub async fn bind(addr: &str) -> Result<TcpListener> {
    let listener = TcpListener::bind(addr).await?;
    info!("Gateway simulator listening on {}", listener.local_addr()?);
    Ok(listener)
}

/// Accept clients forever, serving each on its own task
pub async fn serve_tcp(listener: TcpListener, config: SimConfig) -> Result<()> {
    loop {
        let (stream, peer) = listener.accept().await?;
        let link = match TcpLink::<Event, ClientFrame>::from_stream(stream, config.channel_capacity)
        {
            Ok(link) => link,
            Err(e) => {
                error!("Failed to set up connection from {}: {}", peer, e);
                continue;
            }
        };
        info!("Client connected from {}", peer);

        let gateway = SimGateway::new(config.clone());
        tokio::spawn(async move {
            match gateway.serve(link).await {
                Ok(()) => info!("Client {} done", peer),
                Err(e) => error!("Client {} failed: {}", peer, e),
            }
        });
    }
}
