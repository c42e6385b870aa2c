//! Simulated market-data gateway over TCP
//!
//! ```text
//! RUST_LOG=debug gateway_sim --port 8194 --tick-ms 250
//! ```

use clap::Parser;
use log::info;
use meridian_gateway_sim::{SimConfig, bind, serve_tcp};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "gateway_sim", about = "Simulated market-data gateway")]
struct Args {
    /// Address to listen on
    #[arg(long, default_value = "127.0.0.1")]
    bind: String,

    /// Port to listen on
    #[arg(long, short, default_value_t = 8194)]
    port: u16,

    /// Milliseconds between subscription ticks
    #[arg(long, default_value_t = 500)]
    tick_ms: u64,

    /// Terminate each subscription after this many ticks
    #[arg(long)]
    max_ticks: Option<u64>,
}

#[tokio::main]
async fn main() -> meridian_gateway_sim::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config = SimConfig {
        tick_interval: Duration::from_millis(args.tick_ms.max(1)),
        max_ticks: args.max_ticks,
        ..SimConfig::default()
    };
    info!(
        "Starting gateway simulator (tick {:?}, max ticks {:?})",
        config.tick_interval, config.max_ticks
    );

    let listener = bind(&format!("{}:{}", args.bind, args.port)).await?;
    serve_tcp(listener, config).await
}
