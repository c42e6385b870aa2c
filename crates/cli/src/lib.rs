//! Meridian example programs
//!
//! Each binary under `src/bin` calls `run_main`, which parses the common
//! flags into a `ClientConfig`, connects a session, and runs one program
//! from `programs`. The programs take any session transport, so the tests drive
//! them against the in-process gateway simulator.

pub mod args;
pub mod config;
pub mod error;
pub mod handlers;
pub mod print;
pub mod programs;

pub use config::{ClientConfig, Example};
pub use error::{CliError, Result};
pub use print::Output;

use anyhow::Context;
use meridian_gateway::Session;

/// Log to stderr, `RUST_LOG` or warnings only
pub fn init_logging() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
}

/// Resolves on Ctrl-C; ends the subscription programs
pub async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::warn!("Cannot listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}

/// Body of every program binary: parse flags, connect, run, always stop.
///
/// Failures are printed as `<program>: <error>`; the process still exits
/// normally.
pub async fn run_main(example: Example) {
    init_logging();
    if let Err(e) = run_example(example).await {
        eprintln!("{}: {:#}", example.name(), e);
    }
}

async fn run_example(example: Example) -> anyhow::Result<()> {
    let Some(config) = ClientConfig::from_env(example)? else {
        print!("{}", example.usage());
        return Ok(());
    };

    let address = config.session_options().address();
    let mut session = Session::connect(config.session_options())
        .await
        .with_context(|| format!("Failed to start session with {}", address))?;

    let result = programs::run(&mut session, &config, &Output::stdout(), ctrl_c()).await;
    session.stop().await?;
    let stats = result?;
    log::info!("{} done: {:?}", example.name(), stats);
    Ok(())
}
