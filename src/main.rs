use clap::Parser;
use color_eyre::{eyre::eyre, Result};
use tokio_util::sync::CancellationToken;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use padbridge::bridge::BridgeHandle;
use padbridge::cli::Args;
use padbridge::config::BridgeConfig;
use padbridge::layout::LayoutRegistry;

#[tokio::main]
async fn main() -> Result<()> {
    setup()?;

    let args = Args::parse();
    let mut config = BridgeConfig::load(args.config.as_deref())?;
    args.apply(&mut config);

    info!("Bridging controllers to {}", config.server.endpoint());

    let registry = LayoutRegistry::new();
    let shutdown = CancellationToken::new();

    let bridge_task = BridgeHandle::spawn(config, registry, shutdown.clone())
        .map_err(|e| eyre!("Failed to start bridge: {}", e))?;

    tokio::signal::ctrl_c().await?;
    info!("Shutdown requested");
    shutdown.cancel();
    bridge_task.await?;

    Ok(())
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    setup_logging_env();
    Ok(())
}

fn setup_logging_env() {
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();
}
