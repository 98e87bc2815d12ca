//! park-sync - keeps the offline queue flowing
//!
//! Opens the local store, watches connectivity and replays queued mutations
//! on every reconnect until Ctrl-C.

use park_client::logger::init_logger_with_file;
use park_client::{ClientConfig, ParkingContext};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    let config = ClientConfig::from_env();
    init_logger_with_file(Some(&config.log_level), config.log_dir.as_deref());

    tracing::info!(
        base_url = %config.base_url,
        data_dir = %config.data_dir,
        "Starting park-sync"
    );

    let ctx = ParkingContext::open(config)?;
    if !ctx.queue.is_empty() {
        tracing::info!(queued = ctx.queue.len(), "Pending offline mutations found");
    }

    let shutdown = CancellationToken::new();
    let handles = ctx.spawn_background(ctx.http_probe()?, shutdown.clone());

    tokio::signal::ctrl_c().await?;
    tracing::info!("Ctrl-C received, shutting down");
    shutdown.cancel();

    for handle in handles {
        handle.await?;
    }

    tracing::info!(queued = ctx.queue.len(), "park-sync stopped");
    Ok(())
}
