use clap::Parser;
use clipsmith::cli::Cli;
use clipsmith::core::{config, logging, probe};
use clipsmith::events::ProgressHub;
use clipsmith::jobs::store::{spawn_eviction_sweeper, InMemoryJobStore};
use clipsmith::jobs::JobStore;
use clipsmith::web::{serve, AppState};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let log_file = cli.log_file.unwrap_or_else(|| config::LOG_FILE_PATH.clone());
    logging::init_logger(&log_file)?;
    log::info!("Starting clipsmith v{}", env!("CARGO_PKG_VERSION"));

    logging::log_cookies_configuration();

    // One-time probe: the orchestrator and splitter receive this immutable
    // snapshot instead of lazily discovering binaries mid-request
    let caps = Arc::new(probe::probe_tooling().await?);

    let download_dir = config::expand_path(&config::DOWNLOAD_DIR);
    let clips_dir = config::expand_path(&config::CLIPS_DIR);
    std::fs::create_dir_all(&download_dir)?;
    std::fs::create_dir_all(&clips_dir)?;
    log::info!("📁 videos: {}  clips: {}", download_dir, clips_dir);

    // No cap on concurrently active jobs; the workload is bound by external
    // processes. Front with a limiter if this instance is public.
    log::warn!("No concurrent-job cap is enforced; operator-side limiting is assumed");

    let store: Arc<dyn JobStore> = Arc::new(InMemoryJobStore::new());
    let hub = Arc::new(ProgressHub::new());
    spawn_eviction_sweeper(store.clone());

    let port = cli.port.unwrap_or(*config::WEB_PORT);
    serve(port, AppState { store, hub, caps }).await
}
