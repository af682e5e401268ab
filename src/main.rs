use std::sync::Arc;

use serde::Serialize;
use tracing::info;
use tracing_subscriber::EnvFilter;

use roomlock::clock::SystemClock;
use roomlock::compactor::compact_if_needed;
use roomlock::config::Config;
use roomlock::engine::Engine;
use roomlock::model::{ReservationFilter, ReservationView, Space};
use roomlock::store::LocalStore;

#[derive(Serialize)]
struct Snapshot {
    spaces: Vec<Space>,
    reservations: Vec<ReservationView>,
}

/// Replay the data directory and print its state as JSON on stdout.
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let config = Config::from_env();
    roomlock::observability::init(config.metrics_port)?;

    std::fs::create_dir_all(&config.data_dir)?;
    let wal_path = config.wal_path();
    info!("data_dir: {}", config.data_dir.display());

    let store = Arc::new(LocalStore::open(&wal_path)?);
    let engine = Engine::new(store.clone(), Arc::new(SystemClock));

    let snapshot = Snapshot {
        spaces: engine.list_spaces().await?,
        reservations: engine.query_views(&ReservationFilter::default()).await?,
    };
    println!("{}", serde_json::to_string_pretty(&snapshot)?);

    if compact_if_needed(&store, config.compact_threshold).await? {
        info!("compacted {}", wal_path.display());
    }
    Ok(())
}
