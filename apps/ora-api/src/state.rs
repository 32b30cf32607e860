use std::{path::PathBuf, sync::Arc, time::Duration};

use ora_monitor::Monitor;
use ora_service::OraService;
use ora_storage::{db::Db, vector::QdrantStore};

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<OraService>,
}
impl AppState {
	pub async fn new(config: ora_config::Config) -> color_eyre::Result<Self> {
		let db = Db::connect(&config.storage.postgres).await?;

		db.ensure_schema().await?;

		let qdrant = QdrantStore::new(&config.storage.qdrant)?;
		let monitor = Monitor::new(config.monitor.retention_days);
		let snapshot_path = PathBuf::from(&config.monitor.snapshot_path);
		let flush_interval = Duration::from_secs(config.monitor.flush_interval_secs);

		tokio::spawn(ora_monitor::run_flush(monitor.clone(), snapshot_path, flush_interval));

		let service = OraService::new(config, db, qdrant, monitor);

		Ok(Self { service: Arc::new(service) })
	}
}
