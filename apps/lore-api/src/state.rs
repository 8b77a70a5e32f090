use std::sync::Arc;

use lore_pipeline::{PipelineService, Providers};
use lore_storage::{history::FileHistoryStore, qdrant::QdrantStore};

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<PipelineService>,
}
impl AppState {
	pub fn new(config: lore_config::Config) -> color_eyre::Result<Self> {
		let index = QdrantStore::new(&config.storage.qdrant)?;
		let history = FileHistoryStore::new(&config.storage.history);
		let service = PipelineService::new(
			config,
			Arc::new(index),
			Arc::new(history),
			Providers::default_http(),
		);

		Ok(Self { service: Arc::new(service) })
	}
}
