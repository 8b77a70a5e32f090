use std::collections::HashMap;

use qdrant_client::{
	Qdrant,
	qdrant::{PointId, Query, QueryPointsBuilder, ScrollPointsBuilder, Value, value::Kind},
};

use crate::Result;
use lore_domain::{document::Document, handbook::UNKNOWN_COLLECTION};

const SCROLL_PAGE_SIZE: u32 = 256;

/// Dense-index view of the corpus snapshot: top-k similarity search for
/// retrieval, full scroll for lexical indexing.
pub struct QdrantStore {
	pub client: Qdrant,
	pub collection: String,
	pub vector_dim: u32,
}
impl QdrantStore {
	pub fn new(cfg: &lore_config::Qdrant) -> Result<Self> {
		let client = Qdrant::from_url(&cfg.url).build()?;

		Ok(Self { client, collection: cfg.collection.clone(), vector_dim: cfg.vector_dim })
	}

	pub async fn search(&self, vector: Vec<f32>, k: u64) -> Result<Vec<Document>> {
		let search = QueryPointsBuilder::new(self.collection.clone())
			.query(Query::new_nearest(vector))
			.limit(k)
			.with_payload(true);
		let response = self.client.query(search).await?;
		let mut out = Vec::with_capacity(response.result.len());

		for point in &response.result {
			match document_from_payload(&point.payload) {
				Some(doc) => out.push(doc),
				None => tracing::warn!("Scored point has an incomplete document payload."),
			}
		}

		Ok(out)
	}

	pub async fn all_documents(&self) -> Result<Vec<Document>> {
		let mut out = Vec::new();
		let mut offset: Option<PointId> = None;

		loop {
			let mut scroll = ScrollPointsBuilder::new(self.collection.clone())
				.limit(SCROLL_PAGE_SIZE)
				.with_payload(true);

			if let Some(offset) = offset.take() {
				scroll = scroll.offset(offset);
			}

			let response = self.client.scroll(scroll).await?;

			for point in &response.result {
				match document_from_payload(&point.payload) {
					Some(doc) => out.push(doc),
					None => tracing::warn!("Scrolled point has an incomplete document payload."),
				}
			}

			match response.next_page_offset {
				Some(next) => offset = Some(next),
				None => break,
			}
		}

		Ok(out)
	}
}

fn document_from_payload(payload: &HashMap<String, Value>) -> Option<Document> {
	let content = payload_string(payload, "content")?;
	let page = payload_i64(payload, "page")?;
	let chunk_index = payload_i64(payload, "chunk_index")?;
	let source_collection = payload_string(payload, "source_collection")
		.unwrap_or_else(|| UNKNOWN_COLLECTION.to_string());

	Some(Document { content, source_collection, page, chunk_index })
}

fn payload_string(payload: &HashMap<String, Value>, key: &str) -> Option<String> {
	let value = payload.get(key)?;

	match &value.kind {
		Some(Kind::StringValue(text)) => Some(text.to_string()),
		_ => None,
	}
}

fn payload_i64(payload: &HashMap<String, Value>, key: &str) -> Option<i64> {
	let value = payload.get(key)?;

	match &value.kind {
		Some(Kind::IntegerValue(value)) => Some(*value),
		Some(Kind::DoubleValue(value)) =>
			if value.fract() == 0.0 {
				Some(*value as i64)
			} else {
				None
			},
		_ => None,
	}
}
