use std::cmp::Ordering;

use crate::{Error, PipelineService, Result, state::RequestState};
use lore_domain::document::Document;

impl PipelineService {
	pub(crate) async fn rerank(&self, state: &mut RequestState) -> Result<()> {
		let query = state.retrieval_query().to_string();
		let docs = std::mem::take(&mut state.retrieved_docs);
		let reranked = self.rerank_docs(&query, docs, self.cfg.rerank.top_n).await?;

		state.log_step(format!("rerank: kept top {}", reranked.len()));

		state.reranked_docs = reranked;

		Ok(())
	}

	/// Pairwise relevance reorder, stable-descending, truncated to top_n.
	/// Empty input returns empty without touching the scoring service.
	pub async fn rerank_docs(
		&self,
		query: &str,
		docs: Vec<Document>,
		top_n: u32,
	) -> Result<Vec<Document>> {
		if docs.is_empty() {
			return Ok(Vec::new());
		}

		let contents: Vec<String> = docs.iter().map(|doc| doc.content.clone()).collect();
		let scores =
			self.providers.rerank.score(&self.cfg.providers.rerank, query, &contents).await?;

		if scores.len() != docs.len() {
			return Err(Error::Provider {
				message: "Rerank provider returned mismatched score count.".to_string(),
			});
		}

		let mut scored: Vec<(Document, f32)> = docs.into_iter().zip(scores).collect();

		scored.sort_by(|left, right| cmp_f32_desc(left.1, right.1));
		scored.truncate(top_n as usize);

		Ok(scored.into_iter().map(|(doc, _)| doc).collect())
	}
}

/// Descending float order that tolerates NaN (sorted last) so ranking never
/// panics on a degenerate score.
pub(crate) fn cmp_f32_desc(a: f32, b: f32) -> Ordering {
	match (a.is_nan(), b.is_nan()) {
		(true, true) => Ordering::Equal,
		(true, false) => Ordering::Greater,
		(false, true) => Ordering::Less,
		(false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
	}
}
