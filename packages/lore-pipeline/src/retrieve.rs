pub mod lexical;

use crate::{Error, PipelineService, Result, state::RequestState};
use lore_domain::document::{Document, merge_dedup};

impl PipelineService {
	pub(crate) async fn retrieve(&self, state: &mut RequestState) -> Result<()> {
		let cfg = &self.cfg.retrieval;
		let query = state.retrieval_query().to_string();
		let docs = self.hybrid_retrieve(&query, cfg.k_dense, cfg.k_lexical).await?;

		state.log_step(format!("retrieve: {} candidates", docs.len()));

		state.retrieved_docs = docs;

		Ok(())
	}

	/// Dense and lexical retrieval over the same corpus snapshot, merged
	/// dense-first with identity-key dedup. The two result lists are never
	/// scored jointly; ranking is the reranker's job.
	pub async fn hybrid_retrieve(
		&self,
		query: &str,
		k_dense: u32,
		k_lexical: u32,
	) -> Result<Vec<Document>> {
		let corpus = self.index.all_documents().await?;

		if corpus.is_empty() {
			tracing::warn!("Corpus snapshot is empty; retrieval returns nothing.");

			return Ok(Vec::new());
		}

		let vector = self.embed_single(query).await?;
		let dense = self.index.search(vector, u64::from(k_dense)).await?;
		let index = lexical::LexicalIndex::build(
			&corpus,
			self.cfg.retrieval.bm25_k1,
			self.cfg.retrieval.bm25_b,
		);
		let lexical_docs = index.top_k(query, &corpus, k_lexical as usize);

		Ok(merge_dedup(dense.into_iter().chain(lexical_docs)))
	}

	pub(crate) async fn embed_single(&self, text: &str) -> Result<Vec<f32>> {
		let texts = [text.to_string()];
		let embeddings =
			self.providers.embedding.embed(&self.cfg.providers.embedding, &texts).await?;
		let vector = embeddings.into_iter().next().ok_or_else(|| Error::Provider {
			message: "Embedding provider returned no vectors.".to_string(),
		})?;

		if vector.len() != self.cfg.storage.qdrant.vector_dim as usize {
			return Err(Error::Provider {
				message: "Embedding vector dimension mismatch.".to_string(),
			});
		}

		Ok(vector)
	}
}
