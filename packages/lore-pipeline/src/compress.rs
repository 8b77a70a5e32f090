use crate::{Error, PipelineService, Result, rerank::cmp_f32_desc, state::RequestState};
use lore_domain::{document::Document, sentences, similarity::cosine};

impl PipelineService {
	pub(crate) async fn compress(&self, state: &mut RequestState) -> Result<()> {
		let compressed = self.compress_docs(&state.user_query, &state.reranked_docs).await?;

		state.log_step(format!("compress: {} characters of context", compressed.chars().count()));

		state.compressed_context = Some(compressed);

		Ok(())
	}

	/// Keeps the sentences most similar to the query, newline-joined in
	/// descending-score order rather than document order. Empty input
	/// yields the empty string that short-circuits answer generation;
	/// unsplittable input falls back to raw excerpts.
	pub async fn compress_docs(&self, query: &str, docs: &[Document]) -> Result<String> {
		if docs.is_empty() {
			return Ok(String::new());
		}

		let cfg = &self.cfg.compress;
		let mut candidates = Vec::new();

		for doc in docs.iter().take(cfg.max_docs as usize) {
			candidates
				.extend(sentences::split_sentences(&doc.content, cfg.min_sentence_chars as usize));
		}

		if candidates.is_empty() {
			let excerpts: Vec<String> = docs
				.iter()
				.take(cfg.fallback_docs as usize)
				.map(|doc| sentences::excerpt(&doc.content, cfg.fallback_chars as usize))
				.collect();

			return Ok(excerpts.join("\n\n"));
		}

		let mut inputs = Vec::with_capacity(candidates.len() + 1);

		inputs.push(query.to_string());
		inputs.extend(candidates.iter().cloned());

		let embeddings =
			self.providers.embedding.embed(&self.cfg.providers.embedding, &inputs).await?;

		if embeddings.len() != inputs.len() {
			return Err(Error::Provider {
				message: "Embedding provider returned mismatched vector count.".to_string(),
			});
		}

		let query_vector = &embeddings[0];
		let mut scored: Vec<(String, f32)> = candidates
			.into_iter()
			.zip(embeddings[1..].iter())
			.map(|(sentence, vector)| {
				let score = cosine(query_vector, vector);

				(sentence, score)
			})
			.collect();

		scored.sort_by(|left, right| cmp_f32_desc(left.1, right.1));
		scored.truncate(cfg.top_sentences as usize);

		let lines: Vec<String> = scored.into_iter().map(|(sentence, _)| sentence).collect();

		Ok(lines.join("\n"))
	}
}
