use serde_json::json;

use crate::{PipelineService, Result, state::RequestState};

// Replies shorter than this are treated as a failed rewrite and the raw
// user query is retrieved instead.
const MIN_REWRITE_CHARS: usize = 3;

impl PipelineService {
	pub(crate) async fn rewrite(&self, state: &mut RequestState) -> Result<()> {
		let intent = state
			.classification
			.as_ref()
			.map(|classification| classification.intent.clone())
			.unwrap_or_else(|| self.cfg.intents.fallback.clone());
		let rewritten = self.rewrite_query(&state.user_query, &intent).await?;

		state.log_step(format!("rewrite: {rewritten:?}"));

		state.rewritten_query = Some(rewritten);

		Ok(())
	}

	async fn rewrite_query(&self, query: &str, intent: &str) -> Result<String> {
		let prompt = format!(
			"\
Rewrite this employee handbook query into a short retrieval query.

Rules:
- keep it short
- include keywords
- include synonyms
- remove filler words
- do NOT answer

Intent: {intent}
Query: {query}

Rewritten query:"
		);
		let messages = [
			json!({ "role": "system", "content": "You rewrite queries for handbook retrieval." }),
			json!({ "role": "user", "content": prompt }),
		];
		let raw = self
			.providers
			.generation
			.generate(&self.cfg.providers.generation, &messages)
			.await?;
		let rewritten = raw.trim();

		if rewritten.chars().count() < MIN_REWRITE_CHARS {
			return Ok(query.to_string());
		}

		Ok(rewritten.to_string())
	}
}
