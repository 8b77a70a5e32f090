use serde_json::json;

use crate::{PipelineService, Result, state::RequestState};
use lore_domain::{citations, document::Document};
use lore_storage::history::Turn;

/// Fixed sentinel for questions the corpus cannot answer. The verifier and
/// the response boundary rely on this exact string never varying.
pub const NOT_FOUND_ANSWER: &str = "Not found in handbook documents.";

impl PipelineService {
	pub(crate) async fn answer(&self, state: &mut RequestState) -> Result<()> {
		let context = state.compressed_context.clone().unwrap_or_default();
		let answer = self
			.answer_docs(&state.user_query, &context, &state.reranked_docs, &state.history)
			.await?;

		state.log_step(format!("answer: {} characters", answer.chars().count()));

		state.answer = Some(answer);

		Ok(())
	}

	/// Fails closed: an empty context or an empty document list returns the
	/// sentinel without invoking the generation service at all.
	pub async fn answer_docs(
		&self,
		query: &str,
		context: &str,
		docs: &[Document],
		history: &[Turn],
	) -> Result<String> {
		if context.trim().is_empty() || docs.is_empty() {
			return Ok(NOT_FOUND_ANSWER.to_string());
		}

		let citation_lines = citations::format_citations(docs).join("\n");
		let transcript: Vec<String> = history
			.iter()
			.map(|turn| format!("User: {}\nAssistant: {}", turn.user, turn.assistant))
			.collect();
		let history_section = if transcript.is_empty() {
			String::new()
		} else {
			format!("\n\nRecent conversation:\n{}", transcript.join("\n"))
		};
		let prompt = format!(
			"\
Answer the question ONLY using the provided context.
If the context does not contain the answer, say: \"{NOT_FOUND_ANSWER}\"

User question:
{query}

Compressed context:
{context}

Citations available:
{citation_lines}{history_section}

Rules:
- Use bullet points if possible
- Be precise
- Stay within the single handbook the context comes from
- End your answer with a \"Sources:\" section listing the citations you used.

Now write the final answer."
		);
		let messages = [
			json!({ "role": "system", "content": "You are an enterprise handbook assistant." }),
			json!({ "role": "user", "content": prompt }),
		];
		let text = self
			.providers
			.generation
			.generate(&self.cfg.providers.generation, &messages)
			.await?;

		Ok(text.trim().to_string())
	}
}
