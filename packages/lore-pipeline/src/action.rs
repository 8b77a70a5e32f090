use serde_json::json;

use crate::{PipelineService, Result, state::RequestState};

impl PipelineService {
	/// Produces the requested deliverable (email draft, checklist, summary)
	/// from the compressed context once the answer has been verified.
	pub(crate) async fn action(&self, state: &mut RequestState) -> Result<()> {
		let context = state.compressed_context.clone().unwrap_or_default();
		let prompt = format!(
			"\
Based on the handbook context, generate the requested deliverable.
Examples: email draft, checklist, summary.

User request:
{}

Handbook context:
{context}

Return the deliverable.",
			state.user_query,
		);
		let messages = [
			json!({ "role": "system", "content": "You are an enterprise action agent." }),
			json!({ "role": "user", "content": prompt }),
		];
		let output = self
			.providers
			.generation
			.generate(&self.cfg.providers.generation, &messages)
			.await?;

		state.log_step(format!("action: deliverable of {} characters", output.chars().count()));

		state.action_output = Some(output.trim().to_string());

		Ok(())
	}
}
