use serde_json::json;

use crate::{PipelineService, Result, state::RequestState};
use lore_domain::intent::{self, IntentClassification};

impl PipelineService {
	pub(crate) async fn understand(&self, state: &mut RequestState) -> Result<()> {
		let classification = self.classify_query(&state.user_query).await?;

		state.log_step(format!(
			"understand: intent {} strategy {:?} needs_action {}",
			classification.intent, classification.retrieval_strategy, classification.needs_action,
		));

		state.classification = Some(classification);

		Ok(())
	}

	/// Asks the generation service for a structured classification. A
	/// malformed reply degrades to the configured safe defaults inside
	/// [`intent::parse_classification`]; only transport failures propagate.
	async fn classify_query(&self, query: &str) -> Result<IntentClassification> {
		let intents = &self.cfg.intents;
		let labels = intents
			.labels
			.iter()
			.map(|label| format!("- {}: {}", label.name, label.description))
			.collect::<Vec<_>>()
			.join("\n");
		let prompt = format!(
			"\
Classify this employee handbook question.

Intents:
{labels}

Respond with one JSON object and nothing else:
{{\"intent\": \"<one intent name>\", \"retrieval_strategy\": \"single_hop\" or \"multi_hop\", \"needs_action\": true or false}}

Use \"multi_hop\" when answering needs facts from more than one policy \
section (eligibility plus process, combined questions). Set needs_action \
to true only when the user asks for a deliverable such as an email draft, \
a checklist, or a summary.

Question:
{query}"
		);
		let messages = [
			json!({ "role": "system", "content": "You classify employee handbook questions." }),
			json!({ "role": "user", "content": prompt }),
		];
		let raw = self
			.providers
			.generation
			.generate(&self.cfg.providers.generation, &messages)
			.await?;

		Ok(intent::parse_classification(&raw, intents))
	}
}
