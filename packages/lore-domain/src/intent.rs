use serde::{Deserialize, Serialize};
use serde_json::Value;

use lore_config::Intents;

#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RetrievalStrategy {
	SingleHop,
	MultiHop,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct IntentClassification {
	pub intent: String,
	pub retrieval_strategy: RetrievalStrategy,
	pub needs_action: bool,
}
impl IntentClassification {
	/// Safe default used whenever the classification response cannot be
	/// trusted: general intent, single hop, no deliverable.
	pub fn fallback(intents: &Intents) -> Self {
		Self {
			intent: intents.fallback.clone(),
			retrieval_strategy: RetrievalStrategy::SingleHop,
			needs_action: false,
		}
	}
}

/// Interprets the classification service's JSON reply. Every malformation
/// degrades field-by-field to the safe defaults; an intent outside the
/// configured label set degrades to the fallback label. This never fails.
pub fn parse_classification(raw: &str, intents: &Intents) -> IntentClassification {
	let Some(json) = extract_json_object(raw) else { return IntentClassification::fallback(intents) };
	let fallback = IntentClassification::fallback(intents);
	let intent = json
		.get("intent")
		.and_then(Value::as_str)
		.filter(|name| intents.labels.iter().any(|label| label.name == *name))
		.unwrap_or(fallback.intent.as_str())
		.to_string();
	let retrieval_strategy = match json.get("retrieval_strategy").and_then(Value::as_str) {
		Some("multi_hop") => RetrievalStrategy::MultiHop,
		Some("single_hop") => RetrievalStrategy::SingleHop,
		_ => fallback.retrieval_strategy,
	};
	let needs_action =
		json.get("needs_action").and_then(Value::as_bool).unwrap_or(fallback.needs_action);

	IntentClassification { intent, retrieval_strategy, needs_action }
}

fn extract_json_object(raw: &str) -> Option<Value> {
	let start = raw.find('{')?;
	let end = raw.rfind('}')?;

	if end < start {
		return None;
	}

	serde_json::from_str(&raw[start..=end]).ok().filter(Value::is_object)
}
