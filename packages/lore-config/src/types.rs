use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	#[serde(default)]
	pub retrieval: Retrieval,
	#[serde(default)]
	pub rerank: Rerank,
	#[serde(default)]
	pub compress: Compress,
	#[serde(default)]
	pub verify: Verify,
	#[serde(default)]
	pub pipeline: Pipeline,
	#[serde(default)]
	pub intents: Intents,
	#[serde(default)]
	pub security: Security,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub qdrant: Qdrant,
	pub history: History,
}

#[derive(Debug, Deserialize)]
pub struct Qdrant {
	pub url: String,
	pub collection: String,
	pub vector_dim: u32,
}

#[derive(Debug, Deserialize)]
pub struct History {
	pub path: String,
	#[serde(default = "default_history_max_turns")]
	pub max_turns: u32,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
	pub rerank: ProviderConfig,
	pub generation: GenerationProviderConfig,
}

#[derive(Debug, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct ProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct GenerationProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub temperature: f32,
	pub max_output_tokens: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Retrieval {
	pub k_dense: u32,
	pub k_lexical: u32,
	pub multihop_k: u32,
	pub retry_k: u32,
	pub bm25_k1: f32,
	pub bm25_b: f32,
	pub multihop_triggers: Vec<MultihopTrigger>,
}
impl Default for Retrieval {
	fn default() -> Self {
		Self {
			k_dense: 10,
			k_lexical: 10,
			multihop_k: 12,
			retry_k: 12,
			bm25_k1: 1.5,
			bm25_b: 0.75,
			multihop_triggers: default_multihop_triggers(),
		}
	}
}

#[derive(Clone, Debug, Deserialize)]
pub struct MultihopTrigger {
	pub contains: String,
	pub term: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Rerank {
	pub top_n: u32,
}
impl Default for Rerank {
	fn default() -> Self {
		Self { top_n: 6 }
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Compress {
	pub max_docs: u32,
	pub top_sentences: u32,
	pub min_sentence_chars: u32,
	pub fallback_docs: u32,
	pub fallback_chars: u32,
}
impl Default for Compress {
	fn default() -> Self {
		Self {
			max_docs: 6,
			top_sentences: 18,
			min_sentence_chars: 25,
			fallback_docs: 3,
			fallback_chars: 600,
		}
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Verify {
	pub grounded_floor: u8,
	pub weak_similarity_floor: u8,
	pub empty_context_confidence: u8,
	pub parse_failed_confidence: u8,
}
impl Default for Verify {
	fn default() -> Self {
		Self {
			grounded_floor: 60,
			weak_similarity_floor: 55,
			empty_context_confidence: 10,
			parse_failed_confidence: 30,
		}
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Pipeline {
	pub max_retries: u32,
	pub retry_suffix: String,
}
impl Default for Pipeline {
	fn default() -> Self {
		Self { max_retries: 1, retry_suffix: "handbook policy rules".to_string() }
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Intents {
	pub fallback: String,
	pub labels: Vec<IntentLabel>,
}
impl Default for Intents {
	fn default() -> Self {
		Self { fallback: "general_policy".to_string(), labels: default_intent_labels() }
	}
}

#[derive(Clone, Debug, Deserialize)]
pub struct IntentLabel {
	pub name: String,
	pub description: String,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Security {
	pub bind_localhost_only: bool,
}
impl Default for Security {
	fn default() -> Self {
		Self { bind_localhost_only: true }
	}
}

fn default_history_max_turns() -> u32 {
	30
}

fn default_multihop_triggers() -> Vec<MultihopTrigger> {
	[
		("probation", "probation"),
		("notice period", "notice period"),
		("termination", "termination"),
		("leave", "leave policy"),
	]
	.into_iter()
	.map(|(contains, term)| MultihopTrigger {
		contains: contains.to_string(),
		term: term.to_string(),
	})
	.collect()
}

fn default_intent_labels() -> Vec<IntentLabel> {
	[
		("leave_policy", "questions about leave, holidays, sick leave, casual leave, earned leave"),
		("benefits", "questions about employee benefits, insurance, allowances, perks"),
		("payroll", "questions about salary, payroll, payslip, deductions, PF, taxes"),
		("resignation", "questions about resignation process, exit, handover, final settlement"),
		("notice_period", "questions about notice period, serving notice, buyout"),
		("probation", "questions about probation period, confirmation, performance review"),
		("wfh_policy", "questions about work from home, remote work, hybrid policy"),
		("code_of_conduct", "questions about employee behavior, discipline, ethics, harassment"),
		("termination", "questions about termination, dismissal, misconduct, termination rules"),
		("grievance", "questions about grievance process, complaints, reporting issues"),
		("travel_policy", "questions about travel reimbursement, travel policy, expenses, claims"),
		("general_policy", "general handbook questions"),
	]
	.into_iter()
	.map(|(name, description)| IntentLabel {
		name: name.to_string(),
		description: description.to_string(),
	})
	.collect()
}
