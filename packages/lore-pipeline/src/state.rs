use serde::{Deserialize, Serialize};

use lore_domain::{document::Document, intent::IntentClassification};
use lore_storage::history::Turn;

/// Groundedness verdict for one generated answer.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Verification {
	pub is_grounded: bool,
	pub confidence: u8,
	pub issues: Vec<String>,
}

/// Everything one user turn accumulates while it walks the graph. Created
/// at request entry, owned exclusively by the orchestrator, and discarded
/// at completion; only the answered turn outlives it, in history.
#[derive(Debug)]
pub struct RequestState {
	pub user_query: String,
	pub thread_id: String,
	pub history: Vec<Turn>,
	pub classification: Option<IntentClassification>,
	pub rewritten_query: Option<String>,
	pub retrieved_docs: Vec<Document>,
	pub primary_collection: Option<String>,
	pub reranked_docs: Vec<Document>,
	pub compressed_context: Option<String>,
	pub answer: Option<String>,
	pub verification: Option<Verification>,
	pub retry_count: u32,
	pub max_retries: u32,
	pub action_output: Option<String>,
	pub stream_log: Vec<String>,
}
impl RequestState {
	pub fn new(user_query: String, thread_id: String, max_retries: u32) -> Self {
		Self {
			user_query,
			thread_id,
			history: Vec::new(),
			classification: None,
			rewritten_query: None,
			retrieved_docs: Vec::new(),
			primary_collection: None,
			reranked_docs: Vec::new(),
			compressed_context: None,
			answer: None,
			verification: None,
			retry_count: 0,
			max_retries,
			action_output: None,
			stream_log: Vec::new(),
		}
	}

	/// The query used for retrieval and reranking: the rewrite when one
	/// exists, the raw user query otherwise.
	pub fn retrieval_query(&self) -> &str {
		self.rewritten_query.as_deref().unwrap_or(self.user_query.as_str())
	}

	pub fn log_step(&mut self, message: impl Into<String>) {
		let message = message.into();

		tracing::debug!(step = %message, "Pipeline step.");

		self.stream_log.push(message);
	}
}
