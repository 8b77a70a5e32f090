use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
	Error, PipelineService, Result,
	state::{RequestState, Verification},
};
use lore_domain::citations::{self, Source};
use lore_storage::history::Turn;

// How many past turns the answer prompt sees. History itself keeps more;
// this only bounds the prompt.
const HISTORY_CONTEXT_TURNS: usize = 4;

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
	pub query: String,
	#[serde(default = "default_thread_id")]
	pub thread_id: String,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
	pub answer: String,
	pub confidence: u8,
	pub is_grounded: bool,
	pub issues: Vec<String>,
	pub action_output: Option<String>,
	pub intent: String,
	pub rewritten_query: String,
	pub sources: Vec<Source>,
	pub stream_log: Vec<String>,
}

impl PipelineService {
	/// One full user turn: validate, walk the graph, derive the response,
	/// and append the answered turn to history. The append is the only
	/// shared-state effect, so aborting anywhere earlier never corrupts
	/// anything.
	pub async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
		if request.query.trim().is_empty() {
			return Err(Error::InvalidRequest {
				message: "query must be non-empty.".to_string(),
			});
		}

		let mut state = RequestState::new(
			request.query,
			request.thread_id,
			self.cfg.pipeline.max_retries,
		);

		let history = self.history.recent(&state.thread_id, HISTORY_CONTEXT_TURNS).await?;

		state.history = history;

		self.run_pipeline(&mut state).await?;

		let answer = state.answer.clone().unwrap_or_default();
		let verification = state.verification.clone().unwrap_or(Verification {
			is_grounded: false,
			confidence: 0,
			issues: Vec::new(),
		});
		let sources = citations::parse_sources(&answer);
		let turn = Turn {
			user: state.user_query.clone(),
			assistant: answer.clone(),
			recorded_at: OffsetDateTime::now_utc(),
		};

		self.history.append(&state.thread_id, turn).await?;

		Ok(ChatResponse {
			answer,
			confidence: verification.confidence,
			is_grounded: verification.is_grounded,
			issues: verification.issues,
			action_output: state.action_output,
			intent: state
				.classification
				.map(|classification| classification.intent)
				.unwrap_or_else(|| self.cfg.intents.fallback.clone()),
			rewritten_query: state.rewritten_query.unwrap_or_default(),
			sources,
			stream_log: state.stream_log,
		})
	}
}

fn default_thread_id() -> String {
	"default_thread".to_string()
}
