use crate::{
	PipelineService, Result,
	state::{RequestState, Verification},
};
use lore_domain::handbook::{filter_by_collection, primary_collection};

/// The pipeline's states. Every request walks understand → … → verify;
/// verify routes to retry (bounded), action, or end.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Stage {
	Understand,
	Rewrite,
	Retrieve,
	Multihop,
	Rerank,
	Compress,
	Answer,
	Verify,
	Retry,
	Action,
	End,
}
impl Stage {
	pub fn label(self) -> &'static str {
		match self {
			Self::Understand => "understand",
			Self::Rewrite => "rewrite",
			Self::Retrieve => "retrieve",
			Self::Multihop => "multihop",
			Self::Rerank => "rerank",
			Self::Compress => "compress",
			Self::Answer => "answer",
			Self::Verify => "verify",
			Self::Retry => "retry",
			Self::Action => "action",
			Self::End => "end",
		}
	}
}

/// The conditional edge out of verify. The strict `retry_count <
/// max_retries` comparison is the retry loop's only termination guard;
/// weakening it to `<=` would loop forever on persistently weak answers.
pub fn route_after_verify(
	verification: &Verification,
	needs_action: bool,
	retry_count: u32,
	max_retries: u32,
	grounded_floor: u8,
) -> Stage {
	if verification.confidence < grounded_floor && retry_count < max_retries {
		return Stage::Retry;
	}
	if needs_action {
		return Stage::Action;
	}

	Stage::End
}

impl PipelineService {
	pub(crate) async fn run_pipeline(&self, state: &mut RequestState) -> Result<()> {
		let mut stage = Stage::Understand;

		while stage != Stage::End {
			tracing::debug!(stage = stage.label(), "Entering stage.");

			stage = self.step(stage, state).await?;
		}

		Ok(())
	}

	async fn step(&self, stage: Stage, state: &mut RequestState) -> Result<Stage> {
		match stage {
			Stage::Understand => {
				self.understand(state).await?;

				Ok(Stage::Rewrite)
			},
			Stage::Rewrite => {
				self.rewrite(state).await?;

				Ok(Stage::Retrieve)
			},
			Stage::Retrieve => {
				self.retrieve(state).await?;

				Ok(Stage::Multihop)
			},
			Stage::Multihop => {
				self.multihop(state).await?;
				self.resolve_handbook(state);

				Ok(Stage::Rerank)
			},
			Stage::Rerank => {
				self.rerank(state).await?;

				Ok(Stage::Compress)
			},
			Stage::Compress => {
				self.compress(state).await?;

				Ok(Stage::Answer)
			},
			Stage::Answer => {
				self.answer(state).await?;

				Ok(Stage::Verify)
			},
			Stage::Verify => {
				self.verify(state).await?;

				Ok(self.route(state))
			},
			Stage::Retry => {
				self.retry(state).await?;

				Ok(Stage::Verify)
			},
			Stage::Action => {
				self.action(state).await?;

				Ok(Stage::End)
			},
			Stage::End => Ok(Stage::End),
		}
	}

	fn route(&self, state: &RequestState) -> Stage {
		let fallback = Verification { is_grounded: false, confidence: 0, issues: Vec::new() };
		let verification = state.verification.as_ref().unwrap_or(&fallback);
		let needs_action = state
			.classification
			.as_ref()
			.map(|classification| classification.needs_action)
			.unwrap_or(false);

		route_after_verify(
			verification,
			needs_action,
			state.retry_count,
			state.max_retries,
			self.cfg.verify.grounded_floor,
		)
	}

	/// One semantic retry for weakly grounded answers: boosted query, wider
	/// retrieval, then the rerank → compress → answer tail again. The
	/// replaced state fields feed straight back into verify.
	async fn retry(&self, state: &mut RequestState) -> Result<()> {
		state.retry_count += 1;

		let boosted = format!("{} {}", state.user_query, self.cfg.pipeline.retry_suffix);

		state.log_step(format!("retry: attempt {} with boosted query", state.retry_count));

		let k = self.cfg.retrieval.retry_k;
		let docs = self.hybrid_retrieve(&boosted, k, k).await?;
		let (primary, _) = primary_collection(&docs);
		let docs = filter_by_collection(docs, &primary);
		let docs = self.rerank_docs(&boosted, docs, self.cfg.rerank.top_n).await?;
		let compressed = self.compress_docs(&state.user_query, &docs).await?;
		let answer = self.answer_docs(&state.user_query, &compressed, &docs, &state.history).await?;

		state.primary_collection = Some(primary);
		state.reranked_docs = docs;
		state.compressed_context = Some(compressed);
		state.answer = Some(answer);

		Ok(())
	}
}
