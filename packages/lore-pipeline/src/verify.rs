use crate::{PipelineService, Result, state::{RequestState, Verification}};
use lore_domain::{
	citations::SOURCES_HEADER,
	similarity::{confidence_from_similarity, cosine},
};

pub const ISSUE_NO_CONTEXT: &str = "no_context_found";
pub const ISSUE_MISSING_SOURCES: &str = "missing_sources_section";
pub const ISSUE_WEAK_GROUNDING: &str = "weak_grounding_similarity";
pub const ISSUE_PARSE_FAILED: &str = "parse_failed";

impl PipelineService {
	pub(crate) async fn verify(&self, state: &mut RequestState) -> Result<()> {
		let answer = state.answer.clone().unwrap_or_default();
		let context = state.compressed_context.clone().unwrap_or_default();
		let verification = self.verify_answer(&state.user_query, &answer, &context).await?;

		state.log_step(format!(
			"verify: confidence {} grounded {} issues {:?}",
			verification.confidence, verification.is_grounded, verification.issues,
		));

		state.verification = Some(verification);

		Ok(())
	}

	/// Aggregate groundedness approximation: semantic proximity of the
	/// whole answer to the whole context, never claim-by-claim. Empty
	/// context short-circuits without a scoring call; a structurally
	/// degraded scoring response degrades to the parse-failed verdict
	/// rather than failing the request.
	pub async fn verify_answer(
		&self,
		_query: &str,
		answer: &str,
		context: &str,
	) -> Result<Verification> {
		let cfg = &self.cfg.verify;

		if context.trim().is_empty() {
			return Ok(Verification {
				is_grounded: false,
				confidence: cfg.empty_context_confidence,
				issues: vec![ISSUE_NO_CONTEXT.to_string()],
			});
		}

		let mut issues = Vec::new();

		if !answer.contains(SOURCES_HEADER) {
			issues.push(ISSUE_MISSING_SOURCES.to_string());
		}

		let texts = [answer.to_string(), context.to_string()];
		let embeddings =
			self.providers.embedding.embed(&self.cfg.providers.embedding, &texts).await?;
		let vectors = match (embeddings.first(), embeddings.get(1)) {
			(Some(answer_vec), Some(context_vec))
				if !answer_vec.is_empty() && answer_vec.len() == context_vec.len() =>
				Some((answer_vec, context_vec)),
			_ => None,
		};
		let Some((answer_vec, context_vec)) = vectors else {
			tracing::warn!("Verifier similarity response is malformed; degrading.");

			return Ok(Verification {
				is_grounded: false,
				confidence: cfg.parse_failed_confidence,
				issues: vec![ISSUE_PARSE_FAILED.to_string()],
			});
		};
		let confidence = confidence_from_similarity(cosine(answer_vec, context_vec));

		if confidence < cfg.weak_similarity_floor {
			issues.push(ISSUE_WEAK_GROUNDING.to_string());
		}

		let is_grounded = confidence >= cfg.grounded_floor && issues.is_empty();

		Ok(Verification { is_grounded, confidence, issues })
	}
}
