use std::collections::HashSet;

use crate::{PipelineService, Result, state::RequestState};
use lore_domain::{document::merge_dedup, intent::RetrievalStrategy};

// Trigger scanning only inspects the head of the first pass; deeper hits
// rarely change the expansion and would widen the query with noise.
const TRIGGER_SCAN_DOCS: usize = 3;

impl PipelineService {
	/// Second retrieval hop for multi-hop queries: trigger substrings found
	/// in the first-pass head contribute expansion terms, the expanded
	/// query runs through hybrid retrieval with wider k, and both passes
	/// merge first-pass-first with identity-key dedup.
	pub(crate) async fn multihop(&self, state: &mut RequestState) -> Result<()> {
		let strategy = state
			.classification
			.as_ref()
			.map(|classification| classification.retrieval_strategy)
			.unwrap_or(RetrievalStrategy::SingleHop);

		if strategy != RetrievalStrategy::MultiHop {
			return Ok(());
		}

		let terms = self.expansion_terms(state);
		// A triggerless expansion still carries the trailing space and must
		// retrieve at least as well as the first pass.
		let expanded = format!("{} {}", state.retrieval_query(), terms.join(" "));
		let k = self.cfg.retrieval.multihop_k;
		let second_pass = self.hybrid_retrieve(&expanded, k, k).await?;
		let first_pass = std::mem::take(&mut state.retrieved_docs);
		let merged = merge_dedup(first_pass.into_iter().chain(second_pass));

		state.log_step(format!(
			"multihop: expanded with {:?}, {} candidates after merge",
			terms,
			merged.len(),
		));

		state.retrieved_docs = merged;

		Ok(())
	}

	fn expansion_terms(&self, state: &RequestState) -> Vec<String> {
		let mut seen = HashSet::new();
		let mut terms = Vec::new();

		for doc in state.retrieved_docs.iter().take(TRIGGER_SCAN_DOCS) {
			let text = doc.content.to_lowercase();

			for trigger in &self.cfg.retrieval.multihop_triggers {
				if text.contains(&trigger.contains) && seen.insert(trigger.term.clone()) {
					terms.push(trigger.term.clone());
				}
			}
		}

		terms
	}
}
