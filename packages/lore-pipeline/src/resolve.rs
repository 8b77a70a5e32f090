use crate::{PipelineService, state::RequestState};
use lore_domain::handbook::{filter_by_collection, primary_collection};

impl PipelineService {
	/// Pins the request to its dominant handbook so no answer blends policy
	/// text from two collections. The "unknown" sentinel leaves the
	/// candidates untouched.
	pub(crate) fn resolve_handbook(&self, state: &mut RequestState) {
		let docs = std::mem::take(&mut state.retrieved_docs);
		let (primary, distribution) = primary_collection(&docs);

		state.log_step(format!(
			"resolve: primary handbook {primary:?} out of {} collections",
			distribution.len(),
		));

		state.retrieved_docs = filter_by_collection(docs, &primary);
		state.primary_collection = Some(primary);
	}
}
