use lore_domain::{
	citations,
	document::{Document, merge_dedup},
	handbook::{self, UNKNOWN_COLLECTION},
	intent::{self, RetrievalStrategy},
	sentences,
};

fn doc(collection: &str, page: i64, chunk_index: i64, content: &str) -> Document {
	Document {
		content: content.to_string(),
		source_collection: collection.to_string(),
		page,
		chunk_index,
	}
}

#[test]
fn merged_candidates_resolve_and_cite_consistently() {
	let merged = merge_dedup([
		doc("hr_handbook", 3, 0, "Employees accrue eighteen days of paid leave every year."),
		doc("it_handbook", 7, 0, "IT staff follow the pilot leave program."),
		doc("hr_handbook", 3, 0, "duplicate of the first chunk"),
		doc("hr_handbook", 3, 1, "Leave requests need manager approval two days ahead."),
	]);

	assert_eq!(merged.len(), 3);

	let (primary, _) = handbook::primary_collection(&merged);
	let filtered = handbook::filter_by_collection(merged, &primary);

	assert_eq!(primary, "hr_handbook");
	assert_eq!(filtered.len(), 2);

	let lines = citations::format_citations(&filtered);

	assert_eq!(lines, vec![
		"[1] hr_handbook (page 3, chunk 0)".to_string(),
		"[2] hr_handbook (page 3, chunk 1)".to_string(),
	]);
}

#[test]
fn citation_round_trip_survives_answer_formatting() {
	let docs = vec![
		doc("hr_handbook", 3, 0, "text"),
		doc("hr_handbook", 3, 1, "text"),
	];
	let answer = format!(
		"Leave accrues monthly.\n\nSources:\n{}",
		citations::format_citations(&docs).join("\n"),
	);
	let sources = citations::parse_sources(&answer);

	assert_eq!(sources.len(), 2);
	assert_eq!(sources[1].text, "hr_handbook (page 3, chunk 1)");
}

#[test]
fn unknown_collection_disables_filtering() {
	let docs = vec![doc(UNKNOWN_COLLECTION, 1, 0, "a"), doc(UNKNOWN_COLLECTION, 1, 1, "b")];
	let (primary, _) = handbook::primary_collection(&docs);

	assert_eq!(primary, UNKNOWN_COLLECTION);
	assert_eq!(handbook::filter_by_collection(docs.clone(), &primary), docs);
}

#[test]
fn sentence_splitting_feeds_compression_sized_fragments() {
	let content = "Short. Employees accrue eighteen days of paid leave every calendar year. \
	               Unused leave lapses at the end of March without exception.";
	let split = sentences::split_sentences(content, 25);

	assert_eq!(split.len(), 2);
	assert!(split.iter().all(|sentence| sentence.chars().count() > 25));
}

#[test]
fn classification_parsing_defaults_are_single_hop_and_inert() {
	let intents = lore_config::Intents::default();
	let parsed = intent::parse_classification("{}", &intents);

	assert_eq!(parsed.intent, intents.fallback);
	assert_eq!(parsed.retrieval_strategy, RetrievalStrategy::SingleHop);
	assert!(!parsed.needs_action);
}
