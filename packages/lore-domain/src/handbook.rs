use crate::document::Document;

/// Sentinel used when chunks carry no collection metadata. Filtering by it
/// is a no-op.
pub const UNKNOWN_COLLECTION: &str = "unknown";

/// Finds the dominant source collection among the documents. Ties break to
/// the collection encountered first, and the per-collection distribution is
/// reported in first-encounter order.
pub fn primary_collection(docs: &[Document]) -> (String, Vec<(String, usize)>) {
	let mut distribution: Vec<(String, usize)> = Vec::new();

	for doc in docs {
		match distribution.iter_mut().find(|(name, _)| name == &doc.source_collection) {
			Some((_, count)) => *count += 1,
			None => distribution.push((doc.source_collection.clone(), 1)),
		}
	}

	let Some(mut primary) = distribution.first().map(|(name, _)| name.clone()) else {
		return (UNKNOWN_COLLECTION.to_string(), distribution);
	};
	let mut best = 0_usize;

	for (name, count) in &distribution {
		if *count > best {
			best = *count;
			primary = name.clone();
		}
	}

	(primary, distribution)
}

/// Keeps only documents belonging to the primary collection so one answer
/// never blends policy text from two handbooks. The "unknown" sentinel
/// passes everything through.
pub fn filter_by_collection(docs: Vec<Document>, primary: &str) -> Vec<Document> {
	if primary == UNKNOWN_COLLECTION {
		return docs;
	}

	docs.into_iter().filter(|doc| doc.source_collection == primary).collect()
}
