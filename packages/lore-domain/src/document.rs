use std::collections::HashSet;

use serde::{Deserialize, Serialize};

/// One retrievable chunk of handbook text. Identity is
/// (source_collection, page, chunk_index); two documents sharing that key
/// are duplicates and must not survive a merge together.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Document {
	pub content: String,
	pub source_collection: String,
	pub page: i64,
	pub chunk_index: i64,
}
impl Document {
	pub fn identity_key(&self) -> DocumentKey {
		DocumentKey {
			source_collection: self.source_collection.clone(),
			page: self.page,
			chunk_index: self.chunk_index,
		}
	}
}

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct DocumentKey {
	pub source_collection: String,
	pub page: i64,
	pub chunk_index: i64,
}

/// Merges document sequences keeping the first occurrence of each identity
/// key, in input order.
pub fn merge_dedup<I>(docs: I) -> Vec<Document>
where
	I: IntoIterator<Item = Document>,
{
	let mut seen = HashSet::new();
	let mut out = Vec::new();

	for doc in docs {
		if seen.insert(doc.identity_key()) {
			out.push(doc);
		}
	}

	out
}
