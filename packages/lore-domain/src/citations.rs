use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

use crate::document::Document;

pub const SOURCES_HEADER: &str = "Sources:";

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Source {
	pub id: u64,
	pub text: String,
}

/// Citation enumeration handed to the answer prompt, 1-indexed in document
/// input order.
pub fn format_citations(docs: &[Document]) -> Vec<String> {
	docs.iter()
		.enumerate()
		.map(|(idx, doc)| {
			format!(
				"[{}] {} (page {}, chunk {})",
				idx + 1,
				doc.source_collection,
				doc.page,
				doc.chunk_index,
			)
		})
		.collect()
}

/// Parses the trailing citation section of an answer. Lines after the first
/// "Sources:" marker matching `[<integer>] <rest>` become sources; anything
/// else is dropped silently.
pub fn parse_sources(answer: &str) -> Vec<Source> {
	let Some(position) = answer.find(SOURCES_HEADER) else { return Vec::new() };
	let after = &answer[position + SOURCES_HEADER.len()..];
	let mut out = Vec::new();

	for line in after.lines() {
		let line = line.trim();

		if line.is_empty() {
			continue;
		}

		let Some(captures) = source_line_regex().captures(line) else { continue };
		let Ok(id) = captures[1].parse::<u64>() else { continue };

		out.push(Source { id, text: captures[2].trim().to_string() });
	}

	out
}

fn source_line_regex() -> &'static Regex {
	static SOURCE_LINE: OnceLock<Regex> = OnceLock::new();

	SOURCE_LINE.get_or_init(|| Regex::new(r"^\[(\d+)\]\s+(.*)$").expect("Source regex is valid."))
}
