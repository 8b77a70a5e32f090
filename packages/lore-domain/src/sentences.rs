use std::sync::OnceLock;

use regex::Regex;
use unicode_segmentation::UnicodeSegmentation;

/// Collapses whitespace runs to single spaces and trims the ends.
pub fn normalize_whitespace(text: &str) -> String {
	static WHITESPACE: OnceLock<Regex> = OnceLock::new();

	let pattern = WHITESPACE.get_or_init(|| Regex::new(r"\s+").expect("Whitespace regex is valid."));

	pattern.replace_all(text, " ").trim().to_string()
}

/// Splits normalized text into sentences at sentence-ending punctuation
/// followed by whitespace. Sentences at or below `min_chars` characters are
/// discarded as fragment noise.
pub fn split_sentences(text: &str, min_chars: usize) -> Vec<String> {
	let normalized = normalize_whitespace(text);
	let mut out = Vec::new();
	let mut start = 0_usize;
	let mut chars = normalized.char_indices().peekable();

	while let Some((idx, ch)) = chars.next() {
		let ends_sentence = matches!(ch, '.' | '!' | '?')
			&& chars.peek().map(|(_, next)| next.is_whitespace()).unwrap_or(false);

		if ends_sentence {
			push_sentence(&normalized[start..=idx], min_chars, &mut out);

			start = idx + ch.len_utf8();
		}
	}

	if start < normalized.len() {
		push_sentence(&normalized[start..], min_chars, &mut out);
	}

	out
}

/// Grapheme-safe prefix of at most `max_graphemes` clusters, used for the
/// compressor's raw-excerpt fallback.
pub fn excerpt(text: &str, max_graphemes: usize) -> String {
	text.graphemes(true).take(max_graphemes).collect()
}

fn push_sentence(raw: &str, min_chars: usize, out: &mut Vec<String>) {
	let trimmed = raw.trim();

	if trimmed.chars().count() > min_chars {
		out.push(trimmed.to_string());
	}
}
