use std::collections::{HashMap, HashSet};

use crate::rerank::cmp_f32_desc;
use lore_domain::document::Document;

/// BM25 term-frequency index over one corpus snapshot. Tokens are
/// whitespace-split and case-folded; the index is rebuilt from a fresh
/// snapshot on every retrieval call.
pub struct LexicalIndex {
	k1: f32,
	b: f32,
	term_frequencies: Vec<HashMap<String, f32>>,
	document_lengths: Vec<f32>,
	document_frequency: HashMap<String, u32>,
	average_length: f32,
}
impl LexicalIndex {
	pub fn build(corpus: &[Document], k1: f32, b: f32) -> Self {
		let mut term_frequencies = Vec::with_capacity(corpus.len());
		let mut document_lengths = Vec::with_capacity(corpus.len());
		let mut document_frequency: HashMap<String, u32> = HashMap::new();

		for doc in corpus {
			let tokens = tokenize(&doc.content);
			let mut frequencies: HashMap<String, f32> = HashMap::new();
			let mut seen = HashSet::new();

			for token in &tokens {
				*frequencies.entry(token.clone()).or_insert(0.0) += 1.0;

				if seen.insert(token.clone()) {
					*document_frequency.entry(token.clone()).or_insert(0) += 1;
				}
			}

			document_lengths.push(tokens.len() as f32);
			term_frequencies.push(frequencies);
		}

		let total_length: f32 = document_lengths.iter().sum();
		let average_length = if document_lengths.is_empty() {
			0.0
		} else {
			total_length / document_lengths.len() as f32
		};

		Self { k1, b, term_frequencies, document_lengths, document_frequency, average_length }
	}

	/// One BM25 score per corpus document, aligned with build order.
	pub fn scores(&self, query: &str) -> Vec<f32> {
		let query_tokens = tokenize(query);
		let doc_count = self.term_frequencies.len() as f32;
		let average_length = self.average_length.max(f32::EPSILON);

		self.term_frequencies
			.iter()
			.zip(&self.document_lengths)
			.map(|(frequencies, length)| {
				let length_norm = self.k1 * (1.0 - self.b + self.b * length / average_length);

				query_tokens
					.iter()
					.map(|token| {
						let tf = frequencies.get(token).copied().unwrap_or(0.0);

						if tf <= 0.0 {
							return 0.0;
						}

						let df =
							self.document_frequency.get(token).copied().unwrap_or(0) as f32;
						let idf = ((doc_count - df + 0.5) / (df + 0.5) + 1.0).ln();

						idf * tf * (self.k1 + 1.0) / (tf + length_norm)
					})
					.sum()
			})
			.collect()
	}

	/// The k best-scoring documents, score-descending with ties kept in
	/// corpus order. Zero-score documents pad the tail when fewer than k
	/// documents match, mirroring plain top-k over the score array.
	pub fn top_k(&self, query: &str, corpus: &[Document], k: usize) -> Vec<Document> {
		let scores = self.scores(query);
		let mut order: Vec<usize> = (0..corpus.len()).collect();

		order.sort_by(|left, right| {
			cmp_f32_desc(scores[*left], scores[*right]).then_with(|| left.cmp(right))
		});
		order.truncate(k);

		order.into_iter().map(|idx| corpus[idx].clone()).collect()
	}
}

fn tokenize(text: &str) -> Vec<String> {
	text.split_whitespace().map(|token| token.to_lowercase()).collect()
}
