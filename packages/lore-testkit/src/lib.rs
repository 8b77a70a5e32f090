//! Deterministic in-process fakes for the pipeline's capability traits.
//! No network, no clock, no randomness: a token-hash embedder whose cosine
//! tracks shared vocabulary, a token-overlap relevance scorer, a scripted
//! generator, a brute-force static corpus, and an in-memory history store.

use std::{
	collections::{BTreeMap, HashSet, VecDeque},
	sync::Mutex,
};

use color_eyre::eyre;
use serde_json::{Map, Value};

use lore_config::{
	Compress, Config, EmbeddingProviderConfig, GenerationProviderConfig, History, Intents,
	Pipeline, ProviderConfig, Providers as ProviderSettings, Qdrant, Rerank, Retrieval, Security,
	Service, Storage, Verify,
};
use lore_domain::{document::Document, similarity::cosine};
use lore_pipeline::{BoxFuture, CorpusIndex, Embedder, Generator, HistoryStore, RelevanceScorer};
use lore_storage::history::Turn;

pub const TEST_VECTOR_DIM: u32 = 256;

/// Full config wired for the fakes: 256-dim vectors, default tuning.
pub fn test_config() -> Config {
	Config {
		service: Service {
			http_bind: "127.0.0.1:0".to_string(),
			log_level: "info".to_string(),
		},
		storage: Storage {
			qdrant: Qdrant {
				url: "http://127.0.0.1:6334".to_string(),
				collection: "company_handbooks".to_string(),
				vector_dim: TEST_VECTOR_DIM,
			},
			history: History { path: "unused/chat_memory.json".to_string(), max_turns: 30 },
		},
		providers: ProviderSettings {
			embedding: EmbeddingProviderConfig {
				provider_id: "fake".to_string(),
				api_base: "http://embedding.invalid".to_string(),
				api_key: "test-key".to_string(),
				path: "/v1/embeddings".to_string(),
				model: "hash-bag".to_string(),
				dimensions: TEST_VECTOR_DIM,
				timeout_ms: 1_000,
				default_headers: Map::new(),
			},
			rerank: ProviderConfig {
				provider_id: "fake".to_string(),
				api_base: "http://rerank.invalid".to_string(),
				api_key: "test-key".to_string(),
				path: "/v1/rerank".to_string(),
				model: "overlap".to_string(),
				timeout_ms: 1_000,
				default_headers: Map::new(),
			},
			generation: GenerationProviderConfig {
				provider_id: "fake".to_string(),
				api_base: "http://generation.invalid".to_string(),
				api_key: "test-key".to_string(),
				path: "/v1/chat/completions".to_string(),
				model: "scripted".to_string(),
				temperature: 0.2,
				max_output_tokens: 1_024,
				timeout_ms: 1_000,
				default_headers: Map::new(),
			},
		},
		retrieval: Retrieval::default(),
		rerank: Rerank::default(),
		compress: Compress::default(),
		verify: Verify::default(),
		pipeline: Pipeline::default(),
		intents: Intents::default(),
		security: Security::default(),
	}
}

pub fn handbook_doc(collection: &str, page: i64, chunk_index: i64, content: &str) -> Document {
	Document {
		content: content.to_string(),
		source_collection: collection.to_string(),
		page,
		chunk_index,
	}
}

/// Bag-of-words embedding over FNV-hashed tokens. Texts sharing vocabulary
/// land in shared buckets, so cosine similarity rises with token overlap.
pub struct HashEmbedder;
impl Embedder for HashEmbedder {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>> {
		Box::pin(async move {
			Ok(texts
				.iter()
				.map(|text| hash_embedding(text, cfg.dimensions as usize))
				.collect())
		})
	}
}

pub fn hash_embedding(text: &str, dimensions: usize) -> Vec<f32> {
	let mut vector = vec![0.0_f32; dimensions];

	for token in tokens(text) {
		vector[bucket(&token, dimensions)] += 1.0;
	}

	vector
}

/// Relevance = fraction of query tokens present in the document.
pub struct OverlapScorer;
impl RelevanceScorer for OverlapScorer {
	fn score<'a>(
		&'a self,
		_cfg: &'a ProviderConfig,
		query: &'a str,
		docs: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<f32>>> {
		Box::pin(async move {
			let query_tokens: Vec<String> = tokens(query).collect();

			Ok(docs.iter().map(|doc| overlap_ratio(&query_tokens, doc)).collect())
		})
	}
}

/// Replays canned replies in call order; running out is an error so a test
/// notices an unexpected extra generation call.
pub struct ScriptedGenerator {
	replies: Mutex<VecDeque<String>>,
}
impl ScriptedGenerator {
	pub fn new<I, S>(replies: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: Into<String>,
	{
		Self {
			replies: Mutex::new(replies.into_iter().map(Into::into).collect()),
		}
	}

	pub fn remaining(&self) -> usize {
		self.replies.lock().unwrap_or_else(|err| err.into_inner()).len()
	}
}
impl Generator for ScriptedGenerator {
	fn generate<'a>(
		&'a self,
		_cfg: &'a GenerationProviderConfig,
		_messages: &'a [Value],
	) -> BoxFuture<'a, color_eyre::Result<String>> {
		Box::pin(async move {
			self.replies
				.lock()
				.unwrap_or_else(|err| err.into_inner())
				.pop_front()
				.ok_or_else(|| eyre::eyre!("Scripted generator ran out of replies."))
		})
	}
}

/// Always fails, for asserting that a code path never touches the
/// embedding service (short-circuits) or that an embedding outage surfaces
/// as a request-level error.
pub struct FailingEmbedder;
impl Embedder for FailingEmbedder {
	fn embed<'a>(
		&'a self,
		_cfg: &'a EmbeddingProviderConfig,
		_texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>> {
		Box::pin(async move { Err(eyre::eyre!("Embedding service is unreachable.")) })
	}
}

/// Always fails, for asserting that infrastructure failures surface as
/// request-level errors instead of low-confidence answers.
pub struct FailingGenerator;
impl Generator for FailingGenerator {
	fn generate<'a>(
		&'a self,
		_cfg: &'a GenerationProviderConfig,
		_messages: &'a [Value],
	) -> BoxFuture<'a, color_eyre::Result<String>> {
		Box::pin(async move { Err(eyre::eyre!("Generation service is unreachable.")) })
	}
}

/// In-memory corpus with brute-force cosine search against hash embeddings.
pub struct StaticCorpus {
	docs: Vec<Document>,
}
impl StaticCorpus {
	pub fn new(docs: Vec<Document>) -> Self {
		Self { docs }
	}
}
impl CorpusIndex for StaticCorpus {
	fn search<'a>(
		&'a self,
		vector: Vec<f32>,
		k: u64,
	) -> BoxFuture<'a, lore_storage::Result<Vec<Document>>> {
		Box::pin(async move {
			let mut scored: Vec<(usize, f32)> = self
				.docs
				.iter()
				.enumerate()
				.map(|(idx, doc)| {
					let embedding = hash_embedding(&doc.content, vector.len());

					(idx, cosine(&vector, &embedding))
				})
				.collect();

			scored.sort_by(|left, right| {
				right.1.partial_cmp(&left.1).unwrap_or(std::cmp::Ordering::Equal)
			});
			scored.truncate(k as usize);

			Ok(scored.into_iter().map(|(idx, _)| self.docs[idx].clone()).collect())
		})
	}

	fn all_documents<'a>(&'a self) -> BoxFuture<'a, lore_storage::Result<Vec<Document>>> {
		Box::pin(async move { Ok(self.docs.clone()) })
	}
}

/// Thread-partitioned history in memory, for asserting appended turns.
#[derive(Default)]
pub struct MemoryHistory {
	threads: Mutex<BTreeMap<String, Vec<Turn>>>,
}
impl MemoryHistory {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn turns(&self, thread_id: &str) -> Vec<Turn> {
		self.threads
			.lock()
			.unwrap_or_else(|err| err.into_inner())
			.get(thread_id)
			.cloned()
			.unwrap_or_default()
	}
}
impl HistoryStore for MemoryHistory {
	fn append<'a>(
		&'a self,
		thread_id: &'a str,
		turn: Turn,
	) -> BoxFuture<'a, lore_storage::Result<()>> {
		Box::pin(async move {
			self.threads
				.lock()
				.unwrap_or_else(|err| err.into_inner())
				.entry(thread_id.to_string())
				.or_default()
				.push(turn);

			Ok(())
		})
	}

	fn recent<'a>(
		&'a self,
		thread_id: &'a str,
		limit: usize,
	) -> BoxFuture<'a, lore_storage::Result<Vec<Turn>>> {
		Box::pin(async move {
			let threads = self.threads.lock().unwrap_or_else(|err| err.into_inner());
			let turns = threads.get(thread_id).map(Vec::as_slice).unwrap_or_default();
			let start = turns.len().saturating_sub(limit);

			Ok(turns[start..].to_vec())
		})
	}
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
	text.split(|ch: char| !ch.is_alphanumeric())
		.filter(|token| !token.is_empty())
		.map(|token| token.to_lowercase())
}

fn bucket(token: &str, dimensions: usize) -> usize {
	let mut hash = 0xcbf2_9ce4_8422_2325_u64;

	for byte in token.bytes() {
		hash ^= u64::from(byte);
		hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
	}

	(hash % dimensions as u64) as usize
}

fn overlap_ratio(query_tokens: &[String], doc: &str) -> f32 {
	if query_tokens.is_empty() {
		return 0.0;
	}

	let doc_tokens: HashSet<String> = tokens(doc).collect();
	let matched = query_tokens.iter().filter(|token| doc_tokens.contains(*token)).count();

	matched as f32 / query_tokens.len() as f32
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn shared_vocabulary_raises_cosine() {
		let dim = TEST_VECTOR_DIM as usize;
		let a = hash_embedding("notice period before resignation", dim);
		let same = hash_embedding("the notice period for resignation", dim);
		let other = hash_embedding("cafeteria lunch menu hours", dim);

		assert!(cosine(&a, &same) > cosine(&a, &other));
	}

	#[test]
	fn overlap_ratio_counts_query_tokens() {
		let query: Vec<String> = tokens("notice period").collect();

		assert_eq!(overlap_ratio(&query, "a notice period applies"), 1.0);
		assert_eq!(overlap_ratio(&query, "notice only"), 0.5);
		assert_eq!(overlap_ratio(&query, "nothing relevant"), 0.0);
	}
}
