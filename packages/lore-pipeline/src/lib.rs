mod error;

pub mod action;
pub mod answer;
pub mod chat;
pub mod compress;
pub mod graph;
pub mod multihop;
pub mod rerank;
pub mod resolve;
pub mod retrieve;
pub mod rewrite;
pub mod state;
pub mod understand;
pub mod verify;

use std::{future::Future, pin::Pin, sync::Arc};

use serde_json::Value;

pub use answer::NOT_FOUND_ANSWER;
pub use chat::{ChatRequest, ChatResponse};
pub use error::{Error, Result};
pub use graph::{Stage, route_after_verify};
pub use state::{RequestState, Verification};

use lore_config::{Config, EmbeddingProviderConfig, GenerationProviderConfig, ProviderConfig};
use lore_domain::document::Document;
use lore_storage::history::Turn;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Embedding-similarity service: text in, vectors out.
pub trait Embedder
where
	Self: Send + Sync,
{
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>>;
}

/// Pairwise relevance scoring service used by the reranker.
pub trait RelevanceScorer
where
	Self: Send + Sync,
{
	fn score<'a>(
		&'a self,
		cfg: &'a ProviderConfig,
		query: &'a str,
		docs: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<f32>>>;
}

/// Text-generation service consumed by the understand, rewrite, answer, and
/// action stages.
pub trait Generator
where
	Self: Send + Sync,
{
	fn generate<'a>(
		&'a self,
		cfg: &'a GenerationProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, color_eyre::Result<String>>;
}

/// Corpus-snapshot service: dense top-k search plus full enumeration for
/// the lexical index.
pub trait CorpusIndex
where
	Self: Send + Sync,
{
	fn search<'a>(&'a self, vector: Vec<f32>, k: u64)
	-> BoxFuture<'a, lore_storage::Result<Vec<Document>>>;

	fn all_documents<'a>(&'a self) -> BoxFuture<'a, lore_storage::Result<Vec<Document>>>;
}

/// Conversation history with atomic, serialized appends.
pub trait HistoryStore
where
	Self: Send + Sync,
{
	fn append<'a>(
		&'a self,
		thread_id: &'a str,
		turn: Turn,
	) -> BoxFuture<'a, lore_storage::Result<()>>;

	fn recent<'a>(
		&'a self,
		thread_id: &'a str,
		limit: usize,
	) -> BoxFuture<'a, lore_storage::Result<Vec<Turn>>>;
}

#[derive(Clone)]
pub struct Providers {
	pub embedding: Arc<dyn Embedder>,
	pub rerank: Arc<dyn RelevanceScorer>,
	pub generation: Arc<dyn Generator>,
}
impl Providers {
	/// HTTP-backed providers from lore-providers.
	pub fn default_http() -> Self {
		Self {
			embedding: Arc::new(DefaultProviders),
			rerank: Arc::new(DefaultProviders),
			generation: Arc::new(DefaultProviders),
		}
	}
}

/// The answer pipeline. Owns nothing mutable across requests: the corpus
/// index is read-only, history serializes its own appends, and each request
/// threads its own [`RequestState`].
pub struct PipelineService {
	pub cfg: Config,
	pub index: Arc<dyn CorpusIndex>,
	pub history: Arc<dyn HistoryStore>,
	pub providers: Providers,
}
impl PipelineService {
	pub fn new(
		cfg: Config,
		index: Arc<dyn CorpusIndex>,
		history: Arc<dyn HistoryStore>,
		providers: Providers,
	) -> Self {
		Self { cfg, index, history, providers }
	}
}

struct DefaultProviders;

impl Embedder for DefaultProviders {
	fn embed<'a>(
		&'a self,
		cfg: &'a EmbeddingProviderConfig,
		texts: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<Vec<f32>>>> {
		Box::pin(lore_providers::embedding::embed(cfg, texts))
	}
}

impl RelevanceScorer for DefaultProviders {
	fn score<'a>(
		&'a self,
		cfg: &'a ProviderConfig,
		query: &'a str,
		docs: &'a [String],
	) -> BoxFuture<'a, color_eyre::Result<Vec<f32>>> {
		Box::pin(lore_providers::rerank::rerank(cfg, query, docs))
	}
}

impl Generator for DefaultProviders {
	fn generate<'a>(
		&'a self,
		cfg: &'a GenerationProviderConfig,
		messages: &'a [Value],
	) -> BoxFuture<'a, color_eyre::Result<String>> {
		Box::pin(lore_providers::generate::generate(cfg, messages))
	}
}

impl CorpusIndex for lore_storage::qdrant::QdrantStore {
	fn search<'a>(
		&'a self,
		vector: Vec<f32>,
		k: u64,
	) -> BoxFuture<'a, lore_storage::Result<Vec<Document>>> {
		Box::pin(self.search(vector, k))
	}

	fn all_documents<'a>(&'a self) -> BoxFuture<'a, lore_storage::Result<Vec<Document>>> {
		Box::pin(self.all_documents())
	}
}

impl HistoryStore for lore_storage::history::FileHistoryStore {
	fn append<'a>(
		&'a self,
		thread_id: &'a str,
		turn: Turn,
	) -> BoxFuture<'a, lore_storage::Result<()>> {
		Box::pin(self.append(thread_id, turn))
	}

	fn recent<'a>(
		&'a self,
		thread_id: &'a str,
		limit: usize,
	) -> BoxFuture<'a, lore_storage::Result<Vec<Turn>>> {
		Box::pin(self.recent(thread_id, limit))
	}
}

impl From<lore_storage::Error> for Error {
	fn from(err: lore_storage::Error) -> Self {
		match err {
			lore_storage::Error::Qdrant(inner) => Self::Index { message: inner.to_string() },
			other => Self::History { message: other.to_string() },
		}
	}
}
