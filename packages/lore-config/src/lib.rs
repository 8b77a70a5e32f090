mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Compress, Config, EmbeddingProviderConfig, GenerationProviderConfig, History, IntentLabel,
	Intents, MultihopTrigger, Pipeline, ProviderConfig, Providers, Qdrant, Rerank, Retrieval,
	Security, Service, Storage, Verify,
};

use std::{collections::HashSet, fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.storage.qdrant.collection.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.qdrant.collection must be non-empty.".to_string(),
		});
	}
	if cfg.storage.history.path.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.history.path must be non-empty.".to_string(),
		});
	}
	if cfg.storage.history.max_turns == 0 {
		return Err(Error::Validation {
			message: "storage.history.max_turns must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions != cfg.storage.qdrant.vector_dim {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must match storage.qdrant.vector_dim."
				.to_string(),
		});
	}

	for (label, key) in [
		("embedding", &cfg.providers.embedding.api_key),
		("rerank", &cfg.providers.rerank.api_key),
		("generation", &cfg.providers.generation.api_key),
	] {
		if key.trim().is_empty() {
			return Err(Error::Validation {
				message: format!("Provider {label} api_key must be non-empty."),
			});
		}
	}

	for (label, value) in [
		("retrieval.k_dense", cfg.retrieval.k_dense),
		("retrieval.k_lexical", cfg.retrieval.k_lexical),
		("retrieval.multihop_k", cfg.retrieval.multihop_k),
		("retrieval.retry_k", cfg.retrieval.retry_k),
		("rerank.top_n", cfg.rerank.top_n),
		("compress.max_docs", cfg.compress.max_docs),
		("compress.top_sentences", cfg.compress.top_sentences),
		("compress.min_sentence_chars", cfg.compress.min_sentence_chars),
		("compress.fallback_docs", cfg.compress.fallback_docs),
		("compress.fallback_chars", cfg.compress.fallback_chars),
	] {
		if value == 0 {
			return Err(Error::Validation {
				message: format!("{label} must be greater than zero."),
			});
		}
	}

	if cfg.retrieval.multihop_k < cfg.retrieval.k_dense {
		return Err(Error::Validation {
			message: "retrieval.multihop_k must not be narrower than retrieval.k_dense."
				.to_string(),
		});
	}
	if !cfg.retrieval.bm25_k1.is_finite() || cfg.retrieval.bm25_k1 <= 0.0 {
		return Err(Error::Validation {
			message: "retrieval.bm25_k1 must be a positive finite number.".to_string(),
		});
	}
	if !cfg.retrieval.bm25_b.is_finite() || !(0.0..=1.0).contains(&cfg.retrieval.bm25_b) {
		return Err(Error::Validation {
			message: "retrieval.bm25_b must be in the range 0.0-1.0.".to_string(),
		});
	}

	for trigger in &cfg.retrieval.multihop_triggers {
		if trigger.contains.trim().is_empty() || trigger.term.trim().is_empty() {
			return Err(Error::Validation {
				message: "retrieval.multihop_triggers entries must be non-empty.".to_string(),
			});
		}
	}

	for (label, value) in [
		("verify.grounded_floor", cfg.verify.grounded_floor),
		("verify.weak_similarity_floor", cfg.verify.weak_similarity_floor),
		("verify.empty_context_confidence", cfg.verify.empty_context_confidence),
		("verify.parse_failed_confidence", cfg.verify.parse_failed_confidence),
	] {
		if value > 100 {
			return Err(Error::Validation { message: format!("{label} must be 100 or less.") });
		}
	}

	if cfg.verify.weak_similarity_floor > cfg.verify.grounded_floor {
		return Err(Error::Validation {
			message: "verify.weak_similarity_floor must not exceed verify.grounded_floor."
				.to_string(),
		});
	}
	if cfg.intents.labels.is_empty() {
		return Err(Error::Validation {
			message: "intents.labels must be non-empty.".to_string(),
		});
	}
	if !cfg.intents.labels.iter().any(|label| label.name == cfg.intents.fallback) {
		return Err(Error::Validation {
			message: "intents.fallback must name one of intents.labels.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	let mut seen_labels = HashSet::new();

	cfg.intents.labels.retain(|label| seen_labels.insert(label.name.clone()));

	let mut seen_triggers = HashSet::new();

	cfg.retrieval
		.multihop_triggers
		.retain(|trigger| seen_triggers.insert((trigger.contains.clone(), trigger.term.clone())));
}
