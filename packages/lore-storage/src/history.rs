use std::{
	collections::BTreeMap,
	path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tokio::{fs, sync::Mutex};

use crate::{Error, Result};

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Turn {
	pub user: String,
	pub assistant: String,
	#[serde(with = "time::serde::rfc3339")]
	pub recorded_at: OffsetDateTime,
}

#[derive(Debug, Default, Deserialize, Serialize)]
struct HistoryFile {
	threads: BTreeMap<String, Vec<Turn>>,
}

/// Conversation history, partitioned by thread and bounded to the most
/// recent `max_turns` turns per thread. Appends serialize behind a mutex
/// and replace the file atomically (write-temp-then-rename), so concurrent
/// writers never lose turns and readers never observe a partial file.
pub struct FileHistoryStore {
	path: PathBuf,
	max_turns: usize,
	lock: Mutex<()>,
}
impl FileHistoryStore {
	pub fn new(cfg: &lore_config::History) -> Self {
		Self {
			path: PathBuf::from(&cfg.path),
			max_turns: cfg.max_turns as usize,
			lock: Mutex::new(()),
		}
	}

	pub async fn append(&self, thread_id: &str, turn: Turn) -> Result<()> {
		let _guard = self.lock.lock().await;
		let mut file = load_history(&self.path).await;
		let turns = file.threads.entry(thread_id.to_string()).or_default();

		turns.push(turn);

		if turns.len() > self.max_turns {
			let excess = turns.len() - self.max_turns;

			turns.drain(..excess);
		}

		self.persist(&file).await
	}

	pub async fn recent(&self, thread_id: &str, limit: usize) -> Result<Vec<Turn>> {
		let _guard = self.lock.lock().await;
		let file = load_history(&self.path).await;
		let turns = file.threads.get(thread_id).map(Vec::as_slice).unwrap_or_default();
		let start = turns.len().saturating_sub(limit);

		Ok(turns[start..].to_vec())
	}

	async fn persist(&self, file: &HistoryFile) -> Result<()> {
		let payload = serde_json::to_string_pretty(file)
			.map_err(|err| Error::HistorySerde { source: err })?;

		if let Some(parent) = self.path.parent()
			&& !parent.as_os_str().is_empty()
		{
			fs::create_dir_all(parent)
				.await
				.map_err(|err| Error::HistoryIo { path: parent.to_path_buf(), source: err })?;
		}

		let tmp = self.path.with_extension("tmp");

		fs::write(&tmp, payload)
			.await
			.map_err(|err| Error::HistoryIo { path: tmp.clone(), source: err })?;
		fs::rename(&tmp, &self.path)
			.await
			.map_err(|err| Error::HistoryIo { path: self.path.clone(), source: err })?;

		Ok(())
	}
}

// Unreadable or corrupt history degrades to empty rather than failing the
// request; the next successful append rewrites the file.
async fn load_history(path: &Path) -> HistoryFile {
	let raw = match fs::read_to_string(path).await {
		Ok(raw) => raw,
		Err(err) if err.kind() == std::io::ErrorKind::NotFound => return HistoryFile::default(),
		Err(err) => {
			tracing::warn!(error = %err, path = %path.display(), "History file is unreadable.");

			return HistoryFile::default();
		},
	};

	match serde_json::from_str(&raw) {
		Ok(file) => file,
		Err(err) => {
			tracing::warn!(error = %err, path = %path.display(), "History file is corrupt.");

			HistoryFile::default()
		},
	}
}
