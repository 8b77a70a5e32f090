pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Qdrant(#[from] Box<qdrant_client::QdrantError>),
	#[error("History store I/O failed at {path:?}.")]
	HistoryIo { path: std::path::PathBuf, source: std::io::Error },
	#[error("History store serialization failed.")]
	HistorySerde { source: serde_json::Error },
}
impl From<qdrant_client::QdrantError> for Error {
	fn from(err: qdrant_client::QdrantError) -> Self {
		Self::Qdrant(Box::new(err))
	}
}
