pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Request-level failures. Recoverable conditions (empty context, malformed
/// classification or scoring responses) never reach this enum; they degrade
/// inside the stage that observed them. Anything here means the request
/// could not be answered, which callers must be able to tell apart from a
/// low-confidence answer.
#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Provider error: {message}")]
	Provider { message: String },
	#[error("Index error: {message}")]
	Index { message: String },
	#[error("History error: {message}")]
	History { message: String },
}
impl From<color_eyre::Report> for Error {
	fn from(err: color_eyre::Report) -> Self {
		Self::Provider { message: err.to_string() }
	}
}
