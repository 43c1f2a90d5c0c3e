#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Sqlx(#[from] sqlx::Error),
	#[error("Invalid path: {0}")]
	InvalidPath(String),
	#[error("Not found: {0}")]
	NotFound(String),
	#[error("Conflict: {0}")]
	Conflict(String),
	#[error("Store unavailable: {0}")]
	Unavailable(String),
	#[error("Decode error: {0}")]
	Decode(String),
}
