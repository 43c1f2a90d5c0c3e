pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Scope denied: {message}")]
	ScopeDenied { message: String },
	/// The owner list could not be read, so no pass can be built.
	#[error("Owner lookup unavailable: {message}")]
	LookupUnavailable { message: String },
	#[error("Not found: {message}")]
	NotFound { message: String },
	#[error("Conflict: {message}")]
	Conflict { message: String },
	#[error("Write failed: {message}")]
	WriteFailure { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
}
impl Error {
	/// Stable machine-readable code for API responses.
	pub fn code(&self) -> &'static str {
		match self {
			Self::InvalidRequest { .. } => "INVALID_REQUEST",
			Self::ScopeDenied { .. } => "SCOPE_DENIED",
			Self::LookupUnavailable { .. } => "LOOKUP_UNAVAILABLE",
			Self::NotFound { .. } => "NOT_FOUND",
			Self::Conflict { .. } => "CONFLICT",
			Self::WriteFailure { .. } => "WRITE_FAILURE",
			Self::Storage { .. } => "STORAGE_ERROR",
		}
	}
}

impl From<rh_storage::Error> for Error {
	fn from(err: rh_storage::Error) -> Self {
		match err {
			rh_storage::Error::InvalidPath(message) => Self::InvalidRequest { message },
			rh_storage::Error::NotFound(message) => Self::NotFound { message },
			rh_storage::Error::Conflict(message) => Self::Conflict { message },
			rh_storage::Error::Sqlx(inner) => Self::Storage { message: inner.to_string() },
			rh_storage::Error::Unavailable(message) | rh_storage::Error::Decode(message) =>
				Self::Storage { message },
		}
	}
}
