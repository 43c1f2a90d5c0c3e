mod error;
mod types;

pub use error::{Error, Result};
pub use types::{Access, Aggregation, Config, Metrics, Postgres, Service, Storage, Workflow};

use std::{fs, path::Path};

use tracing_subscriber::EnvFilter;

/// Largest reporting offset accepted, in minutes (UTC±18:00).
pub const MAX_UTC_OFFSET_MINUTES: i32 = 18 * 60;

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	parse(&raw).map_err(|err| match err {
		Error::ParseConfig { source, .. } => Error::ParseConfig { path: path.to_path_buf(), source },
		other => other,
	})
}

pub fn parse(raw: &str) -> Result<Config> {
	let mut cfg: Config = toml::from_str(raw)
		.map_err(|err| Error::ParseConfig { path: Default::default(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			field: "service.http_bind",
			message: "must be non-empty.".to_string(),
		});
	}
	if cfg.service.log_level.trim().is_empty() {
		return Err(Error::Validation {
			field: "service.log_level",
			message: "must be non-empty.".to_string(),
		});
	}
	if let Err(err) = EnvFilter::try_new(&cfg.service.log_level) {
		return Err(Error::Validation {
			field: "service.log_level",
			message: format!("must be a valid log filter: {err}."),
		});
	}
	if cfg.storage.postgres.dsn.trim().is_empty() {
		return Err(Error::Validation {
			field: "storage.postgres.dsn",
			message: "must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			field: "storage.postgres.pool_max_conns",
			message: "must be greater than zero.".to_string(),
		});
	}
	if cfg.access.caller_header.is_empty() {
		return Err(Error::Validation {
			field: "access.caller_header",
			message: "must be non-empty.".to_string(),
		});
	}
	if !cfg.access.caller_header.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-') {
		return Err(Error::Validation {
			field: "access.caller_header",
			message: "must contain only ASCII letters, digits, and '-'.".to_string(),
		});
	}
	if cfg.access.admin_identities.iter().any(|identity| identity.is_empty()) {
		return Err(Error::Validation {
			field: "access.admin_identities",
			message: "must not contain empty identities.".to_string(),
		});
	}
	if cfg.aggregation.max_concurrent_reads == 0 {
		return Err(Error::Validation {
			field: "aggregation.max_concurrent_reads",
			message: "must be greater than zero.".to_string(),
		});
	}
	if cfg.aggregation.read_timeout_ms == 0 {
		return Err(Error::Validation {
			field: "aggregation.read_timeout_ms",
			message: "must be greater than zero.".to_string(),
		});
	}
	if cfg.metrics.utc_offset_minutes.abs() > MAX_UTC_OFFSET_MINUTES {
		return Err(Error::Validation {
			field: "metrics.utc_offset_minutes",
			message: format!("must be within ±{MAX_UTC_OFFSET_MINUTES} minutes."),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	for identity in cfg.access.admin_identities.iter_mut() {
		*identity = identity.trim().to_string();
	}

	cfg.access.admin_identities.sort();
	cfg.access.admin_identities.dedup();
	cfg.access.caller_header = cfg.access.caller_header.trim().to_ascii_lowercase();
}
