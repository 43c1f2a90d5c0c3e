use serde::Deserialize;

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	#[serde(default)]
	pub access: Access,
	#[serde(default)]
	pub aggregation: Aggregation,
	#[serde(default)]
	pub workflow: Workflow,
	#[serde(default)]
	pub metrics: Metrics,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Access {
	/// Caller identities that always resolve to the administrator role, regardless of the
	/// partner directory.
	#[serde(default)]
	pub admin_identities: Vec<String>,
	/// HTTP header carrying the authenticated caller identity.
	#[serde(default = "default_caller_header")]
	pub caller_header: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Aggregation {
	/// Upper bound on concurrent per-owner reads during a fan-out pass.
	#[serde(default = "default_max_concurrent_reads")]
	pub max_concurrent_reads: usize,
	#[serde(default = "default_read_timeout_ms")]
	pub read_timeout_ms: u64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Workflow {
	/// When true, status updates without a version token are rejected instead of falling back to
	/// last-write-wins.
	#[serde(default = "default_true")]
	pub require_version_token: bool,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Metrics {
	/// Offset from UTC, in minutes, used to derive calendar dates for bucketing, filtering, and
	/// export formatting.
	#[serde(default)]
	pub utc_offset_minutes: i32,
}

impl Default for Access {
	fn default() -> Self {
		Self { admin_identities: Vec::new(), caller_header: default_caller_header() }
	}
}

impl Default for Aggregation {
	fn default() -> Self {
		Self {
			max_concurrent_reads: default_max_concurrent_reads(),
			read_timeout_ms: default_read_timeout_ms(),
		}
	}
}

impl Default for Workflow {
	fn default() -> Self {
		Self { require_version_token: default_true() }
	}
}

fn default_caller_header() -> String {
	"x-rh-caller-id".to_string()
}

fn default_max_concurrent_reads() -> usize {
	16
}

fn default_read_timeout_ms() -> u64 {
	5_000
}

fn default_true() -> bool {
	true
}
