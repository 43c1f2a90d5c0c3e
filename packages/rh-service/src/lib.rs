pub mod aggregate;
pub mod decode;
pub mod query;
pub mod role;
pub mod session;
pub mod status;

mod error;

pub use error::{Error, Result};
pub use query::{Listing, ListingQuery, MetricsReport};
pub use role::{PartnerDirectory, RoleOracle};
pub use rh_storage::BoxFuture;
pub use session::{Reconciled, StatusApplied, ViewSession};
pub use status::{StatusUpdate, UpdatedRequest};

use std::sync::{
	Arc,
	atomic::{AtomicU64, Ordering},
};

use time::UtcOffset;

use rh_config::Config;
use rh_domain::{Access, ViewKind, resolve_scope};
use rh_storage::DocumentStore;

pub struct RechargeService {
	pub cfg: Config,
	pub store: Arc<dyn DocumentStore>,
	pub roles: Arc<dyn RoleOracle>,
	passes: AtomicU64,
}
impl RechargeService {
	/// Builds a service whose roles come from the partner directory in `store`.
	pub fn new(cfg: Config, store: Arc<dyn DocumentStore>) -> Self {
		let roles =
			Arc::new(PartnerDirectory::new(store.clone(), cfg.access.admin_identities.clone()));

		Self::with_role_oracle(cfg, store, roles)
	}

	pub fn with_role_oracle(
		cfg: Config,
		store: Arc<dyn DocumentStore>,
		roles: Arc<dyn RoleOracle>,
	) -> Self {
		Self { cfg, store, roles, passes: AtomicU64::new(0) }
	}

	/// Resolves what `identity` may see and do for the requested listing.
	pub async fn access(&self, identity: &str, kind: ViewKind) -> Result<Access> {
		let role = self.roles.resolve_role(identity).await?;

		Ok(resolve_scope(identity.trim(), &role).narrowed(kind))
	}

	/// Offset used to turn instants into calendar dates.
	pub fn reporting_offset(&self) -> UtcOffset {
		UtcOffset::from_whole_seconds(self.cfg.metrics.utc_offset_minutes.saturating_mul(60))
			.unwrap_or(UtcOffset::UTC)
	}

	/// Number of the most recently started aggregation pass.
	pub fn current_pass(&self) -> u64 {
		self.passes.load(Ordering::SeqCst)
	}

	fn next_pass(&self) -> u64 {
		self.passes.fetch_add(1, Ordering::SeqCst) + 1
	}
}
