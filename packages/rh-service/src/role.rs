use std::sync::Arc;

use rh_domain::{PartnerRole, Role};
use rh_storage::{BoxFuture, DocumentStore, path};

use crate::{Error, Result, decode};

/// Maps an authenticated caller identity to a role.
pub trait RoleOracle
where
	Self: Send + Sync,
{
	fn resolve_role<'a>(&'a self, identity: &'a str) -> BoxFuture<'a, Result<Role>>;
}

/// Resolves roles from the partner directory. Identities without an active partner record are
/// denied rather than defaulted to any role.
pub struct PartnerDirectory {
	store: Arc<dyn DocumentStore>,
	admin_identities: Vec<String>,
}
impl PartnerDirectory {
	pub fn new(store: Arc<dyn DocumentStore>, admin_identities: Vec<String>) -> Self {
		Self { store, admin_identities }
	}

	async fn lookup(&self, identity: &str) -> Result<Role> {
		let identity = identity.trim();

		if identity.is_empty() {
			return Err(denied("caller identity is missing"));
		}
		if self.admin_identities.iter().any(|admin| admin == identity) {
			return Ok(Role::Admin);
		}

		let Ok(doc_path) = path::partner_doc(identity) else {
			return Err(denied("caller identity is not a partner id"));
		};
		let Some(doc) = self.store.get_document(&doc_path).await? else {
			return Err(denied("caller is not a registered partner"));
		};
		let partner = match decode::partner(&doc) {
			Ok(partner) => partner,
			Err(err) => {
				tracing::warn!(error = %err, partner_id = identity, "Partner record unreadable.");

				return Err(denied("caller partner record is unreadable"));
			},
		};

		if !partner.is_active() {
			return Err(denied("caller partner account is not active"));
		}

		match partner.role {
			PartnerRole::Admin => Ok(Role::Admin),
			PartnerRole::Employee => Ok(Role::Employee(partner)),
		}
	}
}

impl RoleOracle for PartnerDirectory {
	fn resolve_role<'a>(&'a self, identity: &'a str) -> BoxFuture<'a, Result<Role>> {
		Box::pin(self.lookup(identity))
	}
}

fn denied(message: &str) -> Error {
	Error::ScopeDenied { message: message.to_string() }
}
