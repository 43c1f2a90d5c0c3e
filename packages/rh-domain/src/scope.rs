use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::{
	partner::Partner,
	request::{RechargeRequest, RequestStatus},
};

/// Subset of requests a caller may aggregate.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Scope {
	Global,
	/// One owner's sub-collection.
	Owner { owner_id: String },
	/// Requests assigned to one partner across every owner, optionally narrowed by status.
	Partner { partner_id: String, status: Option<RequestStatus> },
}
impl Scope {
	pub fn admits(&self, request: &RechargeRequest) -> bool {
		match self {
			Self::Global => true,
			Self::Owner { owner_id } => &request.owner_id == owner_id,
			Self::Partner { partner_id, status } =>
				request.partner_id.as_deref() == Some(partner_id.as_str())
					&& status.map(|status| status == request.status).unwrap_or(true),
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub enum Role {
	Admin,
	Employee(Partner),
}

/// Which employee listing the caller asked for.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ViewKind {
	#[default]
	Assigned,
	Processed,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Authority {
	/// May record any existing partner as the assignee.
	AnyPartner,
	/// May only record itself as the assignee.
	SelfOnly { partner_id: String },
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Access {
	pub identity: String,
	pub scope: Scope,
	pub authority: Authority,
}
impl Access {
	/// Narrows an employee scope to the requested listing. Global scopes are unaffected.
	pub fn narrowed(mut self, kind: ViewKind) -> Self {
		if let (Scope::Partner { status, .. }, ViewKind::Processed) = (&mut self.scope, kind) {
			*status = Some(RequestStatus::Success);
		}

		self
	}

	/// Resolves the partner id a status change will be recorded under.
	pub fn acting_partner(&self, requested: Option<&str>) -> Result<String, AuthorityDenied> {
		let requested = requested.map(str::trim).filter(|id| !id.is_empty());

		match (&self.authority, requested) {
			(Authority::AnyPartner, Some(partner_id)) => Ok(partner_id.to_string()),
			(Authority::AnyPartner, None) => Ok(self.identity.clone()),
			(Authority::SelfOnly { partner_id }, None) => Ok(partner_id.clone()),
			(Authority::SelfOnly { partner_id }, Some(requested)) if requested == partner_id =>
				Ok(partner_id.clone()),
			(Authority::SelfOnly { partner_id }, Some(requested)) => Err(AuthorityDenied {
				identity: partner_id.clone(),
				requested: requested.to_string(),
			}),
		}
	}
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct AuthorityDenied {
	pub identity: String,
	pub requested: String,
}

impl Display for AuthorityDenied {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "{} may not act as partner {}", self.identity, self.requested)
	}
}

impl std::error::Error for AuthorityDenied {}

pub fn resolve_scope(identity: &str, role: &Role) -> Access {
	match role {
		Role::Admin => Access {
			identity: identity.to_string(),
			scope: Scope::Global,
			authority: Authority::AnyPartner,
		},
		Role::Employee(_) => Access {
			identity: identity.to_string(),
			scope: Scope::Partner { partner_id: identity.to_string(), status: None },
			authority: Authority::SelfOnly { partner_id: identity.to_string() },
		},
	}
}
