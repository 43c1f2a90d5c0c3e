use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::lookup::LookupCache;

/// Display name used when an owner record carries no usable name.
pub const UNNAMED_OWNER: &str = "Unnamed";
/// Sentinel shown when a request has neither a transaction id nor a UTR.
pub const MISSING_UTR: &str = "N/A";

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
pub enum RequestStatus {
	Processing,
	Success,
	Failed,
}
impl RequestStatus {
	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Processing => "Processing",
			Self::Success => "Success",
			Self::Failed => "Failed",
		}
	}

	/// Case-insensitive parse of the stored status label.
	pub fn parse(raw: &str) -> Option<Self> {
		let raw = raw.trim();

		[Self::Processing, Self::Success, Self::Failed]
			.into_iter()
			.find(|status| status.as_str().eq_ignore_ascii_case(raw))
	}
}

impl Display for RequestStatus {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		self.as_str().fmt(f)
	}
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Plan {
	pub provider: String,
	pub price: f64,
}

/// Physical address of a request: the owner's sub-collection plus the request id.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct RequestRef {
	pub owner_id: String,
	pub request_id: String,
}
impl RequestRef {
	pub fn new(owner_id: impl Into<String>, request_id: impl Into<String>) -> Self {
		Self { owner_id: owner_id.into(), request_id: request_id.into() }
	}
}

impl Display for RequestRef {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}/{}", self.owner_id, self.request_id)
	}
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RechargeRequest {
	pub id: String,
	pub owner_id: String,
	pub partner_id: Option<String>,
	pub partner_name: Option<String>,
	pub number: String,
	pub plan: Plan,
	pub status: RequestStatus,
	#[serde(default, with = "crate::timestamp")]
	pub requested_at: Option<OffsetDateTime>,
	pub transaction_id: Option<String>,
	pub utr: Option<String>,
}
impl RechargeRequest {
	pub fn reference(&self) -> RequestRef {
		RequestRef::new(self.owner_id.clone(), self.id.clone())
	}

	pub fn is(&self, reference: &RequestRef) -> bool {
		self.owner_id == reference.owner_id && self.id == reference.request_id
	}

	/// First non-empty of the transaction id and the UTR, else [`MISSING_UTR`].
	pub fn display_utr(&self) -> String {
		[self.transaction_id.as_deref(), self.utr.as_deref()]
			.into_iter()
			.flatten()
			.map(str::trim)
			.find(|value| !value.is_empty())
			.unwrap_or(MISSING_UTR)
			.to_string()
	}
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnrichedRequest {
	#[serde(flatten)]
	pub request: RechargeRequest,
	pub owner_name: String,
	pub display_utr: String,
	/// Store version observed when the record was read; supplied back as the optimistic
	/// concurrency token on status updates.
	pub version: u64,
}
impl EnrichedRequest {
	pub fn enrich(request: RechargeRequest, lookup: &LookupCache, version: u64) -> Self {
		let owner_name = lookup.name(&request.owner_id).to_string();

		Self::with_owner_name(request, owner_name, version)
	}

	pub fn with_owner_name(request: RechargeRequest, owner_name: String, version: u64) -> Self {
		let display_utr = request.display_utr();

		Self { request, owner_name, display_utr, version }
	}

	pub fn reference(&self) -> RequestRef {
		self.request.reference()
	}
}
