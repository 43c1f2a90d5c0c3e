use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartnerRole {
	Admin,
	Employee,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartnerStatus {
	Active,
	Inactive,
	Suspended,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Partner {
	/// Matches the external caller identity.
	pub id: String,
	pub name: String,
	pub email: String,
	pub role: PartnerRole,
	pub status: PartnerStatus,
	#[serde(default, with = "crate::timestamp")]
	pub joined_at: Option<OffsetDateTime>,
}
impl Partner {
	pub fn is_active(&self) -> bool {
		self.status == PartnerStatus::Active
	}
}
