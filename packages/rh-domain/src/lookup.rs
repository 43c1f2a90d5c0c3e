use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::request::UNNAMED_OWNER;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Owner {
	pub id: String,
	pub display_name: Option<String>,
}

/// Owner id to display name, built once per aggregation pass.
#[derive(Clone, Debug, Default)]
pub struct LookupCache {
	names: HashMap<String, String>,
}
impl LookupCache {
	pub fn build(owners: &[Owner]) -> Self {
		let mut names = HashMap::with_capacity(owners.len());

		for owner in owners {
			let name = owner
				.display_name
				.as_deref()
				.map(str::trim)
				.filter(|name| !name.is_empty())
				.unwrap_or(UNNAMED_OWNER);

			names.insert(owner.id.clone(), name.to_string());
		}

		Self { names }
	}

	/// Falls back to [`UNNAMED_OWNER`] for ids missing from the owner list.
	pub fn name(&self, owner_id: &str) -> &str {
		self.names.get(owner_id).map(String::as_str).unwrap_or(UNNAMED_OWNER)
	}

	pub fn contains(&self, owner_id: &str) -> bool {
		self.names.contains_key(owner_id)
	}
}
