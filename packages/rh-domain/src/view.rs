use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
	request::{EnrichedRequest, RechargeRequest, RequestRef},
	scope::Scope,
};

/// One shard read that did not contribute to a pass.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ShardFailure {
	pub shard: String,
	pub message: String,
}

#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct PassReport {
	pub shards_queried: usize,
	pub omitted: Vec<ShardFailure>,
	/// Documents skipped because they could not be decoded.
	pub malformed: usize,
}
impl PassReport {
	pub fn is_complete(&self) -> bool {
		self.omitted.is_empty()
	}
}

/// Result of an aggregation pass. Never mutated in place: patches produce a new value.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AggregatedView {
	/// Sequence number assigned when the pass started.
	pub pass: u64,
	/// Number of local patches applied on top of the pass.
	pub revision: u64,
	pub scope: Scope,
	pub records: Vec<EnrichedRequest>,
	pub report: PassReport,
	#[serde(with = "crate::timestamp::required")]
	pub built_at: OffsetDateTime,
}

#[derive(Clone, Debug, PartialEq)]
pub enum PatchOutcome {
	Applied(AggregatedView),
	/// The record is not in this view but belongs to its scope; only a new pass can place it.
	NeedsRefresh,
}

impl AggregatedView {
	pub fn get(&self, reference: &RequestRef) -> Option<&EnrichedRequest> {
		self.records.iter().find(|record| record.request.is(reference))
	}

	/// Applies a confirmed write. The record is replaced in place, or dropped when it no longer
	/// falls inside the view's scope.
	pub fn patched(&self, updated: &RechargeRequest, version: u64) -> PatchOutcome {
		let reference = updated.reference();
		let position = self.records.iter().position(|record| record.request.is(&reference));
		let admitted = self.scope.admits(updated);
		let Some(position) = position else {
			if admitted {
				return PatchOutcome::NeedsRefresh;
			}

			return PatchOutcome::Applied(self.clone());
		};
		let mut next = self.clone();

		if admitted {
			let owner_name = next.records[position].owner_name.clone();

			next.records[position] =
				EnrichedRequest::with_owner_name(updated.clone(), owner_name, version);
		} else {
			next.records.remove(position);
		}

		next.revision += 1;

		PatchOutcome::Applied(next)
	}
}
