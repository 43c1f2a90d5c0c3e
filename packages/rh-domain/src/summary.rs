use serde::{Deserialize, Serialize};

use crate::request::{RechargeRequest, RequestStatus};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Summary {
	pub total: u64,
	pub processing: u64,
	pub success: u64,
	pub failed: u64,
	/// Sum of plan prices over successful requests.
	pub success_amount: f64,
}

pub fn summarize<'a, I>(requests: I) -> Summary
where
	I: IntoIterator<Item = &'a RechargeRequest>,
{
	let mut summary = Summary::default();

	for request in requests {
		summary.total += 1;

		match request.status {
			RequestStatus::Processing => summary.processing += 1,
			RequestStatus::Success => {
				summary.success += 1;
				summary.success_amount += request.plan.price;
			},
			RequestStatus::Failed => summary.failed += 1,
		}
	}

	summary
}
