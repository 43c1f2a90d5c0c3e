use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use time::{Date, UtcOffset, macros::format_description};

use crate::request::RechargeRequest;

pub const MONTH_LABELS: [&str; 12] =
	["Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec"];

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Granularity {
	/// Twelve month-of-year buckets. The year is ignored, so multi-year data folds together.
	Month,
	/// One bucket per calendar date present in the data.
	Day,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
	pub label: String,
	pub count: u64,
}

/// Counts dated requests per calendar bucket in the given reporting offset. Undated requests are
/// not counted.
pub fn bucketize<'a, I>(requests: I, granularity: Granularity, offset: UtcOffset) -> Vec<Bucket>
where
	I: IntoIterator<Item = &'a RechargeRequest>,
{
	let dates = requests
		.into_iter()
		.filter_map(|request| request.requested_at)
		.map(|at| at.to_offset(offset).date());

	match granularity {
		Granularity::Month => by_month(dates),
		Granularity::Day => by_day(dates),
	}
}

pub fn day_label(date: Date) -> String {
	date.format(format_description!("[year]-[month]-[day]"))
		.unwrap_or_else(|_| date.to_string())
}

fn by_month(dates: impl Iterator<Item = Date>) -> Vec<Bucket> {
	let mut counts = [0_u64; 12];

	for date in dates {
		counts[usize::from(u8::from(date.month())) - 1] += 1;
	}

	MONTH_LABELS
		.iter()
		.zip(counts)
		.map(|(label, count)| Bucket { label: (*label).to_string(), count })
		.collect()
}

fn by_day(dates: impl Iterator<Item = Date>) -> Vec<Bucket> {
	let mut counts = BTreeMap::<Date, u64>::new();

	for date in dates {
		*counts.entry(date).or_default() += 1;
	}

	counts.into_iter().map(|(date, count)| Bucket { label: day_label(date), count }).collect()
}
