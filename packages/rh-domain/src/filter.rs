use std::cmp::Ordering;

use time::{Date, OffsetDateTime, PrimitiveDateTime, Time, UtcOffset, macros::time};

use crate::request::EnrichedRequest;

const END_OF_DAY: Time = time!(23:59:59.999);

#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct FilterQuery {
	pub search: Option<String>,
	pub from: Option<Date>,
	pub to: Option<Date>,
}
impl FilterQuery {
	fn term(&self) -> Option<String> {
		self.search
			.as_deref()
			.map(str::trim)
			.filter(|term| !term.is_empty())
			.map(str::to_lowercase)
	}
}

/// Text predicate AND date-range predicate. Undated records always pass the date predicate.
pub fn filter(
	records: &[EnrichedRequest],
	query: &FilterQuery,
	offset: UtcOffset,
) -> Vec<EnrichedRequest> {
	let term = query.term();
	let lower =
		query.from.map(|date| PrimitiveDateTime::new(date, Time::MIDNIGHT).assume_offset(offset));
	let upper =
		query.to.map(|date| PrimitiveDateTime::new(date, END_OF_DAY).assume_offset(offset));

	records
		.iter()
		.filter(|record| term.as_deref().map(|term| text_matches(record, term)).unwrap_or(true))
		.filter(|record| date_matches(record.request.requested_at, lower, upper))
		.cloned()
		.collect()
}

/// Newest first; undated records last; ties broken by `(owner_id, id)` so the order is total.
pub fn sort_newest_first(records: &mut [EnrichedRequest]) {
	records.sort_by(|a, b| {
		let by_date = match (a.request.requested_at, b.request.requested_at) {
			(Some(a), Some(b)) => b.cmp(&a),
			(Some(_), None) => Ordering::Less,
			(None, Some(_)) => Ordering::Greater,
			(None, None) => Ordering::Equal,
		};

		by_date
			.then_with(|| a.request.owner_id.cmp(&b.request.owner_id))
			.then_with(|| a.request.id.cmp(&b.request.id))
	});
}

fn text_matches(record: &EnrichedRequest, term: &str) -> bool {
	record.owner_name.to_lowercase().contains(term)
		|| record.display_utr.to_lowercase().contains(term)
}

fn date_matches(
	at: Option<OffsetDateTime>,
	lower: Option<OffsetDateTime>,
	upper: Option<OffsetDateTime>,
) -> bool {
	let Some(at) = at else {
		return true;
	};

	lower.map(|lower| at >= lower).unwrap_or(true) && upper.map(|upper| at <= upper).unwrap_or(true)
}
