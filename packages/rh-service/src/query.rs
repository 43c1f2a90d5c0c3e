//! Read-side helpers layered on a finished view: listings, metrics and export rows.

use std::fmt::Display;

use serde::{Deserialize, Serialize};
use time::{Date, macros::format_description};

use rh_domain::{
	AggregatedView, Bucket, EnrichedRequest, ExportSink, FilterQuery, Granularity, PassReport,
	Summary, bucketize, export_rows, filter, sort_newest_first, summarize,
};

use crate::{Error, RechargeService, Result};

/// Free-text and date-range criteria as received from callers. Dates are `YYYY-MM-DD`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ListingQuery {
	#[serde(default)]
	pub search: Option<String>,
	#[serde(default)]
	pub from: Option<String>,
	#[serde(default)]
	pub to: Option<String>,
}
impl ListingQuery {
	pub fn to_filter(&self) -> Result<FilterQuery> {
		let from = parse_date("from", self.from.as_deref())?;
		let to = parse_date("to", self.to.as_deref())?;

		if let (Some(from), Some(to)) = (from, to)
			&& from > to
		{
			return Err(Error::InvalidRequest { message: "from must not be after to.".to_string() });
		}

		Ok(FilterQuery { search: self.search.clone(), from, to })
	}
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Listing {
	pub pass: u64,
	pub revision: u64,
	/// Newest first; undated requests last.
	pub records: Vec<EnrichedRequest>,
	pub summary: Summary,
	pub report: PassReport,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MetricsReport {
	pub granularity: Granularity,
	pub buckets: Vec<Bucket>,
	pub summary: Summary,
	pub report: PassReport,
}

impl RechargeService {
	pub fn listing(&self, view: &AggregatedView, query: &ListingQuery) -> Result<Listing> {
		let mut records = filter(&view.records, &query.to_filter()?, self.reporting_offset());

		sort_newest_first(&mut records);

		let summary = summarize(records.iter().map(|record| &record.request));

		Ok(Listing {
			pass: view.pass,
			revision: view.revision,
			records,
			summary,
			report: view.report.clone(),
		})
	}

	pub fn metrics(&self, view: &AggregatedView, granularity: Granularity) -> MetricsReport {
		let requests = || view.records.iter().map(|record| &record.request);

		MetricsReport {
			granularity,
			buckets: bucketize(requests(), granularity, self.reporting_offset()),
			summary: summarize(requests()),
			report: view.report.clone(),
		}
	}

	/// Writes the filtered listing to `sink` in listing order and returns the row count.
	pub fn export<S>(
		&self,
		view: &AggregatedView,
		query: &ListingQuery,
		sink: &mut S,
	) -> Result<usize>
	where
		S: ExportSink,
		S::Error: Display,
	{
		let listing = self.listing(view, query)?;
		let rows = export_rows(&listing.records, self.reporting_offset());

		sink.write_rows(&rows)
			.map_err(|err| Error::WriteFailure { message: format!("export sink: {err}") })?;

		Ok(rows.len())
	}
}

fn parse_date(field: &str, raw: Option<&str>) -> Result<Option<Date>> {
	let Some(raw) = raw.map(str::trim).filter(|raw| !raw.is_empty()) else {
		return Ok(None);
	};

	Date::parse(raw, format_description!("[year]-[month]-[day]")).map(Some).map_err(|_| {
		Error::InvalidRequest { message: format!("{field} must be a YYYY-MM-DD date.") }
	})
}
