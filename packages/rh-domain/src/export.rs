use serde::{Deserialize, Serialize};
use time::{UtcOffset, macros::format_description};

use crate::request::{EnrichedRequest, RequestStatus};

/// Flat row handed to an export sink. Field order matches the exported column order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ExportRow {
	pub owner_name: String,
	pub utr: String,
	pub mobile: String,
	pub amount: f64,
	pub status: RequestStatus,
	/// `YYYY-MM-DD HH:MM` in the reporting offset, empty when the request is undated.
	pub date: String,
}

/// Consumer of a finalized, ordered row set. Serialization is the sink's concern.
pub trait ExportSink {
	type Error;

	fn write_rows(&mut self, rows: &[ExportRow]) -> Result<(), Self::Error>;
}

impl ExportSink for Vec<ExportRow> {
	type Error = std::convert::Infallible;

	fn write_rows(&mut self, rows: &[ExportRow]) -> Result<(), Self::Error> {
		self.extend_from_slice(rows);

		Ok(())
	}
}

pub fn export_rows(records: &[EnrichedRequest], offset: UtcOffset) -> Vec<ExportRow> {
	let format = format_description!("[year]-[month]-[day] [hour]:[minute]");

	records
		.iter()
		.map(|record| ExportRow {
			owner_name: record.owner_name.clone(),
			utr: record.display_utr.clone(),
			mobile: record.request.number.clone(),
			amount: record.request.plan.price,
			status: record.request.status,
			date: record
				.request
				.requested_at
				.and_then(|at| at.to_offset(offset).format(format).ok())
				.unwrap_or_default(),
		})
		.collect()
}
