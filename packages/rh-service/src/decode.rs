//! Store documents to domain records. Field names follow the store's camelCase layout.

use serde_json::Value;
use time::OffsetDateTime;

use rh_domain::{
	Owner, Partner, PartnerRole, PartnerStatus, Plan, RechargeRequest, RequestStatus, timestamp,
};
use rh_storage::{Document, Error, Result};

pub const DISPLAY_NAME: &str = "displayName";
pub const PARTNER_ID: &str = "partnerId";
pub const PARTNER_NAME: &str = "partnerName";
pub const STATUS: &str = "status";

pub fn owner(doc: &Document) -> Owner {
	Owner { id: doc.id().to_string(), display_name: doc.text(DISPLAY_NAME).map(str::to_string) }
}

pub fn partner(doc: &Document) -> Result<Partner> {
	let name = doc.text("name").ok_or_else(|| malformed(doc, "missing name"))?;
	let role = enum_field::<PartnerRole>(doc, "role")?;
	let status = enum_field::<PartnerStatus>(doc, STATUS)?;
	let joined_at = optional_timestamp(doc, "joinedAt")?;

	Ok(Partner {
		id: doc.id().to_string(),
		name: name.to_string(),
		email: doc.text("email").unwrap_or_default().to_string(),
		role,
		status,
		joined_at,
	})
}

/// Decodes a document from an owner's `requests` sub-collection. The owner id comes from the
/// document path, never from the document body.
pub fn request(doc: &Document) -> Result<RechargeRequest> {
	let owner_id = doc
		.path
		.collection()
		.parent_id()
		.ok_or_else(|| malformed(doc, "request is not inside an owner collection"))?;
	let number = match doc.field("number") {
		Some(Value::String(number)) => number.trim().to_string(),
		Some(Value::Number(number)) => number.to_string(),
		_ => return Err(malformed(doc, "missing number")),
	};
	let status = doc
		.text(STATUS)
		.and_then(RequestStatus::parse)
		.ok_or_else(|| malformed(doc, "missing or unknown status"))?;

	Ok(RechargeRequest {
		id: doc.id().to_string(),
		owner_id: owner_id.to_string(),
		partner_id: doc.text(PARTNER_ID).map(str::to_string),
		partner_name: doc.text(PARTNER_NAME).map(str::to_string),
		number,
		plan: plan(doc)?,
		status,
		requested_at: optional_timestamp(doc, "requestedDate")?,
		transaction_id: doc.text("transactionId").map(str::to_string),
		utr: doc.text("utr").map(str::to_string),
	})
}

fn plan(doc: &Document) -> Result<Plan> {
	let Some(Value::Object(plan)) = doc.field("plan") else {
		return Err(malformed(doc, "missing plan"));
	};
	let provider = plan
		.get("provider")
		.and_then(Value::as_str)
		.map(str::trim)
		.ok_or_else(|| malformed(doc, "missing plan.provider"))?;
	let price = match plan.get("price") {
		Some(Value::Number(price)) => price.as_f64(),
		Some(Value::String(price)) => price.trim().parse::<f64>().ok(),
		_ => None,
	}
	.filter(|price| price.is_finite())
	.ok_or_else(|| malformed(doc, "missing or invalid plan.price"))?;

	Ok(Plan { provider: provider.to_string(), price })
}

fn optional_timestamp(doc: &Document, key: &str) -> Result<Option<OffsetDateTime>> {
	let parsed = match doc.field(key) {
		None | Some(Value::Null) => return Ok(None),
		Some(Value::String(raw)) if raw.trim().is_empty() => return Ok(None),
		Some(Value::String(raw)) => timestamp::parse_rfc3339(raw.trim()),
		Some(Value::Number(millis)) => millis.as_i64().and_then(timestamp::from_millis),
		Some(_) => None,
	};

	parsed.map(Some).ok_or_else(|| malformed(doc, "unreadable timestamp"))
}

fn enum_field<T>(doc: &Document, key: &str) -> Result<T>
where
	T: serde::de::DeserializeOwned,
{
	let raw = doc.text(key).ok_or_else(|| malformed(doc, "missing enum field"))?;

	serde_json::from_value(Value::String(raw.to_ascii_lowercase()))
		.map_err(|err| Error::Decode(format!("{}: {key}: {err}", doc.path)))
}

fn malformed(doc: &Document, reason: &str) -> Error {
	Error::Decode(format!("{}: {reason}", doc.path))
}
