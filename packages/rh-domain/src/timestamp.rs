//! Serde helpers for optional timestamps.
//!
//! Timestamps are written as RFC 3339 strings. Reads also accept integer epoch milliseconds, the
//! other encoding found in stored documents.

use serde::{Deserialize, Deserializer, Serializer};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

#[derive(Deserialize)]
#[serde(untagged)]
enum RawTimestamp {
	Text(String),
	Millis(i64),
}

pub fn serialize<S>(value: &Option<OffsetDateTime>, serializer: S) -> Result<S::Ok, S::Error>
where
	S: Serializer,
{
	match value {
		Some(value) => {
			let formatted = value.format(&Rfc3339).map_err(serde::ser::Error::custom)?;

			serializer.serialize_str(&formatted)
		},
		None => serializer.serialize_none(),
	}
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<OffsetDateTime>, D::Error>
where
	D: Deserializer<'de>,
{
	match Option::<RawTimestamp>::deserialize(deserializer)? {
		Some(RawTimestamp::Text(raw)) =>
			parse_rfc3339(&raw).map(Some).ok_or_else(|| {
				serde::de::Error::custom(format!("invalid RFC 3339 timestamp '{raw}'"))
			}),
		Some(RawTimestamp::Millis(millis)) => from_millis(millis)
			.map(Some)
			.ok_or_else(|| serde::de::Error::custom("epoch milliseconds out of range")),
		None => Ok(None),
	}
}

pub mod required {
	use serde::{Deserializer, Serializer};
	use time::OffsetDateTime;

	pub fn serialize<S>(value: &OffsetDateTime, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		super::serialize(&Some(*value), serializer)
	}

	pub fn deserialize<'de, D>(deserializer: D) -> Result<OffsetDateTime, D::Error>
	where
		D: Deserializer<'de>,
	{
		super::deserialize(deserializer)?
			.ok_or_else(|| serde::de::Error::custom("timestamp is required"))
	}
}

pub fn parse_rfc3339(raw: &str) -> Option<OffsetDateTime> {
	OffsetDateTime::parse(raw.trim(), &Rfc3339).ok()
}

pub fn from_millis(millis: i64) -> Option<OffsetDateTime> {
	OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000).ok()
}
