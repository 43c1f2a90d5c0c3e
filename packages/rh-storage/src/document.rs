use serde_json::{Map, Value};
use time::OffsetDateTime;

use crate::path::DocPath;

pub type Fields = Map<String, Value>;

#[derive(Clone, Debug, PartialEq)]
pub struct Document {
	pub path: DocPath,
	pub fields: Fields,
	/// Incremented by the store on every write; starts at 1.
	pub version: u64,
	pub updated_at: OffsetDateTime,
}
impl Document {
	pub fn id(&self) -> &str {
		self.path.id()
	}

	pub fn field(&self, key: &str) -> Option<&Value> {
		self.fields.get(key)
	}

	/// Trimmed, non-empty string field.
	pub fn text(&self, key: &str) -> Option<&str> {
		self.fields.get(key).and_then(Value::as_str).map(str::trim).filter(|s| !s.is_empty())
	}
}

/// Equality predicate on a top-level document field.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldFilter {
	pub field: String,
	pub value: Value,
}
impl FieldFilter {
	pub fn equals(field: impl Into<String>, value: impl Into<Value>) -> Self {
		Self { field: field.into(), value: value.into() }
	}

	pub fn matches(&self, fields: &Fields) -> bool {
		fields.get(&self.field) == Some(&self.value)
	}
}
