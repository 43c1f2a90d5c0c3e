//! Two-level document addressing: `owners/{owner_id}/requests/{request_id}` for per-owner
//! sub-collections, plus the flat `owners` and `partners` collections.

use std::fmt::{Display, Formatter};

use crate::{Error, Result};

pub const OWNERS: &str = "owners";
pub const PARTNERS: &str = "partners";
pub const REQUESTS: &str = "requests";

/// A collection path has an odd number of segments: `name` or `name/{id}/name`.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct CollectionPath(String);
impl CollectionPath {
	pub fn parse(raw: &str) -> Result<Self> {
		let segments = split_segments(raw)?;

		if segments.len() % 2 == 0 {
			return Err(Error::InvalidPath(format!(
				"collection path '{raw}' must have an odd number of segments"
			)));
		}

		Ok(Self(segments.join("/")))
	}

	pub fn as_str(&self) -> &str {
		&self.0
	}

	/// Final segment, used for collection-group queries.
	pub fn group(&self) -> &str {
		self.0.rsplit('/').next().unwrap_or(&self.0)
	}

	/// Id of the document that owns this sub-collection, if any.
	pub fn parent_id(&self) -> Option<&str> {
		let mut segments = self.0.rsplit('/');

		segments.next();
		segments.next()
	}

	pub fn doc(&self, id: &str) -> Result<DocPath> {
		validate_segment(id, &self.0)?;

		Ok(DocPath { collection: self.clone(), id: id.to_string() })
	}
}

impl Display for CollectionPath {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		self.0.fmt(f)
	}
}

#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct DocPath {
	collection: CollectionPath,
	id: String,
}
impl DocPath {
	pub fn parse(raw: &str) -> Result<Self> {
		let segments = split_segments(raw)?;

		if segments.len() % 2 != 0 {
			return Err(Error::InvalidPath(format!(
				"document path '{raw}' must have an even number of segments"
			)));
		}

		let (id, collection) = segments.split_last().ok_or_else(|| {
			Error::InvalidPath(format!("document path '{raw}' must not be empty"))
		})?;

		Ok(Self { collection: CollectionPath(collection.join("/")), id: (*id).to_string() })
	}

	pub fn collection(&self) -> &CollectionPath {
		&self.collection
	}

	pub fn id(&self) -> &str {
		&self.id
	}

	pub fn sub_collection(&self, name: &str) -> Result<CollectionPath> {
		CollectionPath::parse(&format!("{self}/{name}"))
	}
}

impl Display for DocPath {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "{}/{}", self.collection, self.id)
	}
}

pub fn owners() -> CollectionPath {
	CollectionPath(OWNERS.to_string())
}

pub fn partners() -> CollectionPath {
	CollectionPath(PARTNERS.to_string())
}

pub fn owner_requests(owner_id: &str) -> Result<CollectionPath> {
	owners().doc(owner_id)?.sub_collection(REQUESTS)
}

pub fn request_doc(owner_id: &str, request_id: &str) -> Result<DocPath> {
	owner_requests(owner_id)?.doc(request_id)
}

pub fn partner_doc(partner_id: &str) -> Result<DocPath> {
	partners().doc(partner_id)
}

fn split_segments(raw: &str) -> Result<Vec<&str>> {
	let segments: Vec<&str> = raw.trim_matches('/').split('/').collect();

	for segment in &segments {
		validate_segment(segment, raw)?;
	}

	Ok(segments)
}

fn validate_segment(segment: &str, context: &str) -> Result<()> {
	if segment.trim().is_empty() || segment.contains('/') {
		return Err(Error::InvalidPath(format!("'{context}' contains an invalid segment")));
	}

	Ok(())
}
