use std::{future::Future, pin::Pin};

use crate::{CollectionPath, DocPath, Document, FieldFilter, Fields, Result};

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Document store addressed by collection and sub-collection paths.
pub trait DocumentStore
where
	Self: Send + Sync,
{
	fn list_collection<'a>(&'a self, path: &'a CollectionPath)
	-> BoxFuture<'a, Result<Vec<Document>>>;

	fn get_document<'a>(&'a self, path: &'a DocPath) -> BoxFuture<'a, Result<Option<Document>>>;

	/// Merges `fields` into the top level of an existing document and returns the new version.
	///
	/// With `expected_version`, the write only happens when the stored version matches;
	/// otherwise it fails with [`crate::Error::Conflict`]. A missing document fails with
	/// [`crate::Error::NotFound`].
	fn update_document<'a>(
		&'a self,
		path: &'a DocPath,
		fields: Fields,
		expected_version: Option<u64>,
	) -> BoxFuture<'a, Result<u64>>;

	/// Documents from every collection whose final segment is `group`, matching all filters.
	fn query_group<'a>(
		&'a self,
		group: &'a str,
		filters: &'a [FieldFilter],
	) -> BoxFuture<'a, Result<Vec<Document>>>;
}
