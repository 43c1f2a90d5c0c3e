use std::{
	collections::BTreeMap,
	sync::{RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use time::OffsetDateTime;

use crate::{
	BoxFuture, CollectionPath, DocPath, Document, DocumentStore, Error, FieldFilter, Fields,
	Result,
};

#[derive(Clone, Debug)]
struct StoredDoc {
	fields: Fields,
	version: u64,
	updated_at: OffsetDateTime,
}

/// Process-local store. Collections and documents iterate in key order.
#[derive(Debug, Default)]
pub struct MemoryStore {
	collections: RwLock<BTreeMap<CollectionPath, BTreeMap<String, StoredDoc>>>,
}
impl MemoryStore {
	pub fn new() -> Self {
		Self::default()
	}

	/// Creates or replaces a document and returns its new version.
	pub fn put(&self, path: &DocPath, fields: Fields) -> u64 {
		let mut collections = self.write();
		let docs = collections.entry(path.collection().clone()).or_default();
		let version = docs.get(path.id()).map(|doc| doc.version + 1).unwrap_or(1);

		docs.insert(
			path.id().to_string(),
			StoredDoc { fields, version, updated_at: OffsetDateTime::now_utc() },
		);

		version
	}

	pub fn len(&self) -> usize {
		self.read().values().map(BTreeMap::len).sum()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	fn read(&self) -> RwLockReadGuard<'_, BTreeMap<CollectionPath, BTreeMap<String, StoredDoc>>> {
		self.collections.read().unwrap_or_else(|err| err.into_inner())
	}

	fn write(
		&self,
	) -> RwLockWriteGuard<'_, BTreeMap<CollectionPath, BTreeMap<String, StoredDoc>>> {
		self.collections.write().unwrap_or_else(|err| err.into_inner())
	}

	fn list_sync(&self, path: &CollectionPath) -> Result<Vec<Document>> {
		let collections = self.read();
		let Some(docs) = collections.get(path) else {
			return Ok(Vec::new());
		};

		docs.iter().map(|(id, doc)| to_document(path, id, doc)).collect()
	}

	fn get_sync(&self, path: &DocPath) -> Option<Document> {
		let collections = self.read();
		let doc = collections.get(path.collection())?.get(path.id())?;

		Some(Document {
			path: path.clone(),
			fields: doc.fields.clone(),
			version: doc.version,
			updated_at: doc.updated_at,
		})
	}

	fn update_sync(
		&self,
		path: &DocPath,
		fields: Fields,
		expected_version: Option<u64>,
	) -> Result<u64> {
		let mut collections = self.write();
		let doc = collections
			.get_mut(path.collection())
			.and_then(|docs| docs.get_mut(path.id()))
			.ok_or_else(|| Error::NotFound(path.to_string()))?;

		if let Some(expected) = expected_version
			&& expected != doc.version
		{
			return Err(Error::Conflict(format!(
				"{path} is at version {}, expected {expected}",
				doc.version
			)));
		}

		doc.fields.extend(fields);
		doc.version += 1;
		doc.updated_at = OffsetDateTime::now_utc();

		Ok(doc.version)
	}

	fn query_group_sync(&self, group: &str, filters: &[FieldFilter]) -> Result<Vec<Document>> {
		let collections = self.read();
		let mut out = Vec::new();

		for (path, docs) in collections.iter().filter(|(path, _)| path.group() == group) {
			for (id, doc) in docs {
				if filters.iter().all(|filter| filter.matches(&doc.fields)) {
					out.push(to_document(path, id, doc)?);
				}
			}
		}

		Ok(out)
	}
}

impl DocumentStore for MemoryStore {
	fn list_collection<'a>(
		&'a self,
		path: &'a CollectionPath,
	) -> BoxFuture<'a, Result<Vec<Document>>> {
		Box::pin(async move { self.list_sync(path) })
	}

	fn get_document<'a>(&'a self, path: &'a DocPath) -> BoxFuture<'a, Result<Option<Document>>> {
		Box::pin(async move { Ok(self.get_sync(path)) })
	}

	fn update_document<'a>(
		&'a self,
		path: &'a DocPath,
		fields: Fields,
		expected_version: Option<u64>,
	) -> BoxFuture<'a, Result<u64>> {
		Box::pin(async move { self.update_sync(path, fields, expected_version) })
	}

	fn query_group<'a>(
		&'a self,
		group: &'a str,
		filters: &'a [FieldFilter],
	) -> BoxFuture<'a, Result<Vec<Document>>> {
		Box::pin(async move { self.query_group_sync(group, filters) })
	}
}

fn to_document(collection: &CollectionPath, id: &str, doc: &StoredDoc) -> Result<Document> {
	Ok(Document {
		path: collection.doc(id)?,
		fields: doc.fields.clone(),
		version: doc.version,
		updated_at: doc.updated_at,
	})
}
