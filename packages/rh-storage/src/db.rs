use serde_json::Value;
use sqlx::{PgPool, Row, postgres::PgPoolOptions, postgres::PgRow, types::Json};
use time::OffsetDateTime;

use crate::{
	BoxFuture, CollectionPath, DocPath, Document, DocumentStore, Error, FieldFilter, Fields,
	Result, schema,
};

const SCHEMA_LOCK_ID: i64 = 7_120_115;

/// Postgres-backed document store. All documents live in one table keyed by
/// `(collection, doc_id)`; `group_name` carries the final collection segment for group queries.
pub struct Db {
	pub pool: PgPool,
}
impl Db {
	pub async fn connect(cfg: &rh_config::Postgres) -> Result<Self> {
		let pool =
			PgPoolOptions::new().max_connections(cfg.pool_max_conns).connect(&cfg.dsn).await?;

		Ok(Self { pool })
	}

	pub async fn ensure_schema(&self) -> Result<()> {
		let sql = schema::render_schema();
		// Advisory locks are per connection; the transaction pins the lock to one connection.
		let mut tx = self.pool.begin().await?;

		sqlx::query("SELECT pg_advisory_xact_lock($1)")
			.bind(SCHEMA_LOCK_ID)
			.execute(&mut *tx)
			.await?;

		for statement in sql.split(';') {
			let trimmed = statement.trim();

			if trimmed.is_empty() {
				continue;
			}

			sqlx::query(trimmed).execute(&mut *tx).await?;
		}

		tx.commit().await?;

		tracing::info!("Document schema ensured.");

		Ok(())
	}

	/// Creates or replaces a document and returns its new version.
	pub async fn put_document(&self, path: &DocPath, fields: &Fields) -> Result<u64> {
		let collection = path.collection();
		let version: i64 = sqlx::query_scalar(
			"\
INSERT INTO documents (collection, doc_id, group_name, fields, version, updated_at)
VALUES ($1, $2, $3, $4, 1, $5)
ON CONFLICT (collection, doc_id)
DO UPDATE
SET
	fields = EXCLUDED.fields,
	version = documents.version + 1,
	updated_at = EXCLUDED.updated_at
RETURNING version",
		)
		.bind(collection.as_str())
		.bind(path.id())
		.bind(collection.group())
		.bind(Json(fields))
		.bind(OffsetDateTime::now_utc())
		.fetch_one(&self.pool)
		.await?;

		to_version(version)
	}

	async fn list(&self, path: &CollectionPath) -> Result<Vec<Document>> {
		let rows = sqlx::query(
			"\
SELECT collection, doc_id, fields, version, updated_at
FROM documents
WHERE collection = $1
ORDER BY doc_id",
		)
		.bind(path.as_str())
		.fetch_all(&self.pool)
		.await?;

		rows.iter().map(row_to_document).collect()
	}

	async fn get(&self, path: &DocPath) -> Result<Option<Document>> {
		let row = sqlx::query(
			"\
SELECT collection, doc_id, fields, version, updated_at
FROM documents
WHERE collection = $1 AND doc_id = $2",
		)
		.bind(path.collection().as_str())
		.bind(path.id())
		.fetch_optional(&self.pool)
		.await?;

		row.as_ref().map(row_to_document).transpose()
	}

	async fn update(
		&self,
		path: &DocPath,
		fields: Fields,
		expected_version: Option<u64>,
	) -> Result<u64> {
		let expected = expected_version.map(i64::try_from).transpose().map_err(|_| {
			Error::Conflict(format!("{path} expected version is out of range"))
		})?;
		let updated: Option<i64> = sqlx::query_scalar(
			"\
UPDATE documents
SET
	fields = fields || $3,
	version = version + 1,
	updated_at = $5
WHERE collection = $1
	AND doc_id = $2
	AND ($4::bigint IS NULL OR version = $4)
RETURNING version",
		)
		.bind(path.collection().as_str())
		.bind(path.id())
		.bind(Json(&fields))
		.bind(expected)
		.bind(OffsetDateTime::now_utc())
		.fetch_optional(&self.pool)
		.await?;

		if let Some(version) = updated {
			return to_version(version);
		}

		let current: Option<i64> = sqlx::query_scalar(
			"SELECT version FROM documents WHERE collection = $1 AND doc_id = $2",
		)
		.bind(path.collection().as_str())
		.bind(path.id())
		.fetch_optional(&self.pool)
		.await?;

		match (current, expected) {
			(None, _) => Err(Error::NotFound(path.to_string())),
			(Some(current), Some(expected)) => Err(Error::Conflict(format!(
				"{path} is at version {current}, expected {expected}"
			))),
			(Some(_), None) => Err(Error::Unavailable(format!("{path} update affected no rows"))),
		}
	}

	async fn group(&self, group: &str, filters: &[FieldFilter]) -> Result<Vec<Document>> {
		let mut containment = Fields::new();

		for filter in filters {
			containment.insert(filter.field.clone(), filter.value.clone());
		}

		let rows = sqlx::query(
			"\
SELECT collection, doc_id, fields, version, updated_at
FROM documents
WHERE group_name = $1 AND fields @> $2
ORDER BY collection, doc_id",
		)
		.bind(group)
		.bind(Json(Value::Object(containment)))
		.fetch_all(&self.pool)
		.await?;

		rows.iter().map(row_to_document).collect()
	}
}

impl DocumentStore for Db {
	fn list_collection<'a>(
		&'a self,
		path: &'a CollectionPath,
	) -> BoxFuture<'a, Result<Vec<Document>>> {
		Box::pin(self.list(path))
	}

	fn get_document<'a>(&'a self, path: &'a DocPath) -> BoxFuture<'a, Result<Option<Document>>> {
		Box::pin(self.get(path))
	}

	fn update_document<'a>(
		&'a self,
		path: &'a DocPath,
		fields: Fields,
		expected_version: Option<u64>,
	) -> BoxFuture<'a, Result<u64>> {
		Box::pin(self.update(path, fields, expected_version))
	}

	fn query_group<'a>(
		&'a self,
		group: &'a str,
		filters: &'a [FieldFilter],
	) -> BoxFuture<'a, Result<Vec<Document>>> {
		Box::pin(self.group(group, filters))
	}
}

fn row_to_document(row: &PgRow) -> Result<Document> {
	let collection: String = row.try_get("collection")?;
	let doc_id: String = row.try_get("doc_id")?;
	let Json(fields): Json<Value> = row.try_get("fields")?;
	let version: i64 = row.try_get("version")?;
	let updated_at: OffsetDateTime = row.try_get("updated_at")?;
	let Value::Object(fields) = fields else {
		return Err(Error::Decode(format!("{collection}/{doc_id} fields are not an object")));
	};

	Ok(Document {
		path: CollectionPath::parse(&collection)?.doc(&doc_id)?,
		fields,
		version: to_version(version)?,
		updated_at,
	})
}

fn to_version(version: i64) -> Result<u64> {
	u64::try_from(version).map_err(|_| Error::Decode(format!("negative document version {version}")))
}
