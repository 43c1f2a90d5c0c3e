//! Fan-out aggregation: one read per owner shard, merged into a single immutable view.

use std::time::Duration;

use futures::{FutureExt, StreamExt, stream};
use time::OffsetDateTime;

use rh_domain::{
	AggregatedView, EnrichedRequest, LookupCache, Owner, PassReport, Scope, ShardFailure,
};
use rh_storage::{BoxFuture, Document, FieldFilter, path};

use crate::{Error, RechargeService, Result, decode};

impl RechargeService {
	/// Runs one aggregation pass for `scope`.
	///
	/// Shard reads that fail or time out are left out of the view and listed in its report. The
	/// pass only fails as a whole when the owner list itself cannot be read.
	pub async fn aggregate(&self, scope: &Scope) -> Result<AggregatedView> {
		let pass = self.next_pass();
		let owners = self.load_owners().await?;
		let lookup = LookupCache::build(&owners);
		let mut report = PassReport::default();
		let documents = match scope {
			Scope::Global => {
				let owner_ids = owners.iter().map(|owner| owner.id.clone()).collect();

				self.read_owner_shards(owner_ids, &mut report).await
			},
			Scope::Owner { owner_id } => {
				if !lookup.contains(owner_id) {
					tracing::warn!(
						owner_id = %owner_id,
						pass,
						"Owner scope names an unknown owner."
					);
				}

				self.read_owner_shards(vec![owner_id.clone()], &mut report).await
			},
			Scope::Partner { partner_id, .. } =>
				self.read_partner_group(partner_id, &mut report).await,
		};
		let mut records = Vec::with_capacity(documents.len());

		for doc in &documents {
			match decode::request(doc) {
				Ok(request) if scope.admits(&request) =>
					records.push(EnrichedRequest::enrich(request, &lookup, doc.version)),
				Ok(_) => {},
				Err(err) => {
					tracing::warn!(error = %err, pass, "Skipping malformed request document.");

					report.malformed += 1;
				},
			}
		}

		tracing::info!(
			pass,
			owners = owners.len(),
			shards = report.shards_queried,
			omitted = report.omitted.len(),
			malformed = report.malformed,
			records = records.len(),
			"Aggregation pass finished."
		);

		Ok(AggregatedView {
			pass,
			revision: 0,
			scope: scope.clone(),
			records,
			report,
			built_at: OffsetDateTime::now_utc(),
		})
	}

	async fn load_owners(&self) -> Result<Vec<Owner>> {
		let owners = path::owners();

		match self.bounded(self.store.list_collection(&owners)).await {
			Ok(docs) => Ok(docs.iter().map(decode::owner).collect()),
			Err(message) => {
				tracing::error!(error = %message, "Owner lookup failed.");

				Err(Error::LookupUnavailable { message })
			},
		}
	}

	async fn read_owner_shards(
		&self,
		owner_ids: Vec<String>,
		report: &mut PassReport,
	) -> Vec<Document> {
		let reads = owner_ids.into_iter().map(|owner_id| {
			async move {
				let outcome = self.read_owner(&owner_id).await;

				(owner_id, outcome)
			}
			.boxed()
		});
		let outcomes: Vec<_> = stream::iter(reads)
			.buffer_unordered(self.cfg.aggregation.max_concurrent_reads.max(1))
			.collect()
			.await;
		let mut documents = Vec::new();

		report.shards_queried += outcomes.len();

		for (owner_id, outcome) in outcomes {
			match outcome {
				Ok(mut docs) => documents.append(&mut docs),
				Err(message) => {
					tracing::warn!(
						owner_id = %owner_id,
						error = %message,
						"Owner shard omitted from pass."
					);

					report.omitted.push(ShardFailure { shard: shard_label(&owner_id), message });
				},
			}
		}

		documents
	}

	async fn read_owner(&self, owner_id: &str) -> std::result::Result<Vec<Document>, String> {
		let collection = path::owner_requests(owner_id).map_err(|err| err.to_string())?;

		self.bounded(self.store.list_collection(&collection)).await
	}

	async fn read_partner_group(&self, partner_id: &str, report: &mut PassReport) -> Vec<Document> {
		let filters = [FieldFilter::equals(decode::PARTNER_ID, partner_id)];

		report.shards_queried += 1;

		match self.bounded(self.store.query_group(path::REQUESTS, &filters)).await {
			Ok(docs) => docs,
			Err(message) => {
				tracing::warn!(partner_id, error = %message, "Group query omitted from pass.");

				report.omitted.push(ShardFailure { shard: path::REQUESTS.to_string(), message });

				Vec::new()
			},
		}
	}

	async fn bounded<T>(
		&self,
		read: BoxFuture<'_, rh_storage::Result<T>>,
	) -> std::result::Result<T, String> {
		let limit = Duration::from_millis(self.cfg.aggregation.read_timeout_ms);

		match tokio::time::timeout(limit, read).await {
			Ok(Ok(value)) => Ok(value),
			Ok(Err(err)) => Err(err.to_string()),
			Err(_) => Err(format!("read timed out after {} ms", limit.as_millis())),
		}
	}
}

fn shard_label(owner_id: &str) -> String {
	format!("{}/{owner_id}/{}", path::OWNERS, path::REQUESTS)
}
