use std::{
	sync::{
		Arc, Mutex,
		atomic::{AtomicUsize, Ordering},
	},
	time::Duration,
};

use serde_json::{Value, json};

use rh_config::Config;
use rh_domain::{
	Bucket, ExportRow, Granularity, RequestRef, RequestStatus, Scope, UNNAMED_OWNER, ViewKind,
};
use rh_service::{
	Error, ListingQuery, RechargeService, Reconciled, StatusUpdate, ViewSession,
};
use rh_storage::{
	BoxFuture, CollectionPath, DocPath, Document, DocumentStore, FieldFilter, Fields, Result,
	memory::MemoryStore, path,
};

/// Memory-backed store with switchable failures, delays, and call accounting.
#[derive(Default)]
struct FakeStore {
	inner: MemoryStore,
	failing: Vec<String>,
	slow: Vec<String>,
	delays: Vec<(String, Duration)>,
	read_delay: Duration,
	owners_unavailable: bool,
	fail_updates: bool,
	in_flight: AtomicUsize,
	max_in_flight: AtomicUsize,
	updates: AtomicUsize,
	completions: Mutex<Vec<String>>,
}
impl FakeStore {
	fn seeded() -> Self {
		let store = Self::default();

		seed(&store.inner);

		store
	}

	async fn version(&self, owner_id: &str, request_id: &str) -> u64 {
		let doc = self
			.inner
			.get_document(&request_path(owner_id, request_id))
			.await
			.expect("Get must succeed.");

		doc.map(|doc| doc.version).unwrap_or_default()
	}

	fn delay_for(&self, path: &CollectionPath) -> Duration {
		if self.slow.iter().any(|slow| slow == path.as_str()) {
			return Duration::from_millis(500);
		}

		self.delays
			.iter()
			.find(|(shard, _)| shard == path.as_str())
			.map(|(_, delay)| *delay)
			.unwrap_or(self.read_delay)
	}

	/// Snapshots the shard first and then holds the result for the shard's delay.
	async fn read_requests(&self, path: &CollectionPath) -> Result<Vec<Document>> {
		let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;

		self.max_in_flight.fetch_max(now, Ordering::SeqCst);

		let outcome = if self.failing.iter().any(|failing| failing == path.as_str()) {
			Err(rh_storage::Error::Unavailable(format!("{path} is offline")))
		} else {
			self.inner.list_collection(path).await
		};
		let delay = self.delay_for(path);

		if !delay.is_zero() {
			tokio::time::sleep(delay).await;
		}

		self.in_flight.fetch_sub(1, Ordering::SeqCst);
		self.completions
			.lock()
			.expect("Completions lock must not be poisoned.")
			.push(path.to_string());

		outcome
	}
}
impl DocumentStore for FakeStore {
	fn list_collection<'a>(
		&'a self,
		path: &'a CollectionPath,
	) -> BoxFuture<'a, Result<Vec<Document>>> {
		Box::pin(async move {
			if path.as_str() == path::OWNERS {
				if self.owners_unavailable {
					return Err(rh_storage::Error::Unavailable("owner directory offline".to_string()));
				}

				return self.inner.list_collection(path).await;
			}

			self.read_requests(path).await
		})
	}

	fn get_document<'a>(&'a self, path: &'a DocPath) -> BoxFuture<'a, Result<Option<Document>>> {
		self.inner.get_document(path)
	}

	fn update_document<'a>(
		&'a self,
		path: &'a DocPath,
		fields: Fields,
		expected_version: Option<u64>,
	) -> BoxFuture<'a, Result<u64>> {
		if self.fail_updates {
			return Box::pin(async move {
				Err(rh_storage::Error::Unavailable(format!("{path} rejected the write")))
			});
		}

		self.updates.fetch_add(1, Ordering::SeqCst);
		self.inner.update_document(path, fields, expected_version)
	}

	fn query_group<'a>(
		&'a self,
		group: &'a str,
		filters: &'a [FieldFilter],
	) -> BoxFuture<'a, Result<Vec<Document>>> {
		self.inner.query_group(group, filters)
	}
}

fn fields(value: Value) -> Fields {
	match value {
		Value::Object(map) => map,
		_ => panic!("Test fields must be an object."),
	}
}

fn request_path(owner_id: &str, request_id: &str) -> DocPath {
	path::request_doc(owner_id, request_id).expect("Request path must be valid.")
}

fn seed(store: &MemoryStore) {
	for (owner_id, name) in [("o1", json!("Anita Sharma")), ("o2", json!("Ravi")), ("o3", Value::Null)]
	{
		store.put(
			&path::owners().doc(owner_id).expect("Owner path must be valid."),
			fields(json!({ "displayName": name })),
		);
	}
	for (partner_id, name, role, status) in [
		("p-1", "Priya", "employee", "active"),
		("p-2", "Karan", "employee", "active"),
		("p-adm", "Meera", "admin", "active"),
		("p-off", "Old", "employee", "suspended"),
	] {
		store.put(
			&path::partner_doc(partner_id).expect("Partner path must be valid."),
			fields(json!({
				"name": name,
				"email": format!("{partner_id}@example.com"),
				"role": role,
				"status": status,
				"joinedAt": "2023-06-01T00:00:00Z",
			})),
		);
	}

	store.put(
		&request_path("o1", "r1"),
		fields(json!({
			"number": "9800000001",
			"plan": { "provider": "Jio", "price": 199 },
			"status": "Processing",
			"requestedDate": "2024-01-05T10:00:00Z",
			"utr": "UTR-1",
		})),
	);
	store.put(
		&request_path("o1", "r2"),
		fields(json!({
			"number": "9800000002",
			"plan": { "provider": "Airtel", "price": 299 },
			"status": "Success",
			"partnerId": "p-1",
			"partnerName": "Priya",
			"requestedDate": "2024-01-06T09:30:00Z",
			"transactionId": "TX-2",
		})),
	);
	store.put(
		&request_path("o2", "r3"),
		fields(json!({
			"number": "9800000003",
			"plan": { "provider": "Vi", "price": 399 },
			"status": "Success",
			"partnerId": "p-2",
			"partnerName": "Karan",
			"requestedDate": "2024-01-05T20:00:00Z",
		})),
	);
	store.put(
		&request_path("o3", "r4"),
		fields(json!({
			"number": "9800000004",
			"plan": { "provider": "Jio", "price": 99 },
			"status": "Failed",
			"partnerId": "p-1",
			"partnerName": "Priya",
		})),
	);
}

fn config(extra: &str) -> Config {
	rh_config::parse(&format!(
		r#"
[service]
http_bind = "127.0.0.1:0"
log_level = "info"

[storage.postgres]
dsn = "postgres://localhost/rh"
pool_max_conns = 1

[access]
admin_identities = ["root"]

{extra}
"#
	))
	.expect("Test config must be valid.")
}

fn service_with(store: FakeStore, extra: &str) -> (Arc<RechargeService>, Arc<FakeStore>) {
	let store = Arc::new(store);
	let service = Arc::new(RechargeService::new(config(extra), store.clone()));

	(service, store)
}

fn ids(records: &[rh_domain::EnrichedRequest]) -> Vec<String> {
	let mut ids: Vec<String> = records.iter().map(|record| record.request.id.clone()).collect();

	ids.sort();

	ids
}

fn update(owner_id: &str, request_id: &str, status: RequestStatus) -> StatusUpdate {
	StatusUpdate {
		owner_id: owner_id.to_string(),
		request_id: request_id.to_string(),
		status,
		acting_partner_id: None,
		expected_version: None,
	}
}

#[tokio::test]
async fn global_pass_unions_every_owner_and_enriches_names() {
	let (service, _) = service_with(FakeStore::seeded(), "");
	let view = service.aggregate(&Scope::Global).await.expect("Pass must succeed.");

	assert_eq!(ids(&view.records), vec!["r1", "r2", "r3", "r4"]);
	assert_eq!(view.report.shards_queried, 3);
	assert!(view.report.is_complete());

	let r1 = view.get(&RequestRef::new("o1", "r1")).expect("r1 must be present.");
	let r4 = view.get(&RequestRef::new("o3", "r4")).expect("r4 must be present.");

	assert_eq!(r1.owner_name, "Anita Sharma");
	assert_eq!(r1.display_utr, "UTR-1");
	assert_eq!(r4.owner_name, UNNAMED_OWNER);
	assert_eq!(r4.display_utr, "N/A");
	assert_eq!(r4.request.requested_at, None);
}

#[tokio::test]
async fn owner_scope_reads_one_sub_collection() {
	let (service, _) = service_with(FakeStore::seeded(), "");
	let view = service
		.aggregate(&Scope::Owner { owner_id: "o1".to_string() })
		.await
		.expect("Pass must succeed.");

	assert_eq!(ids(&view.records), vec!["r1", "r2"]);
	assert_eq!(view.report.shards_queried, 1);
}

#[tokio::test]
async fn failed_shard_is_omitted_and_reported() {
	let store = FakeStore { failing: vec!["owners/o2/requests".to_string()], ..FakeStore::seeded() };
	let (service, _) = service_with(store, "");
	let view = service.aggregate(&Scope::Global).await.expect("Pass must succeed.");

	assert_eq!(ids(&view.records), vec!["r1", "r2", "r4"]);
	assert_eq!(view.report.omitted.len(), 1);
	assert_eq!(view.report.omitted[0].shard, "owners/o2/requests");
	assert!(view.report.omitted[0].message.contains("offline"));
}

#[tokio::test]
async fn slow_shard_times_out_without_failing_the_pass() {
	let store = FakeStore { slow: vec!["owners/o1/requests".to_string()], ..FakeStore::seeded() };
	let (service, _) = service_with(store, "[aggregation]\nread_timeout_ms = 50");
	let view = service.aggregate(&Scope::Global).await.expect("Pass must succeed.");

	assert_eq!(ids(&view.records), vec!["r3", "r4"]);
	assert_eq!(view.report.omitted.len(), 1);
	assert!(view.report.omitted[0].message.contains("timed out"));
}

#[tokio::test]
async fn owner_directory_failure_aborts_the_pass() {
	let store = FakeStore { owners_unavailable: true, ..FakeStore::seeded() };
	let (service, _) = service_with(store, "");
	let err = service.aggregate(&Scope::Global).await.expect_err("Pass must fail.");

	assert!(matches!(err, Error::LookupUnavailable { .. }));
}

#[tokio::test]
async fn fan_out_respects_the_concurrency_bound() {
	let store = FakeStore { read_delay: Duration::from_millis(20), ..FakeStore::seeded() };

	for owner_id in ["o4", "o5", "o6", "o7"] {
		store.inner.put(
			&path::owners().doc(owner_id).expect("Owner path must be valid."),
			fields(json!({ "displayName": owner_id })),
		);
	}

	let (service, store) = service_with(store, "[aggregation]\nmax_concurrent_reads = 2");
	let view = service.aggregate(&Scope::Global).await.expect("Pass must succeed.");

	assert_eq!(view.report.shards_queried, 7);
	assert!(store.max_in_flight.load(Ordering::SeqCst) <= 2);
}

#[tokio::test]
async fn shards_finishing_out_of_order_still_union_every_record() {
	let store = FakeStore {
		delays: vec![
			("owners/o1/requests".to_string(), Duration::from_millis(150)),
			("owners/o2/requests".to_string(), Duration::from_millis(100)),
			("owners/o3/requests".to_string(), Duration::from_millis(50)),
		],
		..FakeStore::seeded()
	};
	let (service, store) = service_with(store, "");
	let view = service.aggregate(&Scope::Global).await.expect("Pass must succeed.");
	let completions =
		store.completions.lock().expect("Completions lock must not be poisoned.").clone();

	assert_eq!(
		completions,
		vec!["owners/o3/requests", "owners/o2/requests", "owners/o1/requests"]
	);
	assert_eq!(ids(&view.records), vec!["r1", "r2", "r3", "r4"]);
	assert_eq!(view.records.len(), 2 + 1 + 1);
	assert!(view.report.is_complete());

	for (owner_id, expected) in [("o1", 2), ("o2", 1), ("o3", 1)] {
		let held = view.records.iter().filter(|record| record.request.owner_id == owner_id).count();

		assert_eq!(held, expected, "{owner_id}");
	}
}

#[tokio::test]
async fn malformed_documents_are_skipped_and_counted() {
	let store = FakeStore::seeded();

	store.inner.put(&request_path("o2", "bad"), fields(json!({ "number": "1" })));

	let (service, _) = service_with(store, "");
	let view = service.aggregate(&Scope::Global).await.expect("Pass must succeed.");

	assert_eq!(view.records.len(), 4);
	assert_eq!(view.report.malformed, 1);
}

#[tokio::test]
async fn employee_sees_only_their_own_assignments() {
	let (service, _) = service_with(FakeStore::seeded(), "");
	let assigned = service.access("p-1", ViewKind::Assigned).await.expect("p-1 is active.");
	let processed = service.access("p-1", ViewKind::Processed).await.expect("p-1 is active.");
	let assigned_view = service.aggregate(&assigned.scope).await.expect("Pass must succeed.");
	let processed_view = service.aggregate(&processed.scope).await.expect("Pass must succeed.");

	assert_eq!(ids(&assigned_view.records), vec!["r2", "r4"]);
	assert_eq!(ids(&processed_view.records), vec!["r2"]);
	assert!(
		assigned_view
			.records
			.iter()
			.all(|record| record.request.partner_id.as_deref() == Some("p-1"))
	);
}

#[tokio::test]
async fn role_resolution_is_least_privilege() {
	let (service, _) = service_with(FakeStore::seeded(), "");

	for identity in ["root", "p-adm"] {
		let access = service.access(identity, ViewKind::Assigned).await.expect("Admin resolves.");

		assert_eq!(access.scope, Scope::Global);
	}
	for identity in ["stranger", "p-off", "", "owners/o1"] {
		let err = service.access(identity, ViewKind::Assigned).await.expect_err("Must be denied.");

		assert!(matches!(err, Error::ScopeDenied { .. }), "{identity}: {err}");
	}
}

#[tokio::test]
async fn status_change_assigns_the_acting_partner() {
	let (service, store) = service_with(FakeStore::seeded(), "");
	let access = service.access("root", ViewKind::Assigned).await.expect("Admin resolves.");
	let before = store.version("o1", "r2").await;
	let updated = service
		.apply_status(
			&access,
			StatusUpdate {
				acting_partner_id: Some("p-2".to_string()),
				expected_version: Some(before),
				..update("o1", "r2", RequestStatus::Processing)
			},
		)
		.await
		.expect("Update must succeed.");

	assert_eq!(updated.version, before + 1);
	assert_eq!(updated.request.status, RequestStatus::Processing);
	assert_eq!(updated.request.partner_id.as_deref(), Some("p-2"));
	assert_eq!(updated.request.partner_name.as_deref(), Some("Karan"));

	let view = service.aggregate(&Scope::Global).await.expect("Pass must succeed.");
	let stored = view.get(&RequestRef::new("o1", "r2")).expect("r2 must be present.");

	assert_eq!(stored.request.partner_id.as_deref(), Some("p-2"));
	assert_eq!(stored.version, updated.version);
}

#[tokio::test]
async fn stale_version_token_conflicts_without_writing() {
	let (service, store) = service_with(FakeStore::seeded(), "");
	let access = service.access("p-1", ViewKind::Assigned).await.expect("p-1 is active.");
	let token = store.version("o1", "r1").await;
	let first = StatusUpdate { expected_version: Some(token), ..update("o1", "r1", RequestStatus::Success) };

	service.apply_status(&access, first.clone()).await.expect("First writer wins.");

	let err = service.apply_status(&access, first).await.expect_err("Second writer is stale.");

	assert!(matches!(err, Error::Conflict { .. }));
	assert_eq!(store.version("o1", "r1").await, token + 1);
	assert_eq!(store.updates.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn version_token_policy_follows_config() {
	let (strict, _) = service_with(FakeStore::seeded(), "");
	let access = strict.access("p-1", ViewKind::Assigned).await.expect("p-1 is active.");
	let err = strict
		.apply_status(&access, update("o1", "r1", RequestStatus::Success))
		.await
		.expect_err("Token is required.");

	assert!(matches!(err, Error::InvalidRequest { .. }));

	let (relaxed, _) =
		service_with(FakeStore::seeded(), "[workflow]\nrequire_version_token = false");
	let updated = relaxed
		.apply_status(&access, update("o1", "r1", RequestStatus::Success))
		.await
		.expect("Last write wins without a token.");

	assert_eq!(updated.request.partner_id.as_deref(), Some("p-1"));
}

#[tokio::test]
async fn employee_cannot_assign_someone_else() {
	let (service, store) = service_with(FakeStore::seeded(), "");
	let access = service.access("p-1", ViewKind::Assigned).await.expect("p-1 is active.");
	let err = service
		.apply_status(
			&access,
			StatusUpdate {
				acting_partner_id: Some("p-2".to_string()),
				expected_version: Some(1),
				..update("o1", "r1", RequestStatus::Success)
			},
		)
		.await
		.expect_err("Must be denied.");

	assert!(matches!(err, Error::ScopeDenied { .. }));
	assert_eq!(store.updates.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn missing_partner_or_request_is_not_found() {
	let (service, _) = service_with(FakeStore::seeded(), "");
	let access = service.access("root", ViewKind::Assigned).await.expect("Admin resolves.");
	let no_partner = service
		.apply_status(
			&access,
			StatusUpdate { expected_version: Some(1), ..update("o1", "r1", RequestStatus::Success) },
		)
		.await
		.expect_err("root has no partner record.");
	let no_request = service
		.apply_status(
			&access,
			StatusUpdate {
				acting_partner_id: Some("p-1".to_string()),
				expected_version: Some(1),
				..update("o1", "missing", RequestStatus::Success)
			},
		)
		.await
		.expect_err("Request does not exist.");

	assert!(matches!(no_partner, Error::NotFound { .. }));
	assert!(matches!(no_request, Error::NotFound { .. }));
}

#[tokio::test]
async fn session_patches_after_a_confirmed_write() {
	let (service, _) = service_with(FakeStore::seeded(), "");
	let access = service.access("root", ViewKind::Assigned).await.expect("Admin resolves.");
	let session = ViewSession::new(service, access);
	let view = session.refresh().await.expect("Pass must succeed.");
	let token = view.get(&RequestRef::new("o1", "r1")).expect("r1 must be present.").version;
	let applied = session
		.apply_status(StatusUpdate {
			acting_partner_id: Some("p-1".to_string()),
			expected_version: Some(token),
			..update("o1", "r1", RequestStatus::Success)
		})
		.await
		.expect("Update must succeed.");
	let Reconciled::Patched(patched) = applied.reconciled else {
		panic!("Expected a patched view.");
	};
	let record = patched.get(&RequestRef::new("o1", "r1")).expect("r1 must be present.");

	assert_eq!(patched.pass, view.pass);
	assert_eq!(patched.revision, view.revision + 1);
	assert_eq!(record.request.status, RequestStatus::Success);
	assert_eq!(record.request.partner_name.as_deref(), Some("Priya"));
	assert_eq!(record.owner_name, "Anita Sharma");
	assert_eq!(session.current(), Some(patched));
}

#[tokio::test]
async fn failed_write_leaves_the_session_view_untouched() {
	let store = FakeStore { fail_updates: true, ..FakeStore::seeded() };
	let (service, _) = service_with(store, "");
	let access = service.access("p-1", ViewKind::Assigned).await.expect("p-1 is active.");
	let session = ViewSession::new(service, access);
	let before = session.refresh().await.expect("Pass must succeed.");
	let err = session
		.apply_status(StatusUpdate {
			expected_version: Some(
				before.get(&RequestRef::new("o1", "r2")).expect("r2 must be present.").version,
			),
			..update("o1", "r2", RequestStatus::Failed)
		})
		.await
		.expect_err("Write must fail.");

	assert!(matches!(err, Error::WriteFailure { .. }));
	assert_eq!(session.current(), Some(before));
}

#[tokio::test]
async fn session_drops_records_that_leave_the_scope() {
	let (service, _) = service_with(FakeStore::seeded(), "");
	let access = service.access("p-1", ViewKind::Processed).await.expect("p-1 is active.");
	let session = ViewSession::new(service, access);
	let view = session.refresh().await.expect("Pass must succeed.");
	let token = view.get(&RequestRef::new("o1", "r2")).expect("r2 must be present.").version;
	let applied = session
		.apply_status(StatusUpdate {
			expected_version: Some(token),
			..update("o1", "r2", RequestStatus::Failed)
		})
		.await
		.expect("Update must succeed.");
	let Reconciled::Patched(patched) = applied.reconciled else {
		panic!("Expected a patched view.");
	};

	assert!(patched.records.is_empty());
	assert_eq!(patched.revision, 1);
}

#[tokio::test]
async fn session_requests_refresh_for_records_it_never_held() {
	let (service, store) = service_with(FakeStore::seeded(), "");
	let access = service.access("p-2", ViewKind::Assigned).await.expect("p-2 is active.");
	let session = ViewSession::new(service, access);
	let view = session.refresh().await.expect("Pass must succeed.");

	assert_eq!(ids(&view.records), vec!["r3"]);

	let applied = session
		.apply_status(StatusUpdate {
			expected_version: Some(store.version("o1", "r1").await),
			..update("o1", "r1", RequestStatus::Processing)
		})
		.await
		.expect("Update must succeed.");

	assert_eq!(applied.reconciled, Reconciled::NeedsRefresh);
	assert_eq!(session.current(), Some(view));

	let refreshed = session.refresh().await.expect("Pass must succeed.");

	assert_eq!(ids(&refreshed.records), vec!["r1", "r3"]);
}

#[tokio::test]
async fn refresh_runs_on_a_spawned_task() {
	let (service, _) = service_with(FakeStore::seeded(), "");
	let access = service.access("root", ViewKind::Assigned).await.expect("Admin resolves.");
	let session = Arc::new(ViewSession::new(service, access));
	let handle = tokio::spawn({
		let session = session.clone();

		async move { session.refresh().await }
	});
	let view = handle.await.expect("Task must not panic.").expect("Pass must succeed.");

	assert_eq!(ids(&view.records), vec!["r1", "r2", "r3", "r4"]);
	assert_eq!(session.current(), Some(view));
}

#[tokio::test]
async fn pass_started_before_a_write_does_not_undo_the_patch() {
	let store = FakeStore { read_delay: Duration::from_millis(300), ..FakeStore::seeded() };
	let (service, _) = service_with(store, "");
	let access = service.access("root", ViewKind::Assigned).await.expect("Admin resolves.");
	let session = ViewSession::new(service, access);
	let first = session.refresh().await.expect("Pass must succeed.");
	let token = first.get(&RequestRef::new("o1", "r1")).expect("r1 must be present.").version;
	let (refreshed, applied) = tokio::join!(session.refresh(), async {
		tokio::time::sleep(Duration::from_millis(50)).await;

		session
			.apply_status(StatusUpdate {
				acting_partner_id: Some("p-1".to_string()),
				expected_version: Some(token),
				..update("o1", "r1", RequestStatus::Success)
			})
			.await
	});
	let refreshed = refreshed.expect("Pass must succeed.");
	let applied = applied.expect("Update must succeed.");

	assert!(matches!(applied.reconciled, Reconciled::Patched(_)));

	let current = session.current().expect("A view must be installed.");

	for view in [&refreshed, &current] {
		let record = view.get(&RequestRef::new("o1", "r1")).expect("r1 must be present.");

		assert_eq!(record.request.status, RequestStatus::Success);
		assert_eq!(record.request.partner_id.as_deref(), Some("p-1"));
		assert_eq!(record.version, applied.updated.version);
	}
	assert!(current.pass > first.pass);
}

#[tokio::test]
async fn older_pass_never_replaces_a_newer_one() {
	let (service, _) = service_with(FakeStore::seeded(), "");
	let access = service.access("root", ViewKind::Assigned).await.expect("Admin resolves.");
	let older = service.aggregate(&access.scope).await.expect("Pass must succeed.");
	let newer = service.aggregate(&access.scope).await.expect("Pass must succeed.");
	let session = ViewSession::new(service, access);

	assert!(newer.pass > older.pass);
	assert!(session.install(newer.clone()));
	assert!(!session.install(older));
	assert_eq!(session.current().map(|view| view.pass), Some(newer.pass));
}

#[tokio::test]
async fn listing_filters_by_owner_name_and_date_range() {
	let (service, _) = service_with(FakeStore::seeded(), "");
	let view = service.aggregate(&Scope::Global).await.expect("Pass must succeed.");
	let query = ListingQuery {
		search: Some("anita".to_string()),
		from: Some("2024-01-01".to_string()),
		to: Some("2024-01-31".to_string()),
	};
	let listing = service.listing(&view, &query).expect("Query must be valid.");
	let ordered: Vec<&str> =
		listing.records.iter().map(|record| record.request.id.as_str()).collect();

	assert_eq!(ordered, vec!["r2", "r1"]);
	assert_eq!(listing.summary.total, 2);
	assert_eq!(listing.summary.success, 1);
	assert_eq!(service.listing(&view, &query).expect("Query must be valid.").records, listing.records);
}

#[tokio::test]
async fn undated_requests_survive_date_filters() {
	let (service, _) = service_with(FakeStore::seeded(), "");
	let view = service.aggregate(&Scope::Global).await.expect("Pass must succeed.");
	let query = ListingQuery {
		search: Some("unnamed".to_string()),
		from: Some("2030-01-01".to_string()),
		to: None,
	};
	let listing = service.listing(&view, &query).expect("Query must be valid.");

	assert_eq!(ids(&listing.records), vec!["r4"]);
}

#[tokio::test]
async fn inverted_date_range_is_rejected() {
	let (service, _) = service_with(FakeStore::seeded(), "");
	let view = service.aggregate(&Scope::Global).await.expect("Pass must succeed.");
	let query = ListingQuery {
		search: None,
		from: Some("2024-02-01".to_string()),
		to: Some("2024-01-01".to_string()),
	};

	assert!(matches!(service.listing(&view, &query), Err(Error::InvalidRequest { .. })));
}

#[tokio::test]
async fn day_metrics_follow_the_reporting_offset() {
	let (utc, _) = service_with(FakeStore::seeded(), "");
	let (ist, _) = service_with(FakeStore::seeded(), "[metrics]\nutc_offset_minutes = 330");
	let view = utc.aggregate(&Scope::Global).await.expect("Pass must succeed.");
	let bucket = |label: &str, count| Bucket { label: label.to_string(), count };

	assert_eq!(
		utc.metrics(&view, Granularity::Day).buckets,
		vec![bucket("2024-01-05", 2), bucket("2024-01-06", 1)]
	);
	assert_eq!(
		ist.metrics(&view, Granularity::Day).buckets,
		vec![bucket("2024-01-05", 1), bucket("2024-01-06", 2)]
	);

	let months = utc.metrics(&view, Granularity::Month);

	assert_eq!(months.buckets.len(), 12);
	assert_eq!(months.buckets[0], bucket("Jan", 3));
	assert_eq!(months.summary.total, 4);
}

#[tokio::test]
async fn export_writes_listing_rows_in_order() {
	let (service, _) = service_with(FakeStore::seeded(), "");
	let view = service.aggregate(&Scope::Global).await.expect("Pass must succeed.");
	let mut sink: Vec<ExportRow> = Vec::new();
	let written =
		service.export(&view, &ListingQuery::default(), &mut sink).expect("Export must succeed.");
	let utrs: Vec<&str> = sink.iter().map(|row| row.utr.as_str()).collect();

	assert_eq!(written, 4);
	assert_eq!(utrs, vec!["TX-2", "N/A", "UTR-1", "N/A"]);
	assert_eq!(sink[0].date, "2024-01-06 09:30");
	assert_eq!(sink[3].date, "");
	assert_eq!(sink[3].owner_name, UNNAMED_OWNER);
}

#[tokio::test]
async fn empty_owner_shard_contributes_nothing() {
	let store = FakeStore::seeded();

	store.inner.put(
		&path::owners().doc("o9").expect("Owner path must be valid."),
		fields(json!({ "displayName": "Empty" })),
	);

	let (service, _) = service_with(store, "");
	let view = service.aggregate(&Scope::Global).await.expect("Pass must succeed.");

	assert_eq!(view.report.shards_queried, 4);
	assert_eq!(view.records.len(), 4);
	assert!(view.report.is_complete());
}

#[tokio::test]
async fn status_change_is_visible_to_the_owner_scope_alone() {
	let (service, store) = service_with(FakeStore::seeded(), "");
	let scope = Scope::Owner { owner_id: "o1".to_string() };
	let before = service.aggregate(&scope).await.expect("Pass must succeed.");
	let access = service.access("p-2", ViewKind::Assigned).await.expect("p-2 is active.");

	service
		.apply_status(
			&access,
			StatusUpdate {
				expected_version: Some(store.version("o1", "r1").await),
				..update("o1", "r1", RequestStatus::Failed)
			},
		)
		.await
		.expect("Update must succeed.");

	let after = service.aggregate(&scope).await.expect("Pass must succeed.");
	let r1 = after.get(&RequestRef::new("o1", "r1")).expect("r1 must be present.");

	assert_eq!(r1.request.status, RequestStatus::Failed);
	assert_eq!(r1.request.partner_id.as_deref(), Some("p-2"));
	assert_eq!(r1.request.partner_name.as_deref(), Some("Karan"));
	assert_eq!(
		after.get(&RequestRef::new("o1", "r2")),
		before.get(&RequestRef::new("o1", "r2"))
	);
}
