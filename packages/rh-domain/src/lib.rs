pub mod bucket;
pub mod export;
pub mod filter;
pub mod lookup;
pub mod partner;
pub mod request;
pub mod scope;
pub mod summary;
pub mod timestamp;
pub mod view;

pub use bucket::{Bucket, Granularity, MONTH_LABELS, bucketize};
pub use export::{ExportRow, ExportSink, export_rows};
pub use filter::{FilterQuery, filter, sort_newest_first};
pub use lookup::{LookupCache, Owner};
pub use partner::{Partner, PartnerRole, PartnerStatus};
pub use request::{
	EnrichedRequest, MISSING_UTR, Plan, RechargeRequest, RequestRef, RequestStatus, UNNAMED_OWNER,
};
pub use scope::{Access, Authority, AuthorityDenied, Role, Scope, ViewKind, resolve_scope};
pub use summary::{Summary, summarize};
pub use view::{AggregatedView, PassReport, PatchOutcome, ShardFailure};
