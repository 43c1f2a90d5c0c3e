use std::sync::Arc;

use axum::http::HeaderName;
use color_eyre::eyre;

use rh_config::Config;
use rh_service::RechargeService;
use rh_storage::db::Db;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<RechargeService>,
	/// Header carrying the authenticated caller identity.
	pub caller_header: HeaderName,
}
impl AppState {
	/// Connects to Postgres, ensures the schema, and serves from the documents table.
	pub async fn new(config: Config) -> color_eyre::Result<Self> {
		let db = Db::connect(&config.storage.postgres).await?;

		db.ensure_schema().await?;

		Self::with_service(Arc::new(RechargeService::new(config, Arc::new(db))))
	}

	pub fn with_service(service: Arc<RechargeService>) -> color_eyre::Result<Self> {
		let caller_header = HeaderName::try_from(service.cfg.access.caller_header.as_str())
			.map_err(|err| eyre::eyre!("Invalid access.caller_header: {err}."))?;

		Ok(Self { service, caller_header })
	}
}
