use serde::{Deserialize, Serialize};
use serde_json::Value;

use rh_domain::{Access, RechargeRequest, RequestRef, RequestStatus};
use rh_storage::{Fields, path};

use crate::{Error, RechargeService, Result, decode};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StatusUpdate {
	pub owner_id: String,
	pub request_id: String,
	pub status: RequestStatus,
	/// Partner recorded as the assignee. Defaults to the caller.
	#[serde(default)]
	pub acting_partner_id: Option<String>,
	/// Document version the caller last observed.
	#[serde(default)]
	pub expected_version: Option<u64>,
}
impl StatusUpdate {
	pub fn reference(&self) -> RequestRef {
		RequestRef::new(self.owner_id.trim(), self.request_id.trim())
	}
}

/// The request as written, with the version the store assigned to the write.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UpdatedRequest {
	pub request: RechargeRequest,
	pub version: u64,
}

impl RechargeService {
	/// Sets the status of one request and records the acting partner as its assignee.
	///
	/// Any status may follow any other, and the previous assignee is always overwritten. With a
	/// version token the write is conditional on the document being unchanged since it was read.
	pub async fn apply_status(&self, access: &Access, update: StatusUpdate) -> Result<UpdatedRequest> {
		let acting_partner_id = access
			.acting_partner(update.acting_partner_id.as_deref())
			.map_err(|err| Error::ScopeDenied { message: err.to_string() })?;

		if self.cfg.workflow.require_version_token && update.expected_version.is_none() {
			return Err(Error::InvalidRequest {
				message: "expected_version is required for status updates.".to_string(),
			});
		}

		let reference = update.reference();

		if reference.owner_id.is_empty() || reference.request_id.is_empty() {
			return Err(Error::InvalidRequest {
				message: "owner_id and request_id are required.".to_string(),
			});
		}

		let partner_path = path::partner_doc(&acting_partner_id)?;
		let Some(partner_doc) = self.store.get_document(&partner_path).await? else {
			return Err(Error::NotFound { message: format!("partner {acting_partner_id}") });
		};
		let partner = decode::partner(&partner_doc)?;
		let request_path = path::request_doc(&reference.owner_id, &reference.request_id)?;
		let Some(request_doc) = self.store.get_document(&request_path).await? else {
			return Err(Error::NotFound { message: format!("request {reference}") });
		};

		if let Some(expected) = update.expected_version
			&& expected != request_doc.version
		{
			return Err(stale(&reference, expected, request_doc.version));
		}

		let mut request = decode::request(&request_doc)?;
		let mut fields = Fields::new();

		fields.insert(decode::STATUS.to_string(), Value::from(update.status.as_str()));
		fields.insert(decode::PARTNER_ID.to_string(), Value::from(partner.id.as_str()));
		fields.insert(decode::PARTNER_NAME.to_string(), Value::from(partner.name.as_str()));

		let version = self
			.store
			.update_document(&request_path, fields, update.expected_version)
			.await
			.map_err(|err| match err {
				rh_storage::Error::Conflict(message) => Error::Conflict { message },
				rh_storage::Error::NotFound(message) => Error::NotFound { message },
				other => Error::WriteFailure { message: other.to_string() },
			})?;

		request.status = update.status;
		request.partner_id = Some(partner.id);
		request.partner_name = Some(partner.name);

		tracing::info!(
			request = %reference,
			status = %request.status,
			partner_id = request.partner_id.as_deref().unwrap_or_default(),
			version,
			"Request status updated."
		);

		Ok(UpdatedRequest { request, version })
	}
}

fn stale(reference: &RequestRef, expected: u64, current: u64) -> Error {
	Error::Conflict {
		message: format!("request {reference} is at version {current}, expected {expected}"),
	}
}
