use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use rh_domain::{Access, AggregatedView, PatchOutcome};

use crate::{RechargeService, Result, StatusUpdate, UpdatedRequest};

/// How a confirmed write was folded into the session's view.
#[derive(Clone, Debug, PartialEq)]
pub enum Reconciled {
	Patched(AggregatedView),
	/// The updated record belongs in the view but was not part of it.
	NeedsRefresh,
	/// No view has been installed yet.
	NoView,
}

#[derive(Clone, Debug)]
pub struct StatusApplied {
	pub updated: UpdatedRequest,
	pub reconciled: Reconciled,
}

/// One caller's current view. Refreshes and patches from the same caller may overlap; the
/// installed view only ever moves to a later pass, and never to a pass that started before a
/// confirmed write.
pub struct ViewSession {
	service: Arc<RechargeService>,
	access: Access,
	state: Mutex<SessionState>,
}
impl ViewSession {
	pub fn new(service: Arc<RechargeService>, access: Access) -> Self {
		Self { service, access, state: Mutex::new(SessionState::default()) }
	}

	pub fn access(&self) -> &Access {
		&self.access
	}

	pub fn current(&self) -> Option<AggregatedView> {
		self.lock().view.clone()
	}

	/// Runs a new pass and returns whichever view is installed once it finishes. A pass that
	/// started before a write confirmed by this session is rerun.
	pub async fn refresh(&self) -> Result<AggregatedView> {
		loop {
			let view = self.service.aggregate(&self.access.scope).await?;

			match self.try_install(view.clone()) {
				Install::Installed => return Ok(view),
				Install::Superseded(installed) => return Ok(installed),
				Install::Stale => {
					tracing::debug!(pass = view.pass, "Rerunning a pass that predates a write.");
				},
			}
		}
	}

	/// Installs `view` unless a view from a later-started pass is already in place or the pass
	/// started before the last confirmed write. Returns whether the view was installed.
	pub fn install(&self, view: AggregatedView) -> bool {
		matches!(self.try_install(view), Install::Installed)
	}

	/// Applies a status change and, once the store has confirmed it, patches the current view.
	/// A failed write leaves the view untouched.
	pub async fn apply_status(&self, update: StatusUpdate) -> Result<StatusApplied> {
		let updated = self.service.apply_status(&self.access, update).await?;
		let mut state = self.lock();

		state.watermark = state.watermark.max(self.service.current_pass());

		let outcome = state.view.as_ref().map(|view| view.patched(&updated.request, updated.version));
		let reconciled = match outcome {
			None => Reconciled::NoView,
			Some(PatchOutcome::Applied(next)) => {
				state.view = Some(next.clone());

				Reconciled::Patched(next)
			},
			Some(PatchOutcome::NeedsRefresh) => Reconciled::NeedsRefresh,
		};

		Ok(StatusApplied { updated, reconciled })
	}

	fn try_install(&self, view: AggregatedView) -> Install {
		let mut state = self.lock();

		if view.pass <= state.watermark {
			tracing::debug!(
				watermark = state.watermark,
				discarded = view.pass,
				"Discarding result of a pass that started before a write."
			);

			return Install::Stale;
		}
		if let Some(installed) = state.view.as_ref()
			&& installed.pass >= view.pass
		{
			tracing::debug!(
				installed = installed.pass,
				discarded = view.pass,
				"Discarding result of an older pass."
			);

			return Install::Superseded(installed.clone());
		}

		state.view = Some(view);

		Install::Installed
	}

	fn lock(&self) -> MutexGuard<'_, SessionState> {
		self.state.lock().unwrap_or_else(PoisonError::into_inner)
	}
}

#[derive(Default)]
struct SessionState {
	view: Option<AggregatedView>,
	/// Last pass number handed out when this session's latest write was confirmed.
	watermark: u64,
}

enum Install {
	Installed,
	Superseded(AggregatedView),
	Stale,
}
