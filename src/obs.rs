//! Observability helpers for session flows.
//!
//! Every flow runs inside a `bearer_session.flow` span carrying the `flow` and `stage` fields.
//! With the `metrics` feature enabled, each attempt, success, and failure also increments the
//! `bearer_session_flow_total` counter, labeled by `flow` and `outcome`.

mod metrics;
mod tracing;

pub use self::{metrics::*, tracing::*};

// self
use crate::_prelude::*;

/// Session flow kinds observed by the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
	/// Authenticated application request passing through the interceptor.
	Request,
	/// Refresh-token exchange.
	Refresh,
	/// Credential login.
	Login,
	/// Voluntary or forced logout.
	Logout,
	/// Account management calls (password change, registration).
	Account,
}
impl FlowKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowKind::Request => "request",
			FlowKind::Refresh => "refresh",
			FlowKind::Login => "login",
			FlowKind::Logout => "logout",
			FlowKind::Account => "account",
		}
	}
}
impl Display for FlowKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowOutcome {
	/// Entry to a session helper.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl FlowOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			FlowOutcome::Attempt => "attempt",
			FlowOutcome::Success => "success",
			FlowOutcome::Failure => "failure",
		}
	}

	/// Maps a result to its success or failure label.
	pub fn of<T, E>(result: &Result<T, E>) -> Self {
		if result.is_ok() { FlowOutcome::Success } else { FlowOutcome::Failure }
	}
}
impl Display for FlowOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
