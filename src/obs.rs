//! Optional observability helpers for request execution and dispatch.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `oidc_request.execute` with the
//!   `request_type` and `stage` fields, plus debug/warn events for dispatcher hand-offs.
//! - Enable `metrics` to increment the `oidc_request_total` counter for every
//!   attempt/success/failure, labeled by `request_type` + `outcome`.

mod metrics;
mod tracing;

pub use self::{metrics::*, tracing::*};

// self
use crate::_prelude::*;

/// Outcome labels recorded for each execution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RequestOutcome {
	/// Entry to `execute_request`.
	Attempt,
	/// Successful completion.
	Success,
	/// Failure propagated back to the caller.
	Failure,
}
impl RequestOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			RequestOutcome::Attempt => "attempt",
			RequestOutcome::Success => "success",
			RequestOutcome::Failure => "failure",
		}
	}
}
impl Display for RequestOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
