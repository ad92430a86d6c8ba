// self
use crate::{_prelude::*, request::RequestType};

/// A span builder used around request execution.
#[derive(Clone, Debug)]
pub struct RequestSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl RequestSpan {
	/// Creates a new span tagged with the provided request type + stage.
	pub fn new(request_type: RequestType, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!(
				"oidc_request.execute",
				request_type = request_type.as_str(),
				stage
			);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (request_type, stage);

			Self {}
		}
	}

	/// Enters the span for the current (blocking) section.
	pub fn entered(self) -> RequestSpanGuard {
		#[cfg(feature = "tracing")]
		{
			RequestSpanGuard { guard: self.span.entered() }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = self;

			RequestSpanGuard {}
		}
	}
}

/// RAII guard returned by [`RequestSpan::entered`].
pub struct RequestSpanGuard {
	#[cfg(feature = "tracing")]
	#[allow(dead_code)]
	guard: tracing::span::EnteredSpan,
}
impl Debug for RequestSpanGuard {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("RequestSpanGuard(..)")
	}
}

/// Emits a debug event for dispatcher bookkeeping.
pub(crate) fn debug_event(stage: &'static str, message: &str) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(target: "oidc_request", stage, "{message}");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (stage, message);
	}
}

/// Emits a warning for outcomes that could not be delivered.
pub(crate) fn warn_event(stage: &'static str, message: &str) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(target: "oidc_request", stage, "{message}");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (stage, message);
	}
}
