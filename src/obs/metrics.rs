// self
use crate::{obs::RequestOutcome, request::RequestType};

/// Records an execution outcome via the global metrics recorder (when enabled).
pub fn record_request_outcome(request_type: RequestType, outcome: RequestOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"oidc_request_total",
			"request_type" => request_type.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (request_type, outcome);
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn record_request_outcome_noop_without_metrics() {
		record_request_outcome(RequestType::Profile, RequestOutcome::Failure);
	}
}
