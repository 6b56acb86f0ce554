// self
use crate::obs::{Operation, Outcome};

/// Records an operation outcome via the global metrics recorder (when enabled).
///
/// Every outcome bumps `jwt_rotation_op_total{op, outcome}`. Failures also bump
/// `jwt_rotation_rejection_total{op, kind, remedy}` so dashboards can separate retryable store
/// faults from forced re-authentication.
pub fn record_outcome(op: Operation, outcome: Outcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"jwt_rotation_op_total",
			"op" => op.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);

		if let Outcome::Failed(kind) = outcome {
			metrics::counter!(
				"jwt_rotation_rejection_total",
				"op" => op.as_str(),
				"kind" => kind.as_str(),
				"remedy" => kind.remedy().as_str()
			)
			.increment(1);
		}
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (op, outcome);
	}
}
