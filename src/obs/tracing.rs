// self
use crate::{
	_prelude::*,
	obs::{Operation, Outcome},
};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedOp<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedOp<F> = F;

/// The `jwt_rotation.op` span wrapping one verifier operation.
///
/// The `outcome` field starts empty and is filled by [`OpSpan::record`] once the operation
/// settles, so a single span line shows the operation, its stage, and how it ended.
#[derive(Clone, Debug)]
pub struct OpSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl OpSpan {
	/// Opens a span for `op` at `stage` with an unset outcome.
	pub fn new(op: Operation, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!(
				"jwt_rotation.op",
				op = op.as_str(),
				stage,
				outcome = tracing::field::Empty
			);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (op, stage);

			Self {}
		}
	}

	/// Records how the operation ended.
	pub fn record(&self, outcome: Outcome) {
		#[cfg(feature = "tracing")]
		{
			self.span.record("outcome", outcome.as_str());
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = outcome;
		}
	}

	/// Instruments the operation future without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedOp<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::{error::ErrorKind, verifier::Acceptance};

	#[tokio::test]
	async fn span_wraps_the_operation_and_takes_its_outcome() {
		let span = OpSpan::new(Operation::Verify, "span_wraps_the_operation");
		let acceptance = span.instrument(async { Acceptance::Grace }).await;

		span.record(Outcome::Accepted(acceptance));
		span.record(Outcome::Failed(ErrorKind::StoreUnavailable));

		assert_eq!(acceptance, Acceptance::Grace);
	}
}
