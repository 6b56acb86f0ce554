//! Optional observability helpers for verifier operations.
//!
//! # Feature Flags
//!
//! - Enable `tracing` (on by default) to emit structured spans named `jwt_rotation.op` with the
//!   `op`, `stage`, and `outcome` fields, plus `debug`/`warn` events on grace acceptances and
//!   rejections.
//! - Enable `metrics` to increment `jwt_rotation_op_total{op, outcome}` for every attempt and
//!   result, and `jwt_rotation_rejection_total{op, kind, remedy}` for every failure.
//!
//! Outcomes carry the domain result rather than a bare success flag: verifications report the
//! acceptance path (`current` or `grace`) and failures report their taxonomy class.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::{
	_prelude::*,
	auth::SignedToken,
	error::ErrorKind,
	verifier::{Acceptance, Verified},
};

/// Emits a `debug` event when tracing is enabled.
macro_rules! debug_event {
	($($arg:tt)+) => {
		#[cfg(feature = "tracing")]
		::tracing::debug!($($arg)+);
	};
}
/// Emits a `warn` event when tracing is enabled.
macro_rules! warn_event {
	($($arg:tt)+) => {
		#[cfg(feature = "tracing")]
		::tracing::warn!($($arg)+);
	};
}
pub(crate) use {debug_event, warn_event};

/// Verifier operations observed by the crate.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
	/// Issuing a new access token.
	Sign,
	/// Checking a presented access token.
	Verify,
	/// Re-issuing from a still-admitted token.
	Resign,
	/// Ending a subject's refresh session.
	Invalidate,
}
impl Operation {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Operation::Sign => "sign",
			Operation::Verify => "verify",
			Operation::Resign => "resign",
			Operation::Invalidate => "invalidate",
		}
	}
}
impl Display for Operation {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// What an observed operation produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Outcome {
	/// Entry to a verifier operation.
	Attempt,
	/// A token was minted (`sign`, `resign`).
	Issued,
	/// A token was admitted, labeled by the path that admitted it.
	Accepted(Acceptance),
	/// A refresh session was ended (or had nothing to end).
	Invalidated,
	/// The operation failed with an error of this class.
	Failed(ErrorKind),
}
impl Outcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Outcome::Attempt => "attempt",
			Outcome::Issued => "issued",
			Outcome::Accepted(Acceptance::Current) => "current",
			Outcome::Accepted(Acceptance::Grace) => "grace",
			Outcome::Invalidated => "invalidated",
			Outcome::Failed(kind) => kind.as_str(),
		}
	}

	/// Classifies an operation result.
	pub fn of<T>(result: &Result<T>) -> Self
	where
		T: Observed,
	{
		match result {
			Ok(value) => value.outcome(),
			Err(e) => Outcome::Failed(e.kind()),
		}
	}
}
impl Display for Outcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Successful operation results that know their own [`Outcome`].
pub trait Observed {
	/// Outcome recorded when the operation returns this value.
	fn outcome(&self) -> Outcome;
}
impl Observed for SignedToken {
	fn outcome(&self) -> Outcome {
		Outcome::Issued
	}
}
impl Observed for Verified {
	fn outcome(&self) -> Outcome {
		Outcome::Accepted(self.acceptance)
	}
}
// `invalidate` is the only operation returning unit.
impl Observed for () {
	fn outcome(&self) -> Outcome {
		Outcome::Invalidated
	}
}

/// Runs one verifier operation inside its span, recording the attempt and the classified result.
pub(crate) async fn observe<T, F>(op: Operation, stage: &'static str, fut: F) -> Result<T>
where
	T: Observed,
	F: Future<Output = Result<T>>,
{
	let span = OpSpan::new(op, stage);

	record_outcome(op, Outcome::Attempt);

	let result = span.instrument(fut).await;
	let outcome = Outcome::of(&result);

	span.record(outcome);
	record_outcome(op, outcome);

	result
}
