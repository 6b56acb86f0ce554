//! Time sources shared by the codec, the coordinator, and the in-memory store.

// self
use crate::_prelude::*;

/// Source of the current UTC instant.
pub trait Clock
where
	Self: Send + Sync,
{
	/// Returns the current instant.
	fn now(&self) -> OffsetDateTime;
}

/// Wall-clock time source.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;
impl Clock for SystemClock {
	fn now(&self) -> OffsetDateTime {
		OffsetDateTime::now_utc()
	}
}

/// Manually advanced time source for deterministic expiry scenarios.
///
/// Clones share the same instant, so a store and a verifier built from clones of one
/// `ManualClock` observe every [`advance`](Self::advance) together.
#[derive(Clone, Debug)]
pub struct ManualClock(Arc<RwLock<OffsetDateTime>>);
impl ManualClock {
	/// Creates a clock frozen at `start`.
	pub fn new(start: OffsetDateTime) -> Self {
		Self(Arc::new(RwLock::new(start)))
	}

	/// Moves the clock forward (or backward, for negative durations).
	pub fn advance(&self, by: Duration) {
		*self.0.write() += by;
	}

	/// Jumps the clock to an absolute instant.
	pub fn set(&self, instant: OffsetDateTime) {
		*self.0.write() = instant;
	}
}
impl Clock for ManualClock {
	fn now(&self) -> OffsetDateTime {
		*self.0.read()
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	#[test]
	fn manual_clock_clones_share_time() {
		let start = macros::datetime!(2025-01-01 00:00 UTC);
		let clock = ManualClock::new(start);
		let observer = clock.clone();

		clock.advance(Duration::minutes(6));

		assert_eq!(observer.now(), start + Duration::minutes(6));

		observer.set(start);

		assert_eq!(clock.now(), start);
	}
}
