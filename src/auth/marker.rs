//! Refresh markers and the per-process source that mints them.

// std
use std::{
	num::ParseIntError,
	sync::atomic::{AtomicI64, Ordering},
};
// self
use crate::_prelude::*;

/// Monotonically increasing value identifying which refresh rotation issued a token.
///
/// Markers are millisecond Unix timestamps. Only `<` and `==` comparisons carry meaning.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Marker(i64);
impl Marker {
	/// Wraps a raw marker value.
	pub const fn from_millis(millis: i64) -> Self {
		Self(millis)
	}

	/// Returns the raw marker value.
	pub const fn as_millis(self) -> i64 {
		self.0
	}
}
impl Display for Marker {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		Display::fmt(&self.0, f)
	}
}
impl FromStr for Marker {
	type Err = ParseIntError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		s.trim().parse().map(Self)
	}
}

/// Mints strictly increasing markers for one process.
///
/// Each marker is `max(now_ms, last + 1)`, so two calls inside the same millisecond still
/// produce ordered markers. Ties across processes are tolerated by the store protocol.
#[derive(Debug, Default)]
pub struct MarkerSource {
	last: AtomicI64,
}
impl MarkerSource {
	/// Returns the next marker for the provided instant.
	pub fn next(&self, now: OffsetDateTime) -> Marker {
		let now_ms = i64::try_from(now.unix_timestamp_nanos() / 1_000_000).unwrap_or(i64::MAX);
		let step = |last: i64| now_ms.max(last.saturating_add(1));
		let previous = self
			.last
			.fetch_update(Ordering::AcqRel, Ordering::Acquire, |last| Some(step(last)))
			.unwrap_or_else(|last| last);

		Marker(step(previous))
	}
}
