// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for refresh-coordinated verifier activity.
#[derive(Debug, Default)]
pub struct VerifierMetrics {
	issued: AtomicU64,
	superseded: AtomicU64,
	accepted: AtomicU64,
	grace_accepted: AtomicU64,
	rejected: AtomicU64,
}
impl VerifierMetrics {
	/// Returns the number of tokens issued.
	pub fn issued(&self) -> u64 {
		self.issued.load(Ordering::Relaxed)
	}

	/// Returns the number of issued tokens whose marker lost to a fresher concurrent write.
	pub fn superseded(&self) -> u64 {
		self.superseded.load(Ordering::Relaxed)
	}

	/// Returns the number of tokens accepted on the current marker.
	pub fn accepted(&self) -> u64 {
		self.accepted.load(Ordering::Relaxed)
	}

	/// Returns the number of tokens accepted through a grant entry.
	pub fn grace_accepted(&self) -> u64 {
		self.grace_accepted.load(Ordering::Relaxed)
	}

	/// Returns the number of failed verifications.
	pub fn rejected(&self) -> u64 {
		self.rejected.load(Ordering::Relaxed)
	}

	pub(crate) fn record_issued(&self, advanced: bool) {
		self.issued.fetch_add(1, Ordering::Relaxed);

		if !advanced {
			self.superseded.fetch_add(1, Ordering::Relaxed);
		}
	}

	pub(crate) fn record_accepted(&self, grace: bool) {
		if grace {
			self.grace_accepted.fetch_add(1, Ordering::Relaxed);
		} else {
			self.accepted.fetch_add(1, Ordering::Relaxed);
		}
	}

	pub(crate) fn record_rejected(&self) {
		self.rejected.fetch_add(1, Ordering::Relaxed);
	}
}
