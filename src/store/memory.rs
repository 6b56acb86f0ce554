//! Thread-safe in-memory [`CoordinationStore`] for single-process deployments and tests.

// std
use std::sync::atomic::{AtomicUsize, Ordering};
// self
use crate::{
	_prelude::*,
	auth::Marker,
	clock::{Clock, SystemClock},
	store::{AdvanceRequest, CoordinationStore, StoreError, StoreFuture, StoreKey},
};

type StoreMap = Arc<RwLock<HashMap<StoreKey, Entry>>>;

// Writes between full sweeps of expired entries.
const SWEEP_EVERY: usize = 64;

#[derive(Clone, Debug)]
struct Entry {
	value: String,
	expires_at: OffsetDateTime,
}
impl Entry {
	fn is_live_at(&self, now: OffsetDateTime) -> bool {
		now < self.expires_at
	}
}

/// Storage backend that keeps entries in-process.
///
/// Reads drop the expired entry they hit, and every 64th write sweeps the whole map, so grant
/// entries that are never read again do not accumulate.
///
/// Clones share the same map, so several verifiers built over clones behave like instances
/// sharing one external store.
#[derive(Clone)]
pub struct MemoryStore {
	map: StoreMap,
	writes: Arc<AtomicUsize>,
	clock: Arc<dyn Clock>,
}
impl MemoryStore {
	/// Creates a store whose TTLs are measured against `clock`.
	pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
		Self { map: Default::default(), writes: Default::default(), clock }
	}

	/// Number of live entries.
	pub fn live_len(&self) -> usize {
		let now = self.clock.now();

		self.map.read().values().filter(|entry| entry.is_live_at(now)).count()
	}

	/// Number of retained entries, including expired ones not yet swept.
	pub fn entry_len(&self) -> usize {
		self.map.read().len()
	}

	fn get_now(&self, key: &StoreKey) -> Option<String> {
		let now = self.clock.now();
		let mut guard = self.map.write();

		match guard.get(key) {
			Some(entry) if entry.is_live_at(now) => Some(entry.value.clone()),
			Some(_) => {
				guard.remove(key);

				None
			},
			None => None,
		}
	}

	fn set_now(&self, key: &StoreKey, value: String, ttl: Duration) -> Result<(), StoreError> {
		let now = self.clock.now();
		let expires_at = expiry(now, ttl, key)?;
		let mut guard = self.map.write();

		self.maybe_sweep(&mut guard, now);
		guard.insert(key.clone(), Entry { value, expires_at });

		Ok(())
	}

	fn advance_now(&self, request: &AdvanceRequest) -> Result<bool, StoreError> {
		let now = self.clock.now();
		let marker_expires_at = expiry(now, request.marker_ttl, &request.marker_key)?;
		let grant_expires_at = expiry(now, request.grant_ttl, &request.grant_key)?;
		let mut guard = self.map.write();

		self.maybe_sweep(&mut guard, now);
		let current = match guard.get(&request.marker_key) {
			Some(entry) if entry.is_live_at(now) =>
				Some(entry.value.parse::<Marker>().map_err(|e| StoreError::Corrupt {
					key: request.marker_key.to_string(),
					message: format!("{e}"),
				})?),
			_ => None,
		};
		let applied = current.is_none_or(|current| current < request.marker);

		if applied {
			guard.insert(
				request.marker_key.clone(),
				Entry { value: request.marker.to_string(), expires_at: marker_expires_at },
			);
		}

		guard.insert(
			request.grant_key.clone(),
			Entry { value: request.grant_value.clone(), expires_at: grant_expires_at },
		);

		Ok(applied)
	}

	fn maybe_sweep(&self, map: &mut HashMap<StoreKey, Entry>, now: OffsetDateTime) {
		if self.writes.fetch_add(1, Ordering::Relaxed) % SWEEP_EVERY == 0 {
			map.retain(|_, entry| entry.is_live_at(now));
		}
	}

	fn delete_now(&self, key: &StoreKey) -> bool {
		let now = self.clock.now();

		self.map.write().remove(key).is_some_and(|entry| entry.is_live_at(now))
	}
}
impl Default for MemoryStore {
	fn default() -> Self {
		Self::with_clock(Arc::new(SystemClock))
	}
}
impl Debug for MemoryStore {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("MemoryStore").field("entries", &self.map.read().len()).finish()
	}
}
impl CoordinationStore for MemoryStore {
	fn get<'a>(&'a self, key: &'a StoreKey) -> StoreFuture<'a, Option<String>> {
		Box::pin(async move { Ok(self.get_now(key)) })
	}

	fn set_live<'a>(
		&'a self,
		key: &'a StoreKey,
		value: String,
		ttl: Duration,
	) -> StoreFuture<'a, ()> {
		Box::pin(async move { self.set_now(key, value, ttl) })
	}

	fn compare_and_advance<'a>(&'a self, request: &'a AdvanceRequest) -> StoreFuture<'a, bool> {
		Box::pin(async move { self.advance_now(request) })
	}

	fn delete<'a>(&'a self, key: &'a StoreKey) -> StoreFuture<'a, bool> {
		Box::pin(async move { Ok(self.delete_now(key)) })
	}
}

fn expiry(
	now: OffsetDateTime,
	ttl: Duration,
	key: &StoreKey,
) -> Result<OffsetDateTime, StoreError> {
	now.checked_add(ttl).ok_or_else(|| StoreError::Backend {
		message: format!("TTL {ttl} for `{key}` leaves the representable date range"),
	})
}
