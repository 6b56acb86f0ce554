//! Coordination store contract and built-in store implementations.
//!
//! The store is the single source of truth for whether a subject's refresh session is alive.
//! Implementations must run [`CoordinationStore::compare_and_advance`] as one atomic step
//! visible to every service instance; splitting it into a read followed by a write reopens the
//! race where two concurrent signers both believe they published the newest marker.

pub mod memory;
#[cfg(feature = "redis")] pub mod redis;

pub use memory::MemoryStore;
#[cfg(feature = "redis")] pub use redis::RedisStore;

// self
use crate::{
	_prelude::*,
	auth::{Marker, Subject, TokenFingerprint},
};

/// Boxed future returned by [`CoordinationStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Shared key-value store with per-key TTL and one atomic scripted update.
pub trait CoordinationStore
where
	Self: Send + Sync,
{
	/// Reads a live value.
	fn get<'a>(&'a self, key: &'a StoreKey) -> StoreFuture<'a, Option<String>>;

	/// Writes a value that stays live for `ttl`, replacing any previous value and TTL.
	fn set_live<'a>(
		&'a self,
		key: &'a StoreKey,
		value: String,
		ttl: Duration,
	) -> StoreFuture<'a, ()>;

	/// Atomically advances a refresh marker and records a grant entry.
	///
	/// The marker is written (with its TTL reset) only when the stored marker is absent or
	/// strictly older than [`AdvanceRequest::marker`]. The grant entry is written regardless.
	/// Returns whether the marker was advanced.
	fn compare_and_advance<'a>(&'a self, request: &'a AdvanceRequest) -> StoreFuture<'a, bool>;

	/// Removes a key, returning whether it was live.
	fn delete<'a>(&'a self, key: &'a StoreKey) -> StoreFuture<'a, bool>;
}

/// Parameters of one [`CoordinationStore::compare_and_advance`] call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AdvanceRequest {
	/// Refresh marker key (`refresh:<subject>`).
	pub marker_key: StoreKey,
	/// Candidate marker.
	pub marker: Marker,
	/// TTL applied when the marker advances (the refresh window).
	pub marker_ttl: Duration,
	/// Grant key (`grant:<fingerprint>`) for the freshly issued token.
	pub grant_key: StoreKey,
	/// Value stored under the grant key.
	pub grant_value: String,
	/// TTL of the grant entry (the grace window).
	pub grant_ttl: Duration,
}

/// Error type produced by [`CoordinationStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum StoreError {
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
	/// The store did not answer in time.
	#[error("Store operation `{operation}` timed out after {after}.")]
	Timeout {
		/// Operation label.
		operation: &'static str,
		/// Elapsed budget.
		after: Duration,
	},
	/// A stored value could not be interpreted.
	#[error("Stored value under `{key}` is corrupt: {message}.")]
	Corrupt {
		/// Key holding the value.
		key: String,
		/// Human-readable error payload.
		message: String,
	},
}

/// Namespaced key in the coordination store.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StoreKey(String);
impl StoreKey {
	/// Prefix of refresh marker keys.
	pub const REFRESH_PREFIX: &'static str = "refresh:";
	/// Prefix of grant keys.
	pub const GRANT_PREFIX: &'static str = "grant:";

	/// Key holding the latest accepted marker for `subject`.
	pub fn refresh(subject: &Subject) -> Self {
		Self(format!("{}{subject}", Self::REFRESH_PREFIX))
	}

	/// Key recording that the fingerprinted token was validly issued.
	pub fn grant(fingerprint: &TokenFingerprint) -> Self {
		Self(format!("{}{fingerprint}", Self::GRANT_PREFIX))
	}

	/// Returns the rendered key.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}
impl Debug for StoreKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "StoreKey({})", self.0)
	}
}
impl Display for StoreKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

/// Reads and parses the marker stored under `key`.
pub(crate) async fn read_marker(
	store: &dyn CoordinationStore,
	key: &StoreKey,
) -> Result<Option<Marker>, StoreError> {
	match store.get(key).await? {
		Some(raw) => raw
			.parse()
			.map(Some)
			.map_err(|e| StoreError::Corrupt { key: key.to_string(), message: format!("{e}") }),
		None => Ok(None),
	}
}
