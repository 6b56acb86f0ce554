//! Redis-backed [`CoordinationStore`] shared by every service instance.

// crates.io
use redis::{AsyncCommands, Client, RedisError, Script, aio::ConnectionManager};
// self
use crate::{
	_prelude::*,
	config::VerifierConfig,
	store::{AdvanceRequest, CoordinationStore, StoreError, StoreFuture, StoreKey},
};

// Markers are compared numerically; string comparison misorders values of different lengths.
const ADVANCE_SCRIPT: &str = r"
local current = redis.call('GET', KEYS[1])
local applied = 0
if not current or tonumber(current) < tonumber(ARGV[1]) then
	redis.call('SET', KEYS[1], ARGV[1], 'PX', ARGV[2])
	applied = 1
end
redis.call('SET', KEYS[2], ARGV[3], 'PX', ARGV[4])
return applied
";

/// Coordination store talking to Redis through a multiplexed connection manager.
///
/// Every call is bounded by the configured timeout; an elapsed budget surfaces as
/// [`StoreError::Timeout`] so callers can retry instead of treating it as an auth failure.
#[derive(Clone)]
pub struct RedisStore {
	conn: ConnectionManager,
	advance: Arc<Script>,
	timeout: Duration,
}
impl RedisStore {
	/// Connects to the Redis instance at `url`.
	pub async fn connect(url: &str, timeout: Duration) -> Result<Self, StoreError> {
		let client = Client::open(url).map_err(backend)?;
		let conn = bounded("connect", timeout, ConnectionManager::new(client)).await?;

		Ok(Self::with_connection(conn, timeout))
	}

	/// Connects using the per-call budget from `config`.
	pub async fn connect_with(url: &str, config: &VerifierConfig) -> Result<Self, StoreError> {
		Self::connect(url, config.store_timeout()).await
	}

	/// Wraps an existing connection manager.
	pub fn with_connection(conn: ConnectionManager, timeout: Duration) -> Self {
		Self { conn, advance: Arc::new(Script::new(ADVANCE_SCRIPT)), timeout }
	}
}
impl Debug for RedisStore {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RedisStore").field("timeout", &self.timeout).finish()
	}
}
impl CoordinationStore for RedisStore {
	fn get<'a>(&'a self, key: &'a StoreKey) -> StoreFuture<'a, Option<String>> {
		Box::pin(async move {
			let mut conn = self.conn.clone();

			bounded("get", self.timeout, conn.get(key.as_str())).await
		})
	}

	fn set_live<'a>(
		&'a self,
		key: &'a StoreKey,
		value: String,
		ttl: Duration,
	) -> StoreFuture<'a, ()> {
		Box::pin(async move {
			let mut conn = self.conn.clone();
			let ttl = ttl_millis(ttl)?;

			bounded("set_live", self.timeout, conn.pset_ex(key.as_str(), value, ttl)).await
		})
	}

	fn compare_and_advance<'a>(&'a self, request: &'a AdvanceRequest) -> StoreFuture<'a, bool> {
		Box::pin(async move {
			let mut conn = self.conn.clone();
			let mut invocation = self.advance.prepare_invoke();

			invocation
				.key(request.marker_key.as_str())
				.key(request.grant_key.as_str())
				.arg(request.marker.as_millis())
				.arg(ttl_millis(request.marker_ttl)?)
				.arg(request.grant_value.as_str())
				.arg(ttl_millis(request.grant_ttl)?);

			let applied: i64 =
				bounded("compare_and_advance", self.timeout, invocation.invoke_async(&mut conn))
					.await?;

			Ok(applied == 1)
		})
	}

	fn delete<'a>(&'a self, key: &'a StoreKey) -> StoreFuture<'a, bool> {
		Box::pin(async move {
			let mut conn = self.conn.clone();
			let removed: i64 = bounded("delete", self.timeout, conn.del(key.as_str())).await?;

			Ok(removed > 0)
		})
	}
}

async fn bounded<T, F>(operation: &'static str, budget: Duration, fut: F) -> Result<T, StoreError>
where
	F: Future<Output = Result<T, RedisError>>,
{
	let std_budget = std::time::Duration::try_from(budget).unwrap_or_default();

	match tokio::time::timeout(std_budget, fut).await {
		Ok(result) => result.map_err(backend),
		Err(_) => Err(StoreError::Timeout { operation, after: budget }),
	}
}

fn backend(e: RedisError) -> StoreError {
	StoreError::Backend { message: e.to_string() }
}

fn ttl_millis(ttl: Duration) -> Result<u64, StoreError> {
	u64::try_from(ttl.whole_milliseconds())
		.ok()
		.filter(|millis| *millis > 0)
		.ok_or_else(|| StoreError::Backend {
			message: format!("TTL {ttl} is not a positive duration"),
		})
}
