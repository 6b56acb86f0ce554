//! Immutable verifier configuration and its validating builder.

// self
use crate::{_prelude::*, auth::SigningSecret, error::ConfigError};

/// Validated, immutable settings shared by the codec, coordinator, and stores.
#[derive(Clone, Debug)]
pub struct VerifierConfig {
	access_window: Duration,
	refresh_window: Duration,
	grace_window: Duration,
	store_timeout: Duration,
	base_secret: SigningSecret,
}
impl VerifierConfig {
	/// Default access token lifetime.
	pub const DEFAULT_ACCESS_WINDOW: Duration = Duration::minutes(5);
	/// Default refresh session lifetime.
	pub const DEFAULT_REFRESH_WINDOW: Duration = Duration::minutes(60);
	/// Default lifetime of grant entries.
	pub const DEFAULT_GRACE_WINDOW: Duration = Duration::seconds(50);
	/// Default per-call store budget.
	pub const DEFAULT_STORE_TIMEOUT: Duration = Duration::seconds(2);
	/// Longest accepted window or timeout.
	pub const MAX_WINDOW: Duration = Duration::days(3_650);

	/// Starts a builder with the default windows.
	pub fn builder(base_secret: impl Into<String>) -> VerifierConfigBuilder {
		VerifierConfigBuilder::new(SigningSecret::new(base_secret))
	}

	/// Parses a JSON configuration document.
	///
	/// Recognized keys: `base_secret` (required), `access_window_minutes`,
	/// `refresh_window_minutes`, `grace_window_seconds`, `store_timeout_millis`.
	pub fn from_json(document: &str) -> Result<Self, ConfigError> {
		let mut de = serde_json::Deserializer::from_str(document);
		let raw: RawConfig = serde_path_to_error::deserialize(&mut de)
			.map_err(|source| ConfigError::Parse { source })?;
		let mut builder = VerifierConfigBuilder::new(raw.base_secret);

		if let Some(minutes) = raw.access_window_minutes {
			let minutes = whole("access_window_minutes", minutes)?;

			builder = builder.access_window(Duration::minutes(minutes));
		}
		if let Some(minutes) = raw.refresh_window_minutes {
			let minutes = whole("refresh_window_minutes", minutes)?;

			builder = builder.refresh_window(Duration::minutes(minutes));
		}
		if let Some(seconds) = raw.grace_window_seconds {
			let seconds = whole("grace_window_seconds", seconds)?;

			builder = builder.grace_window(Duration::seconds(seconds));
		}
		if let Some(millis) = raw.store_timeout_millis {
			let millis = whole("store_timeout_millis", millis)?;

			builder = builder.store_timeout(Duration::milliseconds(millis));
		}

		builder.build()
	}

	/// Access token lifetime.
	pub fn access_window(&self) -> Duration {
		self.access_window
	}

	/// Refresh session lifetime (TTL of the marker key).
	pub fn refresh_window(&self) -> Duration {
		self.refresh_window
	}

	/// Grant entry lifetime.
	pub fn grace_window(&self) -> Duration {
		self.grace_window
	}

	/// Per-call store budget.
	pub fn store_timeout(&self) -> Duration {
		self.store_timeout
	}

	/// Base signing secret.
	pub fn base_secret(&self) -> &SigningSecret {
		&self.base_secret
	}
}

/// Builder for [`VerifierConfig`].
#[derive(Clone, Debug)]
pub struct VerifierConfigBuilder {
	access_window: Duration,
	refresh_window: Duration,
	grace_window: Duration,
	store_timeout: Duration,
	base_secret: SigningSecret,
}
impl VerifierConfigBuilder {
	fn new(base_secret: SigningSecret) -> Self {
		Self {
			access_window: VerifierConfig::DEFAULT_ACCESS_WINDOW,
			refresh_window: VerifierConfig::DEFAULT_REFRESH_WINDOW,
			grace_window: VerifierConfig::DEFAULT_GRACE_WINDOW,
			store_timeout: VerifierConfig::DEFAULT_STORE_TIMEOUT,
			base_secret,
		}
	}

	/// Overrides the access token lifetime.
	pub fn access_window(mut self, window: Duration) -> Self {
		self.access_window = window;

		self
	}

	/// Overrides the refresh session lifetime.
	pub fn refresh_window(mut self, window: Duration) -> Self {
		self.refresh_window = window;

		self
	}

	/// Overrides the grant entry lifetime.
	pub fn grace_window(mut self, window: Duration) -> Self {
		self.grace_window = window;

		self
	}

	/// Overrides the per-call store budget.
	pub fn store_timeout(mut self, timeout: Duration) -> Self {
		self.store_timeout = timeout;

		self
	}

	/// Validates the settings and produces a [`VerifierConfig`].
	pub fn build(self) -> Result<VerifierConfig, ConfigError> {
		if self.base_secret.is_blank() {
			return Err(ConfigError::EmptySecret);
		}

		for (window, value) in [
			("access", self.access_window),
			("refresh", self.refresh_window),
			("grace", self.grace_window),
			("store timeout", self.store_timeout),
		] {
			if !value.is_positive() {
				return Err(ConfigError::NonPositiveWindow { window });
			}
			if value > VerifierConfig::MAX_WINDOW {
				return Err(ConfigError::WindowTooLong { window, max: VerifierConfig::MAX_WINDOW });
			}
		}

		if self.grace_window >= self.refresh_window {
			return Err(ConfigError::GraceExceedsRefresh {
				grace: self.grace_window,
				refresh: self.refresh_window,
			});
		}

		Ok(VerifierConfig {
			access_window: self.access_window,
			refresh_window: self.refresh_window,
			grace_window: self.grace_window,
			store_timeout: self.store_timeout,
			base_secret: self.base_secret,
		})
	}
}

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
	base_secret: SigningSecret,
	access_window_minutes: Option<u64>,
	refresh_window_minutes: Option<u64>,
	grace_window_seconds: Option<u64>,
	store_timeout_millis: Option<u64>,
}

/// Returns `now + window`, or [`ConfigError::WindowTooLong`] when the sum leaves the
/// representable date range.
pub(crate) fn window_end(
	now: OffsetDateTime,
	window: Duration,
	label: &'static str,
) -> Result<OffsetDateTime, ConfigError> {
	now.checked_add(window)
		.ok_or(ConfigError::WindowTooLong { window: label, max: VerifierConfig::MAX_WINDOW })
}

// Capped at `u32::MAX` units so building the `Duration` itself cannot overflow; `build` then
// enforces `MAX_WINDOW`.
fn whole(option: &'static str, value: u64) -> Result<i64, ConfigError> {
	u32::try_from(value).map(i64::from).map_err(|_| ConfigError::OutOfRange { option })
}
