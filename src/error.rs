//! Verifier-level error taxonomy shared by signing, verification, and configuration.

// self
use crate::_prelude::*;

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Canonical error exposed by every public verifier operation.
///
/// The set is closed: callers decide what to do next from [`Error::remedy`] instead of matching
/// on backend- or codec-specific failures.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Token is tampered, corrupt, or signed for another key.
	#[error("Token signature is invalid: {reason}.")]
	SignatureInvalid {
		/// Codec- or verifier-supplied reason string.
		reason: String,
	},
	/// Access token expired while its refresh session is still alive.
	#[error("Access token has expired.")]
	AccessTokenExpired,
	/// Refresh session ended; the subject must authenticate again.
	#[error("Refresh session has expired.")]
	RefreshSessionExpired,
	/// Coordination store failed or timed out; retry with backoff.
	#[error("Coordination store is unavailable: {0}")]
	StoreUnavailable(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Construction-time misconfiguration.
	#[error(transparent)]
	ConfigInvalid(#[from] ConfigError),
}
impl Error {
	/// Returns the action a caller should take after receiving this error.
	pub fn remedy(&self) -> Remedy {
		self.kind().remedy()
	}

	/// Returns the taxonomy class of this error, independent of its payload.
	pub fn kind(&self) -> ErrorKind {
		match self {
			Self::SignatureInvalid { .. } => ErrorKind::SignatureInvalid,
			Self::AccessTokenExpired => ErrorKind::AccessTokenExpired,
			Self::RefreshSessionExpired => ErrorKind::RefreshSessionExpired,
			Self::StoreUnavailable(_) => ErrorKind::StoreUnavailable,
			Self::ConfigInvalid(_) => ErrorKind::ConfigInvalid,
		}
	}

	pub(crate) fn signature(reason: impl Display) -> Self {
		Self::SignatureInvalid { reason: reason.to_string() }
	}
}

/// Payload-free class of an [`Error`], used as a log and metric label.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
	/// See [`Error::SignatureInvalid`].
	SignatureInvalid,
	/// See [`Error::AccessTokenExpired`].
	AccessTokenExpired,
	/// See [`Error::RefreshSessionExpired`].
	RefreshSessionExpired,
	/// See [`Error::StoreUnavailable`].
	StoreUnavailable,
	/// See [`Error::ConfigInvalid`].
	ConfigInvalid,
}
impl ErrorKind {
	/// Returns a stable snake_case label.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::SignatureInvalid => "signature_invalid",
			Self::AccessTokenExpired => "access_token_expired",
			Self::RefreshSessionExpired => "refresh_session_expired",
			Self::StoreUnavailable => "store_unavailable",
			Self::ConfigInvalid => "config_invalid",
		}
	}

	/// Returns the action a caller should take after an error of this class.
	pub const fn remedy(self) -> Remedy {
		match self {
			Self::AccessTokenExpired => Remedy::Resign,
			Self::SignatureInvalid | Self::RefreshSessionExpired => Remedy::Reauthenticate,
			Self::StoreUnavailable => Remedy::RetryLater,
			Self::ConfigInvalid => Remedy::FixConfiguration,
		}
	}
}
impl Display for ErrorKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Follow-up action implied by an [`Error`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Remedy {
	/// Sign a new access token; the refresh session is still live.
	Resign,
	/// Force the subject through authentication again.
	Reauthenticate,
	/// Infrastructure fault; retry the same call with backoff.
	RetryLater,
	/// Startup configuration must be corrected.
	FixConfiguration,
}
impl Remedy {
	/// Returns a stable snake_case label.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Resign => "resign",
			Self::Reauthenticate => "reauthenticate",
			Self::RetryLater => "retry_later",
			Self::FixConfiguration => "fix_configuration",
		}
	}
}

/// Configuration and validation failures raised while building a verifier.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// Base secret was empty or whitespace.
	#[error("Base secret cannot be empty.")]
	EmptySecret,
	/// A configured window was zero or negative.
	#[error("The {window} window must be positive.")]
	NonPositiveWindow {
		/// Window label (access, refresh, grace, store timeout).
		window: &'static str,
	},
	/// Grace window does not fit inside the refresh window.
	#[error("Grace window ({grace}) must be shorter than the refresh window ({refresh}).")]
	GraceExceedsRefresh {
		/// Configured grace window.
		grace: Duration,
		/// Configured refresh window.
		refresh: Duration,
	},
	/// A window or timeout exceeds the supported maximum.
	#[error("The {window} window exceeds the supported maximum of {max}.")]
	WindowTooLong {
		/// Window label (access, refresh, grace, store timeout).
		window: &'static str,
		/// Largest accepted value.
		max: Duration,
	},
	/// A numeric option does not fit the supported range.
	#[error("The {option} option exceeds the supported range.")]
	OutOfRange {
		/// Option name as it appears in the configuration document.
		option: &'static str,
	},
	/// Configuration document could not be parsed.
	#[error("Configuration document is malformed.")]
	Parse {
		/// Structured parsing failure carrying the offending field path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::store::StoreError;

	#[test]
	fn store_error_converts_with_source() {
		let store_error = StoreError::Backend { message: "connection refused".into() };
		let error: Error = store_error.clone().into();

		assert!(matches!(error, Error::StoreUnavailable(_)));
		assert!(error.to_string().contains("connection refused"));

		let source =
			StdError::source(&error).expect("Store errors should stay reachable as the source.");

		assert_eq!(source.to_string(), store_error.to_string());
	}

	#[test]
	fn remedies_separate_resign_from_reauthentication() {
		assert_eq!(Error::AccessTokenExpired.remedy(), Remedy::Resign);
		assert_eq!(Error::RefreshSessionExpired.remedy(), Remedy::Reauthenticate);
		assert_eq!(Error::signature("bad mac").remedy(), Remedy::Reauthenticate);
		assert_eq!(
			Error::from(StoreError::Timeout { operation: "get", after: Duration::seconds(2) })
				.remedy(),
			Remedy::RetryLater
		);
		assert_eq!(Error::from(ConfigError::EmptySecret).remedy(), Remedy::FixConfiguration);
	}

	#[test]
	fn kinds_drop_the_payload() {
		assert_eq!(Error::signature("bad mac").kind(), ErrorKind::SignatureInvalid);
		assert_eq!(
			Error::from(StoreError::Backend { message: "down".into() }).kind().as_str(),
			"store_unavailable"
		);
		assert_eq!(Error::RefreshSessionExpired.kind().to_string(), "refresh_session_expired");
	}
}
