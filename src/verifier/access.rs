//! Store-free access checks and the stateless verifier built on them.

// self
use crate::{
	_prelude::*,
	auth::{Claims, CustomClaims, SignedToken, Subject},
	clock::{Clock, SystemClock},
	codec::TokenCodec,
	config::{self, VerifierConfig},
	obs::{self, Operation, observe},
	verifier::{Acceptance, TokenVerifier, Verified, VerifierFuture},
};

/// Reasons an authentic token fails the access check.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum AccessError {
	/// The access window elapsed.
	#[error("Access token expired at {expires_at}.")]
	Expired {
		/// Expiry instant recorded in the token.
		expires_at: OffsetDateTime,
	},
	/// A refresh-coordinated verifier received a token without a marker.
	#[error("Token carries no refresh marker.")]
	MissingMarker,
}
impl From<AccessError> for Error {
	fn from(e: AccessError) -> Self {
		match e {
			AccessError::Expired { .. } => Error::AccessTokenExpired,
			AccessError::MissingMarker => Error::signature(e),
		}
	}
}

/// Pure expiry and structure check over decoded claims; never touches a store.
#[derive(Clone, Copy, Debug, Default)]
pub struct AccessVerifier {
	require_marker: bool,
}
impl AccessVerifier {
	/// Verifier for tokens issued without a refresh session.
	pub const fn stateless() -> Self {
		Self { require_marker: false }
	}

	/// Verifier for tokens that must embed a refresh marker.
	pub const fn refresh_coordinated() -> Self {
		Self { require_marker: true }
	}

	/// Checks `claims` at `now`.
	pub fn check(&self, claims: &Claims, now: OffsetDateTime) -> Result<(), AccessError> {
		if self.require_marker && claims.marker.is_none() {
			return Err(AccessError::MissingMarker);
		}
		if claims.is_expired_at(now) {
			return Err(AccessError::Expired { expires_at: claims.expires_at });
		}

		Ok(())
	}
}

/// Access-only verifier: tokens stay valid until they expire and cannot be invalidated.
#[derive(Clone)]
pub struct StatelessVerifier {
	codec: TokenCodec,
	access: AccessVerifier,
	access_window: Duration,
	clock: Arc<dyn Clock>,
}
impl StatelessVerifier {
	/// Creates a verifier backed by the system clock.
	pub fn new(config: VerifierConfig) -> Self {
		Self::with_clock(config, Arc::new(SystemClock))
	}

	/// Creates a verifier backed by `clock`.
	pub fn with_clock(config: VerifierConfig, clock: Arc<dyn Clock>) -> Self {
		Self {
			codec: TokenCodec::new(config.base_secret().clone()),
			access: AccessVerifier::stateless(),
			access_window: config.access_window(),
			clock,
		}
	}

	/// Signs a token for `subject` that expires one access window from now.
	pub fn sign_now(&self, subject: &Subject, custom: CustomClaims) -> Result<SignedToken> {
		let expires_at = config::window_end(self.clock.now(), self.access_window, "access")?;
		let claims = Claims::new(subject.clone(), expires_at, None, custom);

		Ok(self.codec.encode(&claims)?)
	}

	/// Opens `token` and checks it against the current time.
	pub fn verify_now(&self, token: &str) -> Result<Verified> {
		let claims = self.codec.open(token)?;

		self.access.check(&claims, self.clock.now())?;

		Ok(Verified { claims, acceptance: Acceptance::Current })
	}
}
impl Debug for StatelessVerifier {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("StatelessVerifier").field("access_window", &self.access_window).finish()
	}
}
impl TokenVerifier for StatelessVerifier {
	fn sign<'a>(
		&'a self,
		subject: &'a Subject,
		claims: CustomClaims,
	) -> VerifierFuture<'a, SignedToken> {
		Box::pin(observe(Operation::Sign, "stateless_sign", async move {
			self.sign_now(subject, claims)
		}))
	}

	fn verify<'a>(&'a self, token: &'a str) -> VerifierFuture<'a, Verified> {
		Box::pin(observe(Operation::Verify, "stateless_verify", async move {
			self.verify_now(token)
		}))
	}

	fn invalidate<'a>(&'a self, subject: &'a Subject) -> VerifierFuture<'a, ()> {
		Box::pin(observe(Operation::Invalidate, "stateless_invalidate", async move {
			obs::debug_event!(%subject, "stateless tokens cannot be invalidated before expiry");

			Ok(())
		}))
	}

	fn resign<'a>(&'a self, token: &'a str) -> VerifierFuture<'a, SignedToken> {
		// Without a refresh session only live tokens may be renewed; otherwise an expired token
		// would extend itself forever.
		Box::pin(observe(Operation::Resign, "stateless_resign", async move {
			let verified = self.verify_now(token)?;

			self.sign_now(&verified.claims.subject, verified.claims.custom)
		}))
	}
}
