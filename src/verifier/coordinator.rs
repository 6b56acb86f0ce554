//! Refresh-marker rotation protocol.
//!
//! Per subject the store moves through `NoSession -> Active -> Expired`:
//!
//! - [`RefreshCoordinator::issue`] mints a strictly newer marker, embeds it in a candidate
//!   token, and publishes it with one [`CoordinationStore::compare_and_advance`] call. The call
//!   also writes a grant entry for the candidate, so the token is returned (and stays
//!   acceptable for the grace window) even when a racing signer's marker wins.
//! - [`RefreshCoordinator::admit`] accepts a token whose marker equals the stored one, or whose
//!   grant entry is still live. A missing marker means the session ended.
//! - [`RefreshCoordinator::end_session`] deletes the marker key.
//!
//! There are no in-process locks and no retries: each call is at most a few store round trips,
//! and the only serialization point is the store's atomic script.

// self
use crate::{
	_prelude::*,
	auth::{Claims, CustomClaims, Marker, MarkerSource, SignedToken, Subject, TokenFingerprint},
	clock::Clock,
	codec::{CodecError, TokenCodec},
	config::{self, VerifierConfig},
	error::ConfigError,
	obs,
	store::{self, AdvanceRequest, CoordinationStore, StoreError, StoreKey},
	verifier::{AccessError, AccessVerifier, Acceptance, Verified},
};

/// Internal rejection reasons, classified into [`Error`] by the facade.
#[derive(Debug, ThisError)]
pub enum Rejection {
	/// Token failed to open (tampered, malformed, foreign algorithm).
	#[error(transparent)]
	Codec(#[from] CodecError),
	/// Token opened but failed the access check.
	#[error(transparent)]
	Access(#[from] AccessError),
	/// Marker is gone, or the token is superseded with no live grant.
	#[error("Refresh session has ended.")]
	SessionEnded,
	/// Store failed or timed out.
	#[error(transparent)]
	Store(#[from] StoreError),
	/// The configured windows cannot be applied at the current instant.
	#[error(transparent)]
	Config(#[from] ConfigError),
}
impl From<Rejection> for Error {
	fn from(r: Rejection) -> Self {
		match r {
			Rejection::Codec(e) => e.into(),
			Rejection::Access(e) => e.into(),
			Rejection::SessionEnded => Error::RefreshSessionExpired,
			Rejection::Store(e) => Error::StoreUnavailable(e),
			Rejection::Config(e) => Error::ConfigInvalid(e),
		}
	}
}

/// Result of [`RefreshCoordinator::issue`].
#[derive(Clone, Debug)]
pub struct Issued {
	/// Token handed back to the caller.
	pub token: SignedToken,
	/// Claims embedded in the token.
	pub claims: Claims,
	/// Whether this call's marker became the subject's current marker.
	pub advanced: bool,
}

/// Core rotation protocol over a shared [`CoordinationStore`].
#[derive(Clone)]
pub struct RefreshCoordinator {
	codec: TokenCodec,
	access: AccessVerifier,
	store: Arc<dyn CoordinationStore>,
	clock: Arc<dyn Clock>,
	markers: Arc<MarkerSource>,
	access_window: Duration,
	refresh_window: Duration,
	grace_window: Duration,
}
impl RefreshCoordinator {
	/// Creates a coordinator over `store`, measuring time with `clock`.
	pub fn new(
		config: &VerifierConfig,
		store: Arc<dyn CoordinationStore>,
		clock: Arc<dyn Clock>,
	) -> Self {
		Self {
			codec: TokenCodec::new(config.base_secret().clone()),
			access: AccessVerifier::refresh_coordinated(),
			store,
			clock,
			markers: Default::default(),
			access_window: config.access_window(),
			refresh_window: config.refresh_window(),
			grace_window: config.grace_window(),
		}
	}

	/// Mints a token for `subject` and publishes its marker.
	pub async fn issue(
		&self,
		subject: &Subject,
		custom: CustomClaims,
	) -> Result<Issued, Rejection> {
		let now = self.clock.now();
		let expires_at = config::window_end(now, self.access_window, "access")?;
		let marker = self.markers.next(now);
		let claims = Claims::new(subject.clone(), expires_at, Some(marker), custom);
		let token = self.codec.encode(&claims)?;
		let fingerprint = token.fingerprint();
		let request = AdvanceRequest {
			marker_key: StoreKey::refresh(subject),
			marker,
			marker_ttl: self.refresh_window,
			grant_key: StoreKey::grant(&fingerprint),
			grant_value: marker.to_string(),
			grant_ttl: self.grace_window,
		};
		let advanced = self.store.compare_and_advance(&request).await?;

		if !advanced {
			obs::debug_event!(
				%subject,
				%marker,
				%fingerprint,
				"a fresher marker is already current; token rides on its grant entry"
			);
		}

		Ok(Issued { token, claims, advanced })
	}

	/// Admits `token` if its refresh session accepts it and its access window is still open.
	///
	/// The session is checked before expiry, so a superseded token reports
	/// [`Rejection::SessionEnded`] rather than an access expiry.
	pub async fn admit(&self, token: &str) -> Result<Verified, Rejection> {
		let (claims, acceptance) = self.admit_session(token).await?;

		self.access.check(&claims, self.clock.now())?;

		Ok(Verified { claims, acceptance })
	}

	/// Re-issues from `token`, carrying forward its custom claims.
	///
	/// The old token only needs a live session (current marker or live grant); its access
	/// window may have elapsed. When the old token carries the current marker, a grant entry is
	/// written for it first so requests still carrying it keep passing the session check for
	/// the grace window. A token already riding on its grant keeps that grant's remaining TTL;
	/// re-signing never extends how long a superseded token stays acceptable.
	pub async fn reissue(&self, token: &str) -> Result<Issued, Rejection> {
		let (claims, acceptance) = self.admit_session(token).await?;

		if acceptance == Acceptance::Current {
			let old_marker = claims.marker.ok_or(AccessError::MissingMarker)?;

			self.store
				.set_live(
					&StoreKey::grant(&TokenFingerprint::of(token)),
					old_marker.to_string(),
					self.grace_window,
				)
				.await?;
		}

		self.issue(&claims.subject, claims.custom).await
	}

	/// Deletes the subject's marker; every outstanding token then fails the session check.
	pub async fn end_session(&self, subject: &Subject) -> Result<bool, Rejection> {
		Ok(self.store.delete(&StoreKey::refresh(subject)).await?)
	}

	/// Reads the subject's current marker.
	pub async fn current_marker(&self, subject: &Subject) -> Result<Option<Marker>, Rejection> {
		Ok(store::read_marker(self.store.as_ref(), &StoreKey::refresh(subject)).await?)
	}

	async fn admit_session(&self, token: &str) -> Result<(Claims, Acceptance), Rejection> {
		let claims = self.codec.open(token)?;
		let marker = claims.marker.ok_or(AccessError::MissingMarker)?;
		let Some(current) = self.current_marker(&claims.subject).await? else {
			obs::warn_event!(subject = %claims.subject, "refresh session is absent or expired");

			return Err(Rejection::SessionEnded);
		};

		if current == marker {
			return Ok((claims, Acceptance::Current));
		}

		let fingerprint = TokenFingerprint::of(token);

		if self.store.get(&StoreKey::grant(&fingerprint)).await?.is_some() {
			obs::debug_event!(
				subject = %claims.subject,
				%marker,
				%current,
				%fingerprint,
				"superseded token admitted through its grant entry"
			);

			return Ok((claims, Acceptance::Grace));
		}

		obs::warn_event!(
			subject = %claims.subject,
			%marker,
			%current,
			%fingerprint,
			"superseded token has no live grant entry"
		);

		Err(Rejection::SessionEnded)
	}
}
impl Debug for RefreshCoordinator {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RefreshCoordinator")
			.field("access_window", &self.access_window)
			.field("refresh_window", &self.refresh_window)
			.field("grace_window", &self.grace_window)
			.finish()
	}
}
