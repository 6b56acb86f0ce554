//! Refresh-coordinated verifier facade.

// self
use crate::{
	_prelude::*,
	auth::{CustomClaims, Marker, SignedToken, Subject},
	clock::{Clock, SystemClock},
	config::VerifierConfig,
	obs::{Operation, observe},
	store::CoordinationStore,
	verifier::{
		Acceptance, RefreshCoordinator, TokenVerifier, Verified, VerifierFuture, VerifierMetrics,
	},
};

/// Verifier that gates access tokens on a refresh session held in a shared store.
///
/// Safe to share across tasks and to run on many instances at once; all coordination happens
/// in the store. Internal codec, session, and store outcomes are classified into [`Error`]
/// here, so callers only ever see the public taxonomy.
#[derive(Clone)]
pub struct RefreshVerifier {
	coordinator: RefreshCoordinator,
	metrics: Arc<VerifierMetrics>,
}
impl RefreshVerifier {
	/// Creates a verifier over `store` backed by the system clock.
	pub fn new(config: VerifierConfig, store: Arc<dyn CoordinationStore>) -> Self {
		Self::with_clock(config, store, Arc::new(SystemClock))
	}

	/// Creates a verifier over `store` backed by `clock`.
	pub fn with_clock(
		config: VerifierConfig,
		store: Arc<dyn CoordinationStore>,
		clock: Arc<dyn Clock>,
	) -> Self {
		Self {
			coordinator: RefreshCoordinator::new(&config, store, clock),
			metrics: Default::default(),
		}
	}

	/// Shared counters for this verifier.
	pub fn metrics(&self) -> &VerifierMetrics {
		&self.metrics
	}

	/// The underlying rotation protocol.
	pub fn coordinator(&self) -> &RefreshCoordinator {
		&self.coordinator
	}

	/// Returns the subject's current marker, or `None` when no session is live.
	pub async fn session_marker(&self, subject: &Subject) -> Result<Option<Marker>> {
		Ok(self.coordinator.current_marker(subject).await?)
	}
}
impl Debug for RefreshVerifier {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RefreshVerifier").field("coordinator", &self.coordinator).finish()
	}
}
impl TokenVerifier for RefreshVerifier {
	fn sign<'a>(
		&'a self,
		subject: &'a Subject,
		claims: CustomClaims,
	) -> VerifierFuture<'a, SignedToken> {
		Box::pin(observe(Operation::Sign, "refresh_sign", async move {
			let issued = self.coordinator.issue(subject, claims).await?;

			self.metrics.record_issued(issued.advanced);

			Ok::<_, Error>(issued.token)
		}))
	}

	fn verify<'a>(&'a self, token: &'a str) -> VerifierFuture<'a, Verified> {
		Box::pin(observe(Operation::Verify, "refresh_verify", async move {
			match self.coordinator.admit(token).await {
				Ok(verified) => {
					self.metrics.record_accepted(verified.acceptance == Acceptance::Grace);

					Ok(verified)
				},
				Err(rejection) => {
					self.metrics.record_rejected();

					Err(rejection.into())
				},
			}
		}))
	}

	fn invalidate<'a>(&'a self, subject: &'a Subject) -> VerifierFuture<'a, ()> {
		Box::pin(observe(Operation::Invalidate, "refresh_invalidate", async move {
			self.coordinator.end_session(subject).await?;

			Ok::<_, Error>(())
		}))
	}

	fn resign<'a>(&'a self, token: &'a str) -> VerifierFuture<'a, SignedToken> {
		Box::pin(observe(Operation::Resign, "refresh_resign", async move {
			let issued = self.coordinator.reissue(token).await?;

			self.metrics.record_issued(issued.advanced);

			Ok::<_, Error>(issued.token)
		}))
	}
}
