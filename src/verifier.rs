//! Token verifiers: the shared contract and its two implementations.
//!
//! [`StatelessVerifier`] checks signature and expiry only. [`RefreshVerifier`] additionally gates
//! every token on the subject's refresh marker in a [`CoordinationStore`], so sessions can be
//! rotated and invalidated across instances. Pick one at startup with [`select`].

pub mod access;
pub mod coordinator;
pub mod facade;

mod metrics;

pub use access::*;
pub use coordinator::*;
pub use facade::*;
pub use metrics::VerifierMetrics;

// self
use crate::{
	_prelude::*,
	auth::{Claims, CustomClaims, SignedToken, Subject},
	clock::{Clock, SystemClock},
	config::VerifierConfig,
	store::CoordinationStore,
};

/// Boxed future returned by [`TokenVerifier`] operations.
pub type VerifierFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + 'a + Send>>;

/// Sign/verify/invalidate contract shared by every verifier.
pub trait TokenVerifier
where
	Self: Send + Sync,
{
	/// Issues a new access token for `subject` carrying `claims`.
	fn sign<'a>(
		&'a self,
		subject: &'a Subject,
		claims: CustomClaims,
	) -> VerifierFuture<'a, SignedToken>;

	/// Verifies a presented token.
	fn verify<'a>(&'a self, token: &'a str) -> VerifierFuture<'a, Verified>;

	/// Ends the subject's refresh session, if the verifier tracks one.
	fn invalidate<'a>(&'a self, subject: &'a Subject) -> VerifierFuture<'a, ()>;

	/// Issues a replacement token carrying forward the custom claims of `token`.
	fn resign<'a>(&'a self, token: &'a str) -> VerifierFuture<'a, SignedToken>;
}

/// How a verified token was admitted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Acceptance {
	/// The token carries the subject's current marker (or needs no marker).
	Current,
	/// The token was superseded but is still inside its grace window.
	Grace,
}

/// Successful verification result.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Verified {
	/// Decoded claims.
	pub claims: Claims,
	/// Path that admitted the token.
	pub acceptance: Acceptance,
}

/// Builds the verifier for this deployment: refresh-coordinated when a store is supplied,
/// stateless otherwise.
pub fn select(
	config: VerifierConfig,
	store: Option<Arc<dyn CoordinationStore>>,
) -> Arc<dyn TokenVerifier> {
	select_with_clock(config, store, Arc::new(SystemClock))
}

/// [`select`] with an explicit time source.
pub fn select_with_clock(
	config: VerifierConfig,
	store: Option<Arc<dyn CoordinationStore>>,
	clock: Arc<dyn Clock>,
) -> Arc<dyn TokenVerifier> {
	match store {
		Some(store) => Arc::new(RefreshVerifier::with_clock(config, store, clock)),
		None => Arc::new(StatelessVerifier::with_clock(config, clock)),
	}
}
