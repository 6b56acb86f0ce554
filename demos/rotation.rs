//! Walks one subject through a full rotation against the in-memory store.
//!
//! 1. Sign a token and verify it on a second instance that shares the store.
//! 2. Sign again; the first token is superseded but still admitted on its grace entry.
//! 3. Invalidate the session; every outstanding token now requires re-authentication.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use time::Duration;
// self
use jwt_rotation::{
	auth::{CustomClaims, Subject},
	config::VerifierConfig,
	store::{CoordinationStore, MemoryStore},
	verifier::{self, TokenVerifier},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let config = VerifierConfig::builder("demo-secret")
		.access_window(Duration::minutes(5))
		.grace_window(Duration::seconds(10))
		.build()?;
	let store: Arc<dyn CoordinationStore> = Arc::new(MemoryStore::default());
	// Two "instances" sharing one store.
	let api = verifier::select(config.clone(), Some(store.clone()));
	let worker = verifier::select(config, Some(store));
	let alice = Subject::new("alice")?;
	let first = api.sign(&alice, CustomClaims::new().with("role", "admin")?).await?;
	let verified = worker.verify(first.expose()).await?;

	println!("first token admitted as {:?} with claims {:?}", verified.acceptance, verified.claims);

	let second = worker.resign(first.expose()).await?;

	let graced = api.verify(first.expose()).await?;
	let current = api.verify(second.expose()).await?;

	println!("after rotation the first token is {:?}", graced.acceptance);
	println!("and the second is {:?}", current.acceptance);

	api.invalidate(&alice).await?;

	match worker.verify(second.expose()).await {
		Ok(_) => println!("unexpected: the session survived invalidation"),
		Err(e) => println!("after invalidation: {e} (remedy: {:?})", e.remedy()),
	}

	Ok(())
}
