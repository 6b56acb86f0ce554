// std
use std::sync::Arc;
// crates.io
use time::{Duration, macros};
// self
use jwt_rotation::{
	auth::{Marker, Subject, TokenFingerprint},
	clock::ManualClock,
	store::{AdvanceRequest, CoordinationStore, MemoryStore, StoreError, StoreKey},
};

fn store_at_epoch() -> (MemoryStore, ManualClock) {
	let clock = ManualClock::new(macros::datetime!(2025-11-10 12:00 UTC));

	(MemoryStore::with_clock(Arc::new(clock.clone())), clock)
}

fn advance(marker: i64, token: &str) -> AdvanceRequest {
	let subject = Subject::new("alice").expect("Subject fixture should be valid.");

	AdvanceRequest {
		marker_key: StoreKey::refresh(&subject),
		marker: Marker::from_millis(marker),
		marker_ttl: Duration::minutes(60),
		grant_key: StoreKey::grant(&TokenFingerprint::of(token)),
		grant_value: marker.to_string(),
		grant_ttl: Duration::seconds(5),
	}
}

#[tokio::test]
async fn entries_expire_after_their_ttl() {
	let (store, clock) = store_at_epoch();
	let key = StoreKey::grant(&TokenFingerprint::of("a.b.c"));

	store
		.set_live(&key, "1".into(), Duration::seconds(5))
		.await
		.expect("Writing a live entry should succeed.");

	clock.advance(Duration::seconds(4));

	assert_eq!(store.get(&key).await.expect("Read should succeed."), Some("1".into()));

	clock.advance(Duration::seconds(1));

	assert_eq!(store.get(&key).await.expect("Read should succeed."), None);
	assert_eq!(store.live_len(), 0);
}

#[tokio::test]
async fn set_live_replaces_value_and_ttl() {
	let (store, clock) = store_at_epoch();
	let key = StoreKey::grant(&TokenFingerprint::of("a.b.c"));

	store.set_live(&key, "1".into(), Duration::seconds(5)).await.expect("First write succeeds.");
	clock.advance(Duration::seconds(4));
	store.set_live(&key, "2".into(), Duration::seconds(5)).await.expect("Second write succeeds.");
	clock.advance(Duration::seconds(4));

	assert_eq!(store.get(&key).await.expect("Read should succeed."), Some("2".into()));
}

#[tokio::test]
async fn compare_and_advance_only_moves_forward() {
	let (store, _) = store_at_epoch();
	let first = advance(100, "t1");
	let older = advance(50, "t0");
	let equal = advance(100, "t1-again");
	let newer = advance(200, "t2");

	assert!(store.compare_and_advance(&first).await.expect("Advance should succeed."));
	assert!(!store.compare_and_advance(&older).await.expect("Advance should succeed."));
	assert!(!store.compare_and_advance(&equal).await.expect("Advance should succeed."));
	assert_eq!(
		store.get(&first.marker_key).await.expect("Read should succeed."),
		Some("100".into())
	);
	assert!(store.compare_and_advance(&newer).await.expect("Advance should succeed."));
	assert_eq!(
		store.get(&first.marker_key).await.expect("Read should succeed."),
		Some("200".into())
	);
}

#[tokio::test]
async fn compare_and_advance_writes_grant_even_when_marker_loses() {
	let (store, clock) = store_at_epoch();
	let winner = advance(200, "winner");
	let loser = advance(100, "loser");

	store.compare_and_advance(&winner).await.expect("Advance should succeed.");

	assert!(!store.compare_and_advance(&loser).await.expect("Advance should succeed."));
	assert_eq!(
		store.get(&loser.grant_key).await.expect("Read should succeed."),
		Some("100".into())
	);

	clock.advance(Duration::seconds(5));

	assert_eq!(store.get(&loser.grant_key).await.expect("Read should succeed."), None);
	assert_eq!(
		store.get(&winner.marker_key).await.expect("Read should succeed."),
		Some("200".into())
	);
}

#[tokio::test]
async fn advancing_resets_the_marker_ttl() {
	let (store, clock) = store_at_epoch();

	store.compare_and_advance(&advance(1, "t1")).await.expect("Advance should succeed.");
	clock.advance(Duration::minutes(50));
	store.compare_and_advance(&advance(2, "t2")).await.expect("Advance should succeed.");
	clock.advance(Duration::minutes(50));

	let key = advance(2, "t2").marker_key;

	assert_eq!(store.get(&key).await.expect("Read should succeed."), Some("2".into()));

	clock.advance(Duration::minutes(10));

	assert_eq!(store.get(&key).await.expect("Read should succeed."), None);
}

#[tokio::test]
async fn expired_markers_are_replaced_by_any_candidate() {
	let (store, clock) = store_at_epoch();

	store.compare_and_advance(&advance(500, "t1")).await.expect("Advance should succeed.");
	clock.advance(Duration::minutes(61));

	assert!(store.compare_and_advance(&advance(1, "t2")).await.expect("Advance should succeed."));
}

#[tokio::test]
async fn delete_reports_liveness() {
	let (store, clock) = store_at_epoch();
	let request = advance(1, "t1");

	store.compare_and_advance(&request).await.expect("Advance should succeed.");

	assert!(store.delete(&request.marker_key).await.expect("Delete should succeed."));
	assert!(!store.delete(&request.marker_key).await.expect("Delete should succeed."));

	clock.advance(Duration::seconds(10));

	assert!(!store.delete(&request.grant_key).await.expect("Delete should succeed."));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_advances_settle_on_the_highest_marker() {
	let (store, _) = store_at_epoch();
	let mut handles = Vec::new();

	// Markers 1..=32, spawned out of order.
	for i in 0..32_i64 {
		let store = store.clone();
		let marker = if i % 2 == 0 { 32 - i } else { i };

		handles.push(tokio::spawn(async move {
			store
				.compare_and_advance(&advance(marker, &format!("token-{marker}")))
				.await
				.expect("Advance should succeed.")
		}));
	}

	let mut applied = 0;

	for handle in handles {
		if handle.await.expect("Task should not panic.") {
			applied += 1;
		}
	}

	assert!(applied >= 1);
	assert_eq!(
		store.get(&advance(0, "lookup").marker_key).await.expect("Read should succeed."),
		Some("32".into())
	);
	// Every candidate left a grant behind regardless of the race outcome.
	assert_eq!(store.live_len(), 33);
}

#[tokio::test]
async fn expired_grants_are_swept_without_being_read() {
	let (store, clock) = store_at_epoch();

	for marker in 1..=1_000 {
		store
			.compare_and_advance(&advance(marker, &format!("token-{marker}")))
			.await
			.expect("Advance should succeed.");
	}

	assert!(store.entry_len() > 1_000);

	clock.advance(Duration::minutes(10));

	// Any 64 consecutive writes include one full sweep.
	for marker in 1_001..=1_064 {
		store
			.compare_and_advance(&advance(marker, &format!("token-{marker}")))
			.await
			.expect("Advance should succeed.");
	}

	assert_eq!(store.entry_len(), store.live_len());
	assert!(store.entry_len() <= 1 + 64);
}

#[tokio::test]
async fn unrepresentable_ttls_are_store_errors() {
	let clock = ManualClock::new(macros::datetime!(9999-12-31 23:59 UTC));
	let store = MemoryStore::with_clock(Arc::new(clock));
	let key = StoreKey::grant(&TokenFingerprint::of("a.b.c"));

	assert!(matches!(
		store.set_live(&key, "1".into(), Duration::minutes(5)).await,
		Err(StoreError::Backend { .. })
	));
	assert!(matches!(
		store.compare_and_advance(&advance(1, "t1")).await,
		Err(StoreError::Backend { .. })
	));
	assert_eq!(store.entry_len(), 0);
}
