//! Short-lived signed access tokens gated by a rotating refresh marker held in a shared
//! coordination store.
//!
//! Every service instance is stateless: [`verifier::RefreshVerifier`] signs tokens that embed a
//! monotonically increasing marker, publishes that marker through one atomic
//! [`store::CoordinationStore::compare_and_advance`] call, and records a short-lived grant so a
//! token that loses a concurrent rotation race stays acceptable for the grace window.
//! [`verifier::StatelessVerifier`] is the access-only alternative that never touches a store.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod clock;
pub mod codec;
pub mod config;
pub mod error;
pub mod obs;
pub mod store;
pub mod verifier;

mod _prelude {
	pub use std::{
		collections::{BTreeMap, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use parking_lot::RwLock;
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};

	pub use crate::error::{Error, Result};
}

#[cfg(test)] use color_eyre as _;
