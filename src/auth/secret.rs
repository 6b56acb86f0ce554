//! Redacted signing secret and per-subject key derivation.

// self
use crate::{_prelude::*, auth::Subject};

/// Base signing secret; redacted from every formatter.
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct SigningSecret(String);
impl SigningSecret {
	/// Wraps a new secret string.
	pub fn new(value: impl Into<String>) -> Self {
		Self(value.into())
	}

	/// Returns the inner secret. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Returns true if the secret is empty or whitespace only.
	pub fn is_blank(&self) -> bool {
		self.0.trim().is_empty()
	}

	/// Derives the HMAC key for one subject.
	///
	/// The key is the subject followed by the base secret, so a leaked token for one subject
	/// never verifies under another subject's key.
	pub fn derive_for(&self, subject: &Subject) -> DerivedKey {
		let mut bytes = Vec::with_capacity(subject.len() + self.0.len());

		bytes.extend_from_slice(subject.as_bytes());
		bytes.extend_from_slice(self.0.as_bytes());

		DerivedKey(bytes)
	}
}
impl Debug for SigningSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("SigningSecret").field(&"<redacted>").finish()
	}
}
impl Display for SigningSecret {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

/// Per-subject HMAC key material.
#[derive(Clone, PartialEq, Eq)]
pub struct DerivedKey(Vec<u8>);
impl DerivedKey {
	/// Returns the raw key bytes.
	pub fn as_bytes(&self) -> &[u8] {
		&self.0
	}
}
impl Debug for DerivedKey {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("DerivedKey(<redacted>)")
	}
}
