//! Signed token strings and their store fingerprints.

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use sha2::{Digest, Sha256};
// self
use crate::_prelude::*;

/// Compact signed token (`header.payload.signature`); redacted from formatters.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SignedToken(String);
impl SignedToken {
	pub(crate) fn new(value: String) -> Self {
		Self(value)
	}

	/// Returns the token text. Callers must avoid logging this string.
	pub fn expose(&self) -> &str {
		&self.0
	}

	/// Consumes the wrapper and returns the token text.
	pub fn into_inner(self) -> String {
		self.0
	}

	/// Content hash of the full token string, used to key grant entries.
	pub fn fingerprint(&self) -> TokenFingerprint {
		TokenFingerprint::of(&self.0)
	}
}
impl AsRef<str> for SignedToken {
	fn as_ref(&self) -> &str {
		self.expose()
	}
}
impl Debug for SignedToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_tuple("SignedToken").field(&self.fingerprint()).finish()
	}
}
impl Display for SignedToken {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("<redacted>")
	}
}

/// Base64url (no padding) SHA-256 digest of a token string.
///
/// Safe to log: the digest identifies a token without revealing it.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TokenFingerprint(String);
impl TokenFingerprint {
	/// Fingerprints raw token text.
	pub fn of(token: &str) -> Self {
		Self(URL_SAFE_NO_PAD.encode(Sha256::digest(token.as_bytes())))
	}

	/// Returns the fingerprint as a string slice.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}
impl Display for TokenFingerprint {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn fingerprint_is_stable_and_content_sensitive() {
		let a = TokenFingerprint::of("aaa.bbb.ccc");
		let b = TokenFingerprint::of("aaa.bbb.ccc");
		let c = TokenFingerprint::of("aaa.bbb.ccd");

		assert_eq!(a, b);
		assert_ne!(a, c);
		// 32-byte digest, unpadded base64url.
		assert_eq!(a.as_str().len(), 43);
		assert!(!a.as_str().contains(['+', '/', '=']));
	}

	#[test]
	fn token_formatters_hide_the_token() {
		let token = SignedToken::new("aaa.bbb.ccc".into());

		assert_eq!(format!("{token}"), "<redacted>");
		assert!(!format!("{token:?}").contains("aaa.bbb.ccc"));
	}
}
