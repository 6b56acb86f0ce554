//! Immutable claim sets carried inside access tokens.

// self
use crate::{
	_prelude::*,
	auth::{Marker, Subject},
};

/// Claim names owned by the token format; callers cannot set them.
pub const RESERVED_CLAIMS: [&str; 4] = ["sub", "exp", "iat", "rmk"];

/// Errors produced while assembling [`CustomClaims`].
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum ClaimError {
	/// The claim name is owned by the token format.
	#[error("Claim `{name}` is reserved.")]
	Reserved {
		/// Offending claim name.
		name: String,
	},
	/// Empty claim names are not allowed.
	#[error("Claim names cannot be empty.")]
	EmptyName,
}

/// Caller-supplied claims with every reserved name excluded.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CustomClaims(BTreeMap<String, String>);
impl CustomClaims {
	/// Creates an empty claim map.
	pub fn new() -> Self {
		Self::default()
	}

	/// Adds a claim, rejecting reserved or empty names.
	pub fn insert(
		&mut self,
		name: impl Into<String>,
		value: impl Into<String>,
	) -> Result<Option<String>, ClaimError> {
		let name = name.into();

		check_name(&name)?;

		Ok(self.0.insert(name, value.into()))
	}

	/// Builder-style variant of [`insert`](Self::insert).
	pub fn with(
		mut self,
		name: impl Into<String>,
		value: impl Into<String>,
	) -> Result<Self, ClaimError> {
		self.insert(name, value)?;

		Ok(self)
	}

	/// Returns the claim value for `name`, if present.
	pub fn get(&self, name: &str) -> Option<&str> {
		self.0.get(name).map(String::as_str)
	}

	/// Number of claims.
	pub fn len(&self) -> usize {
		self.0.len()
	}

	/// Returns true if no claims are set.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Iterator over `(name, value)` pairs in name order.
	pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
		self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
	}

	pub(crate) fn as_map(&self) -> &BTreeMap<String, String> {
		&self.0
	}
}
impl TryFrom<BTreeMap<String, String>> for CustomClaims {
	type Error = ClaimError;

	fn try_from(value: BTreeMap<String, String>) -> Result<Self, Self::Error> {
		value.keys().try_for_each(|name| check_name(name))?;

		Ok(Self(value))
	}
}

/// Decoded (or about-to-be-encoded) token claims.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Claims {
	/// Subject the token was issued for.
	pub subject: Subject,
	/// Expiry instant, whole-second precision.
	pub expires_at: OffsetDateTime,
	/// Refresh marker; absent for tokens minted without a refresh session.
	pub marker: Option<Marker>,
	/// Caller-supplied claims.
	pub custom: CustomClaims,
}
impl Claims {
	/// Assembles a claim set, truncating `expires_at` to whole seconds to match the wire format.
	pub fn new(
		subject: Subject,
		expires_at: OffsetDateTime,
		marker: Option<Marker>,
		custom: CustomClaims,
	) -> Self {
		let expires_at = expires_at.replace_nanosecond(0).unwrap_or(expires_at);

		Self { subject, expires_at, marker, custom }
	}

	/// Returns `true` if the claims have expired at the provided instant.
	pub fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		instant >= self.expires_at
	}
}

fn check_name(name: &str) -> Result<(), ClaimError> {
	if name.is_empty() {
		return Err(ClaimError::EmptyName);
	}
	if RESERVED_CLAIMS.contains(&name) {
		return Err(ClaimError::Reserved { name: name.to_owned() });
	}

	Ok(())
}
