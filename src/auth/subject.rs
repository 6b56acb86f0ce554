//! Validated subject identifiers.

// std
use std::{borrow::Borrow, ops::Deref};
// self
use crate::_prelude::*;

const SUBJECT_MAX_LEN: usize = 256;

/// Identity string a credential pair is issued for.
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Subject(String);
impl Subject {
	/// Creates a subject after validation.
	pub fn new(value: impl AsRef<str>) -> Result<Self, SubjectError> {
		let view = value.as_ref();

		validate_view(view)?;

		Ok(Self(view.to_owned()))
	}

	/// Returns the subject as a string slice.
	pub fn as_str(&self) -> &str {
		&self.0
	}
}
impl Deref for Subject {
	type Target = str;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
impl AsRef<str> for Subject {
	fn as_ref(&self) -> &str {
		&self.0
	}
}
impl Borrow<str> for Subject {
	fn borrow(&self) -> &str {
		&self.0
	}
}
impl From<Subject> for String {
	fn from(value: Subject) -> Self {
		value.0
	}
}
impl TryFrom<String> for Subject {
	type Error = SubjectError;

	fn try_from(value: String) -> Result<Self, Self::Error> {
		validate_view(&value)?;

		Ok(Self(value))
	}
}
impl FromStr for Subject {
	type Err = SubjectError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Self::new(s)
	}
}
impl Debug for Subject {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		write!(f, "Subject({})", self.0)
	}
}
impl Display for Subject {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(&self.0)
	}
}

/// Error returned when subject validation fails.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum SubjectError {
	/// The subject was empty.
	#[error("Subject cannot be empty.")]
	Empty,
	/// The subject contains whitespace or control characters.
	#[error("Subject contains whitespace or control characters.")]
	InvalidCharacter,
	/// The subject exceeded the allowed byte length.
	#[error("Subject exceeds {max} bytes.")]
	TooLong {
		/// Maximum permitted byte length.
		max: usize,
	},
}

fn validate_view(view: &str) -> Result<(), SubjectError> {
	if view.is_empty() {
		return Err(SubjectError::Empty);
	}
	// Subjects are embedded in store keys, so separators that break key parsing are refused.
	if view.chars().any(|c| c.is_whitespace() || c.is_control()) {
		return Err(SubjectError::InvalidCharacter);
	}
	if view.len() > SUBJECT_MAX_LEN {
		return Err(SubjectError::TooLong { max: SUBJECT_MAX_LEN });
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn subjects_validate() {
		assert_eq!(Subject::new(""), Err(SubjectError::Empty));
		assert_eq!(Subject::new(" alice"), Err(SubjectError::InvalidCharacter));
		assert_eq!(Subject::new("al\u{0007}ice"), Err(SubjectError::InvalidCharacter));
		assert_eq!(Subject::new("al\u{00A0}ice"), Err(SubjectError::InvalidCharacter));

		let alice = Subject::new("alice@example.com").expect("Email subjects should be valid.");

		assert_eq!(alice.as_str(), "alice@example.com");
	}

	#[test]
	fn length_limit_is_inclusive() {
		Subject::new("a".repeat(SUBJECT_MAX_LEN)).expect("Exact length should succeed.");

		assert_eq!(
			Subject::new("a".repeat(SUBJECT_MAX_LEN + 1)),
			Err(SubjectError::TooLong { max: SUBJECT_MAX_LEN })
		);
	}

	#[test]
	fn serde_round_trip_enforces_validation() {
		let subject: Subject =
			serde_json::from_str("\"bob\"").expect("Subject should deserialize successfully.");

		assert_eq!(subject.as_ref(), "bob");
		assert!(serde_json::from_str::<Subject>("\"with space\"").is_err());
	}

	#[test]
	fn borrow_supports_fast_lookup() {
		let map: HashMap<Subject, u8> = HashMap::from_iter([(
			Subject::new("carol").expect("Subject used for lookup should be valid."),
			3_u8,
		)]);

		assert_eq!(map.get("carol"), Some(&3));
	}
}
