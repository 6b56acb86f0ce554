//! Compact HS256 token codec with per-subject keys.
//!
//! Tokens are three dot-separated base64url segments: a fixed header, a JSON payload holding
//! `sub`, `exp`, the optional refresh marker `rmk`, and flattened caller claims, and an
//! HMAC-SHA256 signature over `header.payload` keyed by [`SigningSecret::derive_for`].

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use hmac::{Hmac, Mac};
use sha2::Sha256;
// self
use crate::{
	_prelude::*,
	auth::{Claims, CustomClaims, Marker, SignedToken, SigningSecret, Subject},
};

type HmacSha256 = Hmac<Sha256>;

const ALGORITHM: &str = "HS256";
const TOKEN_TYPE: &str = "JWT";

/// Failures produced while opening or decoding a token.
#[derive(Debug, ThisError)]
pub enum CodecError {
	/// The token is not three base64url segments with JSON header and payload.
	#[error("Token is malformed: {reason}")]
	Malformed {
		/// Description of the structural problem.
		reason: String,
	},
	/// The header names an algorithm other than HS256.
	#[error("Token algorithm `{algorithm}` is not supported")]
	UnsupportedAlgorithm {
		/// Algorithm named by the header.
		algorithm: String,
	},
	/// The signature does not match the subject's derived key.
	#[error("Token signature does not match")]
	SignatureMismatch,
	/// The token is authentic but past its expiry instant.
	#[error("Token expired at {expires_at}")]
	Expired {
		/// Expiry instant recorded in the token.
		expires_at: OffsetDateTime,
	},
	/// The signing key could not be initialised.
	#[error("Signing key is unusable")]
	Key,
}
impl CodecError {
	fn malformed(reason: impl Display) -> Self {
		Self::Malformed { reason: reason.to_string() }
	}
}
impl From<CodecError> for Error {
	fn from(e: CodecError) -> Self {
		match e {
			CodecError::Expired { .. } => Error::AccessTokenExpired,
			other => Error::signature(other),
		}
	}
}

#[derive(Serialize, Deserialize)]
struct Header {
	alg: String,
	typ: Option<String>,
}

#[derive(Serialize)]
struct PayloadOut<'a> {
	sub: &'a str,
	exp: i64,
	#[serde(skip_serializing_if = "Option::is_none")]
	rmk: Option<i64>,
	#[serde(flatten)]
	custom: &'a BTreeMap<String, String>,
}

#[derive(Deserialize)]
struct PayloadIn {
	sub: Subject,
	exp: i64,
	#[serde(default)]
	rmk: Option<i64>,
	#[serde(flatten)]
	custom: BTreeMap<String, String>,
}

/// Stateless encoder/decoder for signed claim sets.
#[derive(Clone, Debug)]
pub struct TokenCodec {
	secret: SigningSecret,
}
impl TokenCodec {
	/// Creates a codec that derives per-subject keys from `secret`.
	pub fn new(secret: SigningSecret) -> Self {
		Self { secret }
	}

	/// Signs `claims` and returns the compact token.
	pub fn encode(&self, claims: &Claims) -> Result<SignedToken, CodecError> {
		let header = Header { alg: ALGORITHM.into(), typ: Some(TOKEN_TYPE.into()) };
		let payload = PayloadOut {
			sub: claims.subject.as_str(),
			exp: claims.expires_at.unix_timestamp(),
			rmk: claims.marker.map(Marker::as_millis),
			custom: claims.custom.as_map(),
		};
		let mut signing_input = segment(&header)?;

		signing_input.push('.');
		signing_input.push_str(&segment(&payload)?);

		let signature =
			self.mac(&claims.subject)?.chain_update(signing_input.as_bytes()).finalize();

		signing_input.push('.');
		signing_input.push_str(&URL_SAFE_NO_PAD.encode(signature.into_bytes()));

		Ok(SignedToken::new(signing_input))
	}

	/// Checks structure, algorithm, and signature, ignoring expiry.
	pub fn open(&self, token: &str) -> Result<Claims, CodecError> {
		let mut segments = token.split('.');
		let (Some(header), Some(payload), Some(signature), None) =
			(segments.next(), segments.next(), segments.next(), segments.next())
		else {
			return Err(CodecError::malformed("expected three segments"));
		};
		let header: Header = parse_segment(header, "header")?;

		if header.alg != ALGORITHM {
			return Err(CodecError::UnsupportedAlgorithm { algorithm: header.alg });
		}

		let payload: PayloadIn = parse_segment(payload, "payload")?;
		let signature = URL_SAFE_NO_PAD
			.decode(signature)
			.map_err(|e| CodecError::malformed(format_args!("signature encoding: {e}")))?;
		// The signed bytes are exactly what was received, so encode/decode stays byte-exact.
		let signed_len = token.len() - signature_len(token);

		self.mac(&payload.sub)?
			.chain_update(&token.as_bytes()[..signed_len])
			.verify_slice(&signature)
			.map_err(|_| CodecError::SignatureMismatch)?;

		let expires_at = OffsetDateTime::from_unix_timestamp(payload.exp)
			.map_err(|e| CodecError::malformed(format_args!("exp: {e}")))?;
		let custom = CustomClaims::try_from(payload.custom).map_err(CodecError::malformed)?;

		Ok(Claims::new(payload.sub, expires_at, payload.rmk.map(Marker::from_millis), custom))
	}

	/// Opens the token and rejects it with [`CodecError::Expired`] once `now` reaches its expiry.
	pub fn decode(&self, token: &str, now: OffsetDateTime) -> Result<Claims, CodecError> {
		let claims = self.open(token)?;

		if claims.is_expired_at(now) {
			return Err(CodecError::Expired { expires_at: claims.expires_at });
		}

		Ok(claims)
	}

	fn mac(&self, subject: &Subject) -> Result<HmacSha256, CodecError> {
		<HmacSha256 as Mac>::new_from_slice(self.secret.derive_for(subject).as_bytes())
			.map_err(|_| CodecError::Key)
	}
}

fn segment<T>(value: &T) -> Result<String, CodecError>
where
	T: Serialize,
{
	let json = serde_json::to_vec(value).map_err(CodecError::malformed)?;

	Ok(URL_SAFE_NO_PAD.encode(json))
}

fn parse_segment<T>(segment: &str, label: &'static str) -> Result<T, CodecError>
where
	T: for<'de> Deserialize<'de>,
{
	let bytes = URL_SAFE_NO_PAD
		.decode(segment)
		.map_err(|e| CodecError::malformed(format_args!("{label} encoding: {e}")))?;
	let mut de = serde_json::Deserializer::from_slice(&bytes);

	serde_path_to_error::deserialize(&mut de).map_err(|e| {
		CodecError::malformed(format_args!("{label} field `{}`: {}", e.path(), e.inner()))
	})
}

// Length of `.signature`, including the separator.
fn signature_len(token: &str) -> usize {
	token.rfind('.').map(|idx| token.len() - idx).unwrap_or(0)
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	fn codec() -> TokenCodec {
		TokenCodec::new(SigningSecret::new("base-secret"))
	}

	fn claims(subject: &str) -> Claims {
		let custom = CustomClaims::new()
			.with("role", "admin")
			.and_then(|c| c.with("tenant", "acme"))
			.expect("Custom claims fixture should be valid.");

		Claims::new(
			Subject::new(subject).expect("Subject fixture should be valid."),
			macros::datetime!(2025-01-01 00:05 UTC),
			Some(Marker::from_millis(1_735_689_600_000)),
			custom,
		)
	}

	#[test]
	fn encode_then_open_preserves_claims_and_bytes() {
		let codec = codec();
		let original = claims("alice");
		let token = codec.encode(&original).expect("Encoding fixture claims should succeed.");
		let opened = codec.open(token.expose()).expect("Freshly encoded token should open.");

		assert_eq!(opened, original);
		assert_eq!(codec.encode(&opened).expect("Re-encoding should succeed."), token);
	}

	#[test]
	fn varied_claim_maps_round_trip_byte_exact() {
		let codec = codec();
		let subject =
			Subject::new("ünïcødé@example.com").expect("Subject fixture should be valid.");
		let escaping = [
			("quote", "say \"hi\""),
			("slash", "a\\b/c"),
			("control", "line\nbreak\ttab\u{0}"),
			("html", "</script><b>&amp;</b>"),
			("emoji", "🔐 ключ 鍵"),
			("empty", ""),
		];
		// Names sorting immediately around the reserved ones.
		let neighbours =
			["ex", "exo", "expires", "ia", "iat_", "rmj", "rmkk", "su", "sub_", "zzz"];
		let mut maps = vec![CustomClaims::new()];
		let mut all = CustomClaims::new();

		for (name, value) in escaping {
			all.insert(name, value).expect("Escaping fixtures use free names.");
		}
		maps.push(all);

		let mut around = CustomClaims::new();

		for name in neighbours {
			around.insert(name, name.to_uppercase()).expect("Neighbour names are not reserved.");
		}
		maps.push(around);
		maps.push(CustomClaims::new().with("ü", "ß").expect("Non-ASCII names are allowed."));

		for (index, custom) in maps.into_iter().enumerate() {
			for marker in [None, Some(Marker::from_millis(i64::MAX))] {
				let original = Claims::new(
					subject.clone(),
					macros::datetime!(2025-01-01 00:05 UTC),
					marker,
					custom.clone(),
				);
				let token = codec.encode(&original).expect("Encoding should succeed.");
				let opened = codec.open(token.expose()).expect("Encoded token should open.");

				assert_eq!(opened, original, "claim map #{index} should survive the round trip");
				assert_eq!(
					codec.encode(&opened).expect("Re-encoding should succeed."),
					token,
					"claim map #{index} should re-encode byte-exact"
				);
			}
		}
	}

	#[test]
	fn header_is_hs256() {
		let token = codec().encode(&claims("alice")).expect("Encoding should succeed.");
		let header = token.expose().split('.').next().expect("Token should have a header.");
		let header = URL_SAFE_NO_PAD.decode(header).expect("Header should be base64url.");

		assert_eq!(header, br#"{"alg":"HS256","typ":"JWT"}"#);
	}

	#[test]
	fn decode_separates_expiry_from_tampering() {
		let codec = codec();
		let token = codec.encode(&claims("alice")).expect("Encoding should succeed.");

		codec
			.decode(token.expose(), macros::datetime!(2025-01-01 00:04:59 UTC))
			.expect("Token should be valid before expiry.");

		assert!(matches!(
			codec.decode(token.expose(), macros::datetime!(2025-01-01 00:05 UTC)),
			Err(CodecError::Expired { .. })
		));

		let mut parts: Vec<String> = token.expose().split('.').map(str::to_owned).collect();
		let mut payload = URL_SAFE_NO_PAD.decode(&parts[1]).expect("Payload should be base64url.");

		// Flip a bit inside the JSON payload without breaking its structure.
		let idx = payload.iter().position(|b| *b == b'a').expect("Payload contains `a`.");

		payload[idx] ^= 0b0000_0010;
		parts[1] = URL_SAFE_NO_PAD.encode(&payload);

		let tampered = parts.join(".");

		assert!(matches!(
			codec.decode(&tampered, macros::datetime!(2025-01-01 00:06 UTC)),
			Err(CodecError::SignatureMismatch | CodecError::Malformed { .. })
		));
	}

	#[test]
	fn every_payload_bit_flip_is_rejected() {
		let codec = codec();
		let token = codec.encode(&claims("alice")).expect("Encoding should succeed.");
		let parts: Vec<&str> = token.expose().split('.').collect();
		let payload = URL_SAFE_NO_PAD.decode(parts[1]).expect("Payload should be base64url.");

		for byte in 0..payload.len() {
			for bit in 0..8 {
				let mut flipped = payload.clone();

				flipped[byte] ^= 1 << bit;

				let forged =
					format!("{}.{}.{}", parts[0], URL_SAFE_NO_PAD.encode(&flipped), parts[2]);
				let err = codec.open(&forged).expect_err("A flipped payload bit must fail.");

				assert!(!matches!(err, CodecError::Expired { .. }));
			}
		}
	}

	#[test]
	fn keys_are_per_subject() {
		let codec = codec();
		let alice = codec.encode(&claims("alice")).expect("Encoding should succeed.");
		let bob = codec.encode(&claims("bob")).expect("Encoding should succeed.");
		let alice_parts: Vec<&str> = alice.expose().split('.').collect();
		let bob_parts: Vec<&str> = bob.expose().split('.').collect();
		// Bob's payload under Alice's signature.
		let spliced = format!("{}.{}.{}", alice_parts[0], bob_parts[1], alice_parts[2]);

		assert!(matches!(codec.open(&spliced), Err(CodecError::SignatureMismatch)));

		let other = TokenCodec::new(SigningSecret::new("other-secret"));

		assert!(matches!(other.open(alice.expose()), Err(CodecError::SignatureMismatch)));
	}

	#[test]
	fn foreign_algorithms_and_shapes_are_refused() {
		let codec = codec();
		let token = codec.encode(&claims("alice")).expect("Encoding should succeed.");
		let rest = token.expose().split_once('.').map(|(_, rest)| rest).expect("Token has dots.");
		let none_header = URL_SAFE_NO_PAD.encode(br#"{"alg":"none"}"#);

		assert!(matches!(
			codec.open(&format!("{none_header}.{rest}")),
			Err(CodecError::UnsupportedAlgorithm { algorithm }) if algorithm == "none"
		));
		assert!(matches!(codec.open("a.b"), Err(CodecError::Malformed { .. })));
		assert!(matches!(codec.open("a.b.c.d"), Err(CodecError::Malformed { .. })));
		assert!(matches!(codec.open("!!.??.**"), Err(CodecError::Malformed { .. })));
	}

	#[test]
	fn codec_errors_classify_into_the_taxonomy() {
		assert!(matches!(
			Error::from(CodecError::Expired { expires_at: OffsetDateTime::UNIX_EPOCH }),
			Error::AccessTokenExpired
		));
		assert!(matches!(
			Error::from(CodecError::SignatureMismatch),
			Error::SignatureInvalid { .. }
		));
	}
}
