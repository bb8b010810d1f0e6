//! PKCE verifier/challenge generation (RFC 7636, `S256`).

// crates.io
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::Rng;
use sha2::{Digest, Sha256};
// self
use crate::_prelude::*;

const VERIFIER_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Verifier length used for every Okta acquisition.
pub const DEFAULT_VERIFIER_LEN: usize = 50;
/// Shortest verifier permitted by RFC 7636.
pub const MIN_VERIFIER_LEN: usize = 43;
/// Longest verifier permitted by RFC 7636.
pub const MAX_VERIFIER_LEN: usize = 128;

/// Supported PKCE challenge methods.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PkceCodeChallengeMethod {
	/// SHA-256 based PKCE (RFC 7636 S256).
	S256,
}
impl PkceCodeChallengeMethod {
	/// Returns the RFC 7636 identifier for the challenge method.
	pub fn as_str(self) -> &'static str {
		match self {
			PkceCodeChallengeMethod::S256 => "S256",
		}
	}
}

/// Errors raised while generating PKCE material.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum PkceError {
	/// Requested verifier length falls outside `43..=128`.
	#[error("PKCE verifier length {len} is outside 43..=128.")]
	InvalidVerifierLength {
		/// Rejected length.
		len: usize,
	},
}

/// Single-use verifier/challenge pair generated for one token acquisition.
#[derive(Clone)]
pub struct PkcePair {
	verifier: String,
	challenge: String,
	method: PkceCodeChallengeMethod,
}
impl PkcePair {
	/// Generates a pair with a [`DEFAULT_VERIFIER_LEN`]-character alphabetic verifier.
	pub fn generate() -> Self {
		Self::from_verifier(random_alphabetic(DEFAULT_VERIFIER_LEN))
	}

	/// Generates a pair with a verifier of the requested length.
	pub fn with_verifier_len(len: usize) -> Result<Self, PkceError> {
		if !(MIN_VERIFIER_LEN..=MAX_VERIFIER_LEN).contains(&len) {
			return Err(PkceError::InvalidVerifierLength { len });
		}

		Ok(Self::from_verifier(random_alphabetic(len)))
	}

	/// Secret verifier sent with the token exchange.
	pub fn verifier(&self) -> &str {
		&self.verifier
	}

	/// Challenge sent with the authorize request.
	pub fn challenge(&self) -> &str {
		&self.challenge
	}

	/// Challenge method (currently always `S256`).
	pub fn method(&self) -> PkceCodeChallengeMethod {
		self.method
	}

	/// Computes the unpadded URL-safe Base64 SHA-256 challenge for `verifier`.
	pub fn compute_challenge(verifier: &str) -> String {
		let mut hasher = Sha256::new();

		hasher.update(verifier.as_bytes());

		URL_SAFE_NO_PAD.encode(hasher.finalize())
	}

	fn from_verifier(verifier: String) -> Self {
		let challenge = Self::compute_challenge(&verifier);

		Self { verifier, challenge, method: PkceCodeChallengeMethod::S256 }
	}
}
impl Debug for PkcePair {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("PkcePair")
			.field("verifier", &"<redacted>")
			.field("challenge", &self.challenge)
			.field("method", &self.method)
			.finish()
	}
}

fn random_alphabetic(len: usize) -> String {
	let mut rng = rand::rng();

	(0..len)
		.map(|_| char::from(VERIFIER_ALPHABET[rng.random_range(0..VERIFIER_ALPHABET.len())]))
		.collect()
}
