//! PKCE (Proof Key for Code Exchange) verification.
//!
//! Implements S256 and plain code challenge verification per RFC 7636.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// Code challenge transformation (RFC 7636 §4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PkceMethod {
    #[serde(rename = "S256")]
    S256,
    #[serde(rename = "plain")]
    Plain,
}

impl PkceMethod {
    /// Parse a `code_challenge_method` value. Absent means `plain` per RFC 7636.
    #[must_use]
    pub fn parse(method: Option<&str>) -> Option<Self> {
        match method {
            Some("S256") => Some(Self::S256),
            Some("plain") | None => Some(Self::Plain),
            Some(_) => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::S256 => "S256",
            Self::Plain => "plain",
        }
    }
}

/// The challenge recorded when an authorization code is issued.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PkceChallenge {
    pub challenge: String,
    pub method: PkceMethod,
}

impl PkceChallenge {
    #[must_use]
    pub fn s256(challenge: impl Into<String>) -> Self {
        Self { challenge: challenge.into(), method: PkceMethod::S256 }
    }

    /// Check a token-request `code_verifier` against this challenge.
    #[must_use]
    pub fn verify(&self, code_verifier: &str) -> bool {
        match self.method {
            PkceMethod::S256 => verify_s256(code_verifier, &self.challenge),
            PkceMethod::Plain => constant_time_eq(code_verifier.as_bytes(), self.challenge.as_bytes()),
        }
    }
}

/// Compute `BASE64URL(SHA256(code_verifier))`.
#[must_use]
pub fn s256_challenge(code_verifier: &str) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(code_verifier.as_bytes()))
}

/// Verify a PKCE S256 code challenge.
///
/// Computes `BASE64URL(SHA256(code_verifier))` and compares to the stored challenge.
pub fn verify_s256(code_verifier: &str, code_challenge: &str) -> bool {
    constant_time_eq(s256_challenge(code_verifier).as_bytes(), code_challenge.as_bytes())
}

/// Byte comparison whose running time does not depend on where inputs differ.
pub(crate) fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.ct_eq(b).into()
}
