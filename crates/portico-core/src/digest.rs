//! # Content Digests
//!
//! SHA-256 digests over canonical JSON, used for deployment snapshot
//! identity and whole-plan digests. Determinism is the point: the same
//! logical records always hash to the same digest, which is what lets a
//! re-composition recognize an unchanged deployment.
//!
//! ## Canonical Form
//!
//! [`digest_of`] serializes through `serde_json`. Every digested type keeps
//! its map-shaped data in `BTreeMap`/`BTreeSet`, so field and key order are
//! fixed and the serialized bytes are canonical without a separate
//! canonicalization pass.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::ValidationError;

/// A SHA-256 content digest.
///
/// Serializes as a 64-character lowercase hex string so digests stay
/// readable inside plan artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContentDigest([u8; 32]);

impl ContentDigest {
    /// Wrap raw digest bytes. Prefer [`digest_of`] for computing digests.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// The raw 32-byte digest value.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Render the digest as a lowercase hex string.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }

    /// The first eight hex characters, used where a full digest would be
    /// unwieldy (deployment node names, log lines).
    pub fn short(&self) -> String {
        self.to_hex()[..8].to_string()
    }

    /// Parse a 64-character lowercase hex string.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::InvalidDigest`] on wrong length or
    /// non-hex characters.
    pub fn from_hex(s: &str) -> Result<Self, ValidationError> {
        if s.len() != 64 {
            return Err(ValidationError::InvalidDigest(s.to_string()));
        }
        let mut bytes = [0u8; 32];
        for (i, chunk) in s.as_bytes().chunks(2).enumerate() {
            let pair = std::str::from_utf8(chunk)
                .map_err(|_| ValidationError::InvalidDigest(s.to_string()))?;
            bytes[i] = u8::from_str_radix(pair, 16)
                .map_err(|_| ValidationError::InvalidDigest(s.to_string()))?;
        }
        Ok(Self(bytes))
    }
}

impl std::fmt::Display for ContentDigest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "sha256:{}", self.to_hex())
    }
}

impl Serialize for ContentDigest {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for ContentDigest {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::from_hex(&raw).map_err(serde::de::Error::custom)
    }
}

/// Compute the SHA-256 digest of a value's canonical JSON form.
///
/// # Errors
///
/// Returns the underlying `serde_json` error if the value cannot be
/// serialized (in practice only for non-string map keys).
pub fn digest_of<T: Serialize>(value: &T) -> Result<ContentDigest, serde_json::Error> {
    let bytes = serde_json::to_vec(value)?;
    let hash = Sha256::digest(&bytes);
    let mut out = [0u8; 32];
    out.copy_from_slice(&hash);
    Ok(ContentDigest(out))
}
