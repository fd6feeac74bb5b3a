use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};
use std::fmt;

/// Prefix for rendered digests (e.g. `sha256:deadbeef`).
pub const HASH_PREFIX: &str = "sha256:";

/// Digest size in bytes. Fixed for the whole system.
pub const DIGEST_LEN: usize = 32;

/// SHA-256 digest of canonical bytes. Serializes as its `sha256:` string.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct Digest([u8; DIGEST_LEN]);

/// Hash arbitrary bytes.
pub fn digest(bytes: &[u8]) -> Digest {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    let mut arr = [0u8; DIGEST_LEN];
    arr.copy_from_slice(&hasher.finalize());
    Digest(arr)
}

impl Digest {
    pub fn as_bytes(&self) -> &[u8; DIGEST_LEN] {
        &self.0
    }

    pub fn to_hex(&self) -> String {
        format!("{HASH_PREFIX}{}", hex::encode(self.0))
    }

    pub fn from_hex_str(s: &str) -> Result<Self, DigestParseError> {
        let rest = s
            .strip_prefix(HASH_PREFIX)
            .ok_or(DigestParseError::MissingPrefix)?;
        if rest.len() != DIGEST_LEN * 2 {
            return Err(DigestParseError::InvalidLength(rest.len()));
        }
        let mut buf = [0u8; DIGEST_LEN];
        hex::decode_to_slice(rest, &mut buf)?;
        Ok(Digest(buf))
    }
}

impl fmt::Debug for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Digest").field(&self.to_hex()).finish()
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl From<[u8; DIGEST_LEN]> for Digest {
    fn from(value: [u8; DIGEST_LEN]) -> Self {
        Digest(value)
    }
}

impl From<Digest> for String {
    fn from(value: Digest) -> Self {
        value.to_hex()
    }
}

impl TryFrom<&str> for Digest {
    type Error = DigestParseError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Digest::from_hex_str(value)
    }
}

impl TryFrom<String> for Digest {
    type Error = DigestParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Digest::from_hex_str(&value)
    }
}

impl AsRef<[u8]> for Digest {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DigestParseError {
    #[error("digest string missing '{HASH_PREFIX}' prefix")]
    MissingPrefix,
    #[error("digest hex length must be 64, got {0}")]
    InvalidLength(usize),
    #[error("invalid hex: {0}")]
    InvalidHex(#[from] hex::FromHexError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_vector() {
        assert_eq!(
            digest(b"abc").to_hex(),
            "sha256:ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn parse_and_format_round_trip() {
        let original = "sha256:0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";
        let parsed = Digest::from_hex_str(original).expect("parse");
        assert_eq!(parsed.to_hex(), original);
        assert!(Digest::from_hex_str("0123").is_err());
        assert!(Digest::from_hex_str("sha256:0123").is_err());
    }

    #[test]
    fn serializes_as_prefixed_string() {
        let d = digest(b"abc");
        let json = serde_json::to_string(&d).expect("serialize");
        assert_eq!(json, format!("\"{}\"", d.to_hex()));
        let back: Digest = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, d);
        assert!(serde_json::from_str::<Digest>("\"md5:abc\"").is_err());
        assert!(Digest::try_from("sha256:zz").is_err());
    }
}
