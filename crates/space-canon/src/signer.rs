use ed25519_dalek::{SECRET_KEY_LENGTH, Signature, Signer as _, SigningKey, VerifyingKey};
use std::fmt;

use crate::canonical::{CanonicalError, canonicalize};
use crate::envelope::{Seal, SignedEnvelope, UnsignedEnvelope};
use crate::hash::{Digest, digest};

/// Produces signatures over envelope digests.
///
/// The digest is the message: implementations sign the 32 bytes as given and
/// must not hash them again, so the hash and signature algorithms can move
/// independently.
pub trait EnvelopeSigner: Send + Sync {
    /// Hex-encoded public key written into every envelope this signer seals.
    fn public_key(&self) -> String;

    /// Hex-encoded signature over `digest`.
    fn sign_digest(&self, digest: &Digest) -> Result<String, SignError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SignError {
    #[error(transparent)]
    Canonical(#[from] CanonicalError),
    #[error("invalid secret key: {0}")]
    InvalidKey(String),
    #[error("signer unavailable: {0}")]
    Unavailable(String),
}

/// Why a signature did not check out.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerificationFailure {
    #[error("public key is not a 32-byte hex Ed25519 key")]
    MalformedPublicKey,
    #[error("signature is not a 64-byte hex Ed25519 signature")]
    MalformedSignature,
    #[error("envelope could not be canonicalized")]
    Uncanonical,
    #[error("signature does not match envelope digest")]
    Mismatch,
    #[error("system-authored envelopes are not accepted by this reader")]
    SystemAuthoredRejected,
    #[error("system-authored marker used with non-system key '{0}'")]
    SystemAuthorMismatch(String),
    #[error("payload type '{found}' does not match expected '{expected}'")]
    PayloadType { expected: String, found: String },
    #[error("encrypted payloads cannot be opened here")]
    Encrypted,
}

/// Sign the canonical digest of an unsigned envelope.
pub fn sign(
    unsigned: &UnsignedEnvelope,
    signer: &dyn EnvelopeSigner,
) -> Result<String, SignError> {
    let bytes = canonicalize(unsigned)?;
    signer.sign_digest(&digest(&bytes))
}

/// `true` when `envelope` carries a valid user signature under `public_key`.
/// Malformed input is simply `false`.
pub fn verify(envelope: &SignedEnvelope, public_key: &str) -> bool {
    check_signature(envelope, public_key).is_ok()
}

/// Like [`verify`] but reports the reason for a rejection.
pub fn check_signature(
    envelope: &SignedEnvelope,
    public_key: &str,
) -> Result<(), VerificationFailure> {
    let signature_hex = match &envelope.signature {
        Seal::UserSigned(sig) => sig,
        Seal::SystemAuthored => return Err(VerificationFailure::SystemAuthoredRejected),
    };
    let key = parse_public_key(public_key)?;
    let signature = parse_signature(signature_hex)?;
    let bytes =
        canonicalize(&envelope.unsigned()).map_err(|_| VerificationFailure::Uncanonical)?;
    let digest = digest(&bytes);
    key.verify_strict(digest.as_bytes(), &signature)
        .map_err(|_| VerificationFailure::Mismatch)
}

fn parse_public_key(public_key: &str) -> Result<VerifyingKey, VerificationFailure> {
    let mut raw = [0u8; 32];
    hex::decode_to_slice(public_key, &mut raw)
        .map_err(|_| VerificationFailure::MalformedPublicKey)?;
    VerifyingKey::from_bytes(&raw).map_err(|_| VerificationFailure::MalformedPublicKey)
}

fn parse_signature(signature: &str) -> Result<Signature, VerificationFailure> {
    let raw = hex::decode(signature).map_err(|_| VerificationFailure::MalformedSignature)?;
    Signature::from_slice(&raw).map_err(|_| VerificationFailure::MalformedSignature)
}

/// Local Ed25519 key.
pub struct Ed25519Signer {
    key: SigningKey,
}

impl Ed25519Signer {
    pub fn from_bytes(secret: &[u8; SECRET_KEY_LENGTH]) -> Self {
        Self {
            key: SigningKey::from_bytes(secret),
        }
    }

    pub fn from_hex(secret: &str) -> Result<Self, SignError> {
        let mut raw = [0u8; SECRET_KEY_LENGTH];
        hex::decode_to_slice(secret, &mut raw).map_err(|e| SignError::InvalidKey(e.to_string()))?;
        Ok(Self::from_bytes(&raw))
    }

    pub fn generate() -> Result<Self, SignError> {
        let mut raw = [0u8; SECRET_KEY_LENGTH];
        getrandom::getrandom(&mut raw).map_err(|e| SignError::Unavailable(e.to_string()))?;
        Ok(Self::from_bytes(&raw))
    }
}

impl fmt::Debug for Ed25519Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ed25519Signer")
            .field("public_key", &self.public_key())
            .finish_non_exhaustive()
    }
}

impl EnvelopeSigner for Ed25519Signer {
    fn public_key(&self) -> String {
        hex::encode(self.key.verifying_key().to_bytes())
    }

    fn sign_digest(&self, digest: &Digest) -> Result<String, SignError> {
        Ok(hex::encode(self.key.sign(digest.as_bytes()).to_bytes()))
    }
}
