//! Canonical JSON encoding, stable SHA-256 digests and signed envelopes for
//! every artifact a Space persists.

mod canonical;
mod envelope;
mod hash;
mod signer;

pub use canonical::{CanonicalError, canonicalize, canonicalize_to_string};
pub use envelope::{
    Authorship, EnvelopeError, SYSTEM_AUTHOR_KEY, SYSTEM_AUTHORED_MARKER, Seal, SignedEnvelope,
    TrustPolicy, UnsignedEnvelope, decode_envelope, encode_envelope, open, seal,
};
pub use hash::{DIGEST_LEN, Digest, DigestParseError, HASH_PREFIX, digest};
pub use signer::{
    Ed25519Signer, EnvelopeSigner, SignError, VerificationFailure, check_signature, sign, verify,
};
