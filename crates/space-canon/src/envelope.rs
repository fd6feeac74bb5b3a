use serde::{Deserialize, Serialize, de::DeserializeOwned};

use crate::canonical::{CanonicalError, canonicalize, canonicalize_to_string};
use crate::signer::{EnvelopeSigner, SignError, VerificationFailure, check_signature, sign};

/// Wire value of the signature field on machine-generated seed artifacts.
pub const SYSTEM_AUTHORED_MARKER: &str = "not applicable";

/// The only public key a system-authored envelope may carry.
pub const SYSTEM_AUTHOR_KEY: &str = "nounspace";

/// Envelope fields covered by the signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnsignedEnvelope {
    pub public_key: String,
    /// Canonical JSON text of the document, not the document itself.
    pub payload: String,
    pub payload_type: String,
    pub is_encrypted: bool,
    pub timestamp: String,
}

impl UnsignedEnvelope {
    pub fn with_signature(self, signature: Seal) -> SignedEnvelope {
        SignedEnvelope {
            public_key: self.public_key,
            payload: self.payload,
            payload_type: self.payload_type,
            is_encrypted: self.is_encrypted,
            timestamp: self.timestamp,
            signature,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedEnvelope {
    pub public_key: String,
    pub payload: String,
    pub payload_type: String,
    pub is_encrypted: bool,
    pub timestamp: String,
    pub signature: Seal,
}

impl SignedEnvelope {
    /// The envelope with `signature` stripped, i.e. what was hashed.
    pub fn unsigned(&self) -> UnsignedEnvelope {
        UnsignedEnvelope {
            public_key: self.public_key.clone(),
            payload: self.payload.clone(),
            payload_type: self.payload_type.clone(),
            is_encrypted: self.is_encrypted,
            timestamp: self.timestamp.clone(),
        }
    }
}

/// Signature slot of an envelope.
///
/// Seed artifacts written by the system carry a fixed marker instead of a
/// signature. Keeping that as its own variant means no string comparison on
/// a signature can ever widen into a trust bypass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Seal {
    UserSigned(String),
    SystemAuthored,
}

impl From<String> for Seal {
    fn from(value: String) -> Self {
        if value == SYSTEM_AUTHORED_MARKER {
            Seal::SystemAuthored
        } else {
            Seal::UserSigned(value)
        }
    }
}

impl From<Seal> for String {
    fn from(value: Seal) -> Self {
        match value {
            Seal::UserSigned(sig) => sig,
            Seal::SystemAuthored => SYSTEM_AUTHORED_MARKER.to_string(),
        }
    }
}

/// What a reader accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TrustPolicy {
    /// Only envelopes with a valid user signature.
    #[default]
    Strict,
    /// Also system-authored seed envelopes, and only when they carry
    /// [`SYSTEM_AUTHOR_KEY`].
    AllowSystemAuthored,
}

/// Who an opened envelope was accepted from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authorship {
    User { public_key: String },
    System,
}

#[derive(Debug, thiserror::Error)]
pub enum EnvelopeError {
    #[error(transparent)]
    Canonical(#[from] CanonicalError),
    #[error(transparent)]
    Sign(#[from] SignError),
    #[error("envelope JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("untrusted envelope: {0}")]
    Verification(#[from] VerificationFailure),
}

/// Canonicalize `document`, wrap it and sign the result.
pub fn seal<T: Serialize + ?Sized>(
    document: &T,
    payload_type: &str,
    timestamp: impl Into<String>,
    signer: &dyn EnvelopeSigner,
) -> Result<SignedEnvelope, EnvelopeError> {
    let unsigned = UnsignedEnvelope {
        public_key: signer.public_key(),
        payload: canonicalize_to_string(document)?,
        payload_type: payload_type.to_string(),
        is_encrypted: false,
        timestamp: timestamp.into(),
    };
    let signature = sign(&unsigned, signer)?;
    Ok(unsigned.with_signature(Seal::UserSigned(signature)))
}

/// Check an envelope under `policy` and decode its payload.
pub fn open<T: DeserializeOwned>(
    envelope: &SignedEnvelope,
    payload_type: &str,
    policy: TrustPolicy,
) -> Result<(T, Authorship), EnvelopeError> {
    if envelope.is_encrypted {
        return Err(VerificationFailure::Encrypted.into());
    }
    if envelope.payload_type != payload_type {
        return Err(VerificationFailure::PayloadType {
            expected: payload_type.to_string(),
            found: envelope.payload_type.clone(),
        }
        .into());
    }
    let authorship = match (&envelope.signature, policy) {
        (Seal::UserSigned(_), _) => {
            check_signature(envelope, &envelope.public_key)?;
            Authorship::User {
                public_key: envelope.public_key.clone(),
            }
        }
        (Seal::SystemAuthored, TrustPolicy::Strict) => {
            return Err(VerificationFailure::SystemAuthoredRejected.into());
        }
        (Seal::SystemAuthored, TrustPolicy::AllowSystemAuthored) => {
            if envelope.public_key != SYSTEM_AUTHOR_KEY {
                return Err(
                    VerificationFailure::SystemAuthorMismatch(envelope.public_key.clone()).into(),
                );
            }
            Authorship::System
        }
    };
    let document = serde_json::from_str(&envelope.payload)?;
    Ok((document, authorship))
}

/// Wire bytes of an envelope. Canonical, so equal envelopes give equal bytes.
pub fn encode_envelope(envelope: &SignedEnvelope) -> Result<Vec<u8>, EnvelopeError> {
    Ok(canonicalize(envelope)?)
}

pub fn decode_envelope(bytes: &[u8]) -> Result<SignedEnvelope, EnvelopeError> {
    Ok(serde_json::from_slice(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signer::Ed25519Signer;
    use serde_json::{Value, json};
    use space_types::{FidgetInstance, TabDocument};

    const TS: &str = "2024-05-01T10:00:00.000000Z";

    fn signer() -> Ed25519Signer {
        Ed25519Signer::from_bytes(&[3u8; 32])
    }

    #[test]
    fn sealed_document_opens_back() {
        let doc = TabDocument::empty().with_fidget(FidgetInstance::new("a", "text"), 0, 0, 3, 2);
        let envelope = seal(&doc, "spaceTab", TS, &signer()).expect("seal");
        let (opened, authorship): (TabDocument, _) =
            open(&envelope, "spaceTab", TrustPolicy::Strict).expect("open");
        assert_eq!(opened, doc);
        assert_eq!(
            authorship,
            Authorship::User {
                public_key: signer().public_key()
            }
        );
    }

    #[test]
    fn payload_is_double_encoded_on_the_wire() {
        let envelope = seal(&json!({ "b": 1, "a": 2 }), "spaceTab", TS, &signer()).unwrap();
        let wire: Value = serde_json::from_slice(&encode_envelope(&envelope).unwrap()).unwrap();
        assert_eq!(wire["payload"], Value::String(r#"{"a":2,"b":1}"#.into()));
        assert_eq!(wire["payloadType"], "spaceTab");
        assert_eq!(wire["isEncrypted"], false);
        assert!(wire["signature"].is_string());
    }

    #[test]
    fn wire_round_trip_keeps_verification() {
        let envelope = seal(&json!({ "k": [1, 2] }), "tabOrder", TS, &signer()).unwrap();
        let bytes = encode_envelope(&envelope).unwrap();
        let decoded = decode_envelope(&bytes).unwrap();
        assert_eq!(decoded, envelope);
        assert!(crate::verify(&decoded, &signer().public_key()));
    }

    #[test]
    fn payload_type_is_checked() {
        let envelope = seal(&json!({}), "tabOrder", TS, &signer()).unwrap();
        let err = open::<Value>(&envelope, "spaceTab", TrustPolicy::Strict).unwrap_err();
        assert!(matches!(
            err,
            EnvelopeError::Verification(VerificationFailure::PayloadType { .. })
        ));
    }

    fn system_envelope(public_key: &str) -> SignedEnvelope {
        UnsignedEnvelope {
            public_key: public_key.into(),
            payload: "{}".into(),
            payload_type: "spaceTab".into(),
            is_encrypted: false,
            timestamp: TS.into(),
        }
        .with_signature(Seal::SystemAuthored)
    }

    #[test]
    fn system_authored_only_under_opt_in_policy() {
        let envelope = system_envelope(SYSTEM_AUTHOR_KEY);
        assert!(matches!(
            open::<Value>(&envelope, "spaceTab", TrustPolicy::Strict),
            Err(EnvelopeError::Verification(
                VerificationFailure::SystemAuthoredRejected
            ))
        ));
        let (_, authorship) =
            open::<Value>(&envelope, "spaceTab", TrustPolicy::AllowSystemAuthored).unwrap();
        assert_eq!(authorship, Authorship::System);
    }

    #[test]
    fn system_marker_with_user_key_is_rejected() {
        let envelope = system_envelope(&signer().public_key());
        assert!(matches!(
            open::<Value>(&envelope, "spaceTab", TrustPolicy::AllowSystemAuthored),
            Err(EnvelopeError::Verification(
                VerificationFailure::SystemAuthorMismatch(_)
            ))
        ));
    }

    #[test]
    fn marker_string_maps_to_variant() {
        let wire = json!({
            "publicKey": SYSTEM_AUTHOR_KEY,
            "payload": "{}",
            "payloadType": "spaceTab",
            "isEncrypted": false,
            "timestamp": TS,
            "signature": SYSTEM_AUTHORED_MARKER,
        });
        let envelope: SignedEnvelope = serde_json::from_value(wire).unwrap();
        assert_eq!(envelope.signature, Seal::SystemAuthored);
    }

    #[test]
    fn encrypted_payloads_are_refused() {
        let mut envelope = seal(&json!({}), "spaceTab", TS, &signer()).unwrap();
        envelope.is_encrypted = true;
        assert!(matches!(
            open::<Value>(&envelope, "spaceTab", TrustPolicy::Strict),
            Err(EnvelopeError::Verification(VerificationFailure::Encrypted))
        ));
    }
}
