//! Canonical JSON: compact, object keys sorted by UTF-8 bytes at every depth.
//!
//! Values are first lowered into the CBOR data model, which keeps floats,
//! byte strings and non-text map keys distinct. Anything JSON cannot carry
//! faithfully is rejected instead of being coerced.

use serde::Serialize;
use serde_cbor::value::Value as CborValue;
use std::fmt::Write as _;

#[derive(Debug, thiserror::Error)]
pub enum CanonicalError {
    #[error("failed to lower value: {0}")]
    Lower(#[from] serde_cbor::Error),
    #[error("failed to write canonical JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("non-finite float at {path}")]
    NonFiniteFloat { path: String },
    #[error("byte strings are not representable at {path}")]
    Bytes { path: String },
    #[error("tagged value {tag} is not representable at {path}")]
    Tagged { path: String, tag: u64 },
    #[error("map key at {path} is not a string")]
    NonStringKey { path: String },
    #[error("unsupported value at {path}")]
    Unsupported { path: String },
}

/// Canonical bytes for any serializable value.
pub fn canonicalize<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, CanonicalError> {
    let lowered = serde_cbor::value::to_value(value)?;
    let mut out = Vec::with_capacity(256);
    let mut path = String::from("$");
    write_value(&lowered, &mut out, &mut path)?;
    Ok(out)
}

/// Same as [`canonicalize`], as a `String`.
pub fn canonicalize_to_string<T: Serialize + ?Sized>(value: &T) -> Result<String, CanonicalError> {
    let bytes = canonicalize(value)?;
    // The writer only ever emits serde_json output and ASCII punctuation.
    String::from_utf8(bytes).map_err(|_| CanonicalError::Unsupported { path: "$".into() })
}

fn write_value(
    value: &CborValue,
    out: &mut Vec<u8>,
    path: &mut String,
) -> Result<(), CanonicalError> {
    match value {
        CborValue::Null => out.extend_from_slice(b"null"),
        CborValue::Bool(true) => out.extend_from_slice(b"true"),
        CborValue::Bool(false) => out.extend_from_slice(b"false"),
        CborValue::Integer(int) => out.extend_from_slice(int.to_string().as_bytes()),
        CborValue::Float(float) => {
            if !float.is_finite() {
                return Err(CanonicalError::NonFiniteFloat { path: path.clone() });
            }
            serde_json::to_writer(&mut *out, float)?;
        }
        CborValue::Text(text) => serde_json::to_writer(&mut *out, text)?,
        CborValue::Bytes(_) => return Err(CanonicalError::Bytes { path: path.clone() }),
        CborValue::Tag(tag, _) => {
            return Err(CanonicalError::Tagged {
                path: path.clone(),
                tag: *tag,
            });
        }
        CborValue::Array(items) => {
            out.push(b'[');
            for (idx, item) in items.iter().enumerate() {
                if idx > 0 {
                    out.push(b',');
                }
                let mark = path.len();
                let _ = write!(path, "[{idx}]");
                write_value(item, out, path)?;
                path.truncate(mark);
            }
            out.push(b']');
        }
        CborValue::Map(entries) => {
            let mut fields = Vec::with_capacity(entries.len());
            for (key, item) in entries {
                match key {
                    CborValue::Text(key) => fields.push((key.as_str(), item)),
                    _ => return Err(CanonicalError::NonStringKey { path: path.clone() }),
                }
            }
            fields.sort_by(|a, b| a.0.as_bytes().cmp(b.0.as_bytes()));
            out.push(b'{');
            for (idx, (key, item)) in fields.into_iter().enumerate() {
                if idx > 0 {
                    out.push(b',');
                }
                serde_json::to_writer(&mut *out, key)?;
                out.push(b':');
                let mark = path.len();
                let _ = write!(path, ".{key}");
                write_value(item, out, path)?;
                path.truncate(mark);
            }
            out.push(b'}');
        }
        _ => return Err(CanonicalError::Unsupported { path: path.clone() }),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};
    use std::collections::{BTreeMap, HashMap};

    #[test]
    fn key_order_does_not_matter() {
        let a: Value = serde_json::from_str(r#"{"b":1,"a":{"y":[1,2,{"q":true,"p":null}],"x":"s"}}"#)
            .unwrap();
        let b: Value = serde_json::from_str(r#"{"a":{"x":"s","y":[1,2,{"p":null,"q":true}]},"b":1}"#)
            .unwrap();
        assert_eq!(canonicalize(&a).unwrap(), canonicalize(&b).unwrap());
    }

    #[test]
    fn insertion_order_of_hash_maps_is_irrelevant() {
        let mut first = HashMap::new();
        let mut second = HashMap::new();
        for key in ["delta", "alpha", "charlie", "bravo"] {
            first.insert(key.to_string(), key.len());
        }
        for key in ["bravo", "charlie", "alpha", "delta"] {
            second.insert(key.to_string(), key.len());
        }
        assert_eq!(canonicalize(&first).unwrap(), canonicalize(&second).unwrap());
    }

    #[test]
    fn output_is_compact_sorted_json() {
        let value = json!({ "zeta": "z", "Alpha": 1.5, "alpha": [true, -3] });
        assert_eq!(
            canonicalize_to_string(&value).unwrap(),
            r#"{"Alpha":1.5,"alpha":[true,-3],"zeta":"z"}"#
        );
    }

    #[test]
    fn strings_are_escaped() {
        let value = json!({ "k": "line\n\"quoted\"" });
        let text = canonicalize_to_string(&value).unwrap();
        let back: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn canonical_output_is_stable_across_reparse() {
        let value = json!({ "n": 1.0, "m": 2, "s": { "b": [], "a": {} } });
        let first = canonicalize(&value).unwrap();
        let reparsed: Value = serde_json::from_slice(&first).unwrap();
        assert_eq!(first, canonicalize(&reparsed).unwrap());
    }

    #[test]
    fn non_finite_float_fails_loudly() {
        #[derive(Serialize)]
        struct Holder {
            inner: Vec<f64>,
        }
        let err = canonicalize(&Holder {
            inner: vec![1.0, f64::NAN],
        })
        .unwrap_err();
        match err {
            CanonicalError::NonFiniteFloat { path } => assert_eq!(path, "$.inner[1]"),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn non_string_keys_fail_loudly() {
        let mut map = BTreeMap::new();
        map.insert(7u32, "seven");
        assert!(matches!(
            canonicalize(&map),
            Err(CanonicalError::NonStringKey { .. })
        ));
    }

    #[test]
    fn byte_strings_fail_loudly() {
        struct Raw;
        impl Serialize for Raw {
            fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
                s.serialize_bytes(&[1, 2, 3])
            }
        }
        assert!(matches!(canonicalize(&Raw), Err(CanonicalError::Bytes { .. })));
    }
}
