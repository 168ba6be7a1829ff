//! Signing of application records (votes, tags, attestations, vouchers...).
//!
//! Every record type goes through the same path: serialize to a JSON object,
//! drop the fields that carry signature material, sign what remains. A
//! verifier rebuilds that object from the record it holds and checks it
//! against the payload embedded in the signature, so a valid signature lifted
//! from a different record is rejected.

use serde::Serialize;
use serde_json::Value;

use crate::canonical::canonical_eq;
use crate::error::CryptoError;
use crate::jws::{sign, verify_with_key, VerifyOutcome};
use crate::keys::{KeyPair, PublicKey};

/// Fields never covered by an entity signature.
pub const EXCLUDED_FIELDS: [&str; 2] = ["signature", "publicKey"];

/// The JSON value an entity's signature covers.
pub fn signable_payload<T: Serialize + ?Sized>(entity: &T) -> Result<Value, CryptoError> {
    let value = serde_json::to_value(entity)
        .map_err(|e| CryptoError::InvalidInput(format!("entity serialization failed: {}", e)))?;
    Ok(strip_signature_fields(value))
}

fn strip_signature_fields(mut value: Value) -> Value {
    if let Value::Object(map) = &mut value {
        for field in EXCLUDED_FIELDS {
            map.remove(field);
        }
    }
    value
}

pub fn sign_entity<T: Serialize + ?Sized>(entity: &T, keypair: &KeyPair) -> Result<String, CryptoError> {
    let payload = signable_payload(entity)?;
    sign(&payload, keypair)
}

/// Verify the `signature` field of an entity against its other fields.
pub fn verify_entity_signature<T: Serialize + ?Sized>(
    entity: &T,
    public_key: &PublicKey,
) -> VerifyOutcome {
    let value = match serde_json::to_value(entity) {
        Ok(value) => value,
        Err(e) => return VerifyOutcome::failed(format!("Entity serialization failed: {}", e)),
    };

    let signature = match value
        .get("signature")
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
    {
        Some(signature) => signature.to_owned(),
        None => return VerifyOutcome::failed("No signature found"),
    };

    let expected = strip_signature_fields(value);
    check_payload(&expected, &signature, public_key)
}

/// Verify `signature` and require its payload to equal `expected`.
///
/// For records whose signed field set differs from their stored shape, the
/// caller rebuilds the signed payload itself.
pub fn verify_signed_payload<T: Serialize + ?Sized>(
    expected: &T,
    signature: &str,
    public_key: &PublicKey,
) -> VerifyOutcome {
    if signature.is_empty() {
        return VerifyOutcome::failed("No signature found");
    }
    match serde_json::to_value(expected) {
        Ok(expected) => check_payload(&expected, signature, public_key),
        Err(e) => VerifyOutcome::failed(format!("Entity serialization failed: {}", e)),
    }
}

fn check_payload(expected: &Value, signature: &str, public_key: &PublicKey) -> VerifyOutcome {
    let outcome = verify_with_key(signature, public_key);
    if !outcome.valid {
        return outcome;
    }
    match &outcome.payload {
        Some(signed) if canonical_eq(expected, signed) => outcome,
        _ => VerifyOutcome::failed("Payload mismatch"),
    }
}
