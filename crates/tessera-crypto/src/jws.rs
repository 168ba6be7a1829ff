//! Compact JWS-style signatures: `base64url(header).base64url(payload).base64url(sig)`.
//!
//! The signature covers the UTF-8 bytes of the first two segments joined by
//! `.`. Verification recomputes that input from the encoded segments as
//! received, never from a re-serialized payload.

use ed25519_dalek::{Signature, Signer, Verifier};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::encoding::{base64url_decode, base64url_encode};
use crate::error::CryptoError;
use crate::keys::{KeyPair, PublicKey};

/// Algorithm identifier carried in every header.
pub const ALGORITHM: &str = "EdDSA";
const TOKEN_TYPE: &str = "JWT";

#[derive(Debug, Serialize, Deserialize)]
struct JwsHeader {
    alg: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    typ: Option<String>,
}

impl JwsHeader {
    fn ed25519() -> Self {
        Self {
            alg: ALGORITHM.to_string(),
            typ: Some(TOKEN_TYPE.to_string()),
        }
    }
}

/// Result of checking a compact signature. Failures are values, not errors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOutcome {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl VerifyOutcome {
    pub fn verified(payload: Value) -> Self {
        Self {
            valid: true,
            payload: Some(payload),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            valid: false,
            payload: None,
            error: Some(error.into()),
        }
    }
}

/// Sign a JSON-serializable payload and return the compact signature.
///
/// Ed25519 is deterministic, so the same payload and key always produce the
/// same string.
pub fn sign<T: Serialize + ?Sized>(payload: &T, keypair: &KeyPair) -> Result<String, CryptoError> {
    let header_json = serde_json::to_vec(&JwsHeader::ed25519())
        .map_err(|e| CryptoError::Signing(format!("header serialization failed: {}", e)))?;
    let payload_json = serde_json::to_vec(payload)
        .map_err(|e| CryptoError::Signing(format!("payload serialization failed: {}", e)))?;

    let signing_input = format!(
        "{}.{}",
        base64url_encode(header_json),
        base64url_encode(payload_json)
    );
    let signature = keypair
        .signing_key()
        .try_sign(signing_input.as_bytes())
        .map_err(|e| CryptoError::Signing(e.to_string()))?;

    Ok(format!(
        "{}.{}",
        signing_input,
        base64url_encode(signature.to_bytes())
    ))
}

/// Sign with a PKCS#8 (DER) encoded private key.
pub fn sign_with_pkcs8<T: Serialize + ?Sized>(
    payload: &T,
    private_key_der: &[u8],
) -> Result<String, CryptoError> {
    let keypair = KeyPair::from_pkcs8_der(private_key_der)
        .map_err(|e| CryptoError::Signing(e.to_string()))?;
    sign(payload, &keypair)
}

/// Verify a compact signature against a base64-encoded public key.
pub fn verify(compact: &str, public_key_b64: &str) -> VerifyOutcome {
    match PublicKey::from_base64(public_key_b64) {
        Ok(key) => verify_with_key(compact, &key),
        Err(e) => VerifyOutcome::failed(format!("Invalid public key: {}", e)),
    }
}

/// Verify a compact signature against a public key.
pub fn verify_with_key(compact: &str, public_key: &PublicKey) -> VerifyOutcome {
    let parts: Vec<&str> = compact.split('.').collect();
    if parts.len() != 3 {
        return VerifyOutcome::failed("Invalid JWS format");
    }
    let (header_b64, payload_b64, signature_b64) = (parts[0], parts[1], parts[2]);

    let header: JwsHeader = match base64url_decode(header_b64)
        .ok()
        .and_then(|bytes| serde_json::from_slice(&bytes).ok())
    {
        Some(header) => header,
        None => return VerifyOutcome::failed("Invalid JWS header"),
    };
    if header.alg != ALGORITHM {
        return VerifyOutcome::failed(format!("Unsupported algorithm: {}", header.alg));
    }

    let payload: Value = match base64url_decode(payload_b64)
        .ok()
        .and_then(|bytes| serde_json::from_slice(&bytes).ok())
    {
        Some(payload) => payload,
        None => return VerifyOutcome::failed("Invalid JWS payload"),
    };

    let signature_bytes = match base64url_decode(signature_b64) {
        Ok(bytes) => bytes,
        Err(_) => return VerifyOutcome::failed("Invalid signature encoding"),
    };
    let signature_arr: [u8; 64] = match signature_bytes.as_slice().try_into() {
        Ok(arr) => arr,
        Err(_) => return VerifyOutcome::failed("Invalid signature length"),
    };
    let signature = Signature::from_bytes(&signature_arr);

    let signing_input = format!("{}.{}", header_b64, payload_b64);
    match public_key
        .verifying_key()
        .verify(signing_input.as_bytes(), &signature)
    {
        Ok(()) => VerifyOutcome::verified(payload),
        Err(_) => {
            tracing::debug!(key = %public_key.fingerprint(), "signature did not verify");
            VerifyOutcome::failed("Signature verification failed")
        }
    }
}
