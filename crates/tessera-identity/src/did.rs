//! `did:key` identifiers for Ed25519 keys.
//!
//! `did:key:z<base58btc(0xed 0x01 || public_key)>`. The `z` is the multibase
//! tag for base58btc and `0xed 0x01` the multicodec varint for an Ed25519
//! public key. A DID is a pure function of its key.

use tessera_crypto::PublicKey;

use crate::error::IdentityError;

pub const DID_KEY_PREFIX: &str = "did:key:";
const DID_KEY_BASE58_PREFIX: &str = "did:key:z";
pub const ED25519_MULTICODEC: [u8; 2] = [0xed, 0x01];
const ED25519_KEY_LENGTH: usize = 32;

/// Derive the DID for raw public key bytes.
pub fn derive_did_from_public_key(public_key: &[u8]) -> Result<String, IdentityError> {
    if public_key.len() != ED25519_KEY_LENGTH {
        return Err(IdentityError::InvalidKeyLength {
            expected: ED25519_KEY_LENGTH,
            actual: public_key.len(),
        });
    }
    let mut prefixed = Vec::with_capacity(ED25519_MULTICODEC.len() + public_key.len());
    prefixed.extend_from_slice(&ED25519_MULTICODEC);
    prefixed.extend_from_slice(public_key);
    Ok(format!(
        "{}{}",
        DID_KEY_BASE58_PREFIX,
        bs58::encode(prefixed).into_string()
    ))
}

/// Derive the DID for a parsed public key.
pub fn did_from_public_key(public_key: &PublicKey) -> String {
    let mut prefixed = Vec::with_capacity(ED25519_MULTICODEC.len() + ED25519_KEY_LENGTH);
    prefixed.extend_from_slice(&ED25519_MULTICODEC);
    prefixed.extend_from_slice(public_key.as_bytes());
    format!(
        "{}{}",
        DID_KEY_BASE58_PREFIX,
        bs58::encode(prefixed).into_string()
    )
}

/// Extract the raw 32-byte Ed25519 public key embedded in a DID.
pub fn extract_public_key_from_did(did: &str) -> Result<[u8; 32], IdentityError> {
    let encoded = did
        .strip_prefix(DID_KEY_BASE58_PREFIX)
        .ok_or_else(|| IdentityError::InvalidDidFormat(did.to_string()))?;

    let decoded = bs58::decode(encoded)
        .into_vec()
        .map_err(|e| IdentityError::Base58Decode(e.to_string()))?;

    if decoded.len() < ED25519_MULTICODEC.len() || decoded[..2] != ED25519_MULTICODEC {
        let prefix: Vec<String> = decoded.iter().take(2).map(|b| format!("{:#04x}", b)).collect();
        return Err(IdentityError::UnsupportedKeyType(format!(
            "multicodec prefix [{}]",
            prefix.join(", ")
        )));
    }

    let key_bytes = &decoded[ED25519_MULTICODEC.len()..];
    key_bytes
        .try_into()
        .map_err(|_| IdentityError::InvalidKeyLength {
            expected: ED25519_KEY_LENGTH,
            actual: key_bytes.len(),
        })
}

/// Extract and parse the public key embedded in a DID.
pub fn public_key_from_did(did: &str) -> Result<PublicKey, IdentityError> {
    let bytes = extract_public_key_from_did(did)?;
    Ok(PublicKey::from_bytes(&bytes)?)
}

/// A well-formed Ed25519 `did:key` that is not a legacy placeholder.
pub fn is_valid_did(did: &str) -> bool {
    extract_public_key_from_did(did).is_ok() && !is_legacy_fake_did(did)
}

/// Detects identifiers minted before identities were key-derived (random
/// UUID-style strings). Only used to drive the one-time upgrade of such an
/// identity to a real `did:key`; it does not gate anything else.
pub fn is_legacy_fake_did(did: &str) -> bool {
    !did.starts_with(DID_KEY_BASE58_PREFIX) || did.contains('-')
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_crypto::KeyPair;

    #[test]
    fn test_derive_extract_roundtrip() {
        for _ in 0..16 {
            let pk = KeyPair::generate().unwrap().public_key();
            let did = derive_did_from_public_key(pk.as_bytes()).unwrap();
            assert_eq!(&extract_public_key_from_did(&did).unwrap(), pk.as_bytes());
        }
    }

    #[test]
    fn test_did_has_ed25519_z6mk_prefix() {
        let pk = KeyPair::from_seed(&[4u8; 32]).public_key();
        let did = did_from_public_key(&pk);
        assert!(did.starts_with("did:key:z6Mk"), "{}", did);
    }

    #[test]
    fn test_known_test_vector() {
        // Published Ed25519 did:key test vector.
        let did = "did:key:z6MkiTBz1ymuepAQ4HEHYSF1H8quG5GLVVQR3djdX3mDooWp";
        let key = extract_public_key_from_did(did).unwrap();
        assert_eq!(derive_did_from_public_key(&key).unwrap(), did);
    }

    #[test]
    fn test_both_derivations_agree() {
        let pk = KeyPair::generate().unwrap().public_key();
        assert_eq!(
            did_from_public_key(&pk),
            derive_did_from_public_key(pk.as_bytes()).unwrap()
        );
    }

    #[test]
    fn test_derive_rejects_wrong_length() {
        let result = derive_did_from_public_key(&[0u8; 31]);
        assert!(matches!(
            result,
            Err(IdentityError::InvalidKeyLength {
                expected: 32,
                actual: 31
            })
        ));
    }

    #[test]
    fn test_extract_rejects_wrong_prefix() {
        assert!(matches!(
            extract_public_key_from_did("did:web:example.com"),
            Err(IdentityError::InvalidDidFormat(_))
        ));
        assert!(matches!(
            extract_public_key_from_did("did:key:f00"),
            Err(IdentityError::InvalidDidFormat(_))
        ));
    }

    #[test]
    fn test_extract_rejects_non_ed25519_multicodec() {
        // secp256k1 multicodec (0xe7 0x01) + 33 bytes
        let mut bytes = vec![0xe7, 0x01];
        bytes.extend_from_slice(&[2u8; 33]);
        let did = format!("did:key:z{}", bs58::encode(bytes).into_string());
        assert!(matches!(
            extract_public_key_from_did(&did),
            Err(IdentityError::UnsupportedKeyType(_))
        ));
    }

    #[test]
    fn test_extract_rejects_bad_base58() {
        // '0' and 'l' are not in the base58btc alphabet.
        assert!(matches!(
            extract_public_key_from_did("did:key:z0l0l"),
            Err(IdentityError::Base58Decode(_))
        ));
    }

    #[test]
    fn test_extract_rejects_truncated_key() {
        let mut bytes = ED25519_MULTICODEC.to_vec();
        bytes.extend_from_slice(&[1u8; 20]);
        let did = format!("did:key:z{}", bs58::encode(bytes).into_string());
        assert!(matches!(
            extract_public_key_from_did(&did),
            Err(IdentityError::InvalidKeyLength { actual: 20, .. })
        ));
    }

    #[test]
    fn test_is_valid_did() {
        let pk = KeyPair::generate().unwrap().public_key();
        assert!(is_valid_did(&did_from_public_key(&pk)));
        assert!(!is_valid_did("did:key:z"));
        assert!(!is_valid_did("not a did"));
    }

    #[test]
    fn test_legacy_fake_did_detection() {
        assert!(is_legacy_fake_did("did:local:5f0c2b9e-3c1d-4f1a-9e7b-2a6b1c0d9e8f"));
        assert!(is_legacy_fake_did("did:key:z6Mk-legacy"));
        assert!(is_legacy_fake_did("user-1234"));

        let pk = KeyPair::generate().unwrap().public_key();
        assert!(!is_legacy_fake_did(&did_from_public_key(&pk)));
    }

    #[test]
    fn test_public_key_from_did() {
        let kp = KeyPair::generate().unwrap();
        let did = did_from_public_key(&kp.public_key());
        assert_eq!(public_key_from_did(&did).unwrap(), kp.public_key());
    }
}
