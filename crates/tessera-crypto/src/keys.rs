use ed25519_dalek::pkcs8::{DecodePrivateKey, EncodePrivateKey};
use ed25519_dalek::{SigningKey, VerifyingKey};
use rand::rngs::OsRng;
use rand::RngCore;
use std::fmt;
use zeroize::Zeroize;

use crate::encoding::{base64_decode, base64_encode};
use crate::error::CryptoError;

/// Ed25519 key pair for signing operations.
/// Private key material is zeroized on drop by ed25519-dalek.
pub struct KeyPair {
    signing_key: SigningKey,
}

impl KeyPair {
    /// Generate a new random key pair using OS-provided entropy.
    pub fn generate() -> Result<Self, CryptoError> {
        let mut seed = [0u8; 32];
        OsRng
            .try_fill_bytes(&mut seed)
            .map_err(|e| CryptoError::KeyGeneration(e.to_string()))?;
        let kp = Self::from_seed(&seed);
        seed.zeroize();
        tracing::debug!(public_key = %kp.public_key().to_base64(), "generated keypair");
        Ok(kp)
    }

    /// Create a key pair from a 32-byte seed.
    pub fn from_seed(seed: &[u8; 32]) -> Self {
        Self {
            signing_key: SigningKey::from_bytes(seed),
        }
    }

    /// Create a key pair from a raw 32-byte seed slice.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        if bytes.len() != 32 {
            return Err(CryptoError::InvalidKeyLength {
                expected: 32,
                actual: bytes.len(),
            });
        }
        let mut seed = [0u8; 32];
        seed.copy_from_slice(bytes);
        let kp = Self::from_seed(&seed);
        seed.zeroize();
        Ok(kp)
    }

    /// Import a PKCS#8 (DER) encoded private key.
    pub fn from_pkcs8_der(der: &[u8]) -> Result<Self, CryptoError> {
        let signing_key =
            SigningKey::from_pkcs8_der(der).map_err(|e| CryptoError::KeyImport(e.to_string()))?;
        Ok(Self { signing_key })
    }

    /// Import a base64 string holding a PKCS#8 (DER) private key.
    pub fn from_pkcs8_base64(encoded: &str) -> Result<Self, CryptoError> {
        let mut der = base64_decode(encoded)?;
        let kp = Self::from_pkcs8_der(&der);
        der.zeroize();
        kp
    }

    /// Export the private key as PKCS#8 DER.
    pub fn to_pkcs8_der(&self) -> Result<Vec<u8>, CryptoError> {
        let document = self
            .signing_key
            .to_pkcs8_der()
            .map_err(|e| CryptoError::KeyExport(e.to_string()))?;
        Ok(document.as_bytes().to_vec())
    }

    /// Export the private key as base64-encoded PKCS#8 DER.
    pub fn to_pkcs8_base64(&self) -> Result<String, CryptoError> {
        let mut der = self.to_pkcs8_der()?;
        let encoded = base64_encode(&der);
        der.zeroize();
        Ok(encoded)
    }

    /// Get the public key.
    pub fn public_key(&self) -> PublicKey {
        PublicKey {
            verifying_key: self.signing_key.verifying_key(),
        }
    }

    pub(crate) fn signing_key(&self) -> &SigningKey {
        &self.signing_key
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public_key", &self.public_key().to_base64())
            .finish_non_exhaustive()
    }
}

/// Ed25519 public key for verification operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PublicKey {
    verifying_key: VerifyingKey,
}

impl PublicKey {
    pub const LENGTH: usize = 32;

    /// Create from raw bytes (32 bytes).
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, CryptoError> {
        let bytes_arr: [u8; 32] = bytes.try_into().map_err(|_| CryptoError::InvalidKeyLength {
            expected: Self::LENGTH,
            actual: bytes.len(),
        })?;
        let verifying_key = VerifyingKey::from_bytes(&bytes_arr)
            .map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))?;
        Ok(Self { verifying_key })
    }

    /// Get the raw bytes (32 bytes).
    pub fn as_bytes(&self) -> &[u8; 32] {
        self.verifying_key.as_bytes()
    }

    pub fn to_base64(&self) -> String {
        base64_encode(self.as_bytes())
    }

    pub fn from_base64(encoded: &str) -> Result<Self, CryptoError> {
        let bytes = base64_decode(encoded)?;
        Self::from_bytes(&bytes)
    }

    /// Short hex fingerprint (first 8 bytes) for display and log fields.
    pub fn fingerprint(&self) -> String {
        hex::encode(&self.as_bytes()[..8])
    }

    pub(crate) fn verifying_key(&self) -> &VerifyingKey {
        &self.verifying_key
    }
}
