/// Identity-layer errors.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    #[error("invalid DID format: {0}")]
    InvalidDidFormat(String),

    #[error("unsupported key type: {0}")]
    UnsupportedKeyType(String),

    #[error("base58btc decode failed: {0}")]
    Base58Decode(String),

    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("key does not match identity: {0}")]
    KeyMismatch(String),

    #[error("cannot attest trust in oneself: {0}")]
    SelfAttestation(String),

    #[error("attestation not addressed to this identity: {0}")]
    AttestationMismatch(String),

    #[error("invalid verify link: {0}")]
    InvalidLink(String),

    #[error("crypto error: {0}")]
    Crypto(#[from] tessera_crypto::CryptoError),

    #[error("document error: {0}")]
    Document(#[from] tessera_core::CoreError),
}
