/// Cryptographic operation errors.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("key generation failed: {0}")]
    KeyGeneration(String),

    #[error("invalid key length: expected {expected}, got {actual}")]
    InvalidKeyLength { expected: usize, actual: usize },

    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("private key import failed: {0}")]
    KeyImport(String),

    #[error("private key export failed: {0}")]
    KeyExport(String),

    #[error("signing failed: {0}")]
    Signing(String),

    #[error("encoding error: {0}")]
    Encoding(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),
}
