pub mod canonical;
pub mod encoding;
pub mod entity;
pub mod error;
pub mod jws;
pub mod keys;

pub use canonical::{canonical_eq, canonicalize};
pub use entity::{sign_entity, signable_payload, verify_entity_signature, verify_signed_payload};
pub use error::CryptoError;
pub use jws::{sign, sign_with_pkcs8, verify, verify_with_key, VerifyOutcome};
pub use keys::{KeyPair, PublicKey};
