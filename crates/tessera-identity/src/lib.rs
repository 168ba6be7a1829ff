//! Tessera Identity Layer
//!
//! - `did:key` derivation and extraction for Ed25519 keys
//! - device identities and their exported (persisted) form
//! - public key resolution (profile data first, then the DID itself)
//! - signed trust attestations and the per-user trust book
//! - verify links carrying a DID between devices

pub mod did;
pub mod error;
pub mod identity;
pub mod link;
pub mod resolver;
pub mod trust;
pub mod trust_book;

pub use did::{
    derive_did_from_public_key, did_from_public_key, extract_public_key_from_did,
    is_legacy_fake_did, is_valid_did, public_key_from_did,
};
pub use error::IdentityError;
pub use identity::{ExportedKeyPair, Identity};
pub use link::VerifyLink;
pub use resolver::{CompositeKeyResolver, DidKeyResolver, KeyResolver, ProfileKeyResolver};
pub use trust::{
    create_attestation, verify_attestation, AttestationDraft, TrustAttestation, TrustLevel,
    VerificationMethod,
};
pub use trust_book::{
    effective_inbound, outbound_status, trust_state, TrustBook, TrustState, UserDocument,
};
