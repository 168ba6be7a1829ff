use serde::{Deserialize, Serialize};
use tessera_core::{AttestationStatus, Clock, SignatureStatus};
use tessera_crypto::{sign_entity, verify_entity_signature, KeyPair};
use uuid::Uuid;

use crate::did::{did_from_public_key, extract_public_key_from_did};
use crate::error::IdentityError;
use crate::resolver::KeyResolver;

/// How strongly the truster vouches for the trustee.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrustLevel {
    /// The trustee's identity has been verified.
    #[default]
    Verified,
    /// Verified, and trusted to vouch for others.
    Full,
}

/// The out-of-band event backing an attestation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum VerificationMethod {
    /// The trustee's DID was scanned from a QR code.
    QrCode,
    InPerson,
    Remote,
}

/// "`truster_did` has verified `trustee_did`'s identity."
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrustAttestation {
    pub id: String,
    pub truster_did: String,
    pub trustee_did: String,
    pub level: TrustLevel,
    pub verification_method: VerificationMethod,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Unix milliseconds.
    pub created_at: i64,
    /// Unix milliseconds.
    pub updated_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub truster_user_doc_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
}

impl TrustAttestation {
    pub fn is_signed(&self) -> bool {
        self.signature.as_deref().is_some_and(|s| !s.is_empty())
    }

    /// Re-affirm an existing attestation: bump `updated_at` and re-sign,
    /// keeping its id and creation time.
    pub fn reaffirm(&mut self, keypair: &KeyPair, clock: &dyn Clock) -> Result<(), IdentityError> {
        ensure_key_matches(&self.truster_did, keypair)?;
        self.updated_at = clock.now_millis();
        self.signature = None;
        self.signature = Some(sign_entity(self, keypair)?);
        Ok(())
    }
}

/// Unsigned attestation under construction.
#[derive(Debug, Clone)]
pub struct AttestationDraft {
    truster_did: String,
    trustee_did: String,
    method: VerificationMethod,
    level: TrustLevel,
    notes: Option<String>,
    truster_user_doc_url: Option<String>,
}

impl AttestationDraft {
    pub fn new(
        truster_did: impl Into<String>,
        trustee_did: impl Into<String>,
        method: VerificationMethod,
    ) -> Self {
        Self {
            truster_did: truster_did.into(),
            trustee_did: trustee_did.into(),
            method,
            level: TrustLevel::default(),
            notes: None,
            truster_user_doc_url: None,
        }
    }

    pub fn with_level(mut self, level: TrustLevel) -> Self {
        self.level = level;
        self
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    pub fn with_user_doc_url(mut self, url: impl Into<String>) -> Self {
        self.truster_user_doc_url = Some(url.into());
        self
    }

    pub fn truster_did(&self) -> &str {
        &self.truster_did
    }

    pub fn trustee_did(&self) -> &str {
        &self.trustee_did
    }

    /// Carry this draft's claims onto an attestation being re-affirmed.
    pub(crate) fn apply_to(&self, attestation: &mut TrustAttestation) {
        attestation.level = self.level;
        attestation.verification_method = self.method;
        attestation.notes = self.notes.clone();
        attestation.truster_user_doc_url = self.truster_user_doc_url.clone();
    }

    /// Validate both DIDs and sign with the truster's key.
    pub fn sign(self, keypair: &KeyPair, clock: &dyn Clock) -> Result<TrustAttestation, IdentityError> {
        ensure_key_matches(&self.truster_did, keypair)?;
        extract_public_key_from_did(&self.trustee_did)?;
        if self.truster_did == self.trustee_did {
            return Err(IdentityError::SelfAttestation(self.truster_did));
        }

        let now = clock.now_millis();
        let mut attestation = TrustAttestation {
            id: Uuid::now_v7().to_string(),
            truster_did: self.truster_did,
            trustee_did: self.trustee_did,
            level: self.level,
            verification_method: self.method,
            notes: self.notes,
            created_at: now,
            updated_at: now,
            truster_user_doc_url: self.truster_user_doc_url,
            signature: None,
        };
        attestation.signature = Some(sign_entity(&attestation, keypair)?);

        tracing::info!(
            truster = %attestation.truster_did,
            trustee = %attestation.trustee_did,
            "trust attestation signed"
        );
        Ok(attestation)
    }
}

/// Sign a fresh attestation with default level and no optional fields.
pub fn create_attestation(
    truster_did: &str,
    trustee_did: &str,
    keypair: &KeyPair,
    method: VerificationMethod,
    clock: &dyn Clock,
) -> Result<TrustAttestation, IdentityError> {
    AttestationDraft::new(truster_did, trustee_did, method).sign(keypair, clock)
}

/// Check an attestation's signature against the truster's resolved key.
pub async fn verify_attestation(
    attestation: &TrustAttestation,
    resolver: &dyn KeyResolver,
) -> AttestationStatus {
    if !attestation.is_signed() {
        return AttestationStatus::Missing;
    }
    let Some(key) = resolver.resolve_key(&attestation.truster_did).await else {
        return AttestationStatus::Unknown;
    };
    let outcome = verify_entity_signature(attestation, &key);
    if !outcome.valid {
        tracing::warn!(
            attestation = %attestation.id,
            truster = %attestation.truster_did,
            error = outcome.error.as_deref().unwrap_or_default(),
            "attestation signature invalid"
        );
    }
    SignatureStatus::from_valid(outcome.valid).into()
}

fn ensure_key_matches(did: &str, keypair: &KeyPair) -> Result<(), IdentityError> {
    extract_public_key_from_did(did)?;
    let derived = did_from_public_key(&keypair.public_key());
    if derived != did {
        return Err(IdentityError::KeyMismatch(format!(
            "signing key belongs to {}, not {}",
            derived, did
        )));
    }
    Ok(())
}
