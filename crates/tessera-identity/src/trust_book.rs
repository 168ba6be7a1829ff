//! A user's trust relationships, stored in their replicated user document.
//!
//! Each attestation lives in two places: the truster's `trustGiven` (keyed by
//! trustee) and, as a copy, the trustee's `trustReceived` (keyed by truster).
//! Relationship state is always computed from the *outbound* sets, so a
//! revocation takes effect as soon as the truster deletes their own copy.
//! An entry only counts once its signature verifies against the truster.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tessera_core::{AttestationStatus, Clock, DocumentHandle};

use crate::error::IdentityError;
use crate::identity::Identity;
use crate::resolver::KeyResolver;
use crate::trust::{verify_attestation, AttestationDraft, TrustAttestation, VerificationMethod};

/// The per-user document an external store replicates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserDocument {
    pub did: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Base64 public key, read by [`ProfileKeyResolver`](crate::ProfileKeyResolver) users.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
    #[serde(default)]
    pub trust_given: BTreeMap<String, TrustAttestation>,
    #[serde(default)]
    pub trust_received: BTreeMap<String, TrustAttestation>,
}

impl UserDocument {
    pub fn new(did: impl Into<String>) -> Self {
        Self {
            did: did.into(),
            ..Self::default()
        }
    }

    pub fn for_identity(identity: &Identity) -> Self {
        Self {
            did: identity.did().to_string(),
            public_key: Some(identity.public_key().to_base64()),
            ..Self::default()
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Whether an outbound entry for `did` is present. The entry is not
    /// verified; use [`trust_state`] for the relationship itself.
    pub fn has_outbound(&self, did: &str) -> bool {
        self.trust_given.contains_key(did)
    }
}

/// Relationship between two users, as seen from the first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TrustState {
    Absent,
    /// I trust them; they have not reciprocated.
    PendingOutbound,
    /// They trust me; I have not reciprocated.
    PendingInbound,
    Mutual,
    /// An outbound entry on either side failed verification.
    Tampered,
}

impl TrustState {
    pub fn is_mutual(&self) -> bool {
        matches!(self, TrustState::Mutual)
    }

    pub fn signals_tampering(&self) -> bool {
        matches!(self, TrustState::Tampered)
    }
}

/// Verification status of `owner`'s outbound attestation for `trustee_did`,
/// or `None` when there is no entry.
///
/// An entry whose parties do not match its position in the document is
/// `Invalid` regardless of its signature.
pub async fn outbound_status(
    owner: &UserDocument,
    trustee_did: &str,
    resolver: &dyn KeyResolver,
) -> Option<AttestationStatus> {
    let attestation = owner.trust_given.get(trustee_did)?;
    if attestation.truster_did != owner.did || attestation.trustee_did != trustee_did {
        tracing::warn!(
            owner = %owner.did,
            trustee = trustee_did,
            attestation = %attestation.id,
            "outbound attestation names the wrong parties"
        );
        return Some(AttestationStatus::Invalid);
    }
    Some(verify_attestation(attestation, resolver).await)
}

/// Relationship state computed from both users' outbound sets.
///
/// Only attestations that verify count as trust. A failing entry on either
/// side yields [`TrustState::Tampered`] instead of being read as absence.
pub async fn trust_state(
    mine: &UserDocument,
    theirs: &UserDocument,
    resolver: &dyn KeyResolver,
) -> TrustState {
    let given = outbound_status(mine, &theirs.did, resolver).await;
    let received = outbound_status(theirs, &mine.did, resolver).await;
    if [given, received].contains(&Some(AttestationStatus::Invalid)) {
        return TrustState::Tampered;
    }

    let trusted = |status: Option<AttestationStatus>| status.is_some_and(|s| s.is_trusted());
    match (trusted(given), trusted(received)) {
        (true, true) => TrustState::Mutual,
        (true, false) => TrustState::PendingOutbound,
        (false, true) => TrustState::PendingInbound,
        (false, false) => TrustState::Absent,
    }
}

/// The inbound copy from `truster` that still counts.
///
/// A copy counts only while the truster's own outbound attestation exists
/// and verifies, and the copy itself verifies. Revocation never touches the
/// trustee's document, so this is re-checked on every read instead of
/// relying on cleanup.
pub async fn effective_inbound<'a>(
    mine: &'a UserDocument,
    truster: &UserDocument,
    resolver: &dyn KeyResolver,
) -> Option<&'a TrustAttestation> {
    let copy = mine.trust_received.get(&truster.did)?;
    let backed = outbound_status(truster, &mine.did, resolver)
        .await
        .is_some_and(|s| s.is_trusted());
    if !backed {
        tracing::debug!(
            truster = %truster.did,
            trustee = %mine.did,
            "inbound attestation no longer backed by truster"
        );
        return None;
    }
    if copy.truster_did != truster.did || copy.trustee_did != mine.did {
        return None;
    }
    verify_attestation(copy, resolver)
        .await
        .is_trusted()
        .then_some(copy)
}

/// Trust operations for one local identity, applied through a document sink.
pub struct TrustBook<H> {
    handle: H,
    identity: Identity,
    clock: Arc<dyn Clock>,
}

impl<H: DocumentHandle<UserDocument>> TrustBook<H> {
    pub fn new(handle: H, identity: Identity, clock: Arc<dyn Clock>) -> Self {
        Self {
            handle,
            identity,
            clock,
        }
    }

    pub fn did(&self) -> &str {
        self.identity.did()
    }

    pub fn document(&self) -> Result<UserDocument, IdentityError> {
        Ok(self.handle.snapshot()?)
    }

    /// Attest trust in `trustee_did`, re-affirming if an attestation exists.
    pub fn give_trust(
        &self,
        trustee_did: &str,
        method: VerificationMethod,
    ) -> Result<TrustAttestation, IdentityError> {
        self.give_trust_with(AttestationDraft::new(self.did(), trustee_did, method))
    }

    pub fn give_trust_with(&self, draft: AttestationDraft) -> Result<TrustAttestation, IdentityError> {
        if draft.truster_did() != self.did() {
            return Err(IdentityError::KeyMismatch(format!(
                "draft truster {} is not the local identity {}",
                draft.truster_did(),
                self.did()
            )));
        }

        let doc = self.handle.snapshot()?;
        let attestation = match doc.trust_given.get(draft.trustee_did()).cloned() {
            Some(mut existing) => {
                draft.apply_to(&mut existing);
                existing.reaffirm(self.identity.keypair(), self.clock.as_ref())?;
                tracing::info!(trustee = %existing.trustee_did, "trust re-affirmed");
                existing
            }
            None => draft.sign(self.identity.keypair(), self.clock.as_ref())?,
        };

        let key = attestation.trustee_did.clone();
        self.handle.change(&mut |doc| {
            doc.trust_given.insert(key.clone(), attestation.clone());
        })?;
        Ok(attestation)
    }

    /// Store the copy of someone else's attestation about this identity.
    ///
    /// The signature is not checked here; see [`TrustBook::audit_inbound`].
    pub fn receive_trust(&self, attestation: TrustAttestation) -> Result<(), IdentityError> {
        if attestation.trustee_did != self.did() {
            return Err(IdentityError::AttestationMismatch(format!(
                "attestation {} names trustee {}",
                attestation.id, attestation.trustee_did
            )));
        }
        if attestation.truster_did == self.did() {
            return Err(IdentityError::SelfAttestation(attestation.truster_did));
        }

        tracing::info!(
            truster = %attestation.truster_did,
            attestation = %attestation.id,
            "inbound trust recorded"
        );
        let key = attestation.truster_did.clone();
        self.handle.change(&mut |doc| {
            doc.trust_received.insert(key.clone(), attestation.clone());
        })?;
        Ok(())
    }

    /// Delete the outbound attestation for `trustee_did`. Unilateral.
    pub fn revoke_trust(&self, trustee_did: &str) -> Result<Option<TrustAttestation>, IdentityError> {
        let mut removed = None;
        self.handle.change(&mut |doc| {
            removed = doc.trust_given.remove(trustee_did);
        })?;
        if removed.is_some() {
            tracing::info!(trustee = trustee_did, "trust revoked");
        }
        Ok(removed)
    }

    /// Drop an inbound copy, e.g. one that failed verification.
    pub fn discard_inbound(&self, truster_did: &str) -> Result<Option<TrustAttestation>, IdentityError> {
        let mut removed = None;
        self.handle.change(&mut |doc| {
            removed = doc.trust_received.remove(truster_did);
        })?;
        if removed.is_some() {
            tracing::info!(truster = truster_did, "inbound attestation discarded");
        }
        Ok(removed)
    }

    /// Verify every inbound copy and return those whose signature is invalid.
    pub async fn audit_inbound(
        &self,
        resolver: &dyn KeyResolver,
    ) -> Result<Vec<TrustAttestation>, IdentityError> {
        let doc = self.handle.snapshot()?;
        let mut tampered = Vec::new();
        for attestation in doc.trust_received.into_values() {
            if verify_attestation(&attestation, resolver).await == AttestationStatus::Invalid {
                tracing::warn!(
                    truster = %attestation.truster_did,
                    attestation = %attestation.id,
                    "inbound attestation failed verification"
                );
                tampered.push(attestation);
            }
        }
        Ok(tampered)
    }
}
