//! Integration test: the trust handshake between users' documents.
//!
//! Attestations are signed in the identity layer with crypto-layer keys and
//! exchanged between two trust books the way a QR scan would deliver them.

use std::sync::Arc;

use tessera_core::AttestationStatus;
use tessera_identity::{
    effective_inbound, trust_state, verify_attestation, CompositeKeyResolver, DidKeyResolver,
    IdentityError, ProfileKeyResolver, TrustLevel, TrustState, VerificationMethod, VerifyLink,
};
use tessera_integration_tests::{clock, trust_book, User};

// =========================================================================
// Mutual trust establishment and revocation
// =========================================================================

#[tokio::test]
async fn test_mutual_trust_then_unilateral_revocation() {
    let clock = clock();
    let alice = trust_book("alice", clock.clone());
    let bob = trust_book("bob", clock.clone());

    // Alice scans Bob's code.
    let link = VerifyLink::new(bob.did()).with_name("bob");
    let scanned = VerifyLink::parse(&link.to_url("tessera"), "tessera").unwrap();
    let a_to_b = alice.give_trust(&scanned.did, VerificationMethod::QrCode).unwrap();
    bob.receive_trust(a_to_b.clone()).unwrap();
    assert_eq!(
        trust_state(&alice.document().unwrap(), &bob.document().unwrap(), &DidKeyResolver).await,
        TrustState::PendingOutbound
    );

    // Bob scans back.
    let b_to_a = bob.give_trust(alice.did(), VerificationMethod::QrCode).unwrap();
    alice.receive_trust(b_to_a).unwrap();

    let (a_doc, b_doc) = (alice.document().unwrap(), bob.document().unwrap());
    assert_eq!(trust_state(&a_doc, &b_doc, &DidKeyResolver).await, TrustState::Mutual);
    assert_eq!(trust_state(&b_doc, &a_doc, &DidKeyResolver).await, TrustState::Mutual);
    assert_eq!(verify_attestation(&a_to_b, &DidKeyResolver).await, AttestationStatus::Valid);

    // Alice revokes; Bob's copy stays but no longer counts.
    alice.revoke_trust(bob.did()).unwrap();
    let (a_doc, b_doc) = (alice.document().unwrap(), bob.document().unwrap());
    assert!(!a_doc.has_outbound(bob.did()));
    assert!(b_doc.trust_received.contains_key(alice.did()));
    assert!(effective_inbound(&b_doc, &a_doc, &DidKeyResolver).await.is_none());
    assert_eq!(trust_state(&b_doc, &a_doc, &DidKeyResolver).await, TrustState::PendingOutbound);
}

#[tokio::test]
async fn test_forged_outbound_entry_in_replicated_document_is_not_trust() {
    let clock = clock();
    let alice = trust_book("alice", clock.clone());
    let bob = trust_book("bob", clock.clone());
    let carol = trust_book("carol", clock.clone());

    alice.give_trust(bob.did(), VerificationMethod::QrCode).unwrap();

    // A replica of Bob's document arrives carrying Carol's attestation for
    // Alice, relabelled as Bob's with Carol's signature kept.
    let mut forged = carol.give_trust(alice.did(), VerificationMethod::QrCode).unwrap();
    forged.truster_did = bob.did().to_string();
    let mut b_doc = bob.document().unwrap();
    b_doc.trust_given.insert(alice.did().to_string(), forged.clone());
    let a_doc = alice.document().unwrap();

    assert_eq!(verify_attestation(&forged, &DidKeyResolver).await, AttestationStatus::Invalid);
    let state = trust_state(&a_doc, &b_doc, &DidKeyResolver).await;
    assert_ne!(state, TrustState::Mutual);
    assert!(state.signals_tampering());

    // The same forgery delivered as an inbound copy does not count either.
    let mut a_doc = a_doc;
    a_doc.trust_received.insert(bob.did().to_string(), forged);
    assert!(effective_inbound(&a_doc, &b_doc, &DidKeyResolver).await.is_none());
}

#[test]
fn test_reaffirm_keeps_one_attestation() {
    let clock = clock();
    let alice = trust_book("alice", clock.clone());
    let bob = User::new("bob");

    let first = alice.give_trust(bob.did(), VerificationMethod::Remote).unwrap();
    clock.advance(chrono::Duration::days(30));
    let second = alice.give_trust(bob.did(), VerificationMethod::InPerson).unwrap();

    assert_eq!(first.id, second.id);
    assert!(second.updated_at > first.updated_at);
    assert_eq!(second.level, TrustLevel::Verified);
    assert_eq!(alice.document().unwrap().trust_given.len(), 1);
}

// =========================================================================
// Verification policy
// =========================================================================

#[tokio::test]
async fn test_forged_inbound_attestation_is_invalid_and_discarded() {
    let clock = clock();
    let alice = trust_book("alice", clock.clone());
    let bob = trust_book("bob", clock.clone());
    let mallory = User::new("mallory");

    // Mallory re-labels Alice's genuine attestation as coming from her.
    let mut forged = alice.give_trust(bob.did(), VerificationMethod::QrCode).unwrap();
    forged.truster_did = mallory.did().to_string();
    bob.receive_trust(forged.clone()).unwrap();

    let status = verify_attestation(&forged, &DidKeyResolver).await;
    assert_eq!(status, AttestationStatus::Invalid);
    assert!(status.signals_tampering());

    let tampered = bob.audit_inbound(&DidKeyResolver).await.unwrap();
    assert_eq!(tampered.len(), 1);
    bob.discard_inbound(mallory.did()).unwrap();
    assert!(bob.document().unwrap().trust_received.is_empty());
}

#[tokio::test]
async fn test_legacy_unsigned_and_unresolvable_attestations() {
    let clock = clock();
    let alice = trust_book("alice", clock.clone());
    let bob = User::new("bob");

    let mut unsigned = alice.give_trust(bob.did(), VerificationMethod::QrCode).unwrap();
    unsigned.signature = None;
    assert_eq!(
        verify_attestation(&unsigned, &DidKeyResolver).await,
        AttestationStatus::Missing
    );

    let mut legacy = alice.give_trust(bob.did(), VerificationMethod::QrCode).unwrap();
    legacy.truster_did = "did:local:3f2a-legacy".into();
    let profiles = Arc::new(ProfileKeyResolver::new());
    let resolver = CompositeKeyResolver::standard(profiles.clone());
    let status = verify_attestation(&legacy, &resolver).await;
    assert_eq!(status, AttestationStatus::Unknown);
    assert!(!status.signals_tampering());
}

#[test]
fn test_copy_addressed_to_someone_else_rejected() {
    let clock = clock();
    let alice = trust_book("alice", clock.clone());
    let bob = trust_book("bob", clock.clone());
    let carol = User::new("carol");

    let att = alice.give_trust(carol.did(), VerificationMethod::Remote).unwrap();
    assert!(matches!(
        bob.receive_trust(att),
        Err(IdentityError::AttestationMismatch(_))
    ));
}
