//! Integration test: voucher issuance, chained transfers and validation
//! across the crypto, identity and voucher layers.

use std::sync::Arc;

use chrono::Duration;
use tessera_core::{Clock, CoreConfig, MemoryDocument, SignatureStatus, VoucherStatus};
use tessera_crypto::verify_entity_signature;
use tessera_identity::{CompositeKeyResolver, DidKeyResolver, ProfileKeyResolver};
use tessera_integration_tests::{clock, User};
use tessera_vouchers::{
    issue_voucher, transfer_voucher, validate_voucher, ChainBreakReason, IssueRequest,
    VoucherDocument, VoucherError, VoucherLedger,
};

fn resolver() -> CompositeKeyResolver {
    CompositeKeyResolver::standard(Arc::new(ProfileKeyResolver::new()))
}

// =========================================================================
// Issuance and the holder invariant
// =========================================================================

#[tokio::test]
async fn test_fresh_voucher_validates() {
    let clock = clock();
    let alice = User::new("alice");
    let bob = User::new("bob");

    let voucher = issue_voucher(
        IssueRequest::new(alice.did(), bob.did(), 100.0, "coffee"),
        alice.identity.keypair(),
        clock.as_ref(),
    )
    .unwrap();

    let result =
        validate_voucher(&voucher, &resolver(), &CoreConfig::default(), clock.now_millis()).await;
    assert_eq!(result.overall_status, SignatureStatus::Valid);
    assert_eq!(result.issuer_signature_status, SignatureStatus::Valid);
    assert!(result.transfer_signature_statuses.is_empty());
}

#[tokio::test]
async fn test_return_to_issuer_redeems() {
    let clock = clock();
    let alice = User::new("alice");
    let bob = User::new("bob");
    let carol = User::new("carol");

    let mut voucher = issue_voucher(
        IssueRequest::new(alice.did(), bob.did(), 100.0, "coffee"),
        alice.identity.keypair(),
        clock.as_ref(),
    )
    .unwrap();

    clock.advance(Duration::minutes(10));
    transfer_voucher(&mut voucher, bob.did(), carol.did(), bob.identity.keypair(), clock.as_ref())
        .unwrap();
    clock.advance(Duration::minutes(10));
    transfer_voucher(&mut voucher, carol.did(), alice.did(), carol.identity.keypair(), clock.as_ref())
        .unwrap();

    assert_eq!(voucher.status, VoucherStatus::Redeemed);
    assert_eq!(voucher.current_holder_id, alice.did());

    let result =
        validate_voucher(&voucher, &resolver(), &CoreConfig::default(), clock.now_millis()).await;
    assert_eq!(
        result.transfer_signature_statuses,
        vec![SignatureStatus::Valid, SignatureStatus::Valid]
    );
    assert_eq!(result.overall_status, SignatureStatus::Valid);

    let again = transfer_voucher(
        &mut voucher,
        alice.did(),
        bob.did(),
        alice.identity.keypair(),
        clock.as_ref(),
    );
    assert!(matches!(again, Err(VoucherError::NotActive { .. })));
}

#[test]
fn test_tampered_amount_detected_on_issuer_signature() {
    let clock = clock();
    let alice = User::new("alice");
    let bob = User::new("bob");

    let mut voucher = issue_voucher(
        IssueRequest::new(alice.did(), bob.did(), 100.0, "coffee"),
        alice.identity.keypair(),
        clock.as_ref(),
    )
    .unwrap();
    voucher.amount = 100_000.0;

    let outcome = verify_entity_signature(&voucher.issuance(), &alice.identity.public_key());
    assert!(!outcome.valid);
    assert_eq!(outcome.error.as_deref(), Some("Payload mismatch"));
}

#[test]
fn test_holder_invariant_over_many_transfers() {
    let clock = clock();
    let issuer = User::new("issuer");
    let users: Vec<User> = ["u0", "u1", "u2", "u3", "u4"].into_iter().map(User::new).collect();

    let mut voucher = issue_voucher(
        IssueRequest::new(issuer.did(), users[0].did(), 1.0, "hours"),
        issuer.identity.keypair(),
        clock.as_ref(),
    )
    .unwrap();
    assert_eq!(voucher.current_holder_id, voucher.initial_recipient_id);

    for window in users.windows(2) {
        let (from, to) = (&window[0], &window[1]);
        clock.advance(Duration::seconds(1));
        transfer_voucher(&mut voucher, from.did(), to.did(), from.identity.keypair(), clock.as_ref())
            .unwrap();
        let last = voucher.transfers.last().unwrap();
        assert_eq!(voucher.current_holder_id, last.to_id);
    }
    assert_eq!(voucher.transfers.len(), 4);
    assert_eq!(voucher.current_holder_id, users[4].did());
}

#[test]
fn test_self_issued_voucher_is_redeemed() {
    let clock = clock();
    let alice = User::new("alice");
    let voucher = issue_voucher(
        IssueRequest::new(alice.did(), alice.did(), 5.0, "coffee"),
        alice.identity.keypair(),
        clock.as_ref(),
    )
    .unwrap();
    assert_eq!(voucher.status, VoucherStatus::Redeemed);
    assert_eq!(voucher.redeemed_at, Some(voucher.created_at));
}

// =========================================================================
// Chain continuity
// =========================================================================

#[tokio::test]
async fn test_transfer_replayed_from_other_voucher_breaks_chain() {
    let clock = clock();
    let alice = User::new("alice");
    let bob = User::new("bob");
    let carol = User::new("carol");

    let issue = || {
        issue_voucher(
            IssueRequest::new(alice.did(), bob.did(), 10.0, "coffee"),
            alice.identity.keypair(),
            clock.as_ref(),
        )
        .unwrap()
    };
    let mut victim = issue();
    let mut donor = issue();
    transfer_voucher(&mut donor, bob.did(), carol.did(), bob.identity.keypair(), clock.as_ref())
        .unwrap();

    // Splice the donor's genuinely signed transfer onto the victim.
    victim.transfers.push(donor.transfers[0].clone());
    victim.current_holder_id = carol.did().to_string();

    let result =
        validate_voucher(&victim, &DidKeyResolver, &CoreConfig::default(), clock.now_millis()).await;
    assert_eq!(result.transfer_signature_statuses, vec![SignatureStatus::Valid]);
    assert_eq!(result.chain_status, SignatureStatus::Invalid);
    let reasons: Vec<ChainBreakReason> = result.chain_breaks.iter().map(|b| b.reason).collect();
    assert!(reasons.contains(&ChainBreakReason::ForeignTransfer));
    assert!(reasons.contains(&ChainBreakReason::PreviousSignatureMismatch));
    assert_eq!(result.overall_status, SignatureStatus::Invalid);
}

// =========================================================================
// Ledger, cache and key resolution
// =========================================================================

#[tokio::test]
async fn test_ledger_cache_never_serves_stale_result_after_transfer() {
    let clock = clock();
    let alice = User::new("alice");
    let bob = User::new("bob");
    let carol = User::new("carol");
    let ledger = VoucherLedger::new(
        MemoryDocument::new(VoucherDocument::default()),
        CoreConfig::default(),
        clock.clone(),
    );

    let voucher = ledger
        .issue(
            IssueRequest::new(alice.did(), bob.did(), 100.0, "coffee"),
            alice.identity.keypair(),
        )
        .unwrap();
    let before = ledger.validate(&voucher.id, &resolver()).await.unwrap();
    assert!(before.transfer_signature_statuses.is_empty());

    ledger
        .transfer(&voucher.id, bob.did(), carol.did(), Some("thanks".into()), bob.identity.keypair())
        .unwrap();
    let after = ledger.validate(&voucher.id, &resolver()).await.unwrap();
    assert_eq!(after.transfer_signature_statuses.len(), 1);
    assert!(after.is_valid());

    // Past the TTL the result is recomputed even without a mutation.
    clock.advance(Duration::minutes(6));
    let recomputed = ledger.validate(&voucher.id, &resolver()).await.unwrap();
    assert!(recomputed.last_validated > after.last_validated);

    assert_eq!(
        ledger.history(&voucher.id).unwrap(),
        vec![bob.did().to_string(), carol.did().to_string()]
    );
}

#[tokio::test]
async fn test_missing_key_is_unknown_not_invalid() {
    let clock = clock();
    let alice = User::new("alice");
    let bob = User::new("bob");

    let voucher = issue_voucher(
        IssueRequest::new("profile:alice", bob.did(), 3.0, "coffee"),
        alice.identity.keypair(),
        clock.as_ref(),
    )
    .unwrap();

    let profiles = Arc::new(ProfileKeyResolver::new());
    let resolver = CompositeKeyResolver::standard(profiles.clone());
    let result = validate_voucher(&voucher, &resolver, &CoreConfig::default(), 0).await;
    assert_eq!(result.overall_status, SignatureStatus::Unknown);

    profiles.insert("profile:alice", alice.identity.public_key().to_base64());
    let result = validate_voucher(&voucher, &resolver, &CoreConfig::default(), 0).await;
    assert_eq!(result.overall_status, SignatureStatus::Valid);
}
