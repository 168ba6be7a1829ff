//! Bearer vouchers and their chained transfer ledger.
//!
//! The issuer signs `{id, issuerId, amount, unit, createdAt, expiresAt?,
//! initialRecipientId}`. Every transfer is signed by its sender over
//! `{voucherId, fromId, toId, timestamp, previousSignature}`, where
//! `previousSignature` is the signature of the link before it (the issuer
//! signature for the first transfer).

use serde::{Deserialize, Serialize};
use tessera_core::{Clock, VoucherEvent, VoucherStateMachine, VoucherStatus};
use tessera_crypto::{sign, KeyPair};
use tessera_identity::public_key_from_did;
use uuid::Uuid;

use crate::error::VoucherError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Voucher {
    pub id: String,
    pub issuer_id: String,
    pub amount: f64,
    pub unit: String,
    /// Unix milliseconds.
    pub created_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
    pub initial_recipient_id: String,
    pub issuer_signature: String,
    pub current_holder_id: String,
    pub status: VoucherStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redeemed_at: Option<i64>,
    #[serde(default)]
    pub transfers: Vec<Transfer>,
}

/// One append-only link in a voucher's custody chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transfer {
    pub id: String,
    pub voucher_id: String,
    pub from_id: String,
    pub to_id: String,
    pub timestamp: i64,
    pub previous_signature: String,
    pub signature: String,
    /// Not covered by the signature.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

/// The fields covered by the issuer signature.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuerPayload<'a> {
    pub id: &'a str,
    pub issuer_id: &'a str,
    pub amount: f64,
    pub unit: &'a str,
    pub created_at: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
    pub initial_recipient_id: &'a str,
}

/// The issuer payload with its signature attached, in the shape entity
/// verification expects.
#[derive(Debug, Clone, Serialize)]
pub struct Issuance<'a> {
    #[serde(flatten)]
    pub payload: IssuerPayload<'a>,
    pub signature: &'a str,
}

/// The fields covered by a transfer signature.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferPayload<'a> {
    pub voucher_id: &'a str,
    pub from_id: &'a str,
    pub to_id: &'a str,
    pub timestamp: i64,
    pub previous_signature: &'a str,
}

impl Voucher {
    pub fn issuer_payload(&self) -> IssuerPayload<'_> {
        IssuerPayload {
            id: &self.id,
            issuer_id: &self.issuer_id,
            amount: self.amount,
            unit: &self.unit,
            created_at: self.created_at,
            expires_at: self.expires_at,
            initial_recipient_id: &self.initial_recipient_id,
        }
    }

    pub fn issuance(&self) -> Issuance<'_> {
        Issuance {
            payload: self.issuer_payload(),
            signature: &self.issuer_signature,
        }
    }

    /// Signature the next transfer must link to.
    pub fn chain_head(&self) -> &str {
        self.transfers
            .last()
            .map(|t| t.signature.as_str())
            .unwrap_or(&self.issuer_signature)
    }

    /// Status at time `now` (Unix milliseconds). Redemption beats expiry.
    pub fn derived_status(&self, now: i64) -> VoucherStatus {
        if self.status == VoucherStatus::Redeemed || self.redeemed_at.is_some() {
            return VoucherStatus::Redeemed;
        }
        if self.status == VoucherStatus::Expired {
            return VoucherStatus::Expired;
        }
        match self.expires_at {
            Some(expires_at) if expires_at < now => VoucherStatus::Expired,
            _ => VoucherStatus::Active,
        }
    }

    /// Move a stored `active` status to `expired` once the expiry time has
    /// passed. Returns whether the stored status changed.
    pub fn settle_expiry(&mut self, now: i64) -> Result<bool, VoucherError> {
        if self.status != VoucherStatus::Active
            || self.derived_status(now) != VoucherStatus::Expired
        {
            return Ok(false);
        }
        self.status = VoucherStateMachine::transition(self.status, VoucherEvent::Expire)?;
        tracing::info!(voucher_id = %self.id, "voucher expired");
        Ok(true)
    }

    /// Every holder in order, starting with the initial recipient.
    pub fn holders(&self) -> Vec<&str> {
        std::iter::once(self.initial_recipient_id.as_str())
            .chain(self.transfers.iter().map(|t| t.to_id.as_str()))
            .collect()
    }
}

impl Transfer {
    pub fn payload(&self) -> TransferPayload<'_> {
        TransferPayload {
            voucher_id: &self.voucher_id,
            from_id: &self.from_id,
            to_id: &self.to_id,
            timestamp: self.timestamp,
            previous_signature: &self.previous_signature,
        }
    }
}

/// Parameters for [`issue_voucher`].
#[derive(Debug, Clone)]
pub struct IssueRequest {
    pub issuer_id: String,
    pub recipient_id: String,
    pub amount: f64,
    pub unit: String,
    pub expires_at: Option<i64>,
}

impl IssueRequest {
    pub fn new(
        issuer_id: impl Into<String>,
        recipient_id: impl Into<String>,
        amount: f64,
        unit: impl Into<String>,
    ) -> Self {
        Self {
            issuer_id: issuer_id.into(),
            recipient_id: recipient_id.into(),
            amount,
            unit: unit.into(),
            expires_at: None,
        }
    }

    pub fn expiring_at(mut self, expires_at: i64) -> Self {
        self.expires_at = Some(expires_at);
        self
    }
}

/// Issue and sign a voucher. Issuing to oneself redeems it immediately.
pub fn issue_voucher(
    request: IssueRequest,
    keypair: &KeyPair,
    clock: &dyn Clock,
) -> Result<Voucher, VoucherError> {
    if !request.amount.is_finite() || request.amount <= 0.0 {
        return Err(VoucherError::InvalidAmount(request.amount));
    }
    ensure_signer(&request.issuer_id, keypair)?;

    let created_at = clock.now_millis();
    let mut voucher = Voucher {
        id: Uuid::now_v7().to_string(),
        issuer_id: request.issuer_id,
        amount: request.amount,
        unit: request.unit,
        created_at,
        expires_at: request.expires_at,
        current_holder_id: request.recipient_id.clone(),
        initial_recipient_id: request.recipient_id,
        issuer_signature: String::new(),
        status: VoucherStatus::Active,
        redeemed_at: None,
        transfers: Vec::new(),
    };
    voucher.issuer_signature = sign(&voucher.issuer_payload(), keypair)?;

    if voucher.initial_recipient_id == voucher.issuer_id {
        voucher.status =
            VoucherStateMachine::transition(voucher.status, VoucherEvent::ReturnToIssuer)?;
        voucher.redeemed_at = Some(created_at);
    }

    tracing::info!(
        voucher_id = %voucher.id,
        issuer = %voucher.issuer_id,
        recipient = %voucher.initial_recipient_id,
        amount = voucher.amount,
        unit = %voucher.unit,
        "voucher issued"
    );
    Ok(voucher)
}

/// Sign a transfer from the current holder and append it to the chain.
pub fn transfer_voucher(
    voucher: &mut Voucher,
    from_id: &str,
    to_id: &str,
    keypair: &KeyPair,
    clock: &dyn Clock,
) -> Result<Transfer, VoucherError> {
    transfer_voucher_with_note(voucher, from_id, to_id, None, keypair, clock)
}

pub fn transfer_voucher_with_note(
    voucher: &mut Voucher,
    from_id: &str,
    to_id: &str,
    note: Option<String>,
    keypair: &KeyPair,
    clock: &dyn Clock,
) -> Result<Transfer, VoucherError> {
    if from_id != voucher.current_holder_id {
        return Err(VoucherError::NotHolder {
            voucher_id: voucher.id.clone(),
            from_id: from_id.to_string(),
        });
    }
    let timestamp = clock.now_millis();
    voucher.settle_expiry(timestamp)?;
    let status = voucher.derived_status(timestamp);
    if status != VoucherStatus::Active {
        return Err(VoucherError::NotActive {
            voucher_id: voucher.id.clone(),
            status,
        });
    }
    ensure_signer(from_id, keypair)?;

    let event = if to_id == voucher.issuer_id {
        VoucherEvent::ReturnToIssuer
    } else {
        VoucherEvent::Transfer
    };
    let next_status = VoucherStateMachine::transition(status, event)?;

    let payload = TransferPayload {
        voucher_id: &voucher.id,
        from_id,
        to_id,
        timestamp,
        previous_signature: voucher.chain_head(),
    };
    let signature = sign(&payload, keypair)?;

    let transfer = Transfer {
        id: Uuid::now_v7().to_string(),
        voucher_id: voucher.id.clone(),
        from_id: from_id.to_string(),
        to_id: to_id.to_string(),
        timestamp,
        previous_signature: voucher.chain_head().to_string(),
        signature,
        note,
    };

    voucher.transfers.push(transfer.clone());
    voucher.current_holder_id = transfer.to_id.clone();
    voucher.status = next_status;
    if next_status == VoucherStatus::Redeemed {
        voucher.redeemed_at = Some(timestamp);
    }

    tracing::info!(
        voucher_id = %voucher.id,
        from = from_id,
        to = to_id,
        status = %voucher.status,
        "voucher transferred"
    );
    Ok(transfer)
}

/// When `id` is a `did:key`, the key pair must be the one it names.
/// Other identifiers are resolved through profile data at validation time.
fn ensure_signer(id: &str, keypair: &KeyPair) -> Result<(), VoucherError> {
    match public_key_from_did(id) {
        Ok(key) if key != keypair.public_key() => Err(VoucherError::SignerMismatch(id.to_string())),
        _ => Ok(()),
    }
}
