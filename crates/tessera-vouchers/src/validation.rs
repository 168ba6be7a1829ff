use serde::{Deserialize, Serialize};
use tessera_core::{CoreConfig, SignatureStatus};
use tessera_crypto::verify_signed_payload;
use tessera_identity::KeyResolver;

use crate::voucher::Voucher;

/// Where the custody chain stops lining up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainBreak {
    /// Index into `transfers`.
    pub index: usize,
    pub reason: ChainBreakReason,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ChainBreakReason {
    /// `previousSignature` is not the signature of the link before it.
    PreviousSignatureMismatch,
    /// `fromId` is not the holder before this transfer.
    SenderNotHolder,
    /// `voucherId` names a different voucher.
    ForeignTransfer,
}

/// Outcome of validating one voucher. Cached, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub voucher_id: String,
    pub issuer_signature_status: SignatureStatus,
    /// Aligned with `transfers`.
    pub transfer_signature_statuses: Vec<SignatureStatus>,
    pub chain_status: SignatureStatus,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub chain_breaks: Vec<ChainBreak>,
    pub overall_status: SignatureStatus,
    /// Unix milliseconds.
    pub last_validated: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.overall_status.is_valid()
    }
}

/// Verify the issuer signature and every transfer signature, then check that
/// the transfers form one continuous chain.
///
/// Each link is verified independently so one bad link does not hide the
/// state of the others.
pub async fn validate_voucher(
    voucher: &Voucher,
    resolver: &dyn KeyResolver,
    config: &CoreConfig,
    now: i64,
) -> ValidationResult {
    let mut errors = Vec::new();

    let issuer_signature_status = check_signature(
        &voucher.issuer_payload(),
        &voucher.issuer_signature,
        &voucher.issuer_id,
        resolver,
    )
    .await
    .unwrap_or_else(|e| {
        errors.push(format!("issuer: {}", e));
        SignatureStatus::Invalid
    });
    if issuer_signature_status == SignatureStatus::Unknown {
        errors.push(format!("issuer: no public key for {}", voucher.issuer_id));
    }

    let mut transfer_signature_statuses = Vec::with_capacity(voucher.transfers.len());
    for (index, transfer) in voucher.transfers.iter().enumerate() {
        let status = check_signature(
            &transfer.payload(),
            &transfer.signature,
            &transfer.from_id,
            resolver,
        )
        .await
        .unwrap_or_else(|e| {
            errors.push(format!("transfer {}: {}", index, e));
            SignatureStatus::Invalid
        });
        if status == SignatureStatus::Unknown {
            errors.push(format!("transfer {}: no public key for {}", index, transfer.from_id));
        }
        transfer_signature_statuses.push(status);
    }

    let chain_breaks = chain_breaks(voucher);
    let chain_status = SignatureStatus::from_valid(chain_breaks.is_empty());
    for brk in &chain_breaks {
        errors.push(format!("transfer {}: chain broken ({:?})", brk.index, brk.reason));
    }

    let mut statuses = vec![issuer_signature_status];
    statuses.extend(transfer_signature_statuses.iter().copied());
    if config.enforce_chain_continuity {
        statuses.push(chain_status);
    }
    let overall_status = SignatureStatus::aggregate(statuses);

    if overall_status == SignatureStatus::Invalid {
        tracing::warn!(
            voucher_id = %voucher.id,
            errors = ?errors,
            "voucher failed validation"
        );
    } else {
        tracing::debug!(voucher_id = %voucher.id, status = %overall_status, "voucher validated");
    }

    ValidationResult {
        voucher_id: voucher.id.clone(),
        issuer_signature_status,
        transfer_signature_statuses,
        chain_status,
        chain_breaks,
        overall_status,
        last_validated: now,
        error: (!errors.is_empty()).then(|| errors.join("; ")),
    }
}

/// `Ok(Unknown)` when the signer has no resolvable key; `Err` carries the
/// verification failure for an invalid signature.
async fn check_signature<T: serde::Serialize + ?Sized>(
    payload: &T,
    signature: &str,
    signer: &str,
    resolver: &dyn KeyResolver,
) -> Result<SignatureStatus, String> {
    let Some(key) = resolver.resolve_key(signer).await else {
        return Ok(SignatureStatus::Unknown);
    };
    let outcome = verify_signed_payload(payload, signature, &key);
    if outcome.valid {
        Ok(SignatureStatus::Valid)
    } else {
        Err(outcome
            .error
            .unwrap_or_else(|| "signature verification failed".into()))
    }
}

/// Links whose `previousSignature`, sender or voucher id does not follow
/// from the link before them.
pub fn chain_breaks(voucher: &Voucher) -> Vec<ChainBreak> {
    let mut breaks = Vec::new();
    let mut expected_previous = voucher.issuer_signature.as_str();
    let mut holder = voucher.initial_recipient_id.as_str();

    for (index, transfer) in voucher.transfers.iter().enumerate() {
        if transfer.voucher_id != voucher.id {
            breaks.push(ChainBreak {
                index,
                reason: ChainBreakReason::ForeignTransfer,
            });
        }
        if transfer.previous_signature != expected_previous {
            breaks.push(ChainBreak {
                index,
                reason: ChainBreakReason::PreviousSignatureMismatch,
            });
        }
        if transfer.from_id != holder {
            breaks.push(ChainBreak {
                index,
                reason: ChainBreakReason::SenderNotHolder,
            });
        }
        expected_previous = transfer.signature.as_str();
        holder = transfer.to_id.as_str();
    }
    breaks
}
