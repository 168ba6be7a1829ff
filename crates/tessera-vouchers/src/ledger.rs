use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tessera_core::{Clock, CoreConfig, DocumentHandle};
use tessera_crypto::KeyPair;
use tessera_identity::KeyResolver;

use crate::cache::ValidationCache;
use crate::error::VoucherError;
use crate::validation::{validate_voucher, ValidationResult};
use crate::voucher::{issue_voucher, transfer_voucher_with_note, IssueRequest, Transfer, Voucher};

/// The replicated document holding a wallet's vouchers, keyed by id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoucherDocument {
    #[serde(default)]
    pub vouchers: BTreeMap<String, Voucher>,
}

/// Issues, transfers and validates vouchers stored behind a document sink,
/// keeping the validation cache coherent with every mutation.
pub struct VoucherLedger<H> {
    handle: H,
    cache: ValidationCache,
    config: CoreConfig,
    clock: Arc<dyn Clock>,
}

impl<H: DocumentHandle<VoucherDocument>> VoucherLedger<H> {
    pub fn new(handle: H, config: CoreConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            handle,
            cache: ValidationCache::from_config(&config, clock.clone()),
            config,
            clock,
        }
    }

    pub fn cache(&self) -> &ValidationCache {
        &self.cache
    }

    pub fn get(&self, voucher_id: &str) -> Result<Voucher, VoucherError> {
        self.handle
            .snapshot()?
            .vouchers
            .remove(voucher_id)
            .ok_or_else(|| VoucherError::NotFound(voucher_id.to_string()))
    }

    pub fn list(&self) -> Result<Vec<Voucher>, VoucherError> {
        Ok(self.handle.snapshot()?.vouchers.into_values().collect())
    }

    pub fn issue(&self, request: IssueRequest, keypair: &KeyPair) -> Result<Voucher, VoucherError> {
        let voucher = issue_voucher(request, keypair, self.clock.as_ref())?;
        let mut outcome = Ok(());
        self.handle.change(&mut |doc| {
            outcome = if doc.vouchers.contains_key(&voucher.id) {
                Err(VoucherError::AlreadyExists(voucher.id.clone()))
            } else {
                doc.vouchers.insert(voucher.id.clone(), voucher.clone());
                Ok(())
            };
        })?;
        outcome?;
        Ok(voucher)
    }

    /// Append a signed transfer to the stored voucher.
    ///
    /// The holder and status checks run against the live document inside the
    /// same change that appends the transfer, so two racing transfers of one
    /// voucher cannot both succeed.
    pub fn transfer(
        &self,
        voucher_id: &str,
        from_id: &str,
        to_id: &str,
        note: Option<String>,
        keypair: &KeyPair,
    ) -> Result<Transfer, VoucherError> {
        let mut note = note;
        let mut outcome = Err(VoucherError::NotFound(voucher_id.to_string()));
        self.handle.change(&mut |doc| {
            if let Some(voucher) = doc.vouchers.get_mut(voucher_id) {
                outcome = transfer_voucher_with_note(
                    voucher,
                    from_id,
                    to_id,
                    note.take(),
                    keypair,
                    self.clock.as_ref(),
                );
            }
        })?;
        // A refused transfer may still have recorded expiry.
        self.cache.invalidate(voucher_id);
        outcome
    }

    /// Validation result for a stored voucher, served from cache while fresh.
    ///
    /// A result computed from a voucher that changed while it was being
    /// validated is returned to the caller but never cached.
    pub async fn validate(
        &self,
        voucher_id: &str,
        resolver: &dyn KeyResolver,
    ) -> Result<ValidationResult, VoucherError> {
        if let Some(cached) = self.cache.get(voucher_id) {
            return Ok(cached);
        }
        let generation = self.cache.generation(voucher_id);
        let voucher = self.get(voucher_id)?;
        let result =
            validate_voucher(&voucher, resolver, &self.config, self.clock.now_millis()).await;
        self.cache.insert_if_current(result.clone(), generation);
        Ok(result)
    }

    /// Holders in custody order, starting with the initial recipient.
    pub fn history(&self, voucher_id: &str) -> Result<Vec<String>, VoucherError> {
        let voucher = self.get(voucher_id)?;
        Ok(voucher.holders().into_iter().map(str::to_string).collect())
    }

    /// Store a copy of a voucher received from elsewhere.
    ///
    /// A copy replaces the stored voucher only if it carries the same
    /// issuance and its transfers extend the stored ones; an older copy would
    /// silently drop signed transfers.
    pub fn import(&self, voucher: Voucher) -> Result<(), VoucherError> {
        let mut outcome = Ok(());
        self.handle.change(&mut |doc| {
            let extends = doc.vouchers.get(&voucher.id).map_or(true, |stored| {
                stored.issuer_signature == voucher.issuer_signature
                    && voucher.transfers.starts_with(&stored.transfers)
            });
            outcome = if extends {
                doc.vouchers.insert(voucher.id.clone(), voucher.clone());
                Ok(())
            } else {
                Err(VoucherError::StaleCopy(voucher.id.clone()))
            };
        })?;
        outcome?;
        self.cache.invalidate(&voucher.id);
        tracing::info!(
            voucher_id = %voucher.id,
            transfers = voucher.transfers.len(),
            "voucher imported"
        );
        Ok(())
    }
}
