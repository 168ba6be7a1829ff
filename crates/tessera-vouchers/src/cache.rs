use chrono::Duration;
use dashmap::DashMap;
use std::sync::Arc;
use tessera_core::{Clock, CoreConfig};

use crate::validation::ValidationResult;

/// Voucher id → last validation result, fresh for a fixed TTL measured from
/// `lastValidated`.
///
/// Entries are only dropped by TTL or [`ValidationCache::invalidate`]; there
/// is no size bound. Anything that changes a voucher's transfer list must
/// invalidate its entry.
///
/// Each invalidation bumps a per-voucher generation. A validation that read
/// the generation before it started stores its result with
/// [`ValidationCache::insert_if_current`], which refuses results computed
/// from a voucher that has changed since.
pub struct ValidationCache {
    entries: DashMap<String, ValidationResult>,
    generations: DashMap<String, u64>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl ValidationCache {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: DashMap::new(),
            generations: DashMap::new(),
            ttl,
            clock,
        }
    }

    pub fn from_config(config: &CoreConfig, clock: Arc<dyn Clock>) -> Self {
        Self::new(config.validation_ttl(), clock)
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The cached result for `voucher_id`, if still within TTL.
    pub fn get(&self, voucher_id: &str) -> Option<ValidationResult> {
        let entry = self.entries.get(voucher_id)?;
        let age = self.clock.now_millis().saturating_sub(entry.last_validated);
        if age < self.ttl.num_milliseconds() {
            tracing::debug!(voucher_id = voucher_id, age_ms = age, "validation cache hit");
            Some(entry.value().clone())
        } else {
            tracing::debug!(voucher_id = voucher_id, age_ms = age, "validation cache entry stale");
            None
        }
    }

    pub fn insert(&self, result: ValidationResult) {
        self.entries.insert(result.voucher_id.clone(), result);
    }

    /// Current generation for `voucher_id`. Read it before snapshotting the
    /// voucher that will be validated.
    pub fn generation(&self, voucher_id: &str) -> u64 {
        self.generations.get(voucher_id).map_or(0, |g| *g)
    }

    /// Store `result` unless the voucher was invalidated after `generation`
    /// was read. Returns whether the result was stored.
    pub fn insert_if_current(&self, result: ValidationResult, generation: u64) -> bool {
        // The generation entry stays locked until the result is stored, so an
        // invalidation cannot slip in between the check and the insert.
        let current = self.generations.entry(result.voucher_id.clone()).or_insert(0);
        if *current != generation {
            tracing::debug!(
                voucher_id = %result.voucher_id,
                started = generation,
                current = *current,
                "discarding validation of a superseded voucher"
            );
            return false;
        }
        self.entries.insert(result.voucher_id.clone(), result);
        true
    }

    pub fn invalidate(&self, voucher_id: &str) -> bool {
        let mut generation = self.generations.entry(voucher_id.to_string()).or_insert(0);
        *generation += 1;
        let removed = self.entries.remove(voucher_id).is_some();
        drop(generation);
        if removed {
            tracing::debug!(voucher_id = voucher_id, "validation cache entry invalidated");
        }
        removed
    }

    /// Drop every stale entry. Returns how many were removed.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now_millis();
        let ttl = self.ttl.num_milliseconds();
        let before = self.entries.len();
        self.entries
            .retain(|_, result| now.saturating_sub(result.last_validated) < ttl);
        before - self.entries.len()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
