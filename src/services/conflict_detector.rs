//! Optimistic concurrency for API writes.
//!
//! An API write is a whole replacement of the JSON index. It is accepted
//! only if no submitted card is older than the index copy it would replace
//! (beyond a small tolerance). Accepted batches are re-stamped with one
//! shared timestamp and each card's version is bumped by one.

use std::collections::HashMap;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{Card, Conflict, SyncConfig};

/// Checks and stamps API write batches.
#[derive(Debug, Clone, Copy)]
pub struct ConflictDetector {
    tolerance_ms: i64,
    card_limit: usize,
}

impl Default for ConflictDetector {
    fn default() -> Self {
        Self::from_config(&SyncConfig::default())
    }
}

impl ConflictDetector {
    pub const fn new(tolerance_ms: i64, card_limit: usize) -> Self {
        Self {
            tolerance_ms,
            card_limit,
        }
    }

    pub const fn from_config(config: &SyncConfig) -> Self {
        Self::new(config.conflict_tolerance_ms, config.card_limit)
    }

    pub const fn card_limit(&self) -> usize {
        self.card_limit
    }

    /// Every incoming card whose index copy is newer than
    /// `incoming.updatedAt + tolerance`.
    pub fn find_conflicts(&self, incoming: &[Card], current: &[Card]) -> Vec<Conflict> {
        let current: HashMap<&str, &Card> =
            current.iter().map(|card| (card.id.as_str(), card)).collect();

        incoming
            .iter()
            .filter_map(|card| {
                let server = current.get(card.id.as_str())?;
                (server.meta.updated_at > card.meta.updated_at.saturating_add(self.tolerance_ms))
                    .then(|| Conflict::new((*server).clone(), card.clone()))
            })
            .collect()
    }

    /// Validate a batch against the current index.
    ///
    /// Fails with [`DomainError::CardLimitExceeded`] before any comparison if
    /// the batch is too large, or with [`DomainError::Conflict`] listing every
    /// stale card.
    pub fn check(&self, incoming: &[Card], current: &[Card]) -> DomainResult<()> {
        if incoming.len() > self.card_limit {
            return Err(DomainError::CardLimitExceeded {
                limit: self.card_limit,
                actual: incoming.len(),
            });
        }

        let conflicts = self.find_conflicts(incoming, current);
        if conflicts.is_empty() {
            Ok(())
        } else {
            Err(DomainError::Conflict(conflicts))
        }
    }

    /// Check a batch and, if accepted, return it as the new index stamped
    /// at `now`.
    pub fn apply(&self, incoming: Vec<Card>, current: &[Card], now: i64) -> DomainResult<Vec<Card>> {
        self.check(&incoming, current)?;

        incoming
            .into_iter()
            .map(|card| {
                let meta = card.meta.bumped(now).ok_or_else(|| {
                    DomainError::InvalidPayload(format!(
                        "card '{}' version {} cannot be incremented",
                        card.id, card.meta.version
                    ))
                })?;
                Ok(card.with_meta(meta))
            })
            .collect()
    }
}
