//! In-Memory Repository Implementation
//!
//! Single-process store used for tests and local runs without a database.
//! All state sits behind one mutex, which makes token consumption a plain
//! check-and-set.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use chrono::Utc;

use crate::domain::entities::{ConsumeOutcome, ImpressionCounts, Promotion, ValidationToken};
use crate::domain::repository::{ImpressionRepository, PromotionRepository, TokenStore};
use crate::domain::value_objects::{
    CounterKind, DisplayType, ProjectSlug, PromoId, TokenHash, TokenKind, TrackedEvent,
};
use crate::error::{PromoError, PromoResult};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct TokenKey {
    promo_id: PromoId,
    hash: String,
    kind: TokenKind,
}

#[derive(Debug, Clone)]
struct TokenEntry {
    uses: u32,
    context: Option<ProjectSlug>,
    expires_at_ms: i64,
}

impl TokenEntry {
    fn is_live(&self, now_ms: i64) -> bool {
        self.expires_at_ms > now_ms
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    promotions: BTreeMap<PromoId, Promotion>,
    impressions: HashMap<PromoId, ImpressionCounts>,
    project_impressions: HashMap<(PromoId, ProjectSlug), ImpressionCounts>,
    tokens: HashMap<TokenKey, TokenEntry>,
}

/// Memory-backed repository
#[derive(Debug, Clone, Default)]
pub struct MemoryPromoStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryPromoStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a promotion
    pub fn insert_promotion(&self, promo: Promotion) -> PromoResult<()> {
        self.lock()?.promotions.insert(promo.id, promo);
        Ok(())
    }

    /// Token entries currently held, expired or not
    #[cfg(test)]
    pub(crate) fn token_entries(&self) -> usize {
        self.lock().map(|state| state.tokens.len()).unwrap_or_default()
    }

    fn lock(&self) -> PromoResult<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| PromoError::Internal("memory store lock poisoned".to_string()))
    }
}

fn bump(counts: &mut ImpressionCounts, kind: CounterKind) {
    match kind {
        CounterKind::Offer => counts.offers += 1,
        CounterKind::View => counts.views += 1,
        CounterKind::Click => counts.clicks += 1,
    }
}

impl PromotionRepository for MemoryPromoStore {
    async fn find_by_id(&self, promo_id: PromoId) -> PromoResult<Option<Promotion>> {
        Ok(self.lock()?.promotions.get(&promo_id).cloned())
    }

    async fn find_live(&self, display_type: DisplayType) -> PromoResult<Vec<Promotion>> {
        Ok(self
            .lock()?
            .promotions
            .values()
            .filter(|p| p.live && p.display_type == display_type)
            .cloned()
            .collect())
    }

    async fn find_live_by_name(&self, name: &str) -> PromoResult<Option<Promotion>> {
        Ok(self
            .lock()?
            .promotions
            .values()
            .find(|p| p.live && p.name == name)
            .cloned())
    }
}

impl ImpressionRepository for MemoryPromoStore {
    async fn increment(&self, promo_id: PromoId, kind: CounterKind) -> PromoResult<()> {
        let mut state = self.lock()?;
        bump(state.impressions.entry(promo_id).or_default(), kind);
        Ok(())
    }

    async fn increment_for_project(
        &self,
        promo_id: PromoId,
        project: &ProjectSlug,
        kind: CounterKind,
    ) -> PromoResult<()> {
        let mut state = self.lock()?;
        let counts = state
            .project_impressions
            .entry((promo_id, project.clone()))
            .or_default();
        bump(counts, kind);
        Ok(())
    }

    async fn counts(&self, promo_id: PromoId) -> PromoResult<ImpressionCounts> {
        Ok(self
            .lock()?
            .impressions
            .get(&promo_id)
            .copied()
            .unwrap_or_default())
    }

    async fn project_counts(
        &self,
        promo_id: PromoId,
        project: &ProjectSlug,
    ) -> PromoResult<ImpressionCounts> {
        Ok(self
            .lock()?
            .project_impressions
            .get(&(promo_id, project.clone()))
            .copied()
            .unwrap_or_default())
    }
}

impl TokenStore for MemoryPromoStore {
    async fn issue(&self, token: &ValidationToken) -> PromoResult<()> {
        let mut state = self.lock()?;
        for kind in TokenKind::ALL {
            let context = match kind {
                TokenKind::ProjectContext => token.project.clone(),
                TokenKind::View | TokenKind::Click => None,
            };
            state.tokens.insert(
                TokenKey {
                    promo_id: token.promo_id,
                    hash: token.hash.as_str().to_string(),
                    kind,
                },
                TokenEntry {
                    uses: 0,
                    context,
                    expires_at_ms: token.expires_at_ms,
                },
            );
        }

        tracing::debug!(promo_id = %token.promo_id, "Validation token issued");
        Ok(())
    }

    async fn consume(
        &self,
        promo_id: PromoId,
        hash: &TokenHash,
        event: TrackedEvent,
    ) -> PromoResult<ConsumeOutcome> {
        let now_ms = Utc::now().timestamp_millis();
        let key = |kind| TokenKey {
            promo_id,
            hash: hash.as_str().to_string(),
            kind,
        };

        let mut state = self.lock()?;

        let Some(entry) = state
            .tokens
            .get_mut(&key(TokenKind::from(event)))
            .filter(|e| e.is_live(now_ms))
        else {
            return Ok(ConsumeOutcome::Invalid);
        };

        if entry.uses > 0 {
            return Ok(ConsumeOutcome::AlreadyUsed);
        }
        entry.uses = 1;

        let project = state
            .tokens
            .get(&key(TokenKind::ProjectContext))
            .filter(|e| e.is_live(now_ms))
            .and_then(|e| e.context.clone());

        Ok(ConsumeOutcome::Fresh { project })
    }

    async fn cleanup_expired(&self) -> PromoResult<u64> {
        let now_ms = Utc::now().timestamp_millis();
        let mut state = self.lock()?;
        let before = state.tokens.len();
        state.tokens.retain(|_, entry| entry.is_live(now_ms));
        let removed = (before - state.tokens.len()) as u64;

        tracing::debug!(tokens = removed, "Cleaned up expired validation tokens");
        Ok(removed)
    }
}
