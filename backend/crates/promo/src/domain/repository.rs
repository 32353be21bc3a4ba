//! Repository Traits
//!
//! Interfaces for data persistence. Implementation is in infrastructure layer.

use crate::domain::entities::{ConsumeOutcome, ImpressionCounts, Promotion, ValidationToken};
use crate::domain::value_objects::{
    CounterKind, DisplayType, ProjectSlug, PromoId, TokenHash, TrackedEvent,
};
use crate::error::PromoResult;

/// Promotion repository trait (read-only)
#[trait_variant::make(PromotionRepository: Send)]
pub trait LocalPromotionRepository {
    /// Find a promotion by id, live or not
    async fn find_by_id(&self, promo_id: PromoId) -> PromoResult<Option<Promotion>>;

    /// All live promotions for a display surface, geo filters attached in order
    async fn find_live(&self, display_type: DisplayType) -> PromoResult<Vec<Promotion>>;

    /// First live promotion with the given name
    async fn find_live_by_name(&self, name: &str) -> PromoResult<Option<Promotion>>;
}

/// Impression counter repository trait
///
/// Each method touches a single row and must be atomic on its own.
#[trait_variant::make(ImpressionRepository: Send)]
pub trait LocalImpressionRepository {
    /// Increment the global counter for a promotion
    async fn increment(&self, promo_id: PromoId, kind: CounterKind) -> PromoResult<()>;

    /// Increment the per-project counter, creating the row if absent
    async fn increment_for_project(
        &self,
        promo_id: PromoId,
        project: &ProjectSlug,
        kind: CounterKind,
    ) -> PromoResult<()>;

    /// Global counters (zeros if never counted)
    async fn counts(&self, promo_id: PromoId) -> PromoResult<ImpressionCounts>;

    /// Per-project counters (zeros if never counted)
    async fn project_counts(
        &self,
        promo_id: PromoId,
        project: &ProjectSlug,
    ) -> PromoResult<ImpressionCounts>;
}

/// Validation token store trait
#[trait_variant::make(TokenStore: Send)]
pub trait LocalTokenStore {
    /// Register view, click and project-context entries for a token
    async fn issue(&self, token: &ValidationToken) -> PromoResult<()>;

    /// Spend the token for one event. Of any number of concurrent calls for
    /// the same token and event, exactly one may observe `Fresh`.
    async fn consume(
        &self,
        promo_id: PromoId,
        hash: &TokenHash,
        event: TrackedEvent,
    ) -> PromoResult<ConsumeOutcome>;

    /// Remove expired entries, returning how many were deleted
    async fn cleanup_expired(&self) -> PromoResult<u64>;
}
