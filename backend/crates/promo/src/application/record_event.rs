//! Record Event Use Case
//!
//! Backs the view and click redirect endpoints. The client controls these
//! URLs completely, so nothing is counted unless the token is spent here for
//! the first time.

use std::sync::Arc;

use crate::application::bounded;
use crate::application::config::PromoConfig;
use crate::application::counter::ImpressionCounter;
use crate::domain::entities::ConsumeOutcome;
use crate::domain::repository::{ImpressionRepository, PromotionRepository, TokenStore};
use crate::domain::value_objects::{PromoId, TokenHash, TrackedEvent};
use crate::error::{PromoError, PromoResult};

/// Output DTO for record event
#[derive(Debug, Clone)]
pub struct RecordEventOutput {
    /// Promotion image (view) or link (click)
    pub redirect_to: String,
    pub outcome: ConsumeOutcome,
    /// Whether the event was counted
    pub counted: bool,
}

/// Record Event Use Case
pub struct RecordEventUseCase<P, I, T>
where
    P: PromotionRepository,
    I: ImpressionRepository,
    T: TokenStore,
{
    promotion_repo: Arc<P>,
    token_store: Arc<T>,
    counter: ImpressionCounter<I>,
    config: Arc<PromoConfig>,
}

impl<P, I, T> RecordEventUseCase<P, I, T>
where
    P: PromotionRepository,
    I: ImpressionRepository,
    T: TokenStore,
{
    pub fn new(
        promotion_repo: Arc<P>,
        impression_repo: Arc<I>,
        token_store: Arc<T>,
        config: Arc<PromoConfig>,
    ) -> Self {
        Self {
            promotion_repo,
            token_store,
            counter: ImpressionCounter::new(impression_repo, &config),
            config,
        }
    }

    /// Fails only when the promotion is unknown or cannot be loaded, since
    /// then there is no destination to redirect to.
    pub async fn execute(
        &self,
        promo_id: PromoId,
        raw_hash: &str,
        event: TrackedEvent,
    ) -> PromoResult<RecordEventOutput> {
        let timeout = self.config.store_timeout;

        let promo = bounded(timeout, self.promotion_repo.find_by_id(promo_id))
            .await?
            .ok_or(PromoError::PromotionNotFound)?;

        let redirect_to = match event {
            TrackedEvent::View => promo.image,
            TrackedEvent::Click => promo.link,
        };

        let outcome = match TokenHash::parse(raw_hash) {
            Some(hash) => {
                match bounded(timeout, self.token_store.consume(promo_id, &hash, event)).await {
                    Ok(outcome) => outcome,
                    Err(e) => {
                        tracing::warn!(
                            promo_id = %promo_id,
                            event = event.code(),
                            error = %e,
                            "Token store unavailable, not counting"
                        );
                        ConsumeOutcome::Invalid
                    }
                }
            }
            None => ConsumeOutcome::Invalid,
        };

        let counted = match &outcome {
            ConsumeOutcome::Fresh { project } => {
                self.counter
                    .record(promo_id, event.into(), project.as_ref())
                    .await;
                tracing::info!(
                    promo_id = %promo_id,
                    event = event.code(),
                    project = ?project.as_ref().map(|p| p.as_str()),
                    "Counted promotion event"
                );
                true
            }
            rejected => {
                tracing::debug!(
                    promo_id = %promo_id,
                    event = event.code(),
                    outcome = rejected.label(),
                    "Token rejected, not counting"
                );
                false
            }
        };

        Ok(RecordEventOutput {
            redirect_to,
            outcome,
            counted,
        })
    }
}
