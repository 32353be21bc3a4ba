//! Promo Stats Use Case

use std::sync::Arc;

use crate::application::bounded;
use crate::application::config::PromoConfig;
use crate::domain::entities::ImpressionCounts;
use crate::domain::repository::{ImpressionRepository, PromotionRepository};
use crate::domain::value_objects::{ProjectSlug, PromoId};
use crate::error::{PromoError, PromoResult};

/// Output DTO for promo stats
#[derive(Debug, Clone)]
pub struct PromoStatsOutput {
    pub promo_id: PromoId,
    pub project: Option<ProjectSlug>,
    pub counts: ImpressionCounts,
    pub view_ratio: f64,
    pub click_ratio: f64,
}

/// Promo Stats Use Case
pub struct PromoStatsUseCase<P, I>
where
    P: PromotionRepository,
    I: ImpressionRepository,
{
    promotion_repo: Arc<P>,
    impression_repo: Arc<I>,
    config: Arc<PromoConfig>,
}

impl<P, I> PromoStatsUseCase<P, I>
where
    P: PromotionRepository,
    I: ImpressionRepository,
{
    pub fn new(promotion_repo: Arc<P>, impression_repo: Arc<I>, config: Arc<PromoConfig>) -> Self {
        Self {
            promotion_repo,
            impression_repo,
            config,
        }
    }

    /// Counters and ratios, globally or for one project
    pub async fn execute(
        &self,
        promo_id: PromoId,
        project: Option<ProjectSlug>,
    ) -> PromoResult<PromoStatsOutput> {
        let timeout = self.config.store_timeout;

        bounded(timeout, self.promotion_repo.find_by_id(promo_id))
            .await?
            .ok_or(PromoError::PromotionNotFound)?;

        let counts = match &project {
            Some(project) => {
                bounded(timeout, self.impression_repo.project_counts(promo_id, project)).await?
            }
            None => bounded(timeout, self.impression_repo.counts(promo_id)).await?,
        };

        Ok(PromoStatsOutput {
            promo_id,
            project,
            view_ratio: counts.view_ratio(),
            click_ratio: counts.click_ratio(),
            counts,
        })
    }
}
