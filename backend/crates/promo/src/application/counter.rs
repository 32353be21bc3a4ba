//! Impression Counter

use std::sync::Arc;
use std::time::Duration;

use crate::application::bounded;
use crate::application::config::PromoConfig;
use crate::domain::repository::ImpressionRepository;
use crate::domain::value_objects::{CounterKind, ProjectSlug, PromoId};

/// Records offers, views and clicks globally and per project.
///
/// The two writes are independent. A failed write is logged and dropped; it
/// never undoes the other write and never reaches the caller.
pub struct ImpressionCounter<I>
where
    I: ImpressionRepository,
{
    impressions: Arc<I>,
    timeout: Duration,
}

impl<I> ImpressionCounter<I>
where
    I: ImpressionRepository,
{
    pub fn new(impressions: Arc<I>, config: &PromoConfig) -> Self {
        Self {
            impressions,
            timeout: config.store_timeout,
        }
    }

    /// Returns `true` when every write landed
    pub async fn record(
        &self,
        promo_id: PromoId,
        kind: CounterKind,
        project: Option<&ProjectSlug>,
    ) -> bool {
        let mut all_recorded = true;

        if let Err(e) = bounded(self.timeout, self.impressions.increment(promo_id, kind)).await {
            tracing::warn!(
                promo_id = %promo_id,
                counter = kind.column(),
                error = %e,
                "Failed to record impression"
            );
            all_recorded = false;
        }

        if let Some(project) = project {
            let write = self.impressions.increment_for_project(promo_id, project, kind);
            if let Err(e) = bounded(self.timeout, write).await {
                tracing::warn!(
                    promo_id = %promo_id,
                    project = %project,
                    counter = kind.column(),
                    error = %e,
                    "Failed to record project impression"
                );
                all_recorded = false;
            }
        }

        all_recorded
    }
}
