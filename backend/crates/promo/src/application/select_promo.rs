//! Select Promo Use Case

use std::sync::Arc;

use crate::application::bounded;
use crate::application::config::PromoConfig;
use crate::application::counter::ImpressionCounter;
use crate::domain::entities::{Promotion, ValidationToken};
use crate::domain::repository::{ImpressionRepository, PromotionRepository, TokenStore};
use crate::domain::services::{CandidateOrder, Candidates, SelectionContext, select_promotion};
use crate::domain::value_objects::{CounterKind, CountryCode, ProjectSlug, PromoId, TokenHash};

/// Input DTO for select promo
#[derive(Debug, Clone)]
pub struct SelectPromoInput {
    /// Serving context the offer is made under
    pub project: ProjectSlug,
    pub allow_promos: bool,
    pub gold_user: bool,
    pub gold_project: bool,
    pub country: Option<CountryCode>,
}

/// Payload merged into the footer response when a promotion is displayed
#[derive(Debug, Clone, PartialEq)]
pub struct PromoData {
    pub promo_id: PromoId,
    pub name: String,
    pub text: String,
    /// Click-counting redirect URL
    pub link: String,
    /// View-counting redirect URL
    pub image: String,
    pub hash: TokenHash,
}

/// Output DTO for select promo
#[derive(Debug, Clone, PartialEq)]
pub struct SelectPromoOutput {
    pub promo: Option<PromoData>,
}

impl SelectPromoOutput {
    fn nothing() -> Self {
        Self { promo: None }
    }

    pub fn displayed(&self) -> bool {
        self.promo.is_some()
    }
}

/// Select Promo Use Case
///
/// Picks a promotion, registers a validation token for it and counts the
/// offer. Storage failures shrink the result to "no promo" or drop the
/// counting side effect; they are never returned.
pub struct SelectPromoUseCase<P, I, T>
where
    P: PromotionRepository,
    I: ImpressionRepository,
    T: TokenStore,
{
    promotion_repo: Arc<P>,
    token_store: Arc<T>,
    counter: ImpressionCounter<I>,
    order: Arc<dyn CandidateOrder>,
    config: Arc<PromoConfig>,
}

impl<P, I, T> SelectPromoUseCase<P, I, T>
where
    P: PromotionRepository,
    I: ImpressionRepository,
    T: TokenStore,
{
    pub fn new(
        promotion_repo: Arc<P>,
        impression_repo: Arc<I>,
        token_store: Arc<T>,
        order: Arc<dyn CandidateOrder>,
        config: Arc<PromoConfig>,
    ) -> Self {
        Self {
            promotion_repo,
            token_store,
            counter: ImpressionCounter::new(impression_repo, &config),
            order,
            config,
        }
    }

    pub async fn execute(&self, input: SelectPromoInput) -> SelectPromoOutput {
        if !self.config.use_promos {
            tracing::debug!(project = %input.project, "Promos disabled");
            return SelectPromoOutput::nothing();
        }

        let ctx = SelectionContext {
            use_promos: self.config.use_promos,
            allow_promos: input.allow_promos,
            gold_user: input.gold_user,
            gold_project: input.gold_project,
            country: input.country,
        };

        let candidates = self.load_candidates(&ctx).await;

        let Some(promo) = select_promotion(candidates, &ctx) else {
            tracing::debug!(
                project = %input.project,
                country = ?ctx.country,
                "No promotion selected"
            );
            return SelectPromoOutput::nothing();
        };

        let hash = TokenHash::generate();
        self.issue_token(&promo, &hash, &input.project).await;
        self.counter
            .record(promo.id, CounterKind::Offer, Some(&input.project))
            .await;

        tracing::info!(
            promo_id = %promo.id,
            project = %input.project,
            gold_user = input.gold_user,
            gold_project = input.gold_project,
            "Offered promotion"
        );

        SelectPromoOutput {
            promo: Some(PromoData {
                promo_id: promo.id,
                link: self.config.click_url(promo.id, &hash),
                image: self.config.view_url(promo.id, &hash),
                name: promo.name,
                text: promo.text,
                hash,
            }),
        }
    }

    async fn load_candidates(&self, ctx: &SelectionContext) -> Candidates {
        let timeout = self.config.store_timeout;
        let mut candidates = Candidates::default();

        // Without a country no ordinary candidate can be chosen
        if ctx.show_promo() && ctx.country.is_some() {
            let live = self.promotion_repo.find_live(self.config.display_type);
            match bounded(timeout, live).await {
                Ok(mut promos) => {
                    self.order.arrange(&mut promos);
                    candidates.ordinary = promos;
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to load promotion candidates");
                }
            }
        }

        if ctx.gold_user {
            candidates.gold_user = self.find_named(&self.config.gold_user_promo_name).await;
        }

        if ctx.gold_project {
            candidates.gold_project = self.find_named(&self.config.gold_project_promo_name).await;
        }

        candidates
    }

    async fn find_named(&self, name: &str) -> Option<Promotion> {
        let lookup = self.promotion_repo.find_live_by_name(name);
        match bounded(self.config.store_timeout, lookup).await {
            Ok(promo) => promo,
            Err(e) => {
                tracing::warn!(name = name, error = %e, "Failed to load named promotion");
                None
            }
        }
    }

    async fn issue_token(&self, promo: &Promotion, hash: &TokenHash, project: &ProjectSlug) {
        let token = ValidationToken::new(
            promo.id,
            hash.clone(),
            Some(project.clone()),
            self.config.token_ttl_ms(),
        );

        if let Err(e) = bounded(self.config.store_timeout, self.token_store.issue(&token)).await {
            // The offer is still shown; its views and clicks will not count
            tracing::warn!(
                promo_id = %promo.id,
                project = %project,
                error = %e,
                "Failed to issue validation token"
            );
        }
    }
}
