//! Promo Router

use axum::{
    Router,
    routing::{get, post},
};
use platform::geo::CountryLookup;
use std::sync::Arc;

use crate::application::config::PromoConfig;
use crate::domain::repository::{ImpressionRepository, PromotionRepository, TokenStore};
use crate::domain::services::{CandidateOrder, RandomOrder};
use crate::infra::postgres::PgPromoRepository;
use crate::presentation::handlers::{self, PromoAppState};

/// Create the promo router with PostgreSQL repository
pub fn promo_router(
    repo: PgPromoRepository,
    config: PromoConfig,
    geo: Arc<dyn CountryLookup>,
) -> Router {
    promo_router_generic(repo, config, geo, Arc::new(RandomOrder))
}

/// Create a generic promo router for any repository implementation
pub fn promo_router_generic<R>(
    repo: R,
    config: PromoConfig,
    geo: Arc<dyn CountryLookup>,
    order: Arc<dyn CandidateOrder>,
) -> Router
where
    R: PromotionRepository + ImpressionRepository + TokenStore + Clone + Send + Sync + 'static,
{
    let state = PromoAppState {
        repo: Arc::new(repo),
        config: Arc::new(config),
        geo,
        order,
    };

    Router::new()
        .route("/offer", post(handlers::offer_promo::<R>))
        .route("/view/{promo_id}/{hash}", get(handlers::view_redirect::<R>))
        .route("/click/{promo_id}/{hash}", get(handlers::click_redirect::<R>))
        .route("/{promo_id}/stats", get(handlers::promo_stats::<R>))
        .with_state(state)
}
