//! HTTP Handlers

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Json;
use axum::extract::{ConnectInfo, Path, Query, State};
use axum::http::{HeaderMap, HeaderName, StatusCode, header};
use kernel::error::app_error::AppResult;
use platform::client::extract_client_ip;
use platform::geo::CountryLookup;

use crate::application::config::PromoConfig;
use crate::application::promo_stats::PromoStatsUseCase;
use crate::application::record_event::RecordEventUseCase;
use crate::application::select_promo::{SelectPromoInput, SelectPromoUseCase};
use crate::domain::repository::{ImpressionRepository, PromotionRepository, TokenStore};
use crate::domain::services::CandidateOrder;
use crate::domain::value_objects::{CountryCode, PromoId, TrackedEvent};
use crate::error::{PromoError, PromoResult};
use crate::presentation::dto::{OfferRequest, OfferResponse, StatsQuery, StatsResponse};

/// 302 with a `Location` header
type Redirect = (StatusCode, [(HeaderName, String); 1]);

/// Shared state for promo handlers
#[derive(Clone)]
pub struct PromoAppState<R>
where
    R: PromotionRepository + ImpressionRepository + TokenStore + Clone + Send + Sync + 'static,
{
    pub repo: Arc<R>,
    pub config: Arc<PromoConfig>,
    pub geo: Arc<dyn CountryLookup>,
    pub order: Arc<dyn CandidateOrder>,
}

/// POST /api/promo/offer
pub async fn offer_promo<R>(
    State(state): State<PromoAppState<R>>,
    headers: HeaderMap,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(req): Json<OfferRequest>,
) -> Json<OfferResponse>
where
    R: PromotionRepository + ImpressionRepository + TokenStore + Clone + Send + Sync + 'static,
{
    let country = extract_client_ip(&headers, Some(addr.ip()), state.config.trusted_proxies)
        .and_then(|ip| state.geo.country_code(ip))
        .and_then(|code| CountryCode::parse(&code));

    let use_case = SelectPromoUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.repo.clone(),
        state.order.clone(),
        state.config.clone(),
    );

    let input = SelectPromoInput {
        project: req.project.slug,
        allow_promos: req.project.allow_promos,
        gold_user: req.gold_user,
        gold_project: req.project.gold_project,
        country,
    };

    Json(use_case.execute(input).await.into())
}

/// GET /api/promo/view/{promo_id}/{hash}
pub async fn view_redirect<R>(
    State(state): State<PromoAppState<R>>,
    Path((promo_id, hash)): Path<(String, String)>,
) -> PromoResult<Redirect>
where
    R: PromotionRepository + ImpressionRepository + TokenStore + Clone + Send + Sync + 'static,
{
    track_and_redirect(state, &promo_id, &hash, TrackedEvent::View).await
}

/// GET /api/promo/click/{promo_id}/{hash}
pub async fn click_redirect<R>(
    State(state): State<PromoAppState<R>>,
    Path((promo_id, hash)): Path<(String, String)>,
) -> PromoResult<Redirect>
where
    R: PromotionRepository + ImpressionRepository + TokenStore + Clone + Send + Sync + 'static,
{
    track_and_redirect(state, &promo_id, &hash, TrackedEvent::Click).await
}

/// GET /api/promo/{promo_id}/stats
pub async fn promo_stats<R>(
    State(state): State<PromoAppState<R>>,
    Path(promo_id): Path<String>,
    Query(query): Query<StatsQuery>,
) -> AppResult<Json<StatsResponse>>
where
    R: PromotionRepository + ImpressionRepository + TokenStore + Clone + Send + Sync + 'static,
{
    let promo_id = PromoId::parse(&promo_id).ok_or(PromoError::PromotionNotFound)?;

    let use_case =
        PromoStatsUseCase::new(state.repo.clone(), state.repo.clone(), state.config.clone());

    let output = use_case.execute(promo_id, query.project).await?;

    Ok(Json(output.into()))
}

async fn track_and_redirect<R>(
    state: PromoAppState<R>,
    raw_promo_id: &str,
    raw_hash: &str,
    event: TrackedEvent,
) -> PromoResult<Redirect>
where
    R: PromotionRepository + ImpressionRepository + TokenStore + Clone + Send + Sync + 'static,
{
    let promo_id = PromoId::parse(raw_promo_id).ok_or(PromoError::PromotionNotFound)?;

    let use_case = RecordEventUseCase::new(
        state.repo.clone(),
        state.repo.clone(),
        state.repo.clone(),
        state.config.clone(),
    );

    let output = use_case.execute(promo_id, raw_hash, event).await?;

    Ok((StatusCode::FOUND, [(header::LOCATION, output.redirect_to)]))
}
