//! API DTOs (Data Transfer Objects)

use serde::{Deserialize, Serialize};

use crate::application::promo_stats::PromoStatsOutput;
use crate::application::select_promo::{PromoData, SelectPromoOutput};
use crate::domain::value_objects::ProjectSlug;

// ============================================================================
// Offer
// ============================================================================

/// Project the footer is rendered for
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectContext {
    pub slug: ProjectSlug,
    /// Project opted in to community ads
    #[serde(default = "default_true")]
    pub allow_promos: bool,
    #[serde(default)]
    pub gold_project: bool,
}

/// Request for POST /api/promo/offer
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferRequest {
    pub project: ProjectContext,
    #[serde(default)]
    pub gold_user: bool,
}

/// Response for POST /api/promo/offer
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferResponse {
    pub promo: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub promo_data: Option<PromoDataResponse>,
}

/// Promotion payload rendered into the footer
#[derive(Debug, Clone, Serialize)]
pub struct PromoDataResponse {
    pub id: i64,
    pub name: String,
    pub text: String,
    /// Click-counting URL
    pub link: String,
    /// View-counting URL
    pub image: String,
    pub hash: String,
}

impl From<PromoData> for PromoDataResponse {
    fn from(data: PromoData) -> Self {
        Self {
            id: data.promo_id.get(),
            name: data.name,
            text: data.text,
            link: data.link,
            image: data.image,
            hash: data.hash.as_str().to_string(),
        }
    }
}

impl From<SelectPromoOutput> for OfferResponse {
    fn from(output: SelectPromoOutput) -> Self {
        Self {
            promo: output.displayed(),
            promo_data: output.promo.map(PromoDataResponse::from),
        }
    }
}

fn default_true() -> bool {
    true
}

// ============================================================================
// Stats
// ============================================================================

/// Query for GET /api/promo/{promo_id}/stats
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StatsQuery {
    pub project: Option<ProjectSlug>,
}

/// Response for GET /api/promo/{promo_id}/stats
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub promo_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    pub offers: i64,
    pub views: i64,
    pub clicks: i64,
    pub view_ratio: f64,
    pub click_ratio: f64,
}

impl From<PromoStatsOutput> for StatsResponse {
    fn from(output: PromoStatsOutput) -> Self {
        Self {
            promo_id: output.promo_id.get(),
            project: output.project.map(ProjectSlug::into_inner),
            offers: output.counts.offers,
            views: output.counts.views,
            clicks: output.counts.clicks,
            view_ratio: output.view_ratio,
            click_ratio: output.click_ratio,
        }
    }
}
