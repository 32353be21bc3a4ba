//! Domain Entities
//!
//! Core business entities for the promotion domain.

use chrono::Utc;

use crate::domain::services::is_eligible;
use crate::domain::value_objects::{
    CountryCode, DisplayType, FilterType, ProjectSlug, PromoId, TokenHash,
};

/// One include/exclude rule attached to a promotion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeoFilter {
    pub filter_type: FilterType,
    pub countries: Vec<CountryCode>,
}

impl GeoFilter {
    pub fn include(countries: Vec<CountryCode>) -> Self {
        Self {
            filter_type: FilterType::Include,
            countries,
        }
    }

    pub fn exclude(countries: Vec<CountryCode>) -> Self {
        Self {
            filter_type: FilterType::Exclude,
            countries,
        }
    }

    #[inline]
    pub fn contains(&self, country: &CountryCode) -> bool {
        self.countries.contains(country)
    }
}

/// Promotion entity - read-only to this service
#[derive(Debug, Clone, PartialEq)]
pub struct Promotion {
    pub id: PromoId,
    /// Lookup name, e.g. `gold-user` for the gold thank-you promotion
    pub name: String,
    pub slug: String,
    pub text: String,
    /// Click destination
    pub link: String,
    /// Image served on view
    pub image: String,
    pub display_type: DisplayType,
    pub live: bool,
    /// Evaluated in order
    pub geo_filters: Vec<GeoFilter>,
}

impl Promotion {
    /// Whether this promotion may be shown to a visitor from `country`
    pub fn is_shown_in(&self, country: &CountryCode) -> bool {
        is_eligible(&self.geo_filters, country)
    }
}

/// ValidationToken entity - issued with every offer, consumed by view/click
#[derive(Debug, Clone)]
pub struct ValidationToken {
    pub promo_id: PromoId,
    pub hash: TokenHash,
    pub project: Option<ProjectSlug>,
    pub expires_at_ms: i64,
}

impl ValidationToken {
    /// Create a new token expiring `ttl_ms` from now
    pub fn new(promo_id: PromoId, hash: TokenHash, project: Option<ProjectSlug>, ttl_ms: i64) -> Self {
        Self {
            promo_id,
            hash,
            project,
            expires_at_ms: Utc::now().timestamp_millis() + ttl_ms,
        }
    }

    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp_millis() > self.expires_at_ms
    }
}

/// Result of presenting a token for a view or click
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsumeOutcome {
    /// First use; `project` is the serving context recorded at issue time
    Fresh { project: Option<ProjectSlug> },
    /// Token exists but was already spent
    AlreadyUsed,
    /// Never issued, expired, or evicted
    Invalid,
}

impl ConsumeOutcome {
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Fresh { .. } => "fresh",
            Self::AlreadyUsed => "already_used",
            Self::Invalid => "invalid",
        }
    }
}

/// Aggregate impression counters, global or per project
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImpressionCounts {
    pub offers: i64,
    pub views: i64,
    pub clicks: i64,
}

impl ImpressionCounts {
    /// views / offers, 0 when nothing was offered
    pub fn view_ratio(&self) -> f64 {
        ratio(self.views, self.offers)
    }

    /// clicks / views, 0 when nothing was viewed
    pub fn click_ratio(&self) -> f64 {
        ratio(self.clicks, self.views)
    }
}

fn ratio(numerator: i64, denominator: i64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}
