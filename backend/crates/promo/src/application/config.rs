//! Application Configuration
//!
//! Configuration for the promotion application layer.

use std::time::Duration;

use crate::domain::value_objects::{DisplayType, PromoId, TokenHash};

/// Promotion application configuration
#[derive(Debug, Clone)]
pub struct PromoConfig {
    /// Global kill switch (`USE_PROMOS`)
    pub use_promos: bool,
    /// Surface ordinary candidates are drawn from
    pub display_type: DisplayType,
    /// Lifetime of a validation token; never renewed
    pub token_ttl: Duration,
    /// Upper bound for every token/counter store call
    pub store_timeout: Duration,
    /// How often expired tokens are swept from the store
    pub token_cleanup_interval: Duration,
    /// Reverse proxies in front of the server; 0 ignores `X-Forwarded-For`
    pub trusted_proxies: usize,
    /// Prefix of the view/click redirect URLs handed to clients
    pub redirect_base: String,
    /// Name of the thank-you promotion for gold users
    pub gold_user_promo_name: String,
    /// Name of the thank-you promotion for gold projects
    pub gold_project_promo_name: String,
}

impl Default for PromoConfig {
    fn default() -> Self {
        Self {
            use_promos: true,
            display_type: DisplayType::Doc,
            token_ttl: Duration::from_secs(3600),
            store_timeout: Duration::from_secs(2),
            token_cleanup_interval: Duration::from_secs(600),
            trusted_proxies: 0,
            redirect_base: "/api/promo".to_string(),
            gold_user_promo_name: "gold-user".to_string(),
            gold_project_promo_name: "gold-project".to_string(),
        }
    }
}

impl PromoConfig {
    /// Config with promotions switched off
    pub fn disabled() -> Self {
        Self {
            use_promos: false,
            ..Default::default()
        }
    }

    pub fn token_ttl_ms(&self) -> i64 {
        self.token_ttl.as_millis() as i64
    }

    /// URL that counts a click, then redirects to the promotion link
    pub fn click_url(&self, promo_id: PromoId, hash: &TokenHash) -> String {
        format!("{}/click/{}/{}", self.base(), promo_id, hash)
    }

    /// URL that counts a view, then redirects to the promotion image
    pub fn view_url(&self, promo_id: PromoId, hash: &TokenHash) -> String {
        format!("{}/view/{}/{}", self.base(), promo_id, hash)
    }

    fn base(&self) -> &str {
        self.redirect_base.trim_end_matches('/')
    }
}
