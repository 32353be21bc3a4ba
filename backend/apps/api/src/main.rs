//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors; request-level errors are handled
//! inside the `promo` crate.

use anyhow::Context;
use axum::{
    Router, http,
    http::{Method, header},
};
use platform::geo::{CountryLookup, MaxMindCountryLookup, NoCountryLookup};
use promo::{PgPromoRepository, PromoConfig, promo_router, spawn_token_sweeper};
use sqlx::postgres::PgPoolOptions;
use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:31113";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "promo_api=info,promo=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Database connection
    let database_url =
        env::var("DATABASE_URL").context("DATABASE_URL must be set in environment")?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("../../../database/migrations")
        .run(&pool)
        .await?;

    tracing::info!("Migrations completed");

    let promo_config = load_promo_config();
    tracing::info!(
        use_promos = promo_config.use_promos,
        redirect_base = %promo_config.redirect_base,
        trusted_proxies = promo_config.trusted_proxies,
        "Promo configuration loaded"
    );

    // Expired validation tokens are swept at startup and then periodically.
    // Sweep failures are logged and never prevent serving.
    let promo_store = PgPromoRepository::new(pool.clone());
    spawn_token_sweeper(Arc::new(promo_store.clone()), &promo_config);

    let geo = load_geo_lookup();

    // CORS configuration
    let frontend_origins = env::var("FRONTEND_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:40922,http://127.0.0.1:40922".to_string());

    let allowed_origins: Vec<http::HeaderValue> = frontend_origins
        .split(',')
        .filter_map(|origin| origin.trim().parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([header::CONTENT_TYPE, header::ACCEPT]));

    // Build router
    let app = Router::new()
        .nest("/api/promo", promo_router(promo_store, promo_config, geo))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    let addr: SocketAddr = env::var("BIND_ADDR")
        .unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string())
        .parse()
        .context("BIND_ADDR must be a socket address")?;
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// Promo settings from the environment, defaults otherwise
fn load_promo_config() -> PromoConfig {
    let mut config = PromoConfig::default();

    if let Ok(value) = env::var("USE_PROMOS") {
        match parse_flag(&value) {
            Some(flag) => config.use_promos = flag,
            None => tracing::warn!(value = %value, "Ignoring unrecognised USE_PROMOS value"),
        }
    }

    if let Ok(base) = env::var("PROMO_REDIRECT_BASE") {
        config.redirect_base = base;
    }

    if let Ok(value) = env::var("PROMO_TRUSTED_PROXIES") {
        match value.trim().parse::<usize>() {
            Ok(count) => config.trusted_proxies = count,
            Err(_) => {
                tracing::warn!(value = %value, "Ignoring invalid PROMO_TRUSTED_PROXIES value")
            }
        }
    }

    if let Ok(value) = env::var("PROMO_TOKEN_CLEANUP_SECS") {
        match value.trim().parse::<u64>() {
            Ok(secs) if secs > 0 => config.token_cleanup_interval = Duration::from_secs(secs),
            _ => tracing::warn!(value = %value, "Ignoring invalid PROMO_TOKEN_CLEANUP_SECS value"),
        }
    }

    config
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// Geo database from `PROMO_GEO_PATH`; without one, geo targeting is off
fn load_geo_lookup() -> Arc<dyn CountryLookup> {
    let Ok(path) = env::var("PROMO_GEO_PATH") else {
        tracing::info!("PROMO_GEO_PATH not set, geo targeting disabled");
        return Arc::new(NoCountryLookup);
    };

    match MaxMindCountryLookup::open(&path) {
        Ok(lookup) => Arc::new(lookup),
        Err(e) => {
            tracing::warn!(error = %e, "Geo database unavailable, geo targeting disabled");
            Arc::new(NoCountryLookup)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::parse_flag;

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("true"), Some(true));
        assert_eq!(parse_flag(" ON "), Some(true));
        assert_eq!(parse_flag("0"), Some(false));
        assert_eq!(parse_flag("False"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }
}
