//! Application Layer - Use Cases
//!
//! This layer orchestrates domain logic and infrastructure.
//! Contains use case implementations.

pub mod config;
pub mod counter;
pub mod promo_stats;
pub mod record_event;
pub mod select_promo;
pub mod token_sweeper;

use std::future::Future;
use std::time::Duration;

use crate::error::{PromoError, PromoResult};

/// Run a store call with an upper bound on its duration
pub(crate) async fn bounded<T, F>(limit: Duration, fut: F) -> PromoResult<T>
where
    F: Future<Output = PromoResult<T>>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result,
        Err(_) => Err(PromoError::StoreTimeout),
    }
}
