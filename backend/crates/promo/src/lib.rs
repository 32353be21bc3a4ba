//! Promotion Impression Counting Module
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, geo rules, selection policy, repository traits
//! - `application/` - Use cases (offer, view/click recording, stats)
//! - `infra/` - PostgreSQL and in-memory implementations
//! - `presentation/` - HTTP handlers
//!
//! ## Counting Model
//! - Every offer issues a random, single-use validation token that expires
//!   after one hour
//! - View and click URLs carry the token; only its first use is counted
//! - Forged, reused and expired tokens still redirect, silently uncounted
//! - Counters are kept globally and per consuming project

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::config::PromoConfig;
pub use application::token_sweeper::spawn_token_sweeper;
pub use domain::services::{CandidateOrder, RandomOrder, StoredOrder};
pub use error::{PromoError, PromoResult};
pub use infra::memory::MemoryPromoStore;
pub use infra::postgres::PgPromoRepository;
pub use presentation::router::{promo_router, promo_router_generic};

// Re-export kernel error types for unified error handling
pub use kernel::error::{app_error::AppError, kind::ErrorKind};
