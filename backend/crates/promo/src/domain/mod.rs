//! Domain Layer - Business logic and entities
//!
//! This layer contains:
//! - Domain entities (Promotion, GeoFilter, ValidationToken, ImpressionCounts)
//! - Domain value objects (PromoId, TokenHash, CountryCode, counter kinds)
//! - Domain services (geo rule evaluation, selection policy)
//! - Repository traits (interfaces)

pub mod entities;
pub mod repository;
pub mod services;
pub mod value_objects;
