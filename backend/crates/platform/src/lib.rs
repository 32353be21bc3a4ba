//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Client identification (IP extraction behind reverse proxies)
//! - Token randomness and URL-safe encoding
//! - IP to country geolocation

pub mod client;
pub mod crypto;
pub mod geo;
