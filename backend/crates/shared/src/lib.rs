//! Shared Kernel - Vocabulary shared by every promotion crate
//!
//! This crate holds the small set of types whose meaning does not change
//! between layers:
//! - The unified [`error::app_error::AppError`] and its [`error::kind::ErrorKind`]
//! - The [`slug::Slug`] value object used for project and promotion slugs
//!
//! HTTP integration is behind the `axum` feature so that domain crates can
//! depend on the kernel without pulling in a web framework.

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod kind;
}
pub mod slug;
