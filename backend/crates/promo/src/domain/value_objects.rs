//! Domain Value Objects
//!
//! Immutable value types for the promotion domain.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Consuming project (serving context) identifier
pub use kernel::slug::Slug as ProjectSlug;

/// Longest token hash accepted from a client URL
pub const MAX_TOKEN_HASH_LEN: usize = 128;

// ============================================================================
// PromoId
// ============================================================================

/// Promotion primary key (always positive)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PromoId(i64);

impl PromoId {
    pub fn new(id: i64) -> Option<Self> {
        (id > 0).then_some(Self(id))
    }

    /// Parse a path segment. Anything that is not a positive integer is
    /// treated the same as an id with no matching row.
    pub fn parse(s: &str) -> Option<Self> {
        s.parse::<i64>().ok().and_then(Self::new)
    }

    #[inline]
    pub fn get(&self) -> i64 {
        self.0
    }
}

impl fmt::Display for PromoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// TokenHash
// ============================================================================

/// Opaque single-use token issued with an offer
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TokenHash(String);

impl TokenHash {
    /// Fresh random hash (URL-safe base64)
    pub fn generate() -> Self {
        Self(platform::crypto::random_token())
    }

    /// Validate a hash presented by a client. Rejects anything that could not
    /// have been issued so it never reaches the store.
    pub fn parse(s: &str) -> Option<Self> {
        let valid = !s.is_empty()
            && s.len() <= MAX_TOKEN_HASH_LEN
            && s
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        valid.then(|| Self(s.to_string()))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TokenHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// CountryCode
// ============================================================================

/// ISO 3166-1 alpha-2 country code, upper-case
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CountryCode(String);

impl CountryCode {
    pub fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        (s.len() == 2 && s.chars().all(|c| c.is_ascii_alphabetic()))
            .then(|| Self(s.to_ascii_uppercase()))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CountryCode {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        CountryCode::parse(&value).ok_or_else(|| format!("Invalid country code: {value}"))
    }
}

impl From<CountryCode> for String {
    fn from(code: CountryCode) -> Self {
        code.0
    }
}

impl fmt::Display for CountryCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// FilterType / DisplayType
// ============================================================================

/// Geo filter rule kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterType {
    /// Only countries in the set pass
    Include,
    /// Countries in the set are rejected
    Exclude,
}

impl FilterType {
    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Include => "include",
            Self::Exclude => "exclude",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "include" => Some(Self::Include),
            "exclude" => Some(Self::Exclude),
            _ => None,
        }
    }
}

/// Surface a promotion is designed for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DisplayType {
    /// Documentation page footer
    #[default]
    Doc,
    /// Main site footer
    SiteFooter,
}

impl DisplayType {
    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Doc => "doc",
            Self::SiteFooter => "site-footer",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "doc" => Some(Self::Doc),
            "site-footer" => Some(Self::SiteFooter),
            _ => None,
        }
    }
}

// ============================================================================
// Counter / token kinds
// ============================================================================

/// Impression counter column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CounterKind {
    Offer,
    View,
    Click,
}

impl CounterKind {
    /// Storage column for this counter
    #[inline]
    pub const fn column(&self) -> &'static str {
        match self {
            Self::Offer => "offers",
            Self::View => "views",
            Self::Click => "clicks",
        }
    }
}

/// User-driven event that must present a validation token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackedEvent {
    View,
    Click,
}

impl TrackedEvent {
    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Click => "click",
        }
    }
}

impl From<TrackedEvent> for CounterKind {
    fn from(event: TrackedEvent) -> Self {
        match event {
            TrackedEvent::View => CounterKind::View,
            TrackedEvent::Click => CounterKind::Click,
        }
    }
}

/// Entry kinds written for every issued token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    View,
    Click,
    /// Serving context (project slug) the offer was made under
    ProjectContext,
}

impl TokenKind {
    pub const ALL: [TokenKind; 3] = [TokenKind::View, TokenKind::Click, TokenKind::ProjectContext];

    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Click => "click",
            Self::ProjectContext => "project",
        }
    }
}

impl From<TrackedEvent> for TokenKind {
    fn from(event: TrackedEvent) -> Self {
        match event {
            TrackedEvent::View => TokenKind::View,
            TrackedEvent::Click => TokenKind::Click,
        }
    }
}
