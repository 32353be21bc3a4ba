//! Slug Value Object
//!
//! URL-safe identifier for projects and promotions. Slugs arrive from
//! callers and from token storage, so they are validated once at the edge and
//! carried as [`Slug`] afterwards.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Longest slug accepted, matching the storage column width
pub const MAX_SLUG_LEN: usize = 255;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SlugError {
    #[error("Slug must not be empty")]
    Empty,

    #[error("Slug exceeds {MAX_SLUG_LEN} characters")]
    TooLong,

    #[error("Slug contains invalid character {0:?}")]
    InvalidChar(char),
}

/// Lowercase ASCII slug: `[a-z0-9_-]{1,255}`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Slug(String);

impl Slug {
    pub fn parse(s: &str) -> Result<Self, SlugError> {
        if s.is_empty() {
            return Err(SlugError::Empty);
        }
        if s.len() > MAX_SLUG_LEN {
            return Err(SlugError::TooLong);
        }
        if let Some(c) = s
            .chars()
            .find(|c| !(c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-' || *c == '_'))
        {
            return Err(SlugError::InvalidChar(c));
        }
        Ok(Self(s.to_string()))
    }

    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    #[inline]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl FromStr for Slug {
    type Err = SlugError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Slug::parse(s)
    }
}

impl TryFrom<String> for Slug {
    type Error = SlugError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Slug::parse(&value)
    }
}

impl From<Slug> for String {
    fn from(slug: Slug) -> Self {
        slug.0
    }
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid() {
        let slug = Slug::parse("pip").unwrap();
        assert_eq!(slug.as_str(), "pip");
        assert!(Slug::parse("read-the_docs-2").is_ok());
    }

    #[test]
    fn test_parse_invalid() {
        assert_eq!(Slug::parse(""), Err(SlugError::Empty));
        assert_eq!(Slug::parse("Pip"), Err(SlugError::InvalidChar('P')));
        assert_eq!(Slug::parse("a b"), Err(SlugError::InvalidChar(' ')));
        assert_eq!(
            Slug::parse(&"a".repeat(MAX_SLUG_LEN + 1)),
            Err(SlugError::TooLong)
        );
    }

    #[test]
    fn test_serde_validates() {
        let slug: Slug = serde_json::from_str(r#""pip""#).unwrap();
        assert_eq!(slug.to_string(), "pip");
        assert!(serde_json::from_str::<Slug>(r#""../etc""#).is_err());
    }
}
