//! IP Geolocation
//!
//! Resolves a client IP to an ISO 3166-1 alpha-2 country code. Lookups never
//! fail outward: a bad address, an address missing from the database or a
//! corrupt record all come back as `None`.

use std::net::IpAddr;
use std::path::Path;

use maxminddb::geoip2;
use thiserror::Error;

/// Errors raised while opening a geolocation database
#[derive(Debug, Error)]
pub enum GeoError {
    #[error("Failed to open geo database {path}: {source}")]
    Open {
        path: String,
        #[source]
        source: maxminddb::MaxMindDBError,
    },
}

/// IP to country resolution
pub trait CountryLookup: Send + Sync {
    /// Upper-case two letter country code, if known
    fn country_code(&self, ip: IpAddr) -> Option<String>;
}

/// Used when no database is configured; geo filtering is skipped entirely.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCountryLookup;

impl CountryLookup for NoCountryLookup {
    fn country_code(&self, _ip: IpAddr) -> Option<String> {
        None
    }
}

/// MaxMind country/city database reader, loaded fully into memory
pub struct MaxMindCountryLookup {
    reader: maxminddb::Reader<Vec<u8>>,
}

impl MaxMindCountryLookup {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, GeoError> {
        let path = path.as_ref();
        let reader = maxminddb::Reader::open_readfile(path).map_err(|source| GeoError::Open {
            path: path.display().to_string(),
            source,
        })?;

        tracing::info!(
            path = %path.display(),
            database_type = %reader.metadata.database_type,
            "Opened geo database"
        );

        Ok(Self { reader })
    }
}

impl CountryLookup for MaxMindCountryLookup {
    fn country_code(&self, ip: IpAddr) -> Option<String> {
        match self.reader.lookup::<geoip2::Country>(ip) {
            Ok(record) => record
                .country
                .and_then(|c| c.iso_code)
                .map(|code| code.to_ascii_uppercase()),
            Err(maxminddb::MaxMindDBError::AddressNotFoundError(_)) => None,
            Err(e) => {
                tracing::debug!(ip = %ip, error = %e, "Geo lookup failed");
                None
            }
        }
    }
}

impl std::fmt::Debug for MaxMindCountryLookup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MaxMindCountryLookup")
            .field("database_type", &self.reader.metadata.database_type)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_lookup_is_always_unknown() {
        let lookup = NoCountryLookup;
        assert_eq!(lookup.country_code("8.8.8.8".parse().unwrap()), None);
        assert_eq!(lookup.country_code("::1".parse().unwrap()), None);
    }

    #[test]
    fn test_open_missing_database() {
        let result = MaxMindCountryLookup::open("/nonexistent/GeoLite2-Country.mmdb");
        assert!(matches!(result, Err(GeoError::Open { .. })));
    }
}
