//! Error types for route sequencing.
//!
//! Configuration errors are fatal and surface once, when an optimizer is built.
//! Request errors are per-call and are rendered as structured responses by the
//! service layer.

use thiserror::Error;

/// Invalid or unreadable optimizer / application configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Failures of the append-only route log
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("route log IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("route log line {line} is corrupt: {source}")]
    Corrupt {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("cannot encode route record: {0}")]
    Encode(#[source] serde_json::Error),
}

/// Failures of a place-name lookup
#[derive(Debug, Error)]
pub enum GeocodeError {
    #[error("could not find coordinates for '{0}'")]
    NotFound(String),

    #[error("cannot load gazetteer: {0}")]
    Load(String),
}

/// Per-request errors reported back to the caller
#[derive(Debug, Error)]
pub enum RouteError {
    #[error("at least two locations are required (got {found})")]
    InsufficientPoints { found: usize },

    #[error("invalid location format or missing coordinates ({dropped} dropped, {remaining} usable)")]
    MalformedPoint { dropped: usize, remaining: usize },

    #[error("could not find coordinates for '{name}'")]
    GeocodingNotFound { name: String },

    #[error("invalid route data: {0}")]
    InvalidRoute(String),

    #[error(transparent)]
    Storage(#[from] StoreError),

    #[error("geocoder unavailable: {0}")]
    Geocoder(String),
}

impl RouteError {
    /// Stable tag used in response bodies
    pub fn kind(&self) -> &'static str {
        match self {
            RouteError::InsufficientPoints { .. } => "insufficient_points",
            RouteError::MalformedPoint { .. } => "malformed_point",
            RouteError::GeocodingNotFound { .. } => "geocoding_not_found",
            RouteError::InvalidRoute(_) => "invalid_route",
            RouteError::Storage(_) => "storage",
            RouteError::Geocoder(_) => "geocoder",
        }
    }
}

impl From<GeocodeError> for RouteError {
    fn from(err: GeocodeError) -> Self {
        match err {
            GeocodeError::NotFound(name) => RouteError::GeocodingNotFound { name },
            GeocodeError::Load(msg) => RouteError::Geocoder(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(RouteError::InsufficientPoints { found: 1 }.kind(), "insufficient_points");
        assert_eq!(
            RouteError::MalformedPoint { dropped: 2, remaining: 1 }.kind(),
            "malformed_point"
        );
    }

    #[test]
    fn test_geocode_not_found_keeps_name() {
        let err: RouteError = GeocodeError::NotFound("Atlantis".to_string()).into();
        match err {
            RouteError::GeocodingNotFound { ref name } => assert_eq!(name, "Atlantis"),
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(err.to_string().contains("Atlantis"));
    }
}
