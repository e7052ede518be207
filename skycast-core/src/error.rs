use std::fmt;

use thiserror::Error;

/// Broad reason an adapter could not produce a payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterErrorKind {
    /// Network, TLS or status-level failure of the HTTP call.
    Transport,
    /// Body could not be parsed or had an unexpected shape.
    Malformed,
    /// The provider answered with its own error object.
    Upstream,
    NotFound,
    InvalidQuery,
    /// The adapter cannot serve this kind of request (e.g. forecasts).
    Unsupported,
    Timeout,
}

impl AdapterErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdapterErrorKind::Transport => "transport",
            AdapterErrorKind::Malformed => "malformed-payload",
            AdapterErrorKind::Upstream => "upstream-error",
            AdapterErrorKind::NotFound => "not-found",
            AdapterErrorKind::InvalidQuery => "invalid-query",
            AdapterErrorKind::Unsupported => "unsupported",
            AdapterErrorKind::Timeout => "timeout",
        }
    }
}

impl fmt::Display for AdapterErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure of a single adapter. Always recovered by the resolver.
#[derive(Debug, Clone, Error)]
#[error("{kind}: {message}")]
pub struct AdapterError {
    pub kind: AdapterErrorKind,
    pub message: String,
}

impl AdapterError {
    pub fn new(kind: AdapterErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: message.into() }
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(AdapterErrorKind::Transport, message)
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(AdapterErrorKind::Malformed, message)
    }

    pub fn upstream(message: impl Into<String>) -> Self {
        Self::new(AdapterErrorKind::Upstream, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(AdapterErrorKind::NotFound, message)
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::new(AdapterErrorKind::Unsupported, message)
    }
}

impl From<reqwest::Error> for AdapterError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AdapterError::new(AdapterErrorKind::Timeout, err.to_string())
        } else if err.is_decode() {
            AdapterError::malformed(err.to_string())
        } else {
            AdapterError::transport(err.to_string())
        }
    }
}

/// Terminal outcome once every adapter in the chain has failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ResolutionError {
    #[error("no provider returned valid weather data")]
    NoValidData,
    #[error("no provider returned a forecast")]
    ForecastNotAvailable,
}

impl ResolutionError {
    /// Stable code used in structured error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            ResolutionError::NoValidData => "no-valid-data",
            ResolutionError::ForecastNotAvailable => "forecast-not-available",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adapter_error_display_includes_kind() {
        let err = AdapterError::not_found("no row for 'Atlantis'");
        assert_eq!(err.to_string(), "not-found: no row for 'Atlantis'");
    }

    #[test]
    fn resolution_codes_are_stable() {
        assert_eq!(ResolutionError::NoValidData.code(), "no-valid-data");
        assert_eq!(ResolutionError::ForecastNotAvailable.code(), "forecast-not-available");
    }
}
