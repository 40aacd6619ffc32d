use thiserror::Error;

/// Top-level error type for the `mobius-api` crate.
///
/// Covers the three failure families the Mobius API can produce:
/// no response at all (transport), an authentication rejection (401),
/// and any other non-2xx status surfaced with its body.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// The server answered 401. The session token has already been cleared
    /// by the time the caller sees this.
    #[error("Unauthorized: {message}")]
    Unauthorized { message: String },

    // ── Throttling ──────────────────────────────────────────────────
    /// HTTP 429. `retry_after_secs` is taken from `Retry-After` when present.
    #[error("Rate limited{}", retry_after_secs.map(|s| format!(" -- retry after {s}s")).unwrap_or_default())]
    RateLimited { retry_after_secs: Option<u64> },

    // ── API ─────────────────────────────────────────────────────────
    /// Any other non-2xx response, carrying status and raw body verbatim.
    #[error("API error (HTTP {status}): {message}")]
    Api {
        status: u16,
        message: String,
        code: Option<String>,
        body: String,
    },

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, timeout, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// An identifier that cannot be used as a single path segment
    /// (empty, `.` or `..`).
    #[error("Invalid path segment: {0:?}")]
    InvalidPathSegment(String),

    /// TLS setup or certificate error.
    #[error("TLS error: {0}")]
    Tls(String),

    /// A header value could not be encoded (e.g. a token with control bytes).
    #[error("Invalid header value: {0}")]
    InvalidHeader(String),

    // ── WebSocket ───────────────────────────────────────────────────
    /// WebSocket URL could not be built or the handshake failed.
    #[error("WebSocket connection failed: {0}")]
    WebSocketConnect(String),

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// HTTP status associated with this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized { .. } => Some(401),
            Self::RateLimited { .. } => Some(429),
            Self::Api { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Returns `true` if the server rejected the session.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    /// Returns `true` if no response was received at all.
    pub fn is_network(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_connect() || e.is_timeout() || e.is_request(),
            _ => false,
        }
    }

    /// Returns `true` if this is a transient error worth retrying by hand.
    ///
    /// The client itself never retries.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::RateLimited { .. } | Self::WebSocketConnect(_) => true,
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        self.status() == Some(404)
    }

    /// Extract the API error code, if the server sent one.
    pub fn api_error_code(&self) -> Option<&str> {
        match self {
            Self::Api { code, .. } => code.as_deref(),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_is_reported_per_variant() {
        let unauthorized = Error::Unauthorized {
            message: "Invalid credentials".into(),
        };
        assert_eq!(unauthorized.status(), Some(401));
        assert!(unauthorized.is_unauthorized());

        let limited = Error::RateLimited {
            retry_after_secs: Some(30),
        };
        assert_eq!(limited.status(), Some(429));
        assert!(limited.is_transient());

        let missing = Error::Api {
            status: 404,
            message: "Device not found".into(),
            code: Some("Not Found".into()),
            body: String::new(),
        };
        assert!(missing.is_not_found());
        assert_eq!(missing.api_error_code(), Some("Not Found"));
        assert!(!missing.is_transient());
    }

    #[test]
    fn rate_limited_display_includes_retry_hint() {
        let with_hint = Error::RateLimited {
            retry_after_secs: Some(12),
        };
        assert_eq!(with_hint.to_string(), "Rate limited -- retry after 12s");

        let without = Error::RateLimited {
            retry_after_secs: None,
        };
        assert_eq!(without.to_string(), "Rate limited");
    }
}
