//! CLI error types with miette diagnostics.
//!
//! Maps `mobius_api::Error` and `ConfigError` into user-facing errors
//! with actionable help text and stable exit codes.

use miette::Diagnostic;
use thiserror::Error;

use mobius_config::ConfigError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const PERMISSION: i32 = 5;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────
    #[error("Could not connect to the Mobius server at {url}")]
    #[diagnostic(
        code(mobius::connection_failed),
        help(
            "Check that the server is running and reachable.\n\
             Set the URL with: mobius config set-server <url>"
        )
    )]
    ConnectionFailed {
        url: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    #[error("TLS setup failed: {reason}")]
    #[diagnostic(
        code(mobius::tls_error),
        help(
            "Use --insecure (-k) to accept a self-signed certificate,\n\
             or set ca_cert in your profile."
        )
    )]
    TlsError { reason: String },

    // ── Authentication ───────────────────────────────────────────────
    #[error("Not authenticated: {message}")]
    #[diagnostic(
        code(mobius::auth_failed),
        help("The stored session was missing or rejected. Run: mobius login")
    )]
    AuthFailed { message: String },

    #[error("{reason}")]
    #[diagnostic(code(mobius::login_failed))]
    LoginFailed {
        reason: String,
        #[source]
        source: mobius_api::Error,
    },

    // ── Resources ────────────────────────────────────────────────────
    #[error("{resource_type} '{identifier}' not found")]
    #[diagnostic(
        code(mobius::not_found),
        help("Run: mobius {list_command} to see available {resource_type}s")
    )]
    NotFound {
        resource_type: String,
        identifier: String,
        list_command: String,
    },

    // ── API ──────────────────────────────────────────────────────────
    #[error("Rate limited by the server{}", retry_after_secs.map(|s| format!("; retry after {s}s")).unwrap_or_default())]
    #[diagnostic(code(mobius::rate_limited))]
    RateLimited { retry_after_secs: Option<u64> },

    #[error("API error{}: {message}", status.map(|s| format!(" (HTTP {s})")).unwrap_or_default())]
    #[diagnostic(code(mobius::api_error))]
    ApiError {
        status: Option<u16>,
        message: String,
    },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(mobius::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────
    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(mobius::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: mobius --profile {name} config set-server <url>"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error(transparent)]
    #[diagnostic(code(mobius::config))]
    Config(Box<ConfigError>),

    // ── Interactive ──────────────────────────────────────────────────
    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(mobius::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── Timeout ──────────────────────────────────────────────────────
    #[error("Request timed out")]
    #[diagnostic(
        code(mobius::timeout),
        help("Increase the timeout with --timeout or check server responsiveness.")
    )]
    Timeout,

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON payload: {0}")]
    #[diagnostic(code(mobius::json), help("Check the JSON input and try again."))]
    Json(#[from] serde_json::Error),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::TlsError { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } | Self::LoginFailed { .. } => exit_code::AUTH,
            Self::NotFound { .. } => exit_code::NOT_FOUND,
            Self::Timeout => exit_code::TIMEOUT,
            Self::Validation { .. } | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            Self::ApiError {
                status: Some(403), ..
            } => exit_code::PERMISSION,
            Self::ApiError {
                status: Some(409), ..
            } => exit_code::CONFLICT,
            _ => exit_code::GENERAL,
        }
    }

    /// Turn a 404 into a `NotFound` naming the resource.
    pub fn not_found(
        err: mobius_api::Error,
        resource_type: &str,
        identifier: &str,
        list_command: &str,
    ) -> Self {
        if err.is_not_found() {
            Self::NotFound {
                resource_type: resource_type.into(),
                identifier: identifier.into(),
                list_command: list_command.into(),
            }
        } else {
            err.into()
        }
    }
}

// ── mobius_api::Error → CliError ─────────────────────────────────────

impl From<mobius_api::Error> for CliError {
    fn from(err: mobius_api::Error) -> Self {
        use mobius_api::Error;

        match err {
            Error::Unauthorized { message } => Self::AuthFailed { message },
            Error::RateLimited { retry_after_secs } => Self::RateLimited { retry_after_secs },
            Error::Api {
                status, message, ..
            } => Self::ApiError {
                status: Some(status),
                message,
            },
            Error::Transport(e) if e.is_timeout() => Self::Timeout,
            Error::Transport(e) if e.is_connect() || e.is_request() => Self::ConnectionFailed {
                url: e
                    .url()
                    .map_or_else(|| "(unknown)".into(), ToString::to_string),
                source: Box::new(e),
            },
            other @ Error::Transport(_) => Self::ApiError {
                status: other.status(),
                message: other.to_string(),
            },
            Error::InvalidUrl(e) => Self::Validation {
                field: "server".into(),
                reason: e.to_string(),
            },
            Error::InvalidPathSegment(segment) => Self::Validation {
                field: "id".into(),
                reason: format!("{segment:?} is not a usable identifier"),
            },
            Error::Tls(reason) => Self::TlsError { reason },
            Error::InvalidHeader(reason) => Self::AuthFailed {
                message: format!("stored token is unusable ({reason})"),
            },
            Error::WebSocketConnect(reason) => Self::ConnectionFailed {
                url: "(realtime channel)".into(),
                source: reason.into(),
            },
            Error::Deserialization { message, .. } => Self::ApiError {
                status: None,
                message: format!("unexpected response: {message}"),
            },
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            ConfigError::UnknownProfile { name } => Self::ProfileNotFound {
                name,
                available: String::new(),
            },
            ConfigError::Io(e) => Self::Io(e),
            other => Self::Config(Box::new(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_codes_follow_error_family() {
        let auth: CliError = mobius_api::Error::Unauthorized {
            message: "Token expired".into(),
        }
        .into();
        assert_eq!(auth.exit_code(), exit_code::AUTH);

        let forbidden: CliError = mobius_api::Error::Api {
            status: 403,
            message: "Insufficient permissions".into(),
            code: None,
            body: String::new(),
        }
        .into();
        assert_eq!(forbidden.exit_code(), exit_code::PERMISSION);

        let bad_url: CliError = mobius_config::ConfigError::Validation {
            field: "server".into(),
            reason: "invalid URL".into(),
        }
        .into();
        assert_eq!(bad_url.exit_code(), exit_code::USAGE);

        let bad_id: CliError = mobius_api::Error::InvalidPathSegment("..".into()).into();
        assert_eq!(bad_id.exit_code(), exit_code::USAGE);
        assert_eq!(
            bad_id.to_string(),
            r#"Invalid value for id: ".." is not a usable identifier"#
        );
    }

    #[test]
    fn not_found_names_the_resource() {
        let err = mobius_api::Error::Api {
            status: 404,
            message: "Device not found".into(),
            code: None,
            body: String::new(),
        };
        let cli = CliError::not_found(err, "device", "d-1", "devices list");
        assert_eq!(cli.exit_code(), exit_code::NOT_FOUND);
        assert_eq!(cli.to_string(), "device 'd-1' not found");
    }

    #[test]
    fn other_errors_pass_through_not_found_mapping() {
        let err = mobius_api::Error::RateLimited {
            retry_after_secs: Some(5),
        };
        let cli = CliError::not_found(err, "device", "d-1", "devices list");
        assert_eq!(cli.to_string(), "Rate limited by the server; retry after 5s");
    }
}
