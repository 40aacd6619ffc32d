//! Shared configuration for Mobius tools.
//!
//! TOML profiles layered with `MOBIUS_*` environment variables, platform
//! path resolution, persistent token stores, and translation to
//! `mobius_api::TransportConfig`.

mod token_store;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use thiserror::Error;

use mobius_api::{DEFAULT_BASE_URL, TlsMode, TransportConfig};

pub use token_store::{FileTokenStore, KeyringTokenStore, KEYRING_SERVICE, open_token_store};

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found")]
    UnknownProfile { name: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Profile used when `--profile` is not given.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named server profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// Resolve which profile name applies, CLI override first.
    pub fn active_profile_name(&self, requested: Option<&str>) -> String {
        requested
            .map(str::to_owned)
            .or_else(|| self.default_profile.clone())
            .unwrap_or_else(|| "default".into())
    }

    pub fn profile(&self, name: &str) -> Result<&Profile, ConfigError> {
        self.profiles
            .get(name)
            .ok_or_else(|| ConfigError::UnknownProfile { name: name.into() })
    }

    /// Profile by name, or one pointing at the local default server.
    ///
    /// A missing profile is not an error until something needs a field
    /// only a saved profile can carry.
    pub fn profile_or_default(&self, name: &str) -> Profile {
        self.profiles.get(name).cloned().unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    #[serde(default)]
    pub token_store: TokenBackend,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
            token_store: TokenBackend::default(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    10
}

/// Where the bearer token is persisted between invocations.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TokenBackend {
    /// OS credential store.
    #[default]
    Keyring,
    /// JSON key/value file in the platform data directory.
    File,
    /// Not persisted at all.
    Memory,
}

/// A named server profile.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Profile {
    /// API base URL, e.g. "https://mdm.example.com/api/v1".
    pub server: String,

    /// Remembered login email.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    /// Override the token backend for this profile.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_store: Option<TokenBackend>,

    /// Accept self-signed certificates.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insecure: Option<bool>,

    /// Path to a custom CA certificate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<PathBuf>,

    /// Override the timeout, in seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            server: DEFAULT_BASE_URL.into(),
            email: None,
            token_store: None,
            insecure: None,
            ca_cert: None,
            timeout: None,
        }
    }
}

impl Profile {
    pub fn new(server: impl Into<String>) -> Self {
        Self {
            server: server.into(),
            ..Self::default()
        }
    }

    pub fn token_backend(&self, defaults: &Defaults) -> TokenBackend {
        self.token_store.unwrap_or(defaults.token_store)
    }

    /// Build the HTTP transport settings, validating the server URL.
    pub fn to_transport_config(&self, defaults: &Defaults) -> Result<TransportConfig, ConfigError> {
        validate_server(&self.server)?;

        let tls = if self.insecure.unwrap_or(false) {
            TlsMode::DangerAcceptInvalid
        } else if let Some(ref ca_path) = self.ca_cert {
            TlsMode::CustomCa(ca_path.clone())
        } else {
            TlsMode::System
        };

        let timeout = Duration::from_secs(self.timeout.unwrap_or(defaults.timeout));

        Ok(TransportConfig::new(self.server.clone())
            .with_timeout(timeout)
            .with_tls(tls))
    }
}

/// Reject anything that is not an absolute http(s) URL.
pub fn validate_server(server: &str) -> Result<url::Url, ConfigError> {
    let url: url::Url = server.parse().map_err(|_| ConfigError::Validation {
        field: "server".into(),
        reason: format!("invalid URL: {server}"),
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ConfigError::Validation {
            field: "server".into(),
            reason: format!("expected http or https, got '{other}'"),
        }),
    }
}

// ── Paths ───────────────────────────────────────────────────────────

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "mobius", "mobius")
}

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    project_dirs().map_or_else(
        || fallback_dir(".config").join("config.toml"),
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

/// Directory holding file-backed token stores.
pub fn data_dir() -> PathBuf {
    project_dirs().map_or_else(
        || fallback_dir(".local/share"),
        |dirs| dirs.data_dir().to_path_buf(),
    )
}

fn fallback_dir(base: &str) -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(base);
    p.push("mobius");
    p
}

// ── Loading ─────────────────────────────────────────────────────────

/// Load the full Config from the canonical file plus environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from an explicit file. A missing file yields defaults.
///
/// Environment variables use `__` as the nesting separator, e.g.
/// `MOBIUS_DEFAULTS__TIMEOUT=30` or `MOBIUS_PROFILES__LAB__SERVER=...`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("MOBIUS_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, falling back to defaults on any error.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "ignoring unreadable config");
        Config::default()
    })
}

// ── Saving ──────────────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("nope.toml")).unwrap();

        assert_eq!(cfg.default_profile.as_deref(), Some("default"));
        assert_eq!(cfg.defaults.timeout, 10);
        assert_eq!(cfg.defaults.token_store, TokenBackend::Keyring);
        assert!(cfg.profiles.is_empty());
    }

    #[test]
    fn profiles_load_from_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
default_profile = "lab"

[defaults]
output = "json"
token_store = "file"

[profiles.lab]
server = "https://mdm.lab.local/api/v1"
email = "admin@mobius.local"
insecure = true
timeout = 30
"#,
        )
        .unwrap();

        let cfg = load_config_from(&path).unwrap();
        assert_eq!(cfg.active_profile_name(None), "lab");
        assert_eq!(cfg.defaults.output, "json");

        let lab = cfg.profile("lab").unwrap();
        assert_eq!(lab.email.as_deref(), Some("admin@mobius.local"));
        assert_eq!(lab.token_backend(&cfg.defaults), TokenBackend::File);

        let transport = lab.to_transport_config(&cfg.defaults).unwrap();
        assert_eq!(transport.base_url, "https://mdm.lab.local/api/v1");
        assert_eq!(transport.timeout, Duration::from_secs(30));
        assert!(matches!(transport.tls, TlsMode::DangerAcceptInvalid));
    }

    #[test]
    fn save_then_load_keeps_profiles() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        let mut profile = Profile::new("http://10.0.0.5:8081/api/v1");
        profile.token_store = Some(TokenBackend::Memory);
        cfg.profiles.insert("default".into(), profile.clone());

        save_config_to(&cfg, &path).unwrap();
        let loaded = load_config_from(&path).unwrap();

        assert_eq!(loaded.profile("default").unwrap(), &profile);
    }

    #[test]
    fn cli_profile_overrides_default() {
        let cfg = Config::default();
        assert_eq!(cfg.active_profile_name(Some("prod")), "prod");
        assert_eq!(cfg.active_profile_name(None), "default");
        assert!(matches!(
            cfg.profile("prod"),
            Err(ConfigError::UnknownProfile { .. })
        ));
        assert_eq!(cfg.profile_or_default("prod").server, DEFAULT_BASE_URL);
    }

    #[test]
    fn server_must_be_http_url() {
        assert!(validate_server("https://mdm.example.com/api/v1").is_ok());
        assert!(matches!(
            validate_server("mdm.example.com"),
            Err(ConfigError::Validation { .. })
        ));
        assert!(matches!(
            validate_server("ftp://mdm.example.com"),
            Err(ConfigError::Validation { .. })
        ));
    }

    #[test]
    fn ca_cert_selects_custom_tls() {
        let profile = Profile {
            ca_cert: Some(PathBuf::from("/etc/mobius/ca.pem")),
            ..Profile::default()
        };
        let transport = profile.to_transport_config(&Defaults::default()).unwrap();
        assert!(matches!(transport.tls, TlsMode::CustomCa(_)));
        assert_eq!(transport.timeout, Duration::from_secs(10));
    }
}
