//! CLI-specific configuration helpers.
//!
//! Wraps `mobius_config` with `GlobalOpts`-aware profile resolution and
//! builds the API client every server-bound command runs against.

use mobius_api::{MobiusClient, Session};
pub use mobius_config::{Config, Profile, config_path, load_config_or_default, save_config};

use crate::cli::GlobalOpts;
use crate::error::CliError;

/// Everything a server-bound command needs.
pub struct Context {
    pub client: MobiusClient,
    pub profile_name: String,
    pub profile: Profile,
    pub token_backend: mobius_config::TokenBackend,
}

/// Determine the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, cfg: &Config) -> String {
    cfg.active_profile_name(global.profile.as_deref())
}

/// Comma-separated list of configured profile names, sorted.
pub fn available_profiles(cfg: &Config) -> String {
    let mut names: Vec<&str> = cfg.profiles.keys().map(String::as_str).collect();
    names.sort_unstable();
    if names.is_empty() {
        "(none)".into()
    } else {
        names.join(", ")
    }
}

/// Resolve the effective profile: saved profile, then CLI overrides.
///
/// Asking for a profile by name that is not configured is an error
/// unless `--server` supplies the one thing a profile must have.
pub fn resolve_profile(global: &GlobalOpts, cfg: &Config) -> Result<(String, Profile), CliError> {
    let name = active_profile_name(global, cfg);

    let mut profile = match cfg.profiles.get(&name) {
        Some(p) => p.clone(),
        None if global.profile.is_some() && global.server.is_none() => {
            return Err(CliError::ProfileNotFound {
                name,
                available: available_profiles(cfg),
            });
        }
        None => Profile::default(),
    };

    if let Some(ref server) = global.server {
        profile.server.clone_from(server);
    }
    if global.insecure {
        profile.insecure = Some(true);
    }
    if let Some(timeout) = global.timeout {
        profile.timeout = Some(timeout);
    }

    Ok((name, profile))
}

/// Load config and build the client for the active profile.
pub fn build_context(global: &GlobalOpts) -> Result<Context, CliError> {
    let cfg = load_config_or_default();
    let (profile_name, profile) = resolve_profile(global, &cfg)?;

    let transport = profile.to_transport_config(&cfg.defaults)?;
    let token_backend = profile.token_backend(&cfg.defaults);
    let store = mobius_config::open_token_store(&profile_name, token_backend);

    tracing::debug!(
        profile = %profile_name,
        server = %transport.base_url,
        %token_backend,
        "resolved profile"
    );

    let client = MobiusClient::new(&transport, Session::new(store))?;
    Ok(Context {
        client,
        profile_name,
        profile,
        token_backend,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use clap::Parser;

    use super::*;
    use crate::cli::Cli;

    fn global(args: &[&str]) -> GlobalOpts {
        let mut argv = vec!["mobius"];
        argv.extend_from_slice(args);
        argv.push("status");
        Cli::try_parse_from(argv).unwrap().global
    }

    fn config_with_lab() -> Config {
        let mut cfg = Config::default();
        cfg.profiles.insert(
            "lab".into(),
            Profile::new("https://mdm.lab.local/api/v1"),
        );
        cfg
    }

    #[test]
    fn server_flag_overrides_profile() {
        let cfg = config_with_lab();
        let (name, profile) = resolve_profile(
            &global(&["--profile", "lab", "--server", "http://10.0.0.9:8081/api/v1", "-k"]),
            &cfg,
        )
        .unwrap();

        assert_eq!(name, "lab");
        assert_eq!(profile.server, "http://10.0.0.9:8081/api/v1");
        assert_eq!(profile.insecure, Some(true));
    }

    #[test]
    fn unknown_named_profile_is_an_error() {
        let cfg = config_with_lab();
        let err = resolve_profile(&global(&["--profile", "prod"]), &cfg).unwrap_err();
        match err {
            CliError::ProfileNotFound { name, available } => {
                assert_eq!(name, "prod");
                assert_eq!(available, "lab");
            }
            other => panic!("expected ProfileNotFound, got {other:?}"),
        }
    }

    #[test]
    fn missing_default_profile_targets_local_server() {
        let cfg = Config::default();
        let (name, profile) = resolve_profile(&global(&["--timeout", "3"]), &cfg).unwrap();
        assert_eq!(name, "default");
        assert_eq!(profile.server, mobius_api::DEFAULT_BASE_URL);
        assert_eq!(profile.timeout, Some(3));
    }
}
