//! Config subcommand handlers.

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, OutputFormat};
use crate::config::{self, Config, Profile};
use crate::error::CliError;
use crate::output;

// ── Helpers ─────────────────────────────────────────────────────────

fn render_config(cfg: &Config, format: &OutputFormat) -> Result<String, CliError> {
    match format {
        OutputFormat::Table | OutputFormat::Plain => {
            toml::to_string_pretty(cfg).map_err(|e| CliError::Validation {
                field: "config".into(),
                reason: e.to_string(),
            })
        }
        other => Ok(output::render_single(other, cfg, |_| String::new(), |_| String::new())),
    }
}

/// Point `name` at `url`, creating the profile if it does not exist.
fn set_server(cfg: &mut Config, name: &str, url: &str) -> Result<(), CliError> {
    mobius_config::validate_server(url)?;
    cfg.profiles
        .entry(name.to_owned())
        .and_modify(|p| url.clone_into(&mut p.server))
        .or_insert_with(|| Profile::new(url));
    Ok(())
}

fn use_profile(cfg: &mut Config, name: &str) -> Result<(), CliError> {
    if !cfg.profiles.contains_key(name) {
        return Err(CliError::ProfileNotFound {
            name: name.into(),
            available: config::available_profiles(cfg),
        });
    }
    cfg.default_profile = Some(name.to_owned());
    Ok(())
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Show => {
            let cfg = mobius_config::load_config()?;
            let out = render_config(&cfg, &global.output)?;
            output::print_output(out.trim_end(), global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), global.quiet);
            Ok(())
        }

        ConfigCommand::SetServer { url } => {
            let mut cfg = mobius_config::load_config()?;
            let name = config::active_profile_name(global, &cfg);
            set_server(&mut cfg, &name, &url)?;
            config::save_config(&cfg)?;
            output::print_done(&format!("Profile '{name}' now targets {url}"), global.quiet);
            Ok(())
        }

        ConfigCommand::Use { name } => {
            let mut cfg = mobius_config::load_config()?;
            use_profile(&mut cfg, &name)?;
            config::save_config(&cfg)?;
            output::print_done(&format!("Default profile set to '{name}'"), global.quiet);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn set_server_creates_then_updates() {
        let mut cfg = Config::default();
        set_server(&mut cfg, "lab", "http://10.0.0.5:8081/api/v1").unwrap();
        assert_eq!(cfg.profiles["lab"].server, "http://10.0.0.5:8081/api/v1");

        cfg.profiles.get_mut("lab").unwrap().email = Some("ops@lab.local".into());
        set_server(&mut cfg, "lab", "https://mdm.lab.local/api/v1").unwrap();
        let lab = &cfg.profiles["lab"];
        assert_eq!(lab.server, "https://mdm.lab.local/api/v1");
        assert_eq!(lab.email.as_deref(), Some("ops@lab.local"));
    }

    #[test]
    fn set_server_rejects_non_http() {
        let mut cfg = Config::default();
        let err = set_server(&mut cfg, "lab", "ftp://mdm.lab.local").unwrap_err();
        assert!(matches!(err, CliError::Validation { .. }));
        assert!(cfg.profiles.is_empty());
    }

    #[test]
    fn use_requires_known_profile() {
        let mut cfg = Config::default();
        let err = use_profile(&mut cfg, "prod").unwrap_err();
        assert!(matches!(
            err,
            CliError::ProfileNotFound { ref available, .. } if available == "(none)"
        ));

        set_server(&mut cfg, "prod", "https://mdm.example.com/api/v1").unwrap();
        use_profile(&mut cfg, "prod").unwrap();
        assert_eq!(cfg.default_profile.as_deref(), Some("prod"));
    }

    #[test]
    fn show_renders_toml_for_humans() {
        let mut cfg = Config::default();
        set_server(&mut cfg, "lab", "http://10.0.0.5:8081/api/v1").unwrap();
        let out = render_config(&cfg, &OutputFormat::Table).unwrap();
        assert!(out.contains("[profiles.lab]"));
        assert!(out.contains(r#"server = "http://10.0.0.5:8081/api/v1""#));

        let json = render_config(&cfg, &OutputFormat::JsonCompact).unwrap();
        assert!(json.contains(r#""server":"http://10.0.0.5:8081/api/v1""#));
    }
}
