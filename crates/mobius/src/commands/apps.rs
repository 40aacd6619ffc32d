//! Application catalog command handlers.

use std::path::Path;

use bytesize::ByteSize;
use mobius_api::{Application, ApplicationPatch, ApplicationUpload, MobiusClient};
use tabled::Tabled;

use crate::cli::{AppsArgs, AppsCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

#[derive(Tabled)]
struct AppRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Version")]
    version: String,
    #[tabled(rename = "Platform")]
    platform: String,
    #[tabled(rename = "Size")]
    size: String,
}

impl From<&Application> for AppRow {
    fn from(a: &Application) -> Self {
        Self {
            id: a.id.clone(),
            name: a.name.clone(),
            version: a.version.clone(),
            platform: a.platform.clone(),
            size: package_size(a.size),
        }
    }
}

fn package_size(bytes: Option<u64>) -> String {
    bytes.map_or_else(|| "-".into(), |b| ByteSize::b(b).to_string())
}

fn detail(a: &Application) -> String {
    [
        format!("ID:          {}", a.id),
        format!("Name:        {}", a.name),
        format!("Version:     {}", a.version),
        format!("Platform:    {}", a.platform),
        format!("Size:        {}", package_size(a.size)),
        format!("Added:       {}", output::fmt_time(a.created_at.as_ref())),
        format!("Description: {}", a.description.as_deref().unwrap_or("-")),
    ]
    .join("\n")
}

/// Read a package file for upload, keeping only its file name.
fn read_package(path: &Path) -> Result<(String, Vec<u8>), CliError> {
    let file_name = path
        .file_name()
        .and_then(std::ffi::OsStr::to_str)
        .ok_or_else(|| CliError::Validation {
            field: "file".into(),
            reason: format!("'{}' is not a file path", path.display()),
        })?
        .to_owned();
    let bytes = std::fs::read(path)?;
    Ok((file_name, bytes))
}

fn not_found(e: mobius_api::Error, app: &str) -> CliError {
    CliError::not_found(e, "application", app, "apps list")
}

pub async fn handle(
    client: &MobiusClient,
    args: AppsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        AppsCommand::List => {
            let resp = client.get_applications().await?;
            let out = output::render_list(
                &global.output,
                &resp.applications,
                |a| AppRow::from(a),
                |a| a.id.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        AppsCommand::Get { app } => {
            let a = client
                .get_application(&app)
                .await
                .map_err(|e| not_found(e, &app))?;
            let out = output::render_single(&global.output, &a, detail, |a| a.id.clone());
            output::print_output(&out, global.quiet);
            Ok(())
        }

        AppsCommand::Add {
            name,
            version,
            platform,
            description,
            file,
        } => {
            let mut upload = ApplicationUpload::new(name, version, platform);
            if let Some(description) = description {
                upload = upload.description(description);
            }
            if let Some(path) = file {
                let (file_name, bytes) = read_package(&path)?;
                tracing::debug!(%file_name, size = bytes.len(), "read package");
                upload = upload.package(file_name, bytes);
            }
            let a = client.add_application(upload).await?;
            let out = output::render_single(&global.output, &a, detail, |a| a.id.clone());
            output::print_output(&out, global.quiet);
            Ok(())
        }

        AppsCommand::Update {
            app,
            name,
            version,
            platform,
            description,
        } => {
            let patch = ApplicationPatch {
                name,
                version,
                platform,
                description,
            };
            let a = client
                .update_application(&app, &patch)
                .await
                .map_err(|e| not_found(e, &app))?;
            let out = output::render_single(&global.output, &a, detail, |a| a.id.clone());
            output::print_output(&out, global.quiet);
            Ok(())
        }

        AppsCommand::Delete { app } => {
            if !util::confirm(&format!("Delete application {app}?"), "delete", global.yes)? {
                return Ok(());
            }
            client
                .delete_application(&app)
                .await
                .map_err(|e| not_found(e, &app))?;
            output::print_done(&format!("Application {app} deleted"), global.quiet);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[test]
    fn package_keeps_only_file_name() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("agent-1.2.0.msi");
        std::fs::write(&path, b"MZ\x90\x00").unwrap();

        let (name, bytes) = read_package(&path).unwrap();
        assert_eq!(name, "agent-1.2.0.msi");
        assert_eq!(bytes, b"MZ\x90\x00");
    }

    #[test]
    fn sizes_use_binary_units() {
        assert_eq!(package_size(None), "-");
        assert_eq!(package_size(Some(512)), "512 B");
        assert_eq!(package_size(Some(1536)), "1.5 KiB");
        assert_eq!(package_size(Some(5 * 1024 * 1024)), "5.0 MiB");
    }

    #[test]
    fn missing_package_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_package(&dir.path().join("nope.pkg")).unwrap_err();
        assert!(matches!(err, CliError::Io(_)));
    }
}
