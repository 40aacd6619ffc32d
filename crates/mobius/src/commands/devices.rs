//! Device command handlers.

use std::str::FromStr;

use mobius_api::{
    Device, DeviceCommand, DeviceFilter, DevicePatch, DeviceStatus, MobiusClient, OsqueryResult,
};
use tabled::Tabled;
use tabled::builder::Builder;
use tabled::settings::Style;

use crate::cli::{DeviceFields, DeviceListArgs, DevicesArgs, DevicesCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
pub(crate) struct DeviceRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Hostname")]
    hostname: String,
    #[tabled(rename = "Platform")]
    platform: String,
    #[tabled(rename = "OS")]
    os: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Last Seen")]
    last_seen: String,
}

impl From<&Device> for DeviceRow {
    fn from(d: &Device) -> Self {
        Self {
            id: d.id.clone(),
            hostname: d.hostname.clone(),
            platform: d.platform.clone(),
            os: d.os_version.clone(),
            status: d.status.to_string(),
            last_seen: output::fmt_time(d.last_seen.as_ref()),
        }
    }
}

fn or_dash(s: &str) -> &str {
    if s.is_empty() { "-" } else { s }
}

fn detail(d: &Device) -> String {
    [
        format!("ID:        {}", d.id),
        format!("UUID:      {}", or_dash(&d.uuid)),
        format!("Hostname:  {}", or_dash(&d.hostname)),
        format!("Platform:  {}", or_dash(&d.platform)),
        format!("OS:        {}", or_dash(&d.os_version)),
        format!("Status:    {}", d.status),
        format!("User:      {}", d.enrolled_user.as_deref().unwrap_or("-")),
        format!("Enrolled:  {}", output::fmt_time(d.enrollment_date.as_ref())),
        format!("Last seen: {}", output::fmt_time(d.last_seen.as_ref())),
    ]
    .join("\n")
}

/// Render a device list (also used by policy and group membership views).
pub(crate) fn render_devices(devices: &[Device], global: &GlobalOpts) {
    let out = output::render_list(
        &global.output,
        devices,
        |d| DeviceRow::from(d),
        |d| d.id.clone(),
    );
    output::print_output(&out, global.quiet);
}

fn filter_from(args: DeviceListArgs) -> DeviceFilter {
    DeviceFilter {
        limit: args.limit,
        offset: args.offset,
        platform: args.platform,
        status: args.status,
        search: args.search,
    }
}

fn patch_from(fields: DeviceFields, status: Option<&str>) -> Result<DevicePatch, CliError> {
    let status = status
        .map(|s| {
            DeviceStatus::from_str(s).map_err(|_| CliError::Validation {
                field: "status".into(),
                reason: format!("unknown status '{s}' (expected online, offline or pending)"),
            })
        })
        .transpose()?;

    Ok(DevicePatch {
        uuid: fields.uuid,
        hostname: fields.hostname,
        platform: fields.platform,
        os_version: fields.os_version,
        status,
        enrolled_user: fields.user,
    })
}

// ── osquery rendering ───────────────────────────────────────────────

fn osquery_cell(row: &serde_json::Map<String, serde_json::Value>, column: &str) -> String {
    match row.get(column) {
        None | Some(serde_json::Value::Null) => "-".into(),
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    }
}

fn osquery_table(r: &OsqueryResult) -> String {
    let mut builder = Builder::default();
    builder.push_record(r.columns.iter().cloned());
    for row in &r.rows {
        builder.push_record(r.columns.iter().map(|c| osquery_cell(row, c)));
    }
    let table = builder.build().with(Style::rounded()).to_string();
    format!("{table}\n{} row(s) in {} ms", r.rows.len(), r.duration_ms)
}

/// Tab-separated rows without a header, for `-o plain`.
fn osquery_tsv(r: &OsqueryResult) -> String {
    r.rows
        .iter()
        .map(|row| {
            r.columns
                .iter()
                .map(|c| osquery_cell(row, c))
                .collect::<Vec<_>>()
                .join("\t")
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Handler ─────────────────────────────────────────────────────────

#[allow(clippy::too_many_lines)]
pub async fn handle(
    client: &MobiusClient,
    args: DevicesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        DevicesCommand::List(list) => {
            let resp = client.get_devices(&filter_from(list)).await?;
            tracing::debug!(total = resp.total, shown = resp.devices.len(), "listed devices");
            render_devices(&resp.devices, global);
            Ok(())
        }

        DevicesCommand::Get { device } => {
            let d = client
                .get_device(&device)
                .await
                .map_err(|e| CliError::not_found(e, "device", &device, "devices list"))?;
            let out = output::render_single(&global.output, &d, detail, |d| d.id.clone());
            output::print_output(&out, global.quiet);
            Ok(())
        }

        DevicesCommand::Enroll(fields) => {
            let patch = patch_from(fields, None)?;
            if patch.uuid.is_none() || patch.hostname.is_none() || patch.platform.is_none() {
                return Err(CliError::Validation {
                    field: "device".into(),
                    reason: "--uuid, --hostname and --platform are required to enroll".into(),
                });
            }
            let d = client.enroll_device(&patch).await?;
            let out = output::render_single(&global.output, &d, detail, |d| d.id.clone());
            output::print_output(&out, global.quiet);
            Ok(())
        }

        DevicesCommand::Update {
            device,
            fields,
            status,
        } => {
            let patch = patch_from(fields, status.as_deref())?;
            let d = client
                .update_device(&device, &patch)
                .await
                .map_err(|e| CliError::not_found(e, "device", &device, "devices list"))?;
            let out = output::render_single(&global.output, &d, detail, |d| d.id.clone());
            output::print_output(&out, global.quiet);
            Ok(())
        }

        DevicesCommand::Remove { device } => {
            if !util::confirm(&format!("Unenroll device {device}?"), "unenroll", global.yes)? {
                return Ok(());
            }
            client
                .unenroll_device(&device)
                .await
                .map_err(|e| CliError::not_found(e, "device", &device, "devices list"))?;
            output::print_done(&format!("Device {device} unenrolled"), global.quiet);
            Ok(())
        }

        DevicesCommand::Lock { device } => {
            client.lock_device(&device).await?;
            output::print_done(&format!("Lock sent to {device}"), global.quiet);
            Ok(())
        }

        DevicesCommand::Unlock { device } => {
            client.unlock_device(&device).await?;
            output::print_done(&format!("Unlock sent to {device}"), global.quiet);
            Ok(())
        }

        DevicesCommand::Wipe { device } => {
            let prompt = format!("Factory-reset device {device}? This cannot be undone");
            if !util::confirm(&prompt, "wipe", global.yes)? {
                return Ok(());
            }
            client.wipe_device(&device).await?;
            output::print_done(&format!("Wipe sent to {device}"), global.quiet);
            Ok(())
        }

        DevicesCommand::AssignPolicies { device, policies } => {
            client.assign_device_policies(&device, &policies).await?;
            output::print_done(
                &format!("Assigned {} policies to {device}", policies.len()),
                global.quiet,
            );
            Ok(())
        }

        DevicesCommand::Command {
            device,
            command,
            params,
        } => {
            let parameters = params
                .as_deref()
                .map(|raw| util::parse_json_object(raw, "params"))
                .transpose()?;
            let result = client
                .send_device_command(
                    &device,
                    &DeviceCommand {
                        command,
                        parameters,
                    },
                )
                .await?;
            let out = output::render_single(
                &global.output,
                &result,
                |r| {
                    let mut lines = vec![
                        format!("ID:      {}", r.id),
                        format!("Command: {}", r.command),
                        format!("Status:  {}", r.status),
                        format!("Run at:  {}", output::fmt_time(r.executed_at.as_ref())),
                    ];
                    if let Some(ref err) = r.error {
                        lines.push(format!("Error:   {err}"));
                    }
                    if let Some(ref res) = r.result {
                        lines.push(format!("Result:  {}", output::render_json(res, true)));
                    }
                    lines.join("\n")
                },
                |r| r.status.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        DevicesCommand::Osquery { device, query } => {
            let result = client.run_device_osquery(&device, &query).await?;
            let out = output::render_single(&global.output, &result, osquery_table, osquery_tsv);
            output::print_output(&out, global.quiet);
            if let Some(err) = result.error {
                return Err(CliError::ApiError {
                    status: None,
                    message: format!("osquery failed on {device}: {err}"),
                });
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    fn fields() -> DeviceFields {
        DeviceFields {
            uuid: None,
            hostname: Some("lab-01".into()),
            platform: None,
            os_version: None,
            user: Some("jane".into()),
        }
    }

    #[test]
    fn update_patch_parses_status() {
        let patch = patch_from(fields(), Some("offline")).unwrap();
        assert_eq!(patch.status, Some(DeviceStatus::Offline));
        assert_eq!(patch.hostname.as_deref(), Some("lab-01"));
        assert_eq!(patch.enrolled_user.as_deref(), Some("jane"));
        assert!(patch.uuid.is_none());
    }

    #[test]
    fn bogus_status_is_rejected() {
        let err = patch_from(fields(), Some("asleep")).unwrap_err();
        assert!(matches!(err, CliError::Validation { ref field, .. } if field == "status"));
    }

    #[test]
    fn list_args_become_filter() {
        let filter = filter_from(DeviceListArgs {
            limit: Some(25),
            offset: None,
            platform: Some("macos".into()),
            status: None,
            search: None,
        });
        assert_eq!(filter, DeviceFilter::default().limit(25).platform("macos"));
    }

    fn osquery_result() -> OsqueryResult {
        serde_json::from_value(serde_json::json!({
            "query": "SELECT name, pid FROM processes",
            "columns": ["name", "pid"],
            "rows": [
                { "name": "launchd", "pid": "1" },
                { "name": "sshd", "pid": 412 },
                { "name": "kworker" }
            ],
            "duration_ms": 7
        }))
        .unwrap()
    }

    #[test]
    fn osquery_table_uses_result_columns() {
        let out = osquery_table(&osquery_result());
        assert!(out.contains("name"));
        assert!(out.contains("launchd"));
        assert!(out.ends_with("3 row(s) in 7 ms"));
    }

    #[test]
    fn osquery_plain_is_tab_separated() {
        assert_eq!(
            osquery_tsv(&osquery_result()),
            "launchd\t1\nsshd\t412\nkworker\t-"
        );
    }
}
