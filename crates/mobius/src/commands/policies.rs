//! Policy command handlers.

use mobius_api::{MobiusClient, Policy, PolicyPatch};
use tabled::Tabled;

use crate::cli::{GlobalOpts, PoliciesArgs, PoliciesCommand, PolicyFields};
use crate::error::CliError;
use crate::output;

use super::{devices, groups, util};

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct PolicyRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Platform")]
    platform: String,
    #[tabled(rename = "Enabled")]
    enabled: String,
    #[tabled(rename = "Updated")]
    updated: String,
}

impl From<&Policy> for PolicyRow {
    fn from(p: &Policy) -> Self {
        Self {
            id: p.id.clone(),
            name: p.name.clone(),
            platform: p.platform.clone(),
            enabled: if p.enabled { "yes" } else { "no" }.into(),
            updated: output::fmt_time(p.updated_at.as_ref()),
        }
    }
}

fn detail(p: &Policy) -> String {
    let mut lines = vec![
        format!("ID:          {}", p.id),
        format!("Name:        {}", p.name),
        format!("Platform:    {}", p.platform),
        format!("Enabled:     {}", p.enabled),
        format!("Created:     {}", output::fmt_time(p.created_at.as_ref())),
        format!("Updated:     {}", output::fmt_time(p.updated_at.as_ref())),
    ];
    if !p.description.is_empty() {
        lines.push(format!("Description: {}", p.description));
    }
    if !p.configuration.is_empty() {
        lines.push(format!(
            "Config:      {}",
            output::render_json(&p.configuration, true)
        ));
    }
    lines.join("\n")
}

fn patch_from(fields: PolicyFields) -> Result<PolicyPatch, CliError> {
    let configuration = match (fields.config, fields.from_file) {
        (Some(raw), _) => Some(util::parse_json_object(&raw, "config")?),
        (None, Some(path)) => Some(util::read_json_object(&path)?),
        (None, None) => None,
    };

    Ok(PolicyPatch {
        name: fields.name,
        description: fields.description,
        platform: fields.platform,
        enabled: fields.enabled,
        configuration,
    })
}

fn not_found(e: mobius_api::Error, policy: &str) -> CliError {
    CliError::not_found(e, "policy", policy, "policies list")
}

// ── Handler ─────────────────────────────────────────────────────────

#[allow(clippy::too_many_lines)]
pub async fn handle(
    client: &MobiusClient,
    args: PoliciesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        PoliciesCommand::List => {
            let resp = client.get_policies().await?;
            let out = output::render_list(
                &global.output,
                &resp.policies,
                |p| PolicyRow::from(p),
                |p| p.id.clone(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        PoliciesCommand::Get { policy } => {
            let p = client
                .get_policy(&policy)
                .await
                .map_err(|e| not_found(e, &policy))?;
            let out = output::render_single(&global.output, &p, detail, |p| p.id.clone());
            output::print_output(&out, global.quiet);
            Ok(())
        }

        PoliciesCommand::Create(fields) => {
            let patch = patch_from(fields)?;
            if patch.name.is_none() {
                return Err(CliError::Validation {
                    field: "name".into(),
                    reason: "--name is required to create a policy".into(),
                });
            }
            let p = client.create_policy(&patch).await?;
            let out = output::render_single(&global.output, &p, detail, |p| p.id.clone());
            output::print_output(&out, global.quiet);
            Ok(())
        }

        PoliciesCommand::Update { policy, fields } => {
            let patch = patch_from(fields)?;
            let p = client
                .update_policy(&policy, &patch)
                .await
                .map_err(|e| not_found(e, &policy))?;
            let out = output::render_single(&global.output, &p, detail, |p| p.id.clone());
            output::print_output(&out, global.quiet);
            Ok(())
        }

        PoliciesCommand::Delete { policy } => {
            if !util::confirm(&format!("Delete policy {policy}?"), "delete", global.yes)? {
                return Ok(());
            }
            client
                .delete_policy(&policy)
                .await
                .map_err(|e| not_found(e, &policy))?;
            output::print_done(&format!("Policy {policy} deleted"), global.quiet);
            Ok(())
        }

        PoliciesCommand::Assign { policy, device } => {
            client.assign_policy_to_device(&policy, &device).await?;
            output::print_done(&format!("Policy {policy} assigned to {device}"), global.quiet);
            Ok(())
        }

        PoliciesCommand::Unassign { policy, device } => {
            client.unassign_policy_from_device(&policy, &device).await?;
            output::print_done(
                &format!("Policy {policy} removed from {device}"),
                global.quiet,
            );
            Ok(())
        }

        PoliciesCommand::Devices { policy } => {
            let resp = client
                .get_policy_devices(&policy)
                .await
                .map_err(|e| not_found(e, &policy))?;
            devices::render_devices(&resp.devices, global);
            Ok(())
        }

        PoliciesCommand::Groups { policy } => {
            let resp = client
                .get_policy_groups(&policy)
                .await
                .map_err(|e| not_found(e, &policy))?;
            groups::render_groups(&resp.groups, global);
            Ok(())
        }

        PoliciesCommand::AssignGroup { policy, group } => {
            client.assign_policy_to_group(&policy, &group).await?;
            output::print_done(
                &format!("Policy {policy} assigned to group {group}"),
                global.quiet,
            );
            Ok(())
        }

        PoliciesCommand::UnassignGroup { policy, group } => {
            client.unassign_policy_from_group(&policy, &group).await?;
            output::print_done(
                &format!("Policy {policy} removed from group {group}"),
                global.quiet,
            );
            Ok(())
        }
    }
}
