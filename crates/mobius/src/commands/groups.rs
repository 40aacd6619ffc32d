//! Device group command handlers.

use mobius_api::{DeviceGroup, GroupPatch, MobiusClient};
use tabled::Tabled;

use crate::cli::{GlobalOpts, GroupsArgs, GroupsCommand};
use crate::error::CliError;
use crate::output;

use super::{devices, util};

#[derive(Tabled)]
struct GroupRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Devices")]
    devices: u64,
    #[tabled(rename = "Description")]
    description: String,
}

impl From<&DeviceGroup> for GroupRow {
    fn from(g: &DeviceGroup) -> Self {
        Self {
            id: g.id.clone(),
            name: g.name.clone(),
            devices: g.device_count,
            description: g.description.clone(),
        }
    }
}

fn detail(g: &DeviceGroup) -> String {
    let mut lines = vec![
        format!("ID:          {}", g.id),
        format!("Name:        {}", g.name),
        format!("Devices:     {}", g.device_count),
        format!("Created:     {}", output::fmt_time(g.created_at.as_ref())),
    ];
    if !g.description.is_empty() {
        lines.push(format!("Description: {}", g.description));
    }
    lines.join("\n")
}

pub(crate) fn render_groups(groups: &[DeviceGroup], global: &GlobalOpts) {
    let out = output::render_list(
        &global.output,
        groups,
        |g| GroupRow::from(g),
        |g| g.id.clone(),
    );
    output::print_output(&out, global.quiet);
}

fn not_found(e: mobius_api::Error, group: &str) -> CliError {
    CliError::not_found(e, "group", group, "groups list")
}

pub async fn handle(
    client: &MobiusClient,
    args: GroupsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        GroupsCommand::List => {
            let resp = client.get_device_groups().await?;
            render_groups(&resp.groups, global);
            Ok(())
        }

        GroupsCommand::Get { group } => {
            let g = client
                .get_device_group(&group)
                .await
                .map_err(|e| not_found(e, &group))?;
            let out = output::render_single(&global.output, &g, detail, |g| g.id.clone());
            output::print_output(&out, global.quiet);
            Ok(())
        }

        GroupsCommand::Create { name, description } => {
            let g = client
                .create_device_group(&GroupPatch {
                    name: Some(name),
                    description,
                })
                .await?;
            let out = output::render_single(&global.output, &g, detail, |g| g.id.clone());
            output::print_output(&out, global.quiet);
            Ok(())
        }

        GroupsCommand::Update {
            group,
            name,
            description,
        } => {
            let g = client
                .update_device_group(&group, &GroupPatch { name, description })
                .await
                .map_err(|e| not_found(e, &group))?;
            let out = output::render_single(&global.output, &g, detail, |g| g.id.clone());
            output::print_output(&out, global.quiet);
            Ok(())
        }

        GroupsCommand::Delete { group } => {
            if !util::confirm(&format!("Delete group {group}?"), "delete", global.yes)? {
                return Ok(());
            }
            client
                .delete_device_group(&group)
                .await
                .map_err(|e| not_found(e, &group))?;
            output::print_done(&format!("Group {group} deleted"), global.quiet);
            Ok(())
        }

        GroupsCommand::AddDevice { group, device } => {
            client.add_device_to_group(&group, &device).await?;
            output::print_done(&format!("Added {device} to group {group}"), global.quiet);
            Ok(())
        }

        GroupsCommand::RemoveDevice { group, device } => {
            client.remove_device_from_group(&group, &device).await?;
            output::print_done(
                &format!("Removed {device} from group {group}"),
                global.quiet,
            );
            Ok(())
        }

        GroupsCommand::Devices { group } => {
            let resp = client
                .get_group_devices(&group)
                .await
                .map_err(|e| not_found(e, &group))?;
            devices::render_devices(&resp.devices, global);
            Ok(())
        }
    }
}
