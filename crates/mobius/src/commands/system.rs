//! Health and license commands.

use mobius_api::{HealthStatus, LicenseStatus, MobiusClient};

use crate::cli::{GlobalOpts, LicenseArgs, LicenseCommand};
use crate::error::CliError;
use crate::output;

fn health_detail(h: &HealthStatus, color: bool) -> String {
    let mut lines = vec![
        format!(
            "Status:   {}",
            output::paint_status(&h.status.to_string(), color)
        ),
        format!("Version:  {}", if h.version.is_empty() { "-" } else { h.version.as_str() }),
        format!("Uptime:   {}", fmt_uptime(h.uptime)),
        format!(
            "Database: {}",
            output::paint_status(if h.database { "yes" } else { "no" }, color)
        ),
    ];

    let mut services: Vec<_> = h.services.iter().collect();
    services.sort();
    for (name, up) in services {
        let state = if *up { "yes" } else { "no" };
        lines.push(format!("  {name:<12} {}", output::paint_status(state, color)));
    }
    lines.join("\n")
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::as_conversions)]
fn fmt_uptime(secs: f64) -> String {
    let total = secs.max(0.0) as u64;
    let (days, rem) = (total / 86_400, total % 86_400);
    let (hours, rem) = (rem / 3600, rem % 3600);
    let minutes = rem / 60;
    if days > 0 {
        format!("{days}d {hours}h {minutes}m")
    } else if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m {}s", rem % 60)
    }
}

fn license_detail(l: &LicenseStatus) -> String {
    let mut lines = vec![
        format!("Tier:     {}", l.tier),
        format!("Devices:  {} / {}", l.devices_enrolled, l.devices_limit),
        format!("Expires:  {}", output::fmt_time(l.expires_at.as_ref())),
    ];
    if !l.features.is_empty() {
        lines.push(format!("Features: {}", l.features.join(", ")));
    }
    lines.join("\n")
}

pub async fn health(client: &MobiusClient, global: &GlobalOpts) -> Result<(), CliError> {
    let status = client.get_health().await?;
    let color = output::should_color(&global.color);
    let out = output::render_single(
        &global.output,
        &status,
        |h| health_detail(h, color),
        |h| h.status.to_string(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}

pub async fn license(
    client: &MobiusClient,
    args: LicenseArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        LicenseCommand::Status => {
            let status = client.get_license_status().await?;
            let out = output::render_single(&global.output, &status, license_detail, |l| {
                l.tier.to_string()
            });
            output::print_output(&out, global.quiet);
            Ok(())
        }

        LicenseCommand::Update { key } => {
            client.update_license(&key).await?;
            output::print_done("License updated", global.quiet);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uptime_is_compact() {
        assert_eq!(fmt_uptime(42.7), "0m 42s");
        assert_eq!(fmt_uptime(3_725.0), "1h 2m");
        assert_eq!(fmt_uptime(90_061.0), "1d 1h 1m");
        assert_eq!(fmt_uptime(-5.0), "0m 0s");
    }
}
