mod cli;
mod commands;
mod config;
mod error;
mod output;

use clap::Parser;
use mobius_api::SessionEvent;
use tokio::sync::broadcast;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    init_tracing(cli.global.verbose);

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

fn init_tracing(verbosity: u8) {
    let filter = match verbosity {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        // Config commands never talk to the server
        Command::Config(args) => commands::config_cmd::handle(args, &cli.global),

        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "mobius", &mut std::io::stdout());
            Ok(())
        }

        cmd => {
            let ctx = config::build_context(&cli.global)?;
            let mut events = ctx.client.session().subscribe();

            tracing::debug!(command = ?cmd, "dispatching command");
            let result = commands::dispatch(cmd, &ctx, &cli.global).await;

            report_session_events(&mut events, &ctx.profile_name);
            result
        }
    }
}

/// Surface session changes the command itself did not report.
fn report_session_events(events: &mut broadcast::Receiver<SessionEvent>, profile: &str) {
    while let Ok(event) = events.try_recv() {
        if let SessionEvent::Unauthorized { path } = event {
            tracing::warn!(%profile, %path, "server rejected the session token; it was cleared");
        }
    }
}
