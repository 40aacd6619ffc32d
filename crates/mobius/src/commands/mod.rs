pub mod apps;
pub mod auth;
pub mod config_cmd;
pub mod devices;
pub mod groups;
pub mod policies;
pub mod system;
pub mod util;
pub mod watch;

use crate::cli::{Command, GlobalOpts};
use crate::config::Context;
use crate::error::CliError;

/// Dispatch a server-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, ctx: &Context, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Login(args) => auth::login(ctx, args, global).await,
        Command::Logout => {
            auth::logout(ctx, global);
            Ok(())
        }
        Command::Status => {
            auth::status(ctx, global);
            Ok(())
        }
        Command::Health => system::health(&ctx.client, global).await,
        Command::License(args) => system::license(&ctx.client, args, global).await,
        Command::Devices(args) => devices::handle(&ctx.client, args, global).await,
        Command::Policies(args) => policies::handle(&ctx.client, args, global).await,
        Command::Apps(args) => apps::handle(&ctx.client, args, global).await,
        Command::Groups(args) => groups::handle(&ctx.client, args, global).await,
        Command::Watch(args) => watch::handle(&ctx.client, args, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
