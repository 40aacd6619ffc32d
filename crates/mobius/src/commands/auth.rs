//! Login, logout and session status.

use dialoguer::Input;
use mobius_api::{LoginFailure, LoginRequest, User};
use serde::Serialize;

use crate::cli::{GlobalOpts, LoginArgs};
use crate::config::Context;
use crate::error::CliError;
use crate::output;

use super::util;

fn user_detail(user: &User) -> String {
    let name = if user.name.is_empty() {
        user.email.clone()
    } else {
        format!("{} <{}>", user.name, user.email)
    };
    format!("Logged in as {name} ({})", user.role)
}

pub async fn login(ctx: &Context, args: LoginArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let email = match args.email.or_else(|| ctx.profile.email.clone()) {
        Some(email) => email,
        None => Input::new()
            .with_prompt("Email")
            .interact_text()
            .map_err(util::prompt_err)?,
    };

    let password = match args.password {
        Some(pw) => pw,
        None => rpassword::prompt_password("Password: ").map_err(util::prompt_err)?,
    };

    if email.is_empty() || password.is_empty() {
        return Err(CliError::Validation {
            field: "credentials".into(),
            reason: "email and password cannot be empty".into(),
        });
    }

    let resp = ctx
        .client
        .login(&LoginRequest::new(email, password))
        .await
        .map_err(|source| CliError::LoginFailed {
            reason: LoginFailure::from(&source).to_string(),
            source,
        })?;

    tracing::debug!(profile = %ctx.profile_name, "session token stored");
    let out = output::render_single(&global.output, &resp.user, user_detail, |u| u.id.clone());
    output::print_output(&out, global.quiet);
    Ok(())
}

pub fn logout(ctx: &Context, global: &GlobalOpts) {
    ctx.client.logout();
    output::print_done(
        &format!("Logged out of profile '{}'", ctx.profile_name),
        global.quiet,
    );
}

#[derive(Serialize)]
struct StatusView<'a> {
    profile: &'a str,
    server: &'a str,
    token_store: String,
    authenticated: bool,
}

pub fn status(ctx: &Context, global: &GlobalOpts) {
    let view = StatusView {
        profile: &ctx.profile_name,
        server: ctx.client.base_url().as_str(),
        token_store: ctx.token_backend.to_string(),
        authenticated: ctx.client.is_authenticated(),
    };

    let color = output::should_color(&global.color);
    let out = output::render_single(
        &global.output,
        &view,
        |v| {
            let auth = if v.authenticated { "yes" } else { "no" };
            [
                format!("Profile:       {}", v.profile),
                format!("Server:        {}", v.server),
                format!("Token store:   {}", v.token_store),
                format!("Authenticated: {}", output::paint_status(auth, color)),
            ]
            .join("\n")
        },
        |v| v.authenticated.to_string(),
    );
    output::print_output(&out, global.quiet);
}
