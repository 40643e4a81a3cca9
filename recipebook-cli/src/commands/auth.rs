//! Auth commands - sign up, log in, log out and show the session

use anyhow::Result;
use chrono::Utc;
use colored::Colorize;
use dialoguer::{Input, Password};
use serde::Serialize;

use recipebook_core::ports::Navigator;
use recipebook_core::services::EntryPoint;
use recipebook_core::{Credentials, OperationResult, RecipeBookContext, User, View};

use super::{get_context, get_local_context, log_command, spinner};

/// Whether the auth form is in sign-up or log-in mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    Login,
    Signup,
}

/// Session details shown to the user (never the token)
#[derive(Debug, Serialize)]
pub struct SessionInfo {
    pub email: String,
    pub user_id: String,
    pub expires_at: String,
    pub expires_in_secs: i64,
}

impl SessionInfo {
    pub fn from_user(user: &User) -> Self {
        let expires = user.token_expiration_date();
        Self {
            email: user.email.clone(),
            user_id: user.id.clone(),
            expires_at: expires.to_rfc3339(),
            expires_in_secs: (expires - Utc::now()).num_seconds().max(0),
        }
    }
}

/// Get credentials from flags or prompt for the missing ones
fn read_credentials(mode: AuthMode, email: Option<String>, password: Option<String>) -> Result<Credentials> {
    let email = match email {
        Some(e) => e,
        None => Input::new().with_prompt("E-Mail").interact_text()?,
    };

    let password = match password {
        Some(p) => p,
        None if mode == AuthMode::Signup => Password::new()
            .with_prompt("Password")
            .with_confirmation("Confirm password", "Passwords do not match")
            .interact()?,
        None => Password::new().with_prompt("Password").interact()?,
    };

    Ok(Credentials::new(email, password))
}

/// Validate and submit the auth form; on success go to the recipe list
pub async fn submit(ctx: &RecipeBookContext, mode: AuthMode, credentials: &Credentials) -> Result<User> {
    credentials.validate()?;

    let progress = spinner(match mode {
        AuthMode::Login => "Logging in...",
        AuthMode::Signup => "Creating account...",
    });
    let result = match mode {
        AuthMode::Login => {
            ctx.auth_service
                .login(&credentials.email, &credentials.password)
                .await
        }
        AuthMode::Signup => {
            ctx.auth_service
                .signup(&credentials.email, &credentials.password)
                .await
        }
    };
    progress.finish_and_clear();
    result?;

    ctx.navigator.navigate(View::Recipes);
    ctx.auth_service
        .current_user()
        .ok_or_else(|| anyhow::anyhow!("Signed in, but no session was published"))
}

pub async fn run(mode: AuthMode, email: Option<String>, password: Option<String>, json: bool) -> Result<()> {
    let ctx = get_context(EntryPoint::Cli)?;
    log_command(
        &ctx,
        match mode {
            AuthMode::Login => "login",
            AuthMode::Signup => "signup",
        },
    );

    let credentials = read_credentials(mode, email, password)?;

    match submit(&ctx, mode, &credentials).await {
        Ok(user) => {
            if json {
                let result = OperationResult::ok(SessionInfo::from_user(&user));
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                let verb = if mode == AuthMode::Signup { "Signed up" } else { "Logged in" };
                println!("{} {} as {}", "Success!".green(), verb, user.email.bold());
            }
            Ok(())
        }
        Err(e) => {
            if json {
                let result: OperationResult<SessionInfo> = OperationResult::fail(e.to_string());
                println!("{}", serde_json::to_string_pretty(&result)?);
            }
            Err(e)
        }
    }
}

pub fn run_logout(json: bool) -> Result<()> {
    let ctx = get_local_context(EntryPoint::Cli)?;
    log_command(&ctx, "logout");

    let was_signed_in = ctx.auth_service.auto_login().is_some();
    ctx.auth_service.logout();

    if json {
        println!("{}", serde_json::json!({"logged_out": was_signed_in}));
    } else if was_signed_in {
        println!("{}", "Logged out".green());
    } else {
        println!("Not logged in.");
    }
    Ok(())
}

pub fn run_session(json: bool) -> Result<()> {
    let ctx = get_local_context(EntryPoint::Cli)?;
    log_command(&ctx, "session");

    let session = ctx.auth_service.auto_login().map(|user| SessionInfo::from_user(&user));

    if json {
        println!("{}", serde_json::to_string_pretty(&OperationResult::ok(session))?);
        return Ok(());
    }

    match session {
        Some(info) => {
            println!("{}", "Session".bold());
            println!("  E-Mail: {}", info.email);
            println!("  User ID: {}", info.user_id);
            println!("  Expires: {} ({} min left)", info.expires_at, info.expires_in_secs / 60);
        }
        None => println!("{}", "Not logged in. Run 'rb login' to sign in.".yellow()),
    }
    Ok(())
}
