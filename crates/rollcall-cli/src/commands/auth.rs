//! Sign-in, sign-out and session status.

use anyhow::{bail, Result};
use tracing::warn;

use rollcall_core::ApiError;

use super::{explain, prompt_line, Context};

pub async fn login(ctx: &mut Context, id: Option<String>) -> Result<()> {
    let login_id = match id.or_else(|| ctx.config.last_login_id.clone()) {
        Some(id) if !id.trim().is_empty() => {
            let entered = prompt_line(&format!("Login ID [{}]: ", id))?;
            if entered.is_empty() {
                id
            } else {
                entered
            }
        }
        _ => prompt_line("Login ID: ")?,
    };
    let password = rpassword::prompt_password("Password: ")?;

    match ctx.session.login_local(&login_id, &password).await {
        Ok(_) => {
            ctx.config.last_login_id = Some(login_id.trim().to_string());
            if let Err(e) = ctx.config.save() {
                warn!(error = %e, "Failed to save configuration");
            }
            println!("Logged in as {}.", login_id.trim());
            Ok(())
        }
        Err(ApiError::InvalidCredentials) => bail!("Invalid login ID or password."),
        Err(e) => Err(explain(&ctx.session, e, "Login failed.")),
    }
}

pub async fn login_google(ctx: &Context) -> Result<()> {
    match ctx.session.google_login_url().await {
        Ok(url) => {
            println!("Open this URL in your browser to sign in with Google:");
            println!("{}", url);
            Ok(())
        }
        Err(e) => Err(explain(&ctx.session, e, "Failed to start Google sign-in.")),
    }
}

pub async fn logout(ctx: &Context) -> Result<()> {
    ctx.session.logout().await;
    println!("Logged out.");
    Ok(())
}

pub async fn status(ctx: &Context) -> Result<()> {
    let api = ctx.session.api();
    println!("Server:  {}", api.base_url());

    if api.cookies().is_empty() {
        println!("Session: none (run `rollcall login`)");
        return Ok(());
    }

    match ctx.session.ensure_access_token().await {
        Some(token) => match token.nominal_expiry() {
            Some(expiry) => println!(
                "Session: active (access token valid until {})",
                expiry.format("%Y-%m-%d %H:%M:%S UTC")
            ),
            None => println!("Session: active"),
        },
        None => println!("Session: expired (run `rollcall login`)"),
    }
    Ok(())
}
