//! `login`, `logout`, and `whoami`

use super::Context;
use crate::auth::{self, Route, TokenSource};
use crate::error::Result;

use colored::Colorize;
use rustyline::DefaultEditor;

/// Sign in, prompting for whatever was not given on the command line.
pub async fn login(ctx: &mut Context, email: Option<String>, password: Option<String>) -> Result<()> {
    let mut rl = DefaultEditor::new()?;
    let email = match email {
        Some(email) => email,
        None => rl.readline("Email: ")?.trim().to_string(),
    };
    let password = match password {
        Some(password) => password,
        None => rl.readline("Password: ")?,
    };

    let user = auth::login(&mut ctx.client, &ctx.tokens, &ctx.state, &email, &password).await?;
    ctx.token_source = Some(TokenSource::Keyring);

    let role = if user.is_admin { "admin" } else { "user" };
    println!(
        "{} Logged in as {} ({})",
        "✓".green(),
        user.username.bold(),
        role
    );
    let next = match auth::landing(&user) {
        Route::Dashboard => "docchat dashboard",
        _ => "docchat chat",
    };
    println!("Next: {}", next.cyan());
    Ok(())
}

pub fn logout(ctx: &mut Context) -> Result<()> {
    ctx.client.set_token(None);
    ctx.token_source = None;
    auth::clear_credentials(&ctx.tokens, &ctx.state, ctx.client.base_url())?;
    tracing::info!("Logged out of {}", ctx.client.base_url());
    println!("{}", "Logged out.".green());
    Ok(())
}

pub async fn whoami(ctx: &Context) -> Result<()> {
    let user = ctx.current_user().await?;
    println!("{} <{}>", user.username.bold(), user.email);
    println!(
        "Role:   {}",
        if user.is_admin {
            "admin".yellow()
        } else {
            "user".normal()
        }
    );
    println!(
        "Status: {}",
        if user.is_active {
            "active".green()
        } else {
            "inactive".red()
        }
    );
    println!("Server: {}", ctx.client.base_url().cyan());
    Ok(())
}
