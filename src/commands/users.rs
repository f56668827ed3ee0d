//! User management commands (admin)

use super::{confirm, Context};
use crate::api::types::{User, UserCreate, UserUpdate};
use crate::auth::Route;
use crate::cli::UserCommand;
use crate::error::{DocchatError, Result};
use crate::format::format_timestamp;

use colored::Colorize;
use prettytable::{format, Table};
use regex::Regex;
use std::sync::OnceLock;

const USERNAME_MIN: usize = 3;
const USERNAME_MAX: usize = 50;
const PASSWORD_MIN: usize = 6;

fn email_regex() -> &'static Regex {
    static EMAIL: OnceLock<Regex> = OnceLock::new();
    EMAIL.get_or_init(|| {
        Regex::new(r"^[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}$")
            .expect("email pattern is valid")
    })
}

fn validate_username(username: &str) -> Result<()> {
    let len = username.chars().count();
    if !(USERNAME_MIN..=USERNAME_MAX).contains(&len) {
        return Err(DocchatError::Validation(format!(
            "Username must be between {} and {} characters",
            USERNAME_MIN, USERNAME_MAX
        ))
        .into());
    }
    Ok(())
}

fn validate_email(email: &str) -> Result<()> {
    if !email_regex().is_match(email) {
        return Err(DocchatError::Validation(format!("Invalid email address: {}", email)).into());
    }
    Ok(())
}

fn validate_password(password: &str) -> Result<()> {
    if password.chars().count() < PASSWORD_MIN {
        return Err(DocchatError::Validation(format!(
            "Password must be at least {} characters",
            PASSWORD_MIN
        ))
        .into());
    }
    Ok(())
}

/// Check a new account before it is sent.
pub fn validate_new_user(user: &UserCreate) -> Result<()> {
    validate_username(&user.username)?;
    validate_email(&user.email)?;
    validate_password(&user.password)
}

/// Check the fields an update sets; an empty update is rejected.
pub fn validate_update(update: &UserUpdate) -> Result<()> {
    if update.is_empty() {
        return Err(DocchatError::Validation("Nothing to update".to_string()).into());
    }
    if let Some(username) = &update.username {
        validate_username(username)?;
    }
    if let Some(email) = &update.email {
        validate_email(email)?;
    }
    if let Some(password) = &update.password {
        validate_password(password)?;
    }
    Ok(())
}

/// Handle user commands
pub async fn handle_users(ctx: &Context, command: UserCommand) -> Result<()> {
    let me = ctx.guard(Route::Users).await?;

    match command {
        UserCommand::List { json } => {
            let users = ctx.client.list_users().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&users)?);
            } else {
                print_users(&users, me.id);
            }
        }
        UserCommand::Show { id } => {
            let user = ctx.client.user(id).await?;
            print_users(std::slice::from_ref(&user), me.id);
        }
        UserCommand::Create {
            username,
            email,
            password,
            admin,
            inactive,
        } => {
            let user = UserCreate {
                username: username.trim().to_string(),
                email: email.trim().to_string(),
                password,
                is_admin: admin,
                is_active: !inactive,
            };
            validate_new_user(&user)?;
            let created = ctx.client.create_user(&user).await?;
            tracing::info!("Created user {} ({})", created.username, created.id);
            println!(
                "{}",
                format!("Created user {} (id {})", created.username, created.id).green()
            );
        }
        UserCommand::Update {
            id,
            username,
            email,
            password,
            active,
            admin,
        } => {
            let update = UserUpdate {
                username: username.map(|u| u.trim().to_string()),
                email: email.map(|e| e.trim().to_string()),
                password,
                is_active: active,
                is_admin: admin,
            };
            validate_update(&update)?;
            let updated = ctx.client.update_user(id, &update).await?;
            if updated.id == me.id {
                ctx.state.set_user(ctx.client.base_url(), updated.clone())?;
            }
            println!("{}", format!("Updated user {}", updated.username).green());
        }
        UserCommand::Delete { id } => {
            if id == me.id {
                return Err(DocchatError::Validation(
                    "You cannot delete your own account".to_string(),
                )
                .into());
            }
            if !confirm(&format!("Delete user {}?", id))? {
                return Ok(());
            }
            ctx.client.delete_user(id).await?;
            println!("{}", format!("Deleted user {}", id).green());
        }
    }

    Ok(())
}

fn print_users(users: &[User], me: i64) {
    if users.is_empty() {
        println!("{}", "No users found.".yellow());
        return;
    }

    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_BORDERS_ONLY);
    table.add_row(prettytable::row![
        "ID".bold(),
        "Username".bold(),
        "Email".bold(),
        "Role".bold(),
        "Status".bold(),
        "Created".bold()
    ]);

    for user in users {
        let name = if user.id == me {
            format!("{} (you)", user.username).bold()
        } else {
            user.username.normal()
        };
        let role = if user.is_admin {
            "admin".yellow()
        } else {
            "user".normal()
        };
        let status = if user.is_active {
            "active".green()
        } else {
            "inactive".red()
        };
        table.add_row(prettytable::row![
            user.id.to_string().cyan(),
            name,
            user.email,
            role,
            status,
            format_timestamp(&user.created_at)
        ]);
    }
    table.printstd();
}
