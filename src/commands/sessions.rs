use super::chat::render_options;
use super::Context;
use crate::api::types::SessionId;
use crate::auth::Route;
use crate::chat::render::render_transcript;
use crate::chat::{SessionList, Transcript};
use crate::cli::SessionCommand;
use crate::error::{DocchatError, Result};
use crate::format::{format_timestamp, truncate_chars};
use crate::state::SessionSelection;

use colored::Colorize;
use prettytable::{format, Table};

/// Handle session commands
pub async fn handle_sessions(ctx: &Context, command: SessionCommand) -> Result<()> {
    ctx.guard(Route::Chat).await?;

    match command {
        SessionCommand::List { search, json } => {
            let summaries = ctx.client.list_sessions().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&summaries)?);
                return Ok(());
            }

            let sessions = SessionList::from_summaries(summaries);
            let hits = sessions.filter(search.as_deref().unwrap_or(""));
            if hits.is_empty() {
                println!("{}", "No conversations found.".yellow());
                return Ok(());
            }

            let selected = SessionSelection::load(ctx.state.clone()).current().cloned();

            let mut table = Table::new();
            table.set_format(*format::consts::FORMAT_BORDERS_ONLY);
            table.add_row(prettytable::row![
                "ID".bold(),
                "Title".bold(),
                "Messages".bold(),
                "Last Updated".bold()
            ]);
            for session in hits {
                let id = if selected.as_ref() == Some(&session.id) {
                    format!("{}*", session.id).green()
                } else {
                    session.id.as_str().cyan()
                };
                table.add_row(prettytable::row![
                    id,
                    truncate_chars(session.label(), 40),
                    session.message_count,
                    format_timestamp(&session.updated_at)
                ]);
            }

            println!("\nConversations:");
            table.printstd();
            println!();
            println!(
                "Use {} to continue one.",
                "docchat chat --session <ID>".cyan()
            );
            println!();
        }
        SessionCommand::Show { id, json } => {
            let history = ctx.client.fetch_history(&SessionId::new(id)).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&history)?);
            } else {
                let transcript = Transcript::from_history(&history);
                println!("{}", render_transcript(&transcript, render_options(ctx)));
            }
        }
        SessionCommand::Rename { id, title } => {
            let title = title.trim();
            if title.is_empty() {
                return Err(DocchatError::Validation("Title cannot be empty".to_string()).into());
            }
            ctx.client
                .rename_session(&SessionId::new(id.clone()), title)
                .await?;
            println!("{}", format!("Renamed conversation {} to \"{}\"", id, title).green());
        }
        SessionCommand::Delete { id } => {
            let id = SessionId::new(id);
            ctx.client.delete_session(&id).await?;
            SessionSelection::load(ctx.state.clone()).clear_if(&id)?;
            println!("{}", format!("Deleted conversation {}", id).green());
        }
    }

    Ok(())
}
