//! Interactive chat mode handler and one-shot questions.
//!
//! The REPL owns one [`ChatView`], the session list, and the persisted
//! session selection. Questions go through the view so a reply that
//! arrives after the user switched sessions is dropped.

use super::special_commands::{parse_special_command, print_help, SpecialCommand};
use super::{confirm, Context};
use crate::api::types::SessionId;
use crate::auth::Route;
use crate::chat::render::{
    render_citations, render_transcript, render_turn, RenderOptions, EMPTY_TRANSCRIPT, LOADING,
};
use crate::chat::sessions::{preview_text, ChatSession};
use crate::chat::transcript::FAILURE_MESSAGE;
use crate::chat::{ChatView, LoadOutcome, SendOutcome, SessionList};
use crate::error::{self, DocchatError, Result};
use crate::format::format_timestamp;
use crate::state::SessionSelection;

use colored::Colorize;
use prettytable::{format, Table};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;

pub(crate) fn render_options(ctx: &Context) -> RenderOptions {
    RenderOptions {
        show_citations: ctx.config.chat.show_citations,
        snippet_chars: ctx.config.chat.snippet_chars,
    }
}

/// Mutable state of one REPL run
struct Repl<'a> {
    ctx: &'a Context,
    view: ChatView,
    selection: SessionSelection,
    sessions: SessionList,
    /// Ids in the order of the last `/sessions` listing, for `/open #n`
    listing: Vec<SessionId>,
    options: RenderOptions,
}

impl<'a> Repl<'a> {
    fn new(ctx: &'a Context, collection: Option<String>) -> Self {
        Self {
            ctx,
            view: ChatView::new(collection),
            selection: SessionSelection::load(ctx.state.clone()),
            sessions: SessionList::default(),
            listing: Vec::new(),
            options: render_options(ctx),
        }
    }

    fn prompt(&self) -> String {
        let label = match self.view.session() {
            Some(id) => self
                .sessions
                .get(id)
                .map(|s| s.label().to_string())
                .unwrap_or_else(|| format!("chat {}", id)),
            None => "new chat".to_string(),
        };
        format!("[{}] >> ", label.cyan())
    }

    async fn refresh_sessions(&mut self) -> Result<()> {
        let summaries = self.ctx.client.list_sessions().await?;
        self.sessions = SessionList::from_summaries(summaries);
        Ok(())
    }

    /// Switch to `id` and print its transcript.
    async fn open(&mut self, id: SessionId) -> Result<()> {
        let ticket = self.view.begin_open(id.clone());
        let result = self.ctx.client.fetch_history(&id).await;
        if let Ok(history) = &result {
            self.sessions.set_preview_from(history);
        }

        match self.view.finish_open(ticket, result) {
            LoadOutcome::Applied { turns } => {
                tracing::debug!("Loaded {} turns for session {}", turns, id);
                self.selection.select(id)?;
                println!("{}\n", render_transcript(self.view.transcript(), self.options));
            }
            LoadOutcome::Stale => {}
            LoadOutcome::Failed {
                session_expired: true,
            } => return Err(DocchatError::SessionExpired.into()),
            LoadOutcome::Failed { .. } => {
                self.view.start_new();
                self.selection.clear_if(&id)?;
                eprintln!(
                    "{}",
                    format!("Could not load conversation {}; starting a new one.", id).red()
                );
            }
        }
        Ok(())
    }

    async fn ask(&mut self, text: &str) -> Result<()> {
        let was_new = self.view.session().is_none();

        let ticket = match self.view.begin_send(text) {
            Ok(Some(ticket)) => ticket,
            Ok(None) => return Ok(()),
            Err(e) if matches!(e.downcast_ref::<DocchatError>(), Some(DocchatError::Busy)) => {
                println!("{}", e.to_string().yellow());
                return Ok(());
            }
            Err(e) => return Err(e),
        };
        println!("{}", LOADING.dimmed());
        let outcome = self.view.complete_send(&self.ctx.client, ticket).await;

        match outcome {
            SendOutcome::Stale => return Ok(()),
            SendOutcome::Failed {
                session_expired: true,
            } => return Err(DocchatError::SessionExpired.into()),
            SendOutcome::Answered | SendOutcome::Failed { .. } => {
                if let Some(turn) = self.view.transcript().last_bot_turn() {
                    println!("\n{}\n", render_turn(turn, self.options));
                }
            }
        }

        if was_new {
            if let Some(id) = self.view.session().cloned() {
                let now = chrono::Utc::now().to_rfc3339();
                self.sessions.insert_front(ChatSession {
                    id: id.clone(),
                    title: None,
                    preview: Some(preview_text(text)),
                    created_at: now.clone(),
                    updated_at: now,
                    message_count: 1,
                });
                self.selection.select(id)?;
            }
        }
        Ok(())
    }

    async fn list(&mut self, query: Option<String>) -> Result<()> {
        self.refresh_sessions().await?;
        let hits = self.sessions.filter(query.as_deref().unwrap_or(""));
        if hits.is_empty() {
            println!("{}", "No conversations found.".yellow());
            self.listing.clear();
            return Ok(());
        }

        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_BORDERS_ONLY);
        table.add_row(prettytable::row![
            "#".bold(),
            "ID".bold(),
            "Title".bold(),
            "Messages".bold(),
            "Last Updated".bold()
        ]);
        for (i, session) in hits.iter().enumerate() {
            let marker = if self.view.session() == Some(&session.id) {
                "*"
            } else {
                ""
            };
            table.add_row(prettytable::row![
                format!("{}{}", i + 1, marker),
                session.id.as_str().cyan(),
                session.label(),
                session.message_count,
                format_timestamp(&session.updated_at)
            ]);
        }
        table.printstd();
        println!("Use {} to switch.", "/open #<n>".cyan());

        self.listing = hits.iter().map(|s| s.id.clone()).collect();
        Ok(())
    }

    fn resolve_target(&self, target: &str) -> Result<SessionId> {
        match target.strip_prefix('#') {
            Some(n) => {
                let index: usize = n.parse().map_err(|_| {
                    DocchatError::Validation(format!("'{}' is not a list number", target))
                })?;
                index
                    .checked_sub(1)
                    .and_then(|i| self.listing.get(i))
                    .cloned()
                    .ok_or_else(|| {
                        DocchatError::NotFound(format!(
                            "list entry {}; run /sessions first",
                            target
                        ))
                        .into()
                    })
            }
            None => Ok(SessionId::new(target)),
        }
    }

    fn current_session(&self) -> Result<SessionId> {
        self.view
            .session()
            .cloned()
            .ok_or_else(|| DocchatError::Validation("No conversation selected yet".into()).into())
    }

    async fn rename(&mut self, title: &str) -> Result<()> {
        let id = self.current_session()?;
        if self.sessions.get(&id).is_none() {
            self.refresh_sessions().await?;
        }
        let pending = self.sessions.begin_rename(&id, title)?;
        match self.ctx.client.rename_session(&id, &pending.title).await {
            Ok(()) => {
                println!("{}", format!("Renamed to \"{}\"", pending.title).green());
                Ok(())
            }
            Err(e) => {
                self.sessions.rollback_rename(pending);
                Err(e)
            }
        }
    }

    /// Delete `target` (an id or `#n`), or the open session without one.
    async fn delete(&mut self, target: Option<&str>) -> Result<()> {
        let id = match target {
            Some(target) => self.resolve_target(target)?,
            None => self.current_session()?,
        };
        let question = if self.view.session() == Some(&id) {
            "Delete this conversation?".to_string()
        } else {
            format!("Delete conversation {}?", id)
        };
        if !confirm(&question)? {
            return Ok(());
        }
        self.remove_session(&id).await
    }

    async fn remove_session(&mut self, id: &SessionId) -> Result<()> {
        self.ctx.client.delete_session(id).await?;
        self.sessions.remove(id);
        self.listing.retain(|s| s != id);
        self.selection.clear_if(id)?;
        if self.view.session() == Some(id) {
            self.view.start_new();
        }
        println!("{}", format!("Deleted conversation {}", id).green());
        Ok(())
    }

    fn sources(&self) {
        let Some(turn) = self.view.transcript().last_bot_turn() else {
            println!("{}", "No answers yet.".yellow());
            return;
        };
        if turn.citations.is_empty() {
            println!("{}", "The last answer has no sources.".yellow());
            return;
        }
        for line in render_citations(&turn.citations, usize::MAX) {
            println!("{}", line);
        }
    }

    /// Run one parsed command; `Ok(false)` ends the loop.
    async fn dispatch(&mut self, command: SpecialCommand, line: &str) -> Result<bool> {
        match command {
            SpecialCommand::None => self.ask(line).await?,
            SpecialCommand::NewSession => {
                self.view.start_new();
                self.selection.clear()?;
                println!("{}", "Started a new conversation.".green());
            }
            SpecialCommand::ListSessions(query) => self.list(query).await?,
            SpecialCommand::OpenSession(target) => {
                let id = self.resolve_target(&target)?;
                self.open(id).await?;
            }
            SpecialCommand::Rename(title) => self.rename(&title).await?,
            SpecialCommand::DeleteSession(target) => self.delete(target.as_deref()).await?,
            SpecialCommand::ShowHistory => {
                let id = self.current_session()?;
                self.open(id).await?;
            }
            SpecialCommand::Sources => self.sources(),
            SpecialCommand::Collection(collection) => {
                match &collection {
                    Some(name) => println!("Asking against collection {}", name.cyan()),
                    None => println!("Asking against the default collection"),
                }
                self.view.set_collection(collection);
            }
            SpecialCommand::Help => print_help(),
            SpecialCommand::Exit => return Ok(false),
        }
        Ok(true)
    }
}

/// Start interactive chat mode
///
/// # Arguments
///
/// * `ctx` - Command context
/// * `session` - Session to open instead of the last selected one
/// * `new` - Start with a fresh session
/// * `collection` - Collection override for this run
pub async fn run_chat(
    ctx: &Context,
    session: Option<String>,
    new: bool,
    collection: Option<String>,
) -> Result<()> {
    let user = ctx.guard(Route::Chat).await?;
    let collection = collection.or_else(|| ctx.config.chat.collection.clone());
    let mut repl = Repl::new(ctx, collection);

    if let Err(e) = repl.refresh_sessions().await {
        if error::is_session_expired(&e) {
            return Err(e);
        }
        tracing::warn!("Could not load chat sessions: {:#}", e);
    }

    print_welcome_banner(&user.username, repl.sessions.len());

    let initial = if new {
        repl.selection.clear()?;
        None
    } else {
        session
            .map(SessionId::new)
            .or_else(|| repl.selection.current().cloned())
    };
    match initial {
        Some(id) => repl.open(id).await?,
        None => println!("{}\n", EMPTY_TRANSCRIPT.yellow()),
    }

    let mut rl = DefaultEditor::new()?;
    loop {
        match rl.readline(&repl.prompt()) {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                rl.add_history_entry(trimmed)?;

                let command = match parse_special_command(trimmed) {
                    Ok(command) => command,
                    Err(e) => {
                        eprintln!("{}", e.to_string().red());
                        continue;
                    }
                };

                match repl.dispatch(command, trimmed).await {
                    Ok(true) => {}
                    Ok(false) => break,
                    Err(e) if error::is_session_expired(&e) => return Err(e),
                    Err(e) => eprintln!("{} {}", "Error:".red(), e),
                }
            }
            Err(ReadlineError::Interrupted) => {
                println!("CTRL-C");
                break;
            }
            Err(ReadlineError::Eof) => {
                println!("CTRL-D");
                break;
            }
            Err(err) => {
                tracing::error!("Readline error: {:?}", err);
                break;
            }
        }
    }

    println!("Goodbye!");
    Ok(())
}

fn print_welcome_banner(username: &str, session_count: usize) {
    println!("\n╔══════════════════════════════════════════════════════════════╗");
    println!("║                 DocChat - Ask your documents                 ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");
    println!(
        "Signed in as {}; {} saved conversation(s).",
        username.bold(),
        session_count
    );
    println!("Type '/help' for available commands, 'exit' to quit\n");
}

/// Ask one question and print the answer.
///
/// Without `session` a new session is created. The session used becomes
/// the selected one, so `docchat chat` continues it.
pub async fn run_ask(
    ctx: &Context,
    question: Vec<String>,
    session: Option<String>,
    collection: Option<String>,
    json: bool,
) -> Result<()> {
    ctx.guard(Route::Chat).await?;
    let text = question.join(" ");
    let collection = collection.or_else(|| ctx.config.chat.collection.clone());
    let mut view = ChatView::new(collection);

    if let Some(id) = session {
        match view.open(&ctx.client, SessionId::new(id.clone())).await {
            LoadOutcome::Applied { .. } | LoadOutcome::Stale => {}
            LoadOutcome::Failed {
                session_expired: true,
            } => return Err(DocchatError::SessionExpired.into()),
            LoadOutcome::Failed { .. } => {
                return Err(DocchatError::NotFound(format!("chat session {}", id)).into())
            }
        }
    }

    match view.send(&ctx.client, &text).await? {
        Some(SendOutcome::Answered) => {}
        Some(SendOutcome::Failed {
            session_expired: true,
        }) => return Err(DocchatError::SessionExpired.into()),
        Some(SendOutcome::Failed { .. }) => anyhow::bail!(FAILURE_MESSAGE),
        Some(SendOutcome::Stale) | None => {
            return Err(DocchatError::Validation("Question cannot be empty".into()).into())
        }
    }

    let session_id = view.session().cloned();
    if let Some(id) = &session_id {
        SessionSelection::load(ctx.state.clone()).select(id.clone())?;
    }

    let turn = view
        .transcript()
        .last_bot_turn()
        .ok_or_else(|| anyhow::anyhow!("no answer in transcript"))?;

    if json {
        let body = serde_json::json!({
            "session_id": session_id,
            "answer": turn.text(),
            "citations": turn.citations,
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
    } else {
        println!("{}", render_turn(turn, render_options(ctx)));
        if let Some(id) = &session_id {
            println!("\n{} {}", "Session:".dimmed(), id.as_str().cyan());
        }
    }
    Ok(())
}
