//! Special commands parser for interactive chat mode
//!
//! Commands are prefixed with `/` and are case-insensitive; arguments keep
//! their original case. Anything else typed at the prompt is a question.

use thiserror::Error;

/// Errors that can occur when parsing special commands
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CommandError {
    /// Unknown command was entered
    #[error("Unknown command: {0}\n\nType '/help' to see available commands")]
    UnknownCommand(String),

    /// Command was given an unsupported argument
    #[error("Unsupported argument for {command}: {arg}\n\nType '/help' to see valid usage")]
    UnsupportedArgument { command: String, arg: String },

    /// Command requires an argument but none was provided
    #[error("Command {command} requires an argument\n\nUsage: {usage}")]
    MissingArgument { command: String, usage: String },
}

/// Special commands that can be executed during interactive chat
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpecialCommand {
    /// Abandon the current session; the next question starts a new one
    NewSession,

    /// List sessions, optionally filtered by a search term
    ListSessions(Option<String>),

    /// Switch to another session by id, or `#n` for its position in the last listing
    OpenSession(String),

    /// Rename the current session
    Rename(String),

    /// Delete a session by id or `#n`, or the current one without an argument
    DeleteSession(Option<String>),

    /// Reload and print the current session's history
    ShowHistory,

    /// Print the citations of the last answer
    Sources,

    /// Set or clear the collection questions are asked against
    Collection(Option<String>),

    /// Display help information
    Help,

    /// Exit the interactive session
    Exit,

    /// Not a special command
    ///
    /// The input should be sent as a question.
    None,
}

/// Parse a user input string into a special command
///
/// # Errors
///
/// Returns CommandError::UnknownCommand if input starts with "/" but is not a valid command.
/// Returns CommandError::UnsupportedArgument if a command receives an invalid argument.
/// Returns CommandError::MissingArgument if a command requires an argument but none was provided.
///
/// # Examples
///
/// ```
/// use docchat::commands::special_commands::{parse_special_command, SpecialCommand};
///
/// let cmd = parse_special_command("/open 12").unwrap();
/// assert_eq!(cmd, SpecialCommand::OpenSession("12".to_string()));
///
/// let cmd = parse_special_command("What is the refund policy?").unwrap();
/// assert_eq!(cmd, SpecialCommand::None);
///
/// assert!(parse_special_command("/foo").is_err());
/// ```
pub fn parse_special_command(input: &str) -> Result<SpecialCommand, CommandError> {
    let trimmed = input.trim();
    let lower = trimmed.to_lowercase();

    if !trimmed.starts_with('/') && lower != "exit" && lower != "quit" {
        return Ok(SpecialCommand::None);
    }

    let (command, rest) = match trimmed.split_once(char::is_whitespace) {
        Some((command, rest)) => (command.to_lowercase(), rest.trim()),
        None => (lower.clone(), ""),
    };
    let arg = (!rest.is_empty()).then(|| rest.to_string());

    match command.as_str() {
        "/new" => no_argument("/new", arg, SpecialCommand::NewSession),
        "/sessions" | "/ls" => Ok(SpecialCommand::ListSessions(arg)),
        "/open" | "/switch" => arg.map(SpecialCommand::OpenSession).ok_or_else(|| {
            CommandError::MissingArgument {
                command: "/open".to_string(),
                usage: "/open <session id | #list number>".to_string(),
            }
        }),
        "/rename" | "/title" => {
            arg.map(SpecialCommand::Rename)
                .ok_or_else(|| CommandError::MissingArgument {
                    command: "/rename".to_string(),
                    usage: "/rename <new title>".to_string(),
                })
        }
        "/delete" => Ok(SpecialCommand::DeleteSession(arg)),
        "/history" => no_argument("/history", arg, SpecialCommand::ShowHistory),
        "/sources" | "/citations" => no_argument("/sources", arg, SpecialCommand::Sources),
        "/collection" => match arg.as_deref() {
            Some("default") | Some("none") => Ok(SpecialCommand::Collection(None)),
            _ => Ok(SpecialCommand::Collection(arg)),
        },
        "/help" | "/?" => Ok(SpecialCommand::Help),
        "exit" | "quit" | "/exit" | "/quit" => Ok(SpecialCommand::Exit),
        _ => Err(CommandError::UnknownCommand(command)),
    }
}

fn no_argument(
    command: &str,
    arg: Option<String>,
    parsed: SpecialCommand,
) -> Result<SpecialCommand, CommandError> {
    match arg {
        None => Ok(parsed),
        Some(arg) => Err(CommandError::UnsupportedArgument {
            command: command.to_string(),
            arg,
        }),
    }
}

/// Display help text for special commands
pub fn print_help() {
    println!(
        r#"
Special Commands for Interactive Chat
=====================================

SESSIONS:
  /new                - Start a new conversation
  /sessions [search]  - List conversations (most recent first)
  /open <id|#n>       - Switch to a conversation by id or #list number
  /rename <title>     - Rename the current conversation
  /delete [id|#n]     - Delete a conversation (default: the current one)
  /history            - Reload and print the current conversation

ANSWERS:
  /sources            - Show the citations of the last answer
  /collection [name]  - Ask against another collection ('default' resets)

OTHER:
  /help               - Show this help message
  /exit               - Exit chat (also 'exit', 'quit', Ctrl-D)

Anything else is sent as a question. While an answer is pending the
prompt does not accept new questions.
"#
    );
}
