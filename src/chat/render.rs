//! Terminal rendering for transcripts

use super::transcript::{ChatTurn, Entry, Role, Transcript, TurnBody};
use crate::api::types::Citation;
use crate::format::{format_timestamp, truncate_chars};

use colored::Colorize;

/// Shown in place of an empty transcript.
pub const EMPTY_TRANSCRIPT: &str = "No messages yet. Ask a question to get started.";

/// Shown while a send is pending.
pub const LOADING: &str = "… thinking";

/// Rendering knobs taken from the chat config.
#[derive(Debug, Clone, Copy)]
pub struct RenderOptions {
    pub show_citations: bool,
    pub snippet_chars: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            show_citations: true,
            snippet_chars: 160,
        }
    }
}

/// One line per citation: `[n] label (page p): snippet`.
///
/// Page numbers are shifted to one-based.
pub fn render_citations(citations: &[Citation], snippet_chars: usize) -> Vec<String> {
    citations
        .iter()
        .enumerate()
        .map(|(i, citation)| {
            let page = citation
                .display_page()
                .map(|p| format!(" (page {})", p))
                .unwrap_or_default();
            let snippet = truncate_chars(&citation.content.replace('\n', " "), snippet_chars);
            if snippet.is_empty() {
                format!("[{}] {}{}", i + 1, citation.label(), page)
            } else {
                format!("[{}] {}{}: {}", i + 1, citation.label(), page, snippet)
            }
        })
        .collect()
}

pub fn render_turn(turn: &ChatTurn, options: RenderOptions) -> String {
    let when = format_timestamp(&turn.timestamp);
    let mut out = match turn.role {
        Role::User => format!("{} {}\n{}", "You".cyan().bold(), when.dimmed(), turn.text()),
        Role::Bot => {
            let text = match turn.body {
                TurnBody::Text(_) => turn.text().normal(),
                TurnBody::Unavailable => turn.text().dimmed().italic(),
                TurnBody::Failed => turn.text().red(),
            };
            format!("{} {}\n{}", "Assistant".green().bold(), when.dimmed(), text)
        }
    };

    if options.show_citations && !turn.citations.is_empty() {
        out.push_str(&format!("\n{}", "Sources:".yellow()));
        for line in render_citations(&turn.citations, options.snippet_chars) {
            out.push_str("\n  ");
            out.push_str(&line);
        }
    }

    out
}

pub fn render_entry(entry: &Entry, options: RenderOptions) -> String {
    match entry {
        Entry::Turn(turn) => render_turn(turn, options),
        Entry::Loading(_) => LOADING.dimmed().to_string(),
    }
}

/// The whole transcript, turns separated by blank lines.
pub fn render_transcript(transcript: &Transcript, options: RenderOptions) -> String {
    if transcript.is_empty() {
        return EMPTY_TRANSCRIPT.yellow().to_string();
    }
    transcript
        .entries()
        .iter()
        .map(|entry| render_entry(entry, options))
        .collect::<Vec<_>>()
        .join("\n\n")
}
