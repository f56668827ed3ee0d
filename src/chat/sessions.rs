//! Session list shown next to the chat
//!
//! Holds the summaries from `GET /chat/all` and the small amount of local
//! decoration the list needs: a preview taken from the first query, and an
//! optimistic title while a rename is in flight.

use crate::api::types::{ChatHistory, ChatSummary, SessionId};
use crate::error::{DocchatError, Result};

/// Label for a session with neither title nor preview.
pub const UNTITLED: &str = "New Chat";

const PREVIEW_MAX_CHARS: usize = 50;

/// One conversation in the list.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatSession {
    pub id: SessionId,
    pub title: Option<String>,
    pub preview: Option<String>,
    pub created_at: String,
    pub updated_at: String,
    pub message_count: u64,
}

impl From<ChatSummary> for ChatSession {
    fn from(summary: ChatSummary) -> Self {
        Self {
            id: summary.id,
            title: summary.title.filter(|t| !t.trim().is_empty()),
            preview: None,
            created_at: summary.created_at,
            updated_at: summary.updated_at,
            message_count: summary.message_count,
        }
    }
}

impl ChatSession {
    /// Title, else preview, else [`UNTITLED`].
    pub fn label(&self) -> &str {
        self.title
            .as_deref()
            .or(self.preview.as_deref())
            .unwrap_or(UNTITLED)
    }

    fn matches(&self, needle: &str) -> bool {
        self.label().to_lowercase().contains(needle)
            || self
                .preview
                .as_deref()
                .map(|p| p.to_lowercase().contains(needle))
                .unwrap_or(false)
    }
}

/// Shorten `text` the way the backend shortens auto-generated titles.
///
/// # Examples
///
/// ```
/// use docchat::chat::sessions::preview_text;
///
/// assert_eq!(preview_text("  short  "), "short");
/// assert_eq!(preview_text(&"x".repeat(60)).chars().count(), 50);
/// ```
pub fn preview_text(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.chars().count() > PREVIEW_MAX_CHARS {
        let head: String = trimmed.chars().take(PREVIEW_MAX_CHARS - 3).collect();
        format!("{}...", head)
    } else {
        trimmed.to_string()
    }
}

/// A rename that has been applied locally but not yet confirmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRename {
    pub id: SessionId,
    pub title: String,
    previous: Option<String>,
}

/// Ordered session list; order is the backend's (most recently updated first).
#[derive(Debug, Clone, Default)]
pub struct SessionList {
    sessions: Vec<ChatSession>,
}

impl SessionList {
    pub fn from_summaries(summaries: Vec<ChatSummary>) -> Self {
        Self {
            sessions: summaries.into_iter().map(ChatSession::from).collect(),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChatSession> {
        self.sessions.iter()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn get(&self, id: &SessionId) -> Option<&ChatSession> {
        self.sessions.iter().find(|s| &s.id == id)
    }

    fn get_mut(&mut self, id: &SessionId) -> Option<&mut ChatSession> {
        self.sessions.iter_mut().find(|s| &s.id == id)
    }

    /// Sessions whose label or preview contains `query`, case-insensitively.
    /// A blank query matches everything.
    pub fn filter(&self, query: &str) -> Vec<&ChatSession> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return self.sessions.iter().collect();
        }
        self.sessions.iter().filter(|s| s.matches(&needle)).collect()
    }

    /// Add a freshly created session at the top of the list.
    pub fn insert_front(&mut self, session: ChatSession) {
        self.sessions.retain(|s| s.id != session.id);
        self.sessions.insert(0, session);
    }

    /// Record the first query of a loaded history as the preview.
    pub fn set_preview_from(&mut self, history: &ChatHistory) {
        let first = history
            .messages
            .first()
            .and_then(|m| m.query.as_deref())
            .map(preview_text)
            .filter(|p| !p.is_empty());
        if let Some(session) = self.get_mut(&history.id) {
            session.preview = first;
            session.message_count = history.messages.len() as u64;
        }
    }

    /// Apply `title` optimistically.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a blank title and
    /// [`DocchatError::NotFound`] for an unknown session.
    pub fn begin_rename(&mut self, id: &SessionId, title: &str) -> Result<PendingRename> {
        let title = title.trim();
        if title.is_empty() {
            return Err(DocchatError::Validation("Title cannot be empty".to_string()).into());
        }
        let session = self
            .get_mut(id)
            .ok_or_else(|| DocchatError::NotFound(format!("chat session {}", id)))?;
        let previous = session.title.replace(title.to_string());
        Ok(PendingRename {
            id: id.clone(),
            title: title.to_string(),
            previous,
        })
    }

    /// Undo a rename the backend rejected.
    pub fn rollback_rename(&mut self, pending: PendingRename) {
        if let Some(session) = self.get_mut(&pending.id) {
            session.title = pending.previous;
        }
    }

    /// Remove a deleted session.
    pub fn remove(&mut self, id: &SessionId) -> Option<ChatSession> {
        let index = self.sessions.iter().position(|s| &s.id == id)?;
        Some(self.sessions.remove(index))
    }
}
