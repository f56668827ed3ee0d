//! Chat transcript reconciliation
//!
//! The backend stores a conversation as ordered query/answer pairs. The
//! client renders it as a flat list of turns, alternating user and bot,
//! and extends that list optimistically while a send is in flight:
//!
//! 1. [`reconcile`] flattens a backend history into [`ChatTurn`]s. Every
//!    pair yields exactly two turns, user first, both stamped with the
//!    pair's `created_at`.
//! 2. [`Transcript::append_optimistic`] adds the local user turn plus a
//!    loading placeholder and returns the placeholder's [`PendingId`].
//! 3. [`Transcript::resolve_optimistic`] removes that placeholder exactly
//!    once and appends either the backend's answer or a local failure turn.
//!
//! The backend history is the only source of truth: a failure turn is never
//! persisted and vanishes on the next [`Transcript::replace_with`].

use crate::api::types::{ChatHistory, Citation, MessageResponse, SessionId};
use crate::error::DocchatError;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Text shown for the synthetic bot turn when a send fails.
pub const FAILURE_MESSAGE: &str =
    "Sorry, there was an error processing your request. Please try again.";

/// Text shown for a history turn whose backend field was missing.
pub const UNAVAILABLE_MESSAGE: &str = "message unavailable";

/// Who authored a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Bot,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => f.write_str("user"),
            Role::Bot => f.write_str("bot"),
        }
    }
}

/// What a turn displays.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnBody {
    /// Normal message text
    Text(String),
    /// The backend entry lacked this side of the pair
    Unavailable,
    /// Local stand-in for an answer that never arrived
    Failed,
}

/// One rendered message bubble.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatTurn {
    /// Unique within the transcript; derived, not server assigned
    pub id: String,
    /// Owning session, unknown until the first send creates it
    pub session_id: Option<SessionId>,
    pub role: Role,
    pub body: TurnBody,
    pub timestamp: String,
    /// Only ever non-empty on bot turns
    pub citations: Vec<Citation>,
}

impl ChatTurn {
    /// The text to display for this turn.
    pub fn text(&self) -> &str {
        match &self.body {
            TurnBody::Text(text) => text,
            TurnBody::Unavailable => UNAVAILABLE_MESSAGE,
            TurnBody::Failed => FAILURE_MESSAGE,
        }
    }

    pub fn is_failure(&self) -> bool {
        self.body == TurnBody::Failed
    }
}

/// Identifies the loading placeholder of one in-flight send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PendingId(u64);

impl fmt::Display for PendingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "pending-{}", self.0)
    }
}

/// An element of the displayed sequence.
#[derive(Debug, Clone, PartialEq)]
pub enum Entry {
    Turn(ChatTurn),
    /// Transient loading marker; never a [`ChatTurn`]
    Loading(PendingId),
}

impl Entry {
    pub fn as_turn(&self) -> Option<&ChatTurn> {
        match self {
            Entry::Turn(turn) => Some(turn),
            Entry::Loading(_) => None,
        }
    }
}

/// Whether a placeholder is currently shown, and for which view generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingState {
    Idle,
    Pending { placeholder: PendingId, generation: u64 },
}

/// How a pending send ended, as reported by the backend call.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    Answered(MessageResponse),
    Failed,
}

/// What [`Transcript::resolve_optimistic`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveOutcome {
    /// Placeholder replaced by the backend answer
    Resolved,
    /// Placeholder replaced by the local failure turn
    Failed,
    /// The id did not match the current placeholder; nothing changed
    Stale,
}

/// Flatten a backend history into display turns.
///
/// Never fails: a pair with a missing `query` or `answer` still yields two
/// turns, with the absent side rendered as [`UNAVAILABLE_MESSAGE`].
///
/// # Examples
///
/// ```
/// use docchat::api::types::ChatHistory;
/// use docchat::chat::transcript::{reconcile, Role};
///
/// let history: ChatHistory = serde_json::from_value(serde_json::json!({
///     "id": "1",
///     "messages": [{"query": "hi", "answer": "hello", "citations": [], "created_at": "T1"}]
/// })).unwrap();
///
/// let turns = reconcile(&history);
/// assert_eq!(turns.len(), 2);
/// assert_eq!(turns[0].role, Role::User);
/// assert_eq!(turns[1].text(), "hello");
/// ```
pub fn reconcile(history: &ChatHistory) -> Vec<ChatTurn> {
    let mut turns = Vec::with_capacity(history.messages.len() * 2);

    for (index, entry) in history.messages.iter().enumerate() {
        if entry.query.is_none() || entry.answer.is_none() {
            tracing::warn!(
                "History entry {} of session {} is missing its {}",
                index,
                history.id,
                if entry.query.is_none() { "query" } else { "answer" }
            );
        }

        turns.push(ChatTurn {
            id: format!("{}-user-{}", entry.created_at, index),
            session_id: Some(history.id.clone()),
            role: Role::User,
            body: body_from(entry.query.as_deref()),
            timestamp: entry.created_at.clone(),
            citations: Vec::new(),
        });
        turns.push(ChatTurn {
            id: format!("{}-bot-{}", entry.created_at, index),
            session_id: Some(history.id.clone()),
            role: Role::Bot,
            body: body_from(entry.answer.as_deref()),
            timestamp: entry.created_at.clone(),
            citations: entry.citations.clone(),
        });
    }

    turns
}

fn body_from(field: Option<&str>) -> TurnBody {
    match field {
        Some(text) => TurnBody::Text(text.to_string()),
        None => TurnBody::Unavailable,
    }
}

fn iso(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Ordered display sequence for one session view.
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    session_id: Option<SessionId>,
    entries: Vec<Entry>,
    pending: Option<(PendingId, u64)>,
    next_pending: u64,
}

impl Transcript {
    /// An empty transcript for a session that may not exist yet.
    pub fn new(session_id: Option<SessionId>) -> Self {
        Self {
            session_id,
            ..Default::default()
        }
    }

    /// A transcript holding the reconciled backend history.
    pub fn from_history(history: &ChatHistory) -> Self {
        let mut transcript = Self::new(None);
        transcript.replace_with(history);
        transcript
    }

    /// Replace everything, including any placeholder and failure turns,
    /// with the reconciled backend history.
    pub fn replace_with(&mut self, history: &ChatHistory) {
        self.session_id = Some(history.id.clone());
        self.entries = reconcile(history).into_iter().map(Entry::Turn).collect();
        self.pending = None;
    }

    /// Drop all entries and any placeholder.
    pub fn clear(&mut self, session_id: Option<SessionId>) {
        self.session_id = session_id;
        self.entries.clear();
        self.pending = None;
    }

    pub fn session_id(&self) -> Option<&SessionId> {
        self.session_id.as_ref()
    }

    /// Put the transcript and every turn in it under `session_id`.
    pub fn bind_session(&mut self, session_id: SessionId) {
        for entry in &mut self.entries {
            if let Entry::Turn(turn) = entry {
                turn.session_id = Some(session_id.clone());
            }
        }
        self.session_id = Some(session_id);
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Real turns only, skipping the placeholder.
    pub fn turns(&self) -> impl Iterator<Item = &ChatTurn> {
        self.entries.iter().filter_map(Entry::as_turn)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn pending_state(&self) -> PendingState {
        match self.pending {
            Some((placeholder, generation)) => PendingState::Pending {
                placeholder,
                generation,
            },
            None => PendingState::Idle,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Most recent bot turn, used to show its citations on demand.
    pub fn last_bot_turn(&self) -> Option<&ChatTurn> {
        self.entries
            .iter()
            .rev()
            .filter_map(Entry::as_turn)
            .find(|turn| turn.role == Role::Bot)
    }

    /// Append the user's turn and a loading placeholder tagged with the
    /// caller's request `generation`.
    ///
    /// # Errors
    ///
    /// Returns [`DocchatError::Busy`] if a placeholder is already shown.
    pub fn append_optimistic(
        &mut self,
        text: &str,
        generation: u64,
    ) -> Result<PendingId, DocchatError> {
        self.append_optimistic_at(text, generation, Utc::now())
    }

    /// [`Transcript::append_optimistic`] with an explicit clock.
    pub fn append_optimistic_at(
        &mut self,
        text: &str,
        generation: u64,
        now: DateTime<Utc>,
    ) -> Result<PendingId, DocchatError> {
        if self.pending.is_some() {
            return Err(DocchatError::Busy);
        }

        self.entries.push(Entry::Turn(ChatTurn {
            id: now.timestamp_millis().to_string(),
            session_id: self.session_id.clone(),
            role: Role::User,
            body: TurnBody::Text(text.to_string()),
            timestamp: iso(now),
            citations: Vec::new(),
        }));

        let placeholder = PendingId(self.next_pending);
        self.next_pending += 1;
        self.entries.push(Entry::Loading(placeholder));
        self.pending = Some((placeholder, generation));

        Ok(placeholder)
    }

    /// Remove the placeholder `pending` and append the outcome.
    ///
    /// An unknown or already resolved id is reported as
    /// [`ResolveOutcome::Stale`] and leaves the transcript untouched.
    pub fn resolve_optimistic(&mut self, pending: PendingId, resolution: Resolution) -> ResolveOutcome {
        self.resolve_optimistic_at(pending, resolution, Utc::now())
    }

    /// [`Transcript::resolve_optimistic`] with an explicit clock.
    pub fn resolve_optimistic_at(
        &mut self,
        pending: PendingId,
        resolution: Resolution,
        now: DateTime<Utc>,
    ) -> ResolveOutcome {
        if self.pending.map(|(id, _)| id) != Some(pending) {
            tracing::debug!("Ignoring resolution for stale placeholder {}", pending);
            return ResolveOutcome::Stale;
        }

        self.entries
            .retain(|entry| !matches!(entry, Entry::Loading(id) if *id == pending));
        self.pending = None;

        let millis = now.timestamp_millis();
        let (turn, outcome) = match resolution {
            Resolution::Answered(response) => (
                ChatTurn {
                    id: response
                        .message_id
                        .map(|id| id.to_string())
                        .unwrap_or_else(|| format!("{}-bot", millis)),
                    session_id: self.session_id.clone(),
                    role: Role::Bot,
                    body: TurnBody::Text(response.answer),
                    timestamp: iso(now),
                    citations: response.citations,
                },
                ResolveOutcome::Resolved,
            ),
            Resolution::Failed => (
                ChatTurn {
                    id: format!("{}-error", millis),
                    session_id: self.session_id.clone(),
                    role: Role::Bot,
                    body: TurnBody::Failed,
                    timestamp: iso(now),
                    citations: Vec::new(),
                },
                ResolveOutcome::Failed,
            ),
        };

        self.entries.push(Entry::Turn(turn));
        outcome
    }
}
