//! Per-session chat view
//!
//! [`ChatView`] drives a [`Transcript`] through `Idle → Sending → Idle`.
//! Each backend call is split into a `begin_*` step that returns a ticket
//! and a `finish_*` step that applies the result. Tickets carry the view's
//! generation at the time they were issued; switching sessions bumps the
//! generation, so a response that arrives for an abandoned selection is
//! recognised and dropped instead of overwriting the newer view.

use super::backend::ChatBackend;
use super::transcript::{PendingId, Resolution, ResolveOutcome, Transcript};
use crate::api::types::{ChatHistory, MessageResponse, SessionId};
use crate::error::{self, DocchatError, Result};

/// Issued by [`ChatView::begin_open`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
    session: SessionId,
}

impl LoadTicket {
    pub fn session(&self) -> &SessionId {
        &self.session
    }
}

/// Issued by [`ChatView::begin_send`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendTicket {
    generation: u64,
    pending: PendingId,
    text: String,
}

impl SendTicket {
    pub fn text(&self) -> &str {
        &self.text
    }
}

/// Result of applying a history load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// History reconciled into the transcript
    Applied { turns: usize },
    /// The view moved on before the response arrived
    Stale,
    /// The fetch failed; the transcript is left empty
    Failed { session_expired: bool },
}

/// Result of applying a send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// The backend answer replaced the placeholder
    Answered,
    /// The failure turn replaced the placeholder
    Failed { session_expired: bool },
    /// The view moved on before the response arrived
    Stale,
}

/// Phase of the view, as shown to the input box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewPhase {
    Idle,
    Sending,
}

/// State of one chat view: current session, transcript, and generation.
#[derive(Debug, Clone, Default)]
pub struct ChatView {
    session: Option<SessionId>,
    transcript: Transcript,
    generation: u64,
    collection: Option<String>,
}

impl ChatView {
    /// A view with no session; the first send creates one.
    pub fn new(collection: Option<String>) -> Self {
        Self {
            collection,
            ..Default::default()
        }
    }

    pub fn session(&self) -> Option<&SessionId> {
        self.session.as_ref()
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn collection(&self) -> Option<&str> {
        self.collection.as_deref()
    }

    pub fn set_collection(&mut self, collection: Option<String>) {
        self.collection = collection;
    }

    pub fn phase(&self) -> ViewPhase {
        if self.transcript.is_pending() {
            ViewPhase::Sending
        } else {
            ViewPhase::Idle
        }
    }

    /// Abandon the current session; the next send creates a new one.
    pub fn start_new(&mut self) {
        self.generation += 1;
        self.session = None;
        self.transcript.clear(None);
    }

    /// Switch to `session` and return the ticket for its history fetch.
    ///
    /// Any in-flight send or load for the previous selection becomes stale.
    pub fn begin_open(&mut self, session: SessionId) -> LoadTicket {
        self.generation += 1;
        self.session = Some(session.clone());
        self.transcript.clear(Some(session.clone()));
        LoadTicket {
            generation: self.generation,
            session,
        }
    }

    /// Apply the history fetched for `ticket`.
    pub fn finish_open(&mut self, ticket: LoadTicket, result: Result<ChatHistory>) -> LoadOutcome {
        if ticket.generation != self.generation {
            tracing::debug!(
                "Dropping stale history for session {} (generation {} != {})",
                ticket.session,
                ticket.generation,
                self.generation
            );
            return LoadOutcome::Stale;
        }

        match result {
            Ok(history) => {
                if history.id != ticket.session {
                    tracing::warn!(
                        "History for session {} came back labelled {}",
                        ticket.session,
                        history.id
                    );
                }
                self.transcript.replace_with(&history);
                self.transcript.bind_session(ticket.session);
                LoadOutcome::Applied {
                    turns: self.transcript.len(),
                }
            }
            Err(e) => {
                tracing::error!("Failed to load chat history for {}: {:#}", ticket.session, e);
                LoadOutcome::Failed {
                    session_expired: error::is_session_expired(&e),
                }
            }
        }
    }

    /// Fetch and apply the history of `session`.
    pub async fn open<B: ChatBackend + ?Sized>(
        &mut self,
        backend: &B,
        session: SessionId,
    ) -> LoadOutcome {
        let ticket = self.begin_open(session);
        let result = backend.fetch_history(ticket.session()).await;
        self.finish_open(ticket, result)
    }

    /// Show `text` optimistically and return the ticket for its send.
    ///
    /// Returns `Ok(None)` for blank input.
    ///
    /// # Errors
    ///
    /// Returns [`DocchatError::Busy`] while a previous send is pending; input
    /// is refused rather than queued.
    pub fn begin_send(&mut self, text: &str) -> Result<Option<SendTicket>> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        if self.transcript.is_pending() {
            return Err(DocchatError::Busy.into());
        }

        let pending = self.transcript.append_optimistic(trimmed, self.generation)?;
        Ok(Some(SendTicket {
            generation: self.generation,
            pending,
            text: trimmed.to_string(),
        }))
    }

    /// Record the session created for a first send.
    ///
    /// Returns `false` (and changes nothing) if the ticket is stale.
    pub fn adopt_session(&mut self, ticket: &SendTicket, session: SessionId) -> bool {
        if ticket.generation != self.generation {
            return false;
        }
        self.session = Some(session.clone());
        self.transcript.bind_session(session);
        true
    }

    /// Apply the backend's reply (or failure) for `ticket`.
    pub fn finish_send(&mut self, ticket: SendTicket, result: Result<MessageResponse>) -> SendOutcome {
        if ticket.generation != self.generation {
            tracing::debug!("Dropping stale answer for {:?}", ticket.text);
            return SendOutcome::Stale;
        }

        let (resolution, session_expired) = match result {
            Ok(response) => (Resolution::Answered(response), false),
            Err(e) => {
                tracing::error!("Error sending message: {:#}", e);
                (Resolution::Failed, error::is_session_expired(&e))
            }
        };

        match self.transcript.resolve_optimistic(ticket.pending, resolution) {
            ResolveOutcome::Resolved => SendOutcome::Answered,
            ResolveOutcome::Failed => SendOutcome::Failed { session_expired },
            ResolveOutcome::Stale => SendOutcome::Stale,
        }
    }

    /// Send `text`, creating a session first if the view has none.
    ///
    /// Transport and payload errors are absorbed into a failure turn; only
    /// the double-submit guard surfaces as an error.
    ///
    /// # Errors
    ///
    /// Returns [`DocchatError::Busy`] if a send is already pending.
    pub async fn send<B: ChatBackend + ?Sized>(
        &mut self,
        backend: &B,
        text: &str,
    ) -> Result<Option<SendOutcome>> {
        let Some(ticket) = self.begin_send(text)? else {
            return Ok(None);
        };
        Ok(Some(self.complete_send(backend, ticket).await))
    }

    /// Deliver the send started by [`ChatView::begin_send`].
    pub async fn complete_send<B: ChatBackend + ?Sized>(
        &mut self,
        backend: &B,
        ticket: SendTicket,
    ) -> SendOutcome {
        let session = match self.session.clone() {
            Some(session) => session,
            None => match backend.create_session().await {
                Ok(session) => {
                    if !self.adopt_session(&ticket, session.clone()) {
                        return SendOutcome::Stale;
                    }
                    session
                }
                Err(e) => return self.finish_send(ticket, Err(e)),
            },
        };

        let result = backend
            .send_message(&session, ticket.text(), self.collection.as_deref())
            .await;
        self.finish_send(ticket, result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::transcript::{Entry, PendingState, Role, FAILURE_MESSAGE};
    use crate::test_utils::FakeBackend;
    use serde_json::json;

    fn history(id: &str, messages: serde_json::Value) -> ChatHistory {
        serde_json::from_value(json!({"id": id, "messages": messages})).unwrap()
    }

    fn reply(answer: &str) -> MessageResponse {
        MessageResponse {
            answer: answer.to_string(),
            citations: vec![],
            message_id: None,
        }
    }

    #[tokio::test]
    async fn test_send_on_empty_view_creates_session() {
        let backend = FakeBackend::new();
        backend.push_session("42");
        backend.push_reply(Ok(reply("X is a thing.")));

        let mut view = ChatView::new(Some("handbook".to_string()));
        let outcome = view.send(&backend, "What is X?").await.unwrap();

        assert_eq!(outcome, Some(SendOutcome::Answered));
        assert_eq!(view.session().unwrap().as_str(), "42");
        assert_eq!(
            backend.sent(),
            vec![(
                "42".to_string(),
                "What is X?".to_string(),
                Some("handbook".to_string())
            )]
        );
        let turns: Vec<_> = view.transcript().turns().collect();
        assert_eq!(turns.len(), 2);
        assert_eq!(turns[1].text(), "X is a thing.");
        assert_eq!(view.phase(), ViewPhase::Idle);
    }

    #[tokio::test]
    async fn test_send_reuses_existing_session() {
        let backend = FakeBackend::new();
        backend.push_history(Ok(history("5", json!([]))));
        backend.push_reply(Ok(reply("a")));

        let mut view = ChatView::new(None);
        view.open(&backend, SessionId::new("5")).await;
        view.send(&backend, "q").await.unwrap();

        assert_eq!(backend.created(), 0);
        assert_eq!(backend.sent()[0].0, "5");
    }

    #[tokio::test]
    async fn test_send_failure_shows_failure_turn() {
        let backend = FakeBackend::new();
        backend.push_session("1");
        backend.push_reply(Err(anyhow::anyhow!("connection reset")));

        let mut view = ChatView::new(None);
        let outcome = view.send(&backend, "q").await.unwrap();

        assert_eq!(
            outcome,
            Some(SendOutcome::Failed {
                session_expired: false
            })
        );
        let last = view.transcript().turns().last().unwrap();
        assert_eq!(last.text(), FAILURE_MESSAGE);
        assert_eq!(view.transcript().len(), 2);
    }

    #[tokio::test]
    async fn test_create_session_failure_resolves_placeholder() {
        let backend = FakeBackend::new();
        backend.push_session_error(DocchatError::SessionExpired.into());

        let mut view = ChatView::new(None);
        let outcome = view.send(&backend, "q").await.unwrap();

        assert_eq!(
            outcome,
            Some(SendOutcome::Failed {
                session_expired: true
            })
        );
        assert!(view.session().is_none());
        assert!(backend.sent().is_empty());
        assert!(!view.transcript().is_pending());
    }

    #[tokio::test]
    async fn test_blank_input_is_ignored() {
        let backend = FakeBackend::new();
        let mut view = ChatView::new(None);
        assert_eq!(view.send(&backend, "   ").await.unwrap(), None);
        assert!(view.transcript().is_empty());
        assert_eq!(backend.created(), 0);
    }

    #[test]
    fn test_double_submit_is_refused() {
        let mut view = ChatView::new(None);
        let _ticket = view.begin_send("first").unwrap().unwrap();
        assert_eq!(view.phase(), ViewPhase::Sending);

        let err = view.begin_send("second").unwrap_err();
        assert!(matches!(
            err.downcast_ref::<DocchatError>(),
            Some(DocchatError::Busy)
        ));
        assert_eq!(view.transcript().len(), 2);
    }

    #[test]
    fn test_stale_history_is_dropped() {
        let mut view = ChatView::new(None);
        let first = view.begin_open(SessionId::new("1"));
        let second = view.begin_open(SessionId::new("2"));

        let applied = view.finish_open(
            second,
            Ok(history(
                "2",
                json!([{"query": "q2", "answer": "a2", "created_at": "T"}]),
            )),
        );
        assert_eq!(applied, LoadOutcome::Applied { turns: 2 });

        let late = view.finish_open(
            first,
            Ok(history(
                "1",
                json!([{"query": "q1", "answer": "a1", "created_at": "T"}]),
            )),
        );
        assert_eq!(late, LoadOutcome::Stale);
        assert_eq!(view.session().unwrap().as_str(), "2");
        assert_eq!(view.transcript().turns().next().unwrap().text(), "q2");
    }

    #[test]
    fn test_stale_answer_after_switch_is_dropped() {
        let mut view = ChatView::new(None);
        view.begin_open(SessionId::new("1"));
        let ticket = view.begin_send("q").unwrap().unwrap();

        view.begin_open(SessionId::new("2"));
        let outcome = view.finish_send(ticket, Ok(reply("late")));

        assert_eq!(outcome, SendOutcome::Stale);
        assert!(view.transcript().is_empty());
        assert_eq!(view.phase(), ViewPhase::Idle);
    }

    #[test]
    fn test_adopt_session_rejects_stale_ticket() {
        let mut view = ChatView::new(None);
        let ticket = view.begin_send("q").unwrap().unwrap();
        view.start_new();
        assert!(!view.adopt_session(&ticket, SessionId::new("9")));
        assert!(view.session().is_none());
    }

    #[test]
    fn test_failed_history_load() {
        let mut view = ChatView::new(None);
        let ticket = view.begin_open(SessionId::new("3"));
        let outcome = view.finish_open(ticket, Err(DocchatError::SessionExpired.into()));
        assert_eq!(
            outcome,
            LoadOutcome::Failed {
                session_expired: true
            }
        );
        assert!(view.transcript().is_empty());
    }

    #[test]
    fn test_pending_state_carries_view_generation() {
        let mut view = ChatView::new(None);
        view.begin_open(SessionId::new("1"));
        view.begin_open(SessionId::new("2"));
        let ticket = view.begin_send("q").unwrap().unwrap();

        match view.transcript().pending_state() {
            PendingState::Pending {
                placeholder,
                generation,
            } => {
                assert_eq!(placeholder, ticket.pending);
                assert_eq!(generation, ticket.generation);
                assert_eq!(generation, 2);
            }
            PendingState::Idle => panic!("expected a pending send"),
        }
    }

    #[tokio::test]
    async fn test_complete_send_after_begin_send() {
        let backend = FakeBackend::new();
        backend.push_reply(Ok(reply("done")));

        let mut view = ChatView::new(None);
        view.begin_open(SessionId::new("4"));
        assert!(view.begin_send("  ").unwrap().is_none());
        assert!(!view.transcript().is_pending());

        let ticket = view.begin_send("go").unwrap().unwrap();
        assert!(view.begin_send("again").is_err());
        assert_eq!(view.complete_send(&backend, ticket).await, SendOutcome::Answered);
        assert_eq!(view.transcript().last_bot_turn().unwrap().text(), "done");
        assert_eq!(backend.created(), 0);
    }

    #[test]
    fn test_history_under_another_id_is_stamped_with_opened_session() {
        let mut view = ChatView::new(None);
        let ticket = view.begin_open(SessionId::new("5"));
        let outcome = view.finish_open(
            ticket,
            Ok(history(
                "6",
                json!([{"query": "q", "answer": "a", "created_at": "T"}]),
            )),
        );

        assert_eq!(outcome, LoadOutcome::Applied { turns: 2 });
        assert_eq!(view.transcript().session_id(), Some(&SessionId::new("5")));
        assert!(view
            .transcript()
            .turns()
            .all(|t| t.session_id == Some(SessionId::new("5"))));
    }

    #[tokio::test]
    async fn test_open_then_send_keeps_order() {
        let backend = FakeBackend::new();
        backend.push_history(Ok(history(
            "8",
            json!([{"query": "hi", "answer": "hello", "created_at": "T1"}]),
        )));
        backend.push_reply(Ok(reply("second answer")));

        let mut view = ChatView::new(None);
        assert_eq!(
            view.open(&backend, SessionId::new("8")).await,
            LoadOutcome::Applied { turns: 2 }
        );
        view.send(&backend, "again").await.unwrap();

        let roles: Vec<Role> = view.transcript().turns().map(|t| t.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Bot, Role::User, Role::Bot]);
        assert!(view
            .transcript()
            .entries()
            .iter()
            .all(|e| matches!(e, Entry::Turn(_))));
    }
}
