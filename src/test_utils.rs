//! Test utilities for DocChat
//!
//! This module provides a scripted [`ChatBackend`] and temporary directory
//! helpers shared by unit tests.

use crate::api::types::{ChatHistory, MessageResponse, SessionId};
use crate::chat::ChatBackend;
use crate::error::Result;
use crate::state::StateFile;

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use tempfile::TempDir;

/// Create a temporary directory for testing
///
/// Returns a TempDir that will be cleaned up when dropped
pub fn temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temporary directory")
}

/// A state file inside a fresh temporary directory
pub fn temp_state_file() -> (TempDir, StateFile) {
    let dir = temp_dir();
    let file = StateFile::new_with_path(dir.path().join("state.json"));
    (dir, file)
}

/// Backend that replays queued responses and records what it was asked.
///
/// Each method pops the next scripted result for that call; an empty queue
/// is a test bug and panics.
#[derive(Default)]
pub struct FakeBackend {
    sessions: Mutex<VecDeque<Result<SessionId>>>,
    replies: Mutex<VecDeque<Result<MessageResponse>>>,
    histories: Mutex<VecDeque<Result<ChatHistory>>>,
    sent: Mutex<Vec<(String, String, Option<String>)>>,
    created: Mutex<usize>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_session(&self, id: &str) {
        self.sessions
            .lock()
            .unwrap()
            .push_back(Ok(SessionId::new(id)));
    }

    pub fn push_session_error(&self, error: anyhow::Error) {
        self.sessions.lock().unwrap().push_back(Err(error));
    }

    pub fn push_reply(&self, reply: Result<MessageResponse>) {
        self.replies.lock().unwrap().push_back(reply);
    }

    pub fn push_history(&self, history: Result<ChatHistory>) {
        self.histories.lock().unwrap().push_back(history);
    }

    /// `(session, message, collection)` for every `send_message` call
    pub fn sent(&self) -> Vec<(String, String, Option<String>)> {
        self.sent.lock().unwrap().clone()
    }

    /// Number of `create_session` calls
    pub fn created(&self) -> usize {
        *self.created.lock().unwrap()
    }
}

#[async_trait]
impl ChatBackend for FakeBackend {
    async fn create_session(&self) -> Result<SessionId> {
        *self.created.lock().unwrap() += 1;
        self.sessions
            .lock()
            .unwrap()
            .pop_front()
            .expect("no scripted session")
    }

    async fn send_message(
        &self,
        session: &SessionId,
        message: &str,
        collection: Option<&str>,
    ) -> Result<MessageResponse> {
        self.sent.lock().unwrap().push((
            session.to_string(),
            message.to_string(),
            collection.map(str::to_string),
        ));
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .expect("no scripted reply")
    }

    async fn fetch_history(&self, _session: &SessionId) -> Result<ChatHistory> {
        self.histories
            .lock()
            .unwrap()
            .pop_front()
            .expect("no scripted history")
    }
}
