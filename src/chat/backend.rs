//! Backend seam used by the chat controller

use crate::api::types::{ChatHistory, MessageResponse, SessionId};
use crate::error::Result;

use async_trait::async_trait;

/// The three chat calls a session view makes.
///
/// [`crate::api::ApiClient`] is the production implementation.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Create an empty session and return its id.
    async fn create_session(&self) -> Result<SessionId>;

    /// Ask a question in `session` and return the answer with citations.
    async fn send_message(
        &self,
        session: &SessionId,
        message: &str,
        collection: Option<&str>,
    ) -> Result<MessageResponse>;

    /// Fetch the persisted query/answer pairs of `session`.
    async fn fetch_history(&self, session: &SessionId) -> Result<ChatHistory>;
}
