//! Chat session endpoints

use super::client::{endpoint, ApiClient};
use super::types::{
    ChatHistory, ChatSummary, MessageRequest, MessageResponse, NewChatResponse, SessionId,
    UpdateTitleRequest,
};
use crate::chat::ChatBackend;
use crate::error::{DocchatError, Result};

use async_trait::async_trait;
use reqwest::Method;

impl ApiClient {
    /// `POST /chat/new`
    pub async fn create_session(&self) -> Result<SessionId> {
        let path = "/chat/new";
        let response = self.execute(path, self.request(Method::POST, path)).await?;
        let body: NewChatResponse = response.json().await.map_err(DocchatError::Http)?;
        tracing::info!("Created chat session {}", body.id);
        Ok(body.id)
    }

    /// `POST /chat/{id}/message`
    pub async fn send_message(
        &self,
        session: &SessionId,
        message: &str,
        collection: Option<&str>,
    ) -> Result<MessageResponse> {
        let path = endpoint(&["chat", session.as_str(), "message"])?;
        let body = MessageRequest {
            message,
            collection_name: collection,
        };
        self.send_json(Method::POST, &path, &body).await
    }

    /// `GET /chat/history/{id}`
    pub async fn fetch_history(&self, session: &SessionId) -> Result<ChatHistory> {
        self.get_json(&endpoint(&["chat", "history", session.as_str()])?)
            .await
    }

    /// `GET /chat/all`
    pub async fn list_sessions(&self) -> Result<Vec<ChatSummary>> {
        self.get_json("/chat/all").await
    }

    /// `PATCH /chat/{id}/title`
    pub async fn rename_session(&self, session: &SessionId, title: &str) -> Result<()> {
        let path = endpoint(&["chat", session.as_str(), "title"])?;
        let builder = self
            .request(Method::PATCH, &path)
            .json(&UpdateTitleRequest { title });
        self.send_unit(builder, &path).await
    }

    /// `DELETE /chat/{id}`
    pub async fn delete_session(&self, session: &SessionId) -> Result<()> {
        let path = endpoint(&["chat", session.as_str()])?;
        self.send_unit(self.request(Method::DELETE, &path), &path)
            .await
    }
}

#[async_trait]
impl ChatBackend for ApiClient {
    async fn create_session(&self) -> Result<SessionId> {
        ApiClient::create_session(self).await
    }

    async fn send_message(
        &self,
        session: &SessionId,
        message: &str,
        collection: Option<&str>,
    ) -> Result<MessageResponse> {
        ApiClient::send_message(self, session, message, collection).await
    }

    async fn fetch_history(&self, session: &SessionId) -> Result<ChatHistory> {
        ApiClient::fetch_history(self, session).await
    }
}
