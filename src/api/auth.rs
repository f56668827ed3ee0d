//! Authentication endpoints

use super::client::{ApiClient, LOGIN_PATH};
use super::types::{TokenResponse, User};
use crate::error::{DocchatError, Result};

use reqwest::multipart::Form;
use reqwest::Method;

impl ApiClient {
    /// `POST /auth/token` with the OAuth2 password form fields.
    ///
    /// The backend's form calls the login field `username` even though
    /// people sign in with their email.
    pub async fn request_token(&self, email: &str, password: &str) -> Result<TokenResponse> {
        let form = Form::new()
            .text("username", email.to_string())
            .text("password", password.to_string());
        let builder = self.request(Method::POST, LOGIN_PATH).multipart(form);
        let response = self.execute(LOGIN_PATH, builder).await?;
        let token: TokenResponse = response.json().await.map_err(DocchatError::Http)?;
        if token.access_token.is_empty() {
            return Err(
                DocchatError::Authentication("Invalid response from server".to_string()).into(),
            );
        }
        Ok(token)
    }

    /// `GET /auth/me`
    pub async fn current_user(&self) -> Result<User> {
        self.get_json("/auth/me").await
    }
}
