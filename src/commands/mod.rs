/*!
Command handlers for the CLI

This module provides command handlers invoked by the CLI entrypoint:

- `auth_cmd`  - login, logout, whoami
- `chat`      - Interactive chat mode and one-shot questions
- `sessions`  - Chat session management
- `files`     - Document library (admin)
- `users`     - User accounts (admin)
- `dashboard` - Usage statistics (admin)

Every handler takes a [`Context`] holding the configuration, the API
client with the resolved token, and the local state file.
*/

use crate::api::types::User;
use crate::api::ApiClient;
use crate::auth::{self, Route, TokenSource, TokenStore};
use crate::config::Config;
use crate::error::{self, Result};
use crate::state::StateFile;

use colored::Colorize;

pub mod auth_cmd;
pub mod chat;
pub mod dashboard;
pub mod files;
pub mod sessions;
pub mod special_commands;
pub mod users;

/// Everything a command handler needs.
pub struct Context {
    pub config: Config,
    pub client: ApiClient,
    pub state: StateFile,
    pub tokens: TokenStore,
    /// `None` when no token was found
    pub token_source: Option<TokenSource>,
}

impl Context {
    /// Build the context, resolving the stored token for the configured
    /// backend.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client or the state file location cannot
    /// be set up
    pub fn new(config: Config) -> Result<Self> {
        let state = StateFile::new()?;
        Self::with_state(config, state)
    }

    /// Like [`Context::new`] but with an explicit state file.
    pub fn with_state(config: Config, state: StateFile) -> Result<Self> {
        let tokens = TokenStore;
        let client = ApiClient::new(&config.api)?;
        let (token, token_source) = match tokens.resolve(client.base_url()) {
            Some((token, source)) => (Some(token), Some(source)),
            None => (None, None),
        };
        Ok(Self {
            client: client.with_token(token),
            config,
            state,
            tokens,
            token_source,
        })
    }

    /// The signed-in user, from the cached profile or `/auth/me`.
    ///
    /// The cache is only trusted for a keyring token and only when it was
    /// fetched from the same backend. A fetched profile is cached for later
    /// guards.
    pub async fn current_user(&self) -> Result<User> {
        auth::require(Route::Chat, self.client.token().is_some(), None)?;
        let base_url = self.client.base_url();
        if self.token_source == Some(TokenSource::Keyring) {
            if let Some(user) = self.state.user(base_url) {
                return Ok(user);
            }
        }
        let user = self.client.current_user().await?;
        if let Err(e) = self.state.set_user(base_url, user.clone()) {
            tracing::warn!("Could not cache profile: {:#}", e);
        }
        Ok(user)
    }

    /// Check the caller may open `route` and return their profile.
    ///
    /// # Errors
    ///
    /// Returns an authentication error without a token and a forbidden
    /// error for admin routes without an admin profile
    pub async fn guard(&self, route: Route) -> Result<User> {
        let user = self.current_user().await?;
        auth::require(route, true, Some(&user))?;
        tracing::debug!("{} may open {}", user.username, route);
        Ok(user)
    }

    /// Forget the rejected token and tell the user to log in again.
    pub fn expire_session(&mut self) {
        self.client.set_token(None);
        self.token_source = None;
        if let Err(e) = auth::clear_credentials(&self.tokens, &self.state, self.client.base_url()) {
            tracing::warn!("Could not clear credentials: {:#}", e);
        }
    }
}

/// Apply the session-expired policy to a failed command.
///
/// Returns the error unchanged so the caller can still report it.
pub fn handle_failure(ctx: &mut Context, err: anyhow::Error) -> anyhow::Error {
    if error::is_session_expired(&err) {
        ctx.expire_session();
        eprintln!(
            "{} Run {} to sign in again.",
            err.to_string().red(),
            "docchat login".cyan()
        );
    }
    err
}

/// Ask a yes/no question on the terminal; anything but `y`/`yes` is no.
pub fn confirm(question: &str) -> Result<bool> {
    let mut rl = rustyline::DefaultEditor::new()?;
    let answer = rl.readline(&format!("{} [y/N] ", question))?;
    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::temp_state_file;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn user(is_admin: bool) -> User {
        serde_json::from_value(serde_json::json!({
            "id": 1,
            "username": "ada",
            "email": "ada@example.com",
            "is_admin": is_admin,
            "created_at": "2024-01-01T00:00:00"
        }))
        .unwrap()
    }

    fn context_at(base_url: &str, token: Option<&str>) -> (tempfile::TempDir, Context) {
        let (dir, state) = temp_state_file();
        let mut config = Config::default();
        config.api.base_url = base_url.to_string();
        let client = ApiClient::new(&config.api)
            .unwrap()
            .with_token(token.map(str::to_string));
        let ctx = Context {
            config,
            client,
            state,
            tokens: TokenStore,
            token_source: token.map(|_| TokenSource::Keyring),
        };
        (dir, ctx)
    }

    fn context(token: Option<&str>) -> (tempfile::TempDir, Context) {
        context_at(&Config::default().api.base_url, token)
    }

    fn cache(ctx: &Context, user: User) {
        ctx.state.set_user(ctx.client.base_url(), user).unwrap();
    }

    async fn mock_me(server: &MockServer, is_admin: bool) {
        Mock::given(method("GET"))
            .and(path("/auth/me"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": 9,
                "username": "eve",
                "email": "eve@example.com",
                "is_admin": is_admin,
                "created_at": "2024-01-01T00:00:00"
            })))
            .expect(1)
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_guard_without_token() {
        let (_dir, ctx) = context(None);
        let err = ctx.guard(Route::Chat).await.unwrap_err();
        assert!(err.to_string().contains("Not logged in"));
    }

    #[tokio::test]
    async fn test_cached_profile_without_token_is_rejected() {
        let (_dir, ctx) = context(None);
        cache(&ctx, user(true));
        assert!(ctx.guard(Route::Chat).await.is_err());
    }

    #[tokio::test]
    async fn test_guard_uses_cached_profile() {
        let (_dir, ctx) = context(Some("tok"));
        cache(&ctx, user(false));

        assert_eq!(ctx.guard(Route::Chat).await.unwrap().username, "ada");
        let err = ctx.guard(Route::Users).await.unwrap_err();
        assert!(err.to_string().contains("Not authorized"));
    }

    #[tokio::test]
    async fn test_guard_admin_route_for_admin() {
        let (_dir, ctx) = context(Some("tok"));
        cache(&ctx, user(true));
        assert!(ctx.guard(Route::Dashboard).await.is_ok());
    }

    #[tokio::test]
    async fn test_profile_cached_for_another_backend_is_refetched() {
        let server = MockServer::start().await;
        mock_me(&server, false).await;

        let (_dir, ctx) = context_at(&server.uri(), Some("tok"));
        ctx.state.set_user("http://other.example/api", user(true)).unwrap();

        let err = ctx.guard(Route::Users).await.unwrap_err();
        assert!(err.to_string().contains("Not authorized"));
        assert_eq!(
            ctx.state.user(ctx.client.base_url()).map(|u| u.username),
            Some("eve".to_string())
        );
    }

    #[tokio::test]
    async fn test_env_token_ignores_cached_profile() {
        let server = MockServer::start().await;
        mock_me(&server, false).await;

        let (_dir, mut ctx) = context_at(&server.uri(), Some("tok"));
        ctx.token_source = Some(TokenSource::Env);
        cache(&ctx, user(true));

        let me = ctx.current_user().await.unwrap();
        assert_eq!(me.username, "eve");
        assert!(!me.is_admin);
    }

    #[test]
    fn test_handle_failure_passes_other_errors_through() {
        let (_dir, mut ctx) = context(Some("tok"));
        let err = handle_failure(&mut ctx, anyhow::anyhow!("boom"));
        assert_eq!(err.to_string(), "boom");
        assert_eq!(ctx.client.token(), Some("tok"));
    }
}
