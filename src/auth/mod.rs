//! Authentication: login, logout, and route guards
//!
//! A login exchanges credentials for a bearer token, stores it in the OS
//! keyring via [`token_store::TokenStore`], and caches the `/auth/me`
//! profile in the local state file so route guards can check the role
//! without a round trip.

pub mod guard;
pub mod token_store;

pub use guard::{landing, require, Route};
pub use token_store::{TokenSource, TokenStore};

use crate::api::types::User;
use crate::api::ApiClient;
use crate::error::{DocchatError, Result};
use crate::state::StateFile;

/// Shown when the backend gives no reason for a failed login.
pub const LOGIN_FAILED: &str = "Login failed. Please check your credentials.";

/// Exchange credentials for a token, then fetch and cache the profile.
///
/// On any failure the stored token and profile are cleared.
///
/// # Errors
///
/// Returns [`DocchatError::Authentication`] carrying the backend's reason
/// (or [`LOGIN_FAILED`]).
pub async fn login(
    client: &mut ApiClient,
    store: &TokenStore,
    state: &StateFile,
    email: &str,
    password: &str,
) -> Result<User> {
    match try_login(client, store, state, email, password).await {
        Ok(user) => {
            tracing::info!("Logged in as {}", user.username);
            Ok(user)
        }
        Err(e) => {
            tracing::error!("Login error: {:#}", e);
            client.set_token(None);
            if let Err(clear_err) = clear_credentials(store, state, client.base_url()) {
                tracing::warn!("Could not clear credentials: {:#}", clear_err);
            }
            let reason = match e.downcast_ref::<DocchatError>() {
                Some(DocchatError::Api { detail, .. }) => detail.clone(),
                Some(DocchatError::Authentication(msg)) => msg.clone(),
                _ => LOGIN_FAILED.to_string(),
            };
            Err(DocchatError::Authentication(reason).into())
        }
    }
}

async fn try_login(
    client: &mut ApiClient,
    store: &TokenStore,
    state: &StateFile,
    email: &str,
    password: &str,
) -> Result<User> {
    let token = client.request_token(email, password).await?;
    client.set_token(Some(token.access_token.clone()));
    let user = client.current_user().await?;

    store.save_token(client.base_url(), &token.access_token)?;
    state.set_user(client.base_url(), user.clone())?;
    Ok(user)
}

/// Forget the token and the cached profile.
///
/// The profile is cleared even when the keyring delete fails.
pub fn clear_credentials(store: &TokenStore, state: &StateFile, base_url: &str) -> Result<()> {
    let cleared = state.clear_user();
    store.delete_token(base_url)?;
    cleared
}
