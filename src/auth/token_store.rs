//! Access token persistence via OS keyring
//!
//! The backend's bearer token is stored in the operating system's native
//! credential store (Keychain on macOS, Secret Service on Linux, Windows
//! Credential Manager on Windows). Tokens are namespaced by the API base
//! URL, so pointing the client at a different backend does not reuse a
//! token issued by another one.

use crate::error::{DocchatError, Result};

/// Keyring service under which every token is stored.
const SERVICE: &str = "docchat";

/// Environment variable that, when set, supplies the token directly.
pub const TOKEN_ENV: &str = "DOCCHAT_TOKEN";

/// Where the token in use came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    /// `DOCCHAT_TOKEN`; not tied to any login on this machine
    Env,
    /// Saved by `docchat login` for this base URL
    Keyring,
}

/// Stateless accessor for the OS native keyring.
///
/// # Examples
///
/// ```no_run
/// use docchat::auth::token_store::TokenStore;
///
/// let store = TokenStore;
/// store.save_token("http://localhost:8000/api", "eyJhbGciOi...").unwrap();
/// assert!(store.load_token("http://localhost:8000/api").unwrap().is_some());
/// ```
pub struct TokenStore;

impl TokenStore {
    fn entry(base_url: &str) -> Result<keyring::Entry> {
        Ok(keyring::Entry::new(SERVICE, base_url).map_err(DocchatError::Keyring)?)
    }

    /// Persist `token` for the backend at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`DocchatError::Keyring`] if the OS credential store rejects
    /// the write.
    pub fn save_token(&self, base_url: &str, token: &str) -> Result<()> {
        Self::entry(base_url)?
            .set_password(token)
            .map_err(DocchatError::Keyring)?;
        Ok(())
    }

    /// Load the stored token for `base_url`.
    ///
    /// Returns `Ok(None)` when nothing has been saved, so callers can tell
    /// "not logged in" apart from a keyring failure.
    pub fn load_token(&self, base_url: &str) -> Result<Option<String>> {
        match Self::entry(base_url)?.get_password() {
            Ok(token) => Ok(Some(token)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(DocchatError::Keyring(e).into()),
        }
    }

    /// Delete the stored token; a no-op when none exists.
    pub fn delete_token(&self, base_url: &str) -> Result<()> {
        match Self::entry(base_url)?.delete_password() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(DocchatError::Keyring(e).into()),
        }
    }

    /// The token to use for requests: `DOCCHAT_TOKEN` if set, else the
    /// keyring. Keyring errors are logged and treated as "no token".
    pub fn resolve(&self, base_url: &str) -> Option<(String, TokenSource)> {
        if let Ok(token) = std::env::var(TOKEN_ENV) {
            if !token.trim().is_empty() {
                tracing::debug!("Using token from {}", TOKEN_ENV);
                return Some((token.trim().to_string(), TokenSource::Env));
            }
        }

        match self.load_token(base_url) {
            Ok(token) => token.map(|token| (token, TokenSource::Keyring)),
            Err(e) => {
                tracing::warn!("Could not read token from keyring: {:#}", e);
                None
            }
        }
    }
}
