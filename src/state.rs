//! Local client state
//!
//! A small JSON file remembers the signed-in user's profile and the last
//! selected chat session between runs. It is a cache, never a source of
//! record: a missing or corrupt file just means defaults.
//!
//! The selected session is owned by [`SessionSelection`]; it is the only
//! writer of that field.

use crate::api::types::{SessionId, User};
use crate::error::{DocchatError, Result};

use anyhow::Context;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Contents of the state file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LocalState {
    /// Profile fetched from `/auth/me` at login
    #[serde(default)]
    pub user: Option<User>,
    /// Base URL of the backend `user` came from
    #[serde(default)]
    pub user_base_url: Option<String>,
    /// Last chat session opened
    #[serde(default)]
    pub selected_session: Option<SessionId>,
}

/// Handle on the state file.
#[derive(Debug, Clone)]
pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    /// Open the state file in the user's data directory.
    ///
    /// `DOCCHAT_STATE_FILE` overrides the location.
    pub fn new() -> Result<Self> {
        if let Ok(override_path) = std::env::var("DOCCHAT_STATE_FILE") {
            return Ok(Self::new_with_path(override_path));
        }

        let proj_dirs = ProjectDirs::from("com", "docchat", "docchat")
            .ok_or_else(|| DocchatError::Storage("Could not determine data directory".into()))?;
        Ok(Self::new_with_path(proj_dirs.data_dir().join("state.json")))
    }

    /// Use the given path; nothing is created until the first save.
    pub fn new_with_path<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the state, falling back to defaults when absent or unreadable.
    pub fn load(&self) -> LocalState {
        let contents = match std::fs::read_to_string(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return LocalState::default(),
            Err(e) => {
                tracing::warn!("Could not read {}: {}", self.path.display(), e);
                return LocalState::default();
            }
        };

        serde_json::from_str(&contents).unwrap_or_else(|e| {
            tracing::warn!(
                "Ignoring corrupt state file {}: {}",
                self.path.display(),
                e
            );
            LocalState::default()
        })
    }

    pub fn save(&self, state: &LocalState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .context("Failed to create state directory")
                .map_err(|e| DocchatError::Storage(format!("{:#}", e)))?;
        }
        let json = serde_json::to_string_pretty(state)?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("Failed to write {}", self.path.display()))
            .map_err(|e| DocchatError::Storage(format!("{:#}", e)))?;
        Ok(())
    }

    /// Load, modify, and save in one step.
    pub fn update<F: FnOnce(&mut LocalState)>(&self, f: F) -> Result<LocalState> {
        let mut state = self.load();
        f(&mut state);
        self.save(&state)?;
        Ok(state)
    }

    /// The cached profile, if it was fetched from the backend at `base_url`.
    pub fn user(&self, base_url: &str) -> Option<User> {
        let state = self.load();
        match state.user_base_url.as_deref() {
            Some(cached) if cached == base_url => state.user,
            _ => None,
        }
    }

    /// Cache `user` as the profile for `base_url`.
    pub fn set_user(&self, base_url: &str, user: User) -> Result<()> {
        self.update(|state| {
            state.user = Some(user);
            state.user_base_url = Some(base_url.to_string());
        })?;
        Ok(())
    }

    pub fn clear_user(&self) -> Result<()> {
        self.update(|state| {
            state.user = None;
            state.user_base_url = None;
        })?;
        Ok(())
    }
}

/// The one owner of "which session is selected".
///
/// Reads the persisted value once on construction and writes through on
/// every change.
#[derive(Debug)]
pub struct SessionSelection {
    file: StateFile,
    current: Option<SessionId>,
}

impl SessionSelection {
    pub fn load(file: StateFile) -> Self {
        let current = file.load().selected_session;
        Self { file, current }
    }

    pub fn current(&self) -> Option<&SessionId> {
        self.current.as_ref()
    }

    pub fn select(&mut self, session: SessionId) -> Result<()> {
        if self.current.as_ref() == Some(&session) {
            return Ok(());
        }
        self.persist(Some(session))
    }

    pub fn clear(&mut self) -> Result<()> {
        if self.current.is_none() {
            return Ok(());
        }
        self.persist(None)
    }

    /// Clear the selection only if it points at `session`.
    pub fn clear_if(&mut self, session: &SessionId) -> Result<bool> {
        if self.current.as_ref() == Some(session) {
            self.persist(None)?;
            return Ok(true);
        }
        Ok(false)
    }

    fn persist(&mut self, value: Option<SessionId>) -> Result<()> {
        let stored = value.clone();
        self.file.update(|state| state.selected_session = stored)?;
        self.current = value;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_state() -> (TempDir, StateFile) {
        let dir = TempDir::new().unwrap();
        let file = StateFile::new_with_path(dir.path().join("nested").join("state.json"));
        (dir, file)
    }

    #[test]
    fn test_missing_file_is_default() {
        let (_dir, file) = temp_state();
        assert_eq!(file.load(), LocalState::default());
    }

    #[test]
    fn test_corrupt_file_is_default() {
        let (_dir, file) = temp_state();
        std::fs::create_dir_all(file.path().parent().unwrap()).unwrap();
        std::fs::write(file.path(), "{not json").unwrap();
        assert_eq!(file.load(), LocalState::default());
    }

    #[test]
    fn test_selection_writes_through() {
        let (_dir, file) = temp_state();
        let mut selection = SessionSelection::load(file.clone());
        assert!(selection.current().is_none());

        selection.select(SessionId::new("12")).unwrap();
        assert_eq!(
            file.load().selected_session,
            Some(SessionId::new("12"))
        );

        let reloaded = SessionSelection::load(file.clone());
        assert_eq!(reloaded.current().unwrap().as_str(), "12");
    }

    #[test]
    fn test_clear_if_only_matching() {
        let (_dir, file) = temp_state();
        let mut selection = SessionSelection::load(file.clone());
        selection.select(SessionId::new("4")).unwrap();

        assert!(!selection.clear_if(&SessionId::new("5")).unwrap());
        assert_eq!(selection.current().unwrap().as_str(), "4");

        assert!(selection.clear_if(&SessionId::new("4")).unwrap());
        assert!(selection.current().is_none());
        assert!(file.load().selected_session.is_none());
    }

    #[test]
    fn test_user_and_selection_are_independent() {
        let (_dir, file) = temp_state();
        let mut selection = SessionSelection::load(file.clone());
        selection.select(SessionId::new("1")).unwrap();

        file.clear_user().unwrap();
        assert_eq!(file.load().selected_session, Some(SessionId::new("1")));
    }

    fn profile() -> User {
        serde_json::from_value(serde_json::json!({
            "id": 3,
            "username": "root",
            "email": "root@example.com",
            "is_admin": true,
            "created_at": "2024-01-01T00:00:00"
        }))
        .unwrap()
    }

    #[test]
    fn test_profile_is_scoped_to_its_backend() {
        let (_dir, file) = temp_state();
        file.set_user("http://b.example/api", profile()).unwrap();

        assert_eq!(
            file.user("http://b.example/api").map(|u| u.username),
            Some("root".to_string())
        );
        assert!(file.user("http://a.example/api").is_none());
    }

    #[test]
    fn test_profile_without_backend_is_not_trusted() {
        let (_dir, file) = temp_state();
        file.update(|state| state.user = Some(profile())).unwrap();
        assert!(file.user("http://localhost:8000/api").is_none());

        file.clear_user().unwrap();
        let state = file.load();
        assert!(state.user.is_none());
        assert!(state.user_base_url.is_none());
    }

    #[cfg(unix)]
    #[test]
    fn test_save_error_keeps_io_cause() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, "file, not a directory").unwrap();
        let file = StateFile::new_with_path(blocker.join("state.json"));

        let err = file.save(&LocalState::default()).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("Failed to create state directory"), "{}", message);
        assert!(message.contains("os error"), "{}", message);
    }
}
