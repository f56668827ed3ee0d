//! DocChat - document question answering client library
//!
//! This library provides the client side of a DocChat deployment: the
//! typed REST client, authentication, chat transcript reconciliation, and
//! the command handlers behind the `docchat` binary.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `api`: HTTP client and wire types for the backend routers
//! - `auth`: Login, token storage, and role guards
//! - `chat`: Transcript reconciliation, the session view, and the session list
//! - `state`: Local state file (cached profile, selected session)
//! - `commands`: Handlers for each CLI command
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use docchat::api::ApiClient;
//! use docchat::chat::ChatView;
//! use docchat::Config;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load("config.yaml", &Default::default())?;
//!     config.validate()?;
//!
//!     let client = ApiClient::new(&config.api)?.with_token(Some("token".into()));
//!     let mut view = ChatView::new(None);
//!     view.send(&client, "What is the refund policy?").await?;
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod auth;
pub mod chat;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod format;
pub mod state;

// Re-export commonly used types
pub use api::ApiClient;
pub use chat::{ChatView, Transcript};
pub use config::Config;
pub use error::{DocchatError, Result};

#[cfg(test)]
pub mod test_utils;
