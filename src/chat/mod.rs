//! Chat: transcript reconciliation, the session view, and the session list
//!
//! - [`transcript`]: backend history → display turns, optimistic appends
//! - [`controller`]: [`ChatView`], the per-session `Idle → Sending` machine
//! - [`sessions`]: the session list with previews and optimistic renames
//! - [`render`]: terminal output for all of the above

pub mod backend;
pub mod controller;
pub mod render;
pub mod sessions;
pub mod transcript;

pub use backend::ChatBackend;
pub use controller::{ChatView, LoadOutcome, SendOutcome, ViewPhase};
pub use sessions::{ChatSession, SessionList};
pub use transcript::{reconcile, ChatTurn, Role, Transcript};
