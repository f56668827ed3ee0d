//! Backend API client
//!
//! The client is split by backend router: `auth`, `chat`, `files`, and
//! `admin` each add methods to [`ApiClient`]. Wire types live in [`types`].

mod admin;
mod auth;
mod chat;
pub mod client;
mod files;
pub mod types;

pub use client::ApiClient;
