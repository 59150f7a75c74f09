//! Task Manager client
//!
//! The core is [`session::Session`]: an HTTP client that keeps a persisted
//! access/refresh token pair usable, refreshing it with a single exchange no
//! matter how many requests need it, and broadcasting every change of login
//! state. The resource services and the `taskman` binary are built on it.

pub mod auth;
pub mod billing;
pub mod cli;
pub mod client;
pub mod config;
pub mod contact;
pub mod dashboard;
pub mod error;
pub mod events;
pub mod profile;
pub mod session;
pub mod store;
pub mod tasks;
pub mod templates;
pub mod token;
pub mod ui;
pub mod version;

#[cfg(test)]
mod tests;

pub use client::{ApiRequest, ApiResponse, BaseClient, MultipartBody};
pub use config::{ClientConfig, ClientConfigBuilder};
pub use error::{ErrorCode, Result, TaskmanError};
pub use events::{AuthChange, AuthNotifier};
pub use session::Session;
pub use store::{TokenStore, TokenStoreConfig};
