//! API DTOs module
//!
//! This module contains all API data transfer objects organized by domain:
//! - `auth`: signup, login, token refresh, profile and password management
//! - `tasks`: tasks and task templates
//! - `dashboard`: aggregated statistics
//! - `billing`: subscription status and checkout
//! - `contact`: the public contact form
//! - `page`: list envelopes

pub mod auth;
pub mod billing;
pub mod contact;
pub mod dashboard;
pub mod page;
pub mod tasks;

pub use auth::*;
pub use billing::*;
pub use contact::*;
pub use dashboard::*;
pub use page::*;
pub use tasks::*;
