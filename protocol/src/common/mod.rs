pub mod auth;
pub mod billing;
pub mod task;

pub use auth::*;
pub use billing::*;
pub use task::*;
