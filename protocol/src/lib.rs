//! Wire types shared between the Task Manager client and its REST API
//!
//! - `common`: types that appear in several endpoints (tokens, tasks, plans)
//! - `api`: request and response bodies grouped by endpoint family

pub mod api;
pub mod common;

pub use api::*;
pub use common::*;
