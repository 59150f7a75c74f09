//! Contact form DTO

use serde::{Deserialize, Serialize};

/// Body for POST /api/contact/
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContactMessage {
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
}
