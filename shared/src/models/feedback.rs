//! Feedback Model

use serde::{Deserialize, Serialize};

/// Feedback entity (append-mostly)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Feedback {
    pub id: String,
    pub content: String,
    /// Optional 1-5 star rating
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rating: Option<u8>,
    /// Originating café, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cafe_id: Option<String>,
    /// Originating staff member, when known
    #[serde(skip_serializing_if = "Option::is_none")]
    pub staff_id: Option<String>,
    #[serde(default)]
    pub resolved: bool,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Create feedback payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackCreate {
    pub content: String,
    pub rating: Option<u8>,
    pub cafe_id: Option<String>,
    pub staff_id: Option<String>,
}
