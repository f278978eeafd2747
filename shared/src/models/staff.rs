//! Staff Model

use serde::{Deserialize, Serialize};

/// Staff role (closed set)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StaffRole {
    /// Front of house
    #[default]
    Waiter,
    Kitchen,
    Manager,
}

impl StaffRole {
    /// Roles allowed to move an order through the kitchen pipeline
    /// (NEW -> PREPARING -> READY).
    pub fn can_prepare(self) -> bool {
        matches!(self, StaffRole::Kitchen | StaffRole::Manager)
    }

    /// Roles allowed to cancel a NEW order on behalf of the café.
    /// Kitchen staff may not cancel.
    pub fn can_cancel(self) -> bool {
        matches!(self, StaffRole::Waiter | StaffRole::Manager)
    }
}

impl std::fmt::Display for StaffRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StaffRole::Waiter => write!(f, "WAITER"),
            StaffRole::Kitchen => write!(f, "KITCHEN"),
            StaffRole::Manager => write!(f, "MANAGER"),
        }
    }
}

/// Staff entity
///
/// The 6-digit PIN is the sole credential and is compared in plaintext
/// against the remote store. A documented weakness of the platform, not
/// a pattern to copy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Staff {
    pub id: String,
    pub cafe_id: String,
    pub name: String,
    pub role: StaffRole,
    /// 6-digit numeric PIN, unique within a café
    pub pin: String,
    /// Optional recovery phone number
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Create staff payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffCreate {
    pub name: String,
    pub role: StaffRole,
    pub pin: String,
    pub phone: Option<String>,
}

/// Update staff payload
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StaffUpdate {
    pub name: Option<String>,
    pub role: Option<StaffRole>,
    pub pin: Option<String>,
    pub phone: Option<Option<String>>,
}
