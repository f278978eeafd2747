//! Creation Code Model

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// How long a creation code stays valid after issue
pub const CODE_VALIDITY_MINUTES: i64 = 15;

/// Invite code gating new-café provisioning
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreationCode {
    pub id: String,
    /// 15-character random code
    pub code: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub used: bool,
}

impl CreationCode {
    /// Issue a fresh code.
    pub fn issue() -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            code: crate::util::creation_code(),
            created_at: Utc::now(),
            used: false,
        }
    }

    /// A code is redeemable only once and only within the validity
    /// window from creation.
    pub fn is_redeemable(&self, now: DateTime<Utc>) -> bool {
        !self.used && now - self.created_at <= Duration::minutes(CODE_VALIDITY_MINUTES)
    }
}
