//! Café Model

use serde::{Deserialize, Serialize};

/// Café entity (one tenant)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Cafe {
    pub id: String,
    pub name: String,
    /// Excluded from the public café listing when true
    #[serde(default)]
    pub hidden: bool,
}
