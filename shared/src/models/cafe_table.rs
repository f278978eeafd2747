//! Café Table Model

use serde::{Deserialize, Serialize};

/// Table entity
///
/// `hidden` is a soft delete: hidden tables are excluded from staff
/// views and table counts but the row is never physically removed.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CafeTable {
    pub id: String,
    pub cafe_id: String,
    pub name: String,
    #[serde(default)]
    pub hidden: bool,
}

impl CafeTable {
    /// Sort key derived from the numeric suffix of the name
    /// ("Mesa 12" -> 12, unparseable -> 0).
    pub fn sort_index(&self) -> u32 {
        crate::util::trailing_number(&self.name)
    }
}

/// Create table payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CafeTableCreate {
    pub name: String,
}

/// Update table payload
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CafeTableUpdate {
    pub name: Option<String>,
}
