//! Theme Model
//!
//! At most one theme document per café. The server stores a sparse
//! patch; the client deep-merges it over compiled-in defaults to obtain
//! a complete `Theme` (see the resolver in `mesa-client`).

use serde::{Deserialize, Serialize};

/// General interface colors
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct GeneralColors {
    pub primary: String,
    pub secondary: String,
    pub background: String,
    pub surface: String,
    pub text: String,
}

/// Table-state colors (free / occupied)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TableColors {
    pub free: String,
    pub occupied: String,
}

/// Per-status order colors
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusColors {
    pub new: String,
    pub preparing: String,
    pub ready: String,
    pub served: String,
}

/// Font family choices
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Fonts {
    pub heading: String,
    pub body: String,
}

/// Complete theme object consumed by the presentation layer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Theme {
    pub general: GeneralColors,
    pub tables: TableColors,
    pub statuses: StatusColors,
    pub fonts: Fonts,
    /// Card corner radius in pixels
    pub card_radius: u8,
    pub logo_url: Option<String>,
    pub background_url: Option<String>,
    /// Background overlay opacity, 0-100
    pub overlay_opacity: u8,
    /// Hide the manager-login entry point on public screens
    pub hide_manager_entry: bool,
}

/// Sparse per-café theme patch as stored server-side
///
/// Every field is optional; missing fields fall back to defaults.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct ThemePatch {
    pub cafe_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub general: Option<GeneralColorsPatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tables: Option<TableColorsPatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statuses: Option<StatusColorsPatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fonts: Option<FontsPatch>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card_radius: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logo_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overlay_opacity: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hide_manager_entry: Option<bool>,
}

/// Sparse general colors
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct GeneralColorsPatch {
    pub primary: Option<String>,
    pub secondary: Option<String>,
    pub background: Option<String>,
    pub surface: Option<String>,
    pub text: Option<String>,
}

/// Sparse table-state colors
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct TableColorsPatch {
    pub free: Option<String>,
    pub occupied: Option<String>,
}

/// Sparse order-status colors
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct StatusColorsPatch {
    pub new: Option<String>,
    pub preparing: Option<String>,
    pub ready: Option<String>,
    pub served: Option<String>,
}

/// Sparse font choices
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct FontsPatch {
    pub heading: Option<String>,
    pub body: Option<String>,
}
