//! Data models
//!
//! Shared between the data layer and the presentation layer. Every
//! tenant-scoped entity carries a `cafe_id`; rows held in local
//! collections must always match the active café.

pub mod cafe;
pub mod cafe_table;
pub mod creation_code;
pub mod feedback;
pub mod product;
pub mod staff;
pub mod theme;

// Re-exports
pub use cafe::*;
pub use cafe_table::*;
pub use creation_code::*;
pub use feedback::*;
pub use product::*;
pub use staff::*;
pub use theme::*;
