//! Shared types for the Mesa café platform
//!
//! Common types used across crates: data models, the order lifecycle
//! state machine, realtime change-event types and small utilities.

pub mod models;
pub mod order;
pub mod realtime;
pub mod util;

// Re-exports
pub use serde::{Deserialize, Serialize};

pub use order::{Order, OrderItem, OrderStatus, CUSTOMER_STAFF_ID};
pub use realtime::{ChangeEvent, EntityKind, FeedEvent};
