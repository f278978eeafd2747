//! Order types and the order lifecycle state machine

pub mod status;
pub mod types;

pub use status::OrderStatus;
pub use types::*;
