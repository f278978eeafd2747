//! Mesa Client - realtime data layer for the café ordering platform
//!
//! Maintains an eventually-correct local mirror of server-authoritative
//! entities across independently-subscribed realtime feeds, reconciles
//! optimistic local mutations with server echoes, implements the order
//! lifecycle state machine, and sequences per-café session bootstrap so
//! no view ever renders one café's UI against another café's data.
//!
//! The hosted backend is abstracted behind [`store::StoreGateway`];
//! [`store::MemoryGateway`] is an in-process implementation used by
//! tests and demos.

pub mod catalog;
pub mod config;
pub mod error;
pub mod feeds;
pub mod local;
pub mod orders;
pub mod presence;
pub mod provisioning;
pub mod session;
pub mod state;
pub mod store;
pub mod theme;

pub use config::ClientConfig;
pub use error::{ActionResult, ClientError, ClientResult};
pub use session::SessionController;
pub use store::{MemoryGateway, StoreGateway};

// Re-export shared types for convenience
pub use shared::order::{CancelOutcome, Order, OrderStatus, RemoveItemResult};
pub use shared::realtime::{ChangeEvent, EntityKind, FeedEvent};
