//! Realtime change-event types
//!
//! Each entity feed delivers a closed tagged union so INSERT / UPDATE /
//! DELETE handling is exhaustively matched instead of dispatched on
//! string tags. The `Removal` broadcast is a compensating mechanism for
//! entities whose delete events do not reliably carry old-row content
//! over the row-level feed (tables, products, staff).

use crate::models::{Cafe, CafeTable, Feedback, Product, Staff, ThemePatch};
use crate::order::Order;
use serde::{Deserialize, Serialize};

/// Entities with a realtime feed
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Cafe,
    Staff,
    Product,
    Table,
    Order,
    Theme,
    Feedback,
}

impl EntityKind {
    /// Entities whose deletes additionally use the broadcast
    /// side-channel (see module docs).
    pub fn needs_removal_broadcast(self) -> bool {
        matches!(
            self,
            EntityKind::Table | EntityKind::Staff | EntityKind::Product
        )
    }

    /// Tenant-scoped feeds; the café feed is global.
    pub fn is_cafe_scoped(self) -> bool {
        !matches!(self, EntityKind::Cafe)
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityKind::Cafe => write!(f, "cafe"),
            EntityKind::Staff => write!(f, "staff"),
            EntityKind::Product => write!(f, "product"),
            EntityKind::Table => write!(f, "table"),
            EntityKind::Order => write!(f, "order"),
            EntityKind::Theme => write!(f, "theme"),
            EntityKind::Feedback => write!(f, "feedback"),
        }
    }
}

/// Row-level change event for one entity type
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeEvent<T> {
    Insert { new: T },
    Update { new: T },
    /// Only the row id is guaranteed on delete
    Delete { old_id: String },
}

/// One event delivered on a subscription channel
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "entity", content = "change", rename_all = "snake_case")]
pub enum FeedEvent {
    Cafe(ChangeEvent<Cafe>),
    Staff(ChangeEvent<Staff>),
    Product(ChangeEvent<Product>),
    Table(ChangeEvent<CafeTable>),
    Order(ChangeEvent<Order>),
    Theme(ChangeEvent<ThemePatch>),
    Feedback(ChangeEvent<Feedback>),
    /// Delete-notification fallback published by the deleting client;
    /// applied idempotently by every subscriber including the deleter
    Removal { entity: EntityKind, id: String },
}

impl FeedEvent {
    /// The entity this event belongs to.
    pub fn entity(&self) -> EntityKind {
        match self {
            FeedEvent::Cafe(_) => EntityKind::Cafe,
            FeedEvent::Staff(_) => EntityKind::Staff,
            FeedEvent::Product(_) => EntityKind::Product,
            FeedEvent::Table(_) => EntityKind::Table,
            FeedEvent::Order(_) => EntityKind::Order,
            FeedEvent::Theme(_) => EntityKind::Theme,
            FeedEvent::Feedback(_) => EntityKind::Feedback,
            FeedEvent::Removal { entity, .. } => *entity,
        }
    }
}

/// One customer session present at a table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PresenceMember {
    /// Connection key, unique per session
    pub id: String,
    pub name: String,
}

/// Synchronized presence snapshot for one table's group
///
/// Ephemeral: rebuilt from scratch on every (re)join, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct PresenceSnapshot {
    pub table_id: String,
    pub members: Vec<PresenceMember>,
}
