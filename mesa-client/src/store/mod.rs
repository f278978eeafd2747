//! Remote store gateway
//!
//! Abstracts the hosted "remote object store with row-level change
//! feeds" the platform delegates persistence and realtime fan-out to.
//! The core only ever talks to this trait; [`MemoryGateway`] is the
//! in-process implementation shipped for tests and demos.

#[cfg(test)]
pub(crate) mod flaky;
pub mod memory;

pub use memory::MemoryGateway;

use crate::error::ClientResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::models::{
    Cafe, CafeTable, CafeTableUpdate, CreationCode, Feedback, Product, ProductUpdate, Staff,
    StaffUpdate, ThemePatch,
};
use shared::order::{Order, OrderStatus};
use shared::realtime::{EntityKind, FeedEvent, PresenceMember, PresenceSnapshot};
use tokio::sync::broadcast;

/// Gateway to the remote object store
///
/// All row mutations resolve to the server-acknowledged row so callers
/// can apply the result locally without waiting for the realtime echo
/// (the echo is deduplicated by identity on arrival).
#[async_trait]
pub trait StoreGateway: Send + Sync {
    // ===== Queries =====

    /// All cafés (id, name, visibility flag) - the tenant-selection
    /// superset, loaded once at startup.
    async fn list_cafes(&self) -> ClientResult<Vec<Cafe>>;
    async fn list_staff(&self, cafe_id: &str) -> ClientResult<Vec<Staff>>;
    async fn list_products(&self, cafe_id: &str) -> ClientResult<Vec<Product>>;
    async fn list_tables(&self, cafe_id: &str) -> ClientResult<Vec<CafeTable>>;
    async fn list_orders(&self, cafe_id: &str) -> ClientResult<Vec<Order>>;
    /// Single row or none.
    async fn fetch_theme(&self, cafe_id: &str) -> ClientResult<Option<ThemePatch>>;
    async fn list_feedback(&self, cafe_id: &str) -> ClientResult<Vec<Feedback>>;
    async fn find_creation_code(&self, code: &str) -> ClientResult<Option<CreationCode>>;

    // ===== Café provisioning =====

    async fn insert_cafe(&self, cafe: Cafe) -> ClientResult<Cafe>;
    async fn delete_cafe(&self, id: &str) -> ClientResult<()>;
    async fn insert_creation_code(&self, code: CreationCode) -> ClientResult<CreationCode>;
    async fn mark_code_used(&self, id: &str) -> ClientResult<()>;

    // ===== Staff =====

    async fn insert_staff(&self, staff: Staff) -> ClientResult<Staff>;
    async fn update_staff(&self, id: &str, patch: StaffUpdate) -> ClientResult<Staff>;
    async fn delete_staff(&self, id: &str) -> ClientResult<()>;

    // ===== Products =====

    async fn insert_product(&self, product: Product) -> ClientResult<Product>;
    async fn update_product(&self, id: &str, patch: ProductUpdate) -> ClientResult<Product>;
    async fn delete_product(&self, id: &str) -> ClientResult<()>;
    /// Bulk category rename across every product carrying `from`.
    async fn rename_product_category(
        &self,
        cafe_id: &str,
        from: &str,
        to: &str,
    ) -> ClientResult<Vec<Product>>;

    // ===== Tables =====

    async fn insert_table(&self, table: CafeTable) -> ClientResult<CafeTable>;
    async fn update_table(&self, id: &str, patch: CafeTableUpdate) -> ClientResult<CafeTable>;
    /// Named RPC instead of a raw field update - works around a
    /// schema-cache limitation of the hosted store.
    async fn set_table_hidden(&self, id: &str, hidden: bool) -> ClientResult<CafeTable>;

    // ===== Orders =====

    async fn insert_order(&self, order: Order) -> ClientResult<Order>;
    async fn update_order_status(
        &self,
        id: &str,
        status: OrderStatus,
        updated_at: DateTime<Utc>,
    ) -> ClientResult<Order>;
    /// Replace the item list (and status, when the list became empty)
    /// in one write.
    async fn update_order_items(
        &self,
        id: &str,
        items: Vec<shared::order::OrderItem>,
        status: OrderStatus,
        updated_at: DateTime<Utc>,
    ) -> ClientResult<Order>;
    /// The one multi-row transition: close a table's bill.
    async fn mark_orders_paid(
        &self,
        ids: &[String],
        updated_at: DateTime<Utc>,
    ) -> ClientResult<Vec<Order>>;

    // ===== Theme / feedback =====

    /// Upsert keyed on `cafe_id`, last writer wins.
    async fn upsert_theme(&self, patch: ThemePatch) -> ClientResult<ThemePatch>;
    async fn insert_feedback(&self, feedback: Feedback) -> ClientResult<Feedback>;
    async fn set_feedback_resolved(&self, id: &str, resolved: bool) -> ClientResult<Feedback>;

    // ===== Realtime =====

    /// Open one change feed for `(entity, cafe)`. `cafe_id` is `None`
    /// only for the global café feed.
    fn subscribe(
        &self,
        entity: EntityKind,
        cafe_id: Option<&str>,
    ) -> broadcast::Receiver<FeedEvent>;

    /// Publish the delete-notification fallback on an entity's channel.
    async fn send_removal(
        &self,
        entity: EntityKind,
        cafe_id: &str,
        id: &str,
    ) -> ClientResult<()>;

    // ===== Presence =====

    /// Subscribe to a table's ephemeral presence group.
    fn presence_subscribe(
        &self,
        cafe_id: &str,
        table_id: &str,
    ) -> broadcast::Receiver<PresenceSnapshot>;

    /// Announce self-state into a table's presence group.
    async fn presence_track(
        &self,
        cafe_id: &str,
        table_id: &str,
        member: PresenceMember,
    ) -> ClientResult<()>;

    /// Leave a table's presence group.
    async fn presence_leave(
        &self,
        cafe_id: &str,
        table_id: &str,
        member_id: &str,
    ) -> ClientResult<()>;
}
