//! Fault-injecting gateway for tests
//!
//! Delegates every operation to a real [`MemoryGateway`] but lets a
//! test switch individual operations to fail, to exercise rollback and
//! teardown paths the happy-path gateway can never reach.

use super::{MemoryGateway, StoreGateway};
use crate::error::{ClientError, ClientResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::models::{
    Cafe, CafeTable, CafeTableUpdate, CreationCode, Feedback, Product, ProductUpdate, Staff,
    StaffUpdate, ThemePatch,
};
use shared::order::{Order, OrderItem, OrderStatus};
use shared::realtime::{EntityKind, FeedEvent, PresenceMember, PresenceSnapshot};
use std::collections::HashSet;
use std::sync::{Mutex, PoisonError};
use tokio::sync::broadcast;

pub(crate) struct FlakyGateway {
    pub(crate) inner: MemoryGateway,
    failing: Mutex<HashSet<&'static str>>,
}

impl FlakyGateway {
    pub(crate) fn new() -> Self {
        Self {
            inner: MemoryGateway::new(),
            failing: Mutex::new(HashSet::new()),
        }
    }

    /// Make one named operation fail until restored.
    pub(crate) fn fail_on(&self, op: &'static str) {
        self.failing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(op);
    }

    pub(crate) fn restore(&self, op: &str) {
        self.failing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(op);
    }

    fn check(&self, op: &str) -> ClientResult<()> {
        let failing = self.failing.lock().unwrap_or_else(PoisonError::into_inner);
        if failing.contains(op) {
            return Err(ClientError::Store(format!("{op} unavailable")));
        }
        Ok(())
    }
}

#[async_trait]
impl StoreGateway for FlakyGateway {
    async fn list_cafes(&self) -> ClientResult<Vec<Cafe>> {
        self.check("list_cafes")?;
        self.inner.list_cafes().await
    }

    async fn list_staff(&self, cafe_id: &str) -> ClientResult<Vec<Staff>> {
        self.check("list_staff")?;
        self.inner.list_staff(cafe_id).await
    }

    async fn list_products(&self, cafe_id: &str) -> ClientResult<Vec<Product>> {
        self.check("list_products")?;
        self.inner.list_products(cafe_id).await
    }

    async fn list_tables(&self, cafe_id: &str) -> ClientResult<Vec<CafeTable>> {
        self.check("list_tables")?;
        self.inner.list_tables(cafe_id).await
    }

    async fn list_orders(&self, cafe_id: &str) -> ClientResult<Vec<Order>> {
        self.check("list_orders")?;
        self.inner.list_orders(cafe_id).await
    }

    async fn fetch_theme(&self, cafe_id: &str) -> ClientResult<Option<ThemePatch>> {
        self.check("fetch_theme")?;
        self.inner.fetch_theme(cafe_id).await
    }

    async fn list_feedback(&self, cafe_id: &str) -> ClientResult<Vec<Feedback>> {
        self.check("list_feedback")?;
        self.inner.list_feedback(cafe_id).await
    }

    async fn find_creation_code(&self, code: &str) -> ClientResult<Option<CreationCode>> {
        self.check("find_creation_code")?;
        self.inner.find_creation_code(code).await
    }

    async fn insert_cafe(&self, cafe: Cafe) -> ClientResult<Cafe> {
        self.check("insert_cafe")?;
        self.inner.insert_cafe(cafe).await
    }

    async fn delete_cafe(&self, id: &str) -> ClientResult<()> {
        self.check("delete_cafe")?;
        self.inner.delete_cafe(id).await
    }

    async fn insert_creation_code(&self, code: CreationCode) -> ClientResult<CreationCode> {
        self.check("insert_creation_code")?;
        self.inner.insert_creation_code(code).await
    }

    async fn mark_code_used(&self, id: &str) -> ClientResult<()> {
        self.check("mark_code_used")?;
        self.inner.mark_code_used(id).await
    }

    async fn insert_staff(&self, staff: Staff) -> ClientResult<Staff> {
        self.check("insert_staff")?;
        self.inner.insert_staff(staff).await
    }

    async fn update_staff(&self, id: &str, patch: StaffUpdate) -> ClientResult<Staff> {
        self.check("update_staff")?;
        self.inner.update_staff(id, patch).await
    }

    async fn delete_staff(&self, id: &str) -> ClientResult<()> {
        self.check("delete_staff")?;
        self.inner.delete_staff(id).await
    }

    async fn insert_product(&self, product: Product) -> ClientResult<Product> {
        self.check("insert_product")?;
        self.inner.insert_product(product).await
    }

    async fn update_product(&self, id: &str, patch: ProductUpdate) -> ClientResult<Product> {
        self.check("update_product")?;
        self.inner.update_product(id, patch).await
    }

    async fn delete_product(&self, id: &str) -> ClientResult<()> {
        self.check("delete_product")?;
        self.inner.delete_product(id).await
    }

    async fn rename_product_category(
        &self,
        cafe_id: &str,
        from: &str,
        to: &str,
    ) -> ClientResult<Vec<Product>> {
        self.check("rename_product_category")?;
        self.inner.rename_product_category(cafe_id, from, to).await
    }

    async fn insert_table(&self, table: CafeTable) -> ClientResult<CafeTable> {
        self.check("insert_table")?;
        self.inner.insert_table(table).await
    }

    async fn update_table(&self, id: &str, patch: CafeTableUpdate) -> ClientResult<CafeTable> {
        self.check("update_table")?;
        self.inner.update_table(id, patch).await
    }

    async fn set_table_hidden(&self, id: &str, hidden: bool) -> ClientResult<CafeTable> {
        self.check("set_table_hidden")?;
        self.inner.set_table_hidden(id, hidden).await
    }

    async fn insert_order(&self, order: Order) -> ClientResult<Order> {
        self.check("insert_order")?;
        self.inner.insert_order(order).await
    }

    async fn update_order_status(
        &self,
        id: &str,
        status: OrderStatus,
        updated_at: DateTime<Utc>,
    ) -> ClientResult<Order> {
        self.check("update_order_status")?;
        self.inner.update_order_status(id, status, updated_at).await
    }

    async fn update_order_items(
        &self,
        id: &str,
        items: Vec<OrderItem>,
        status: OrderStatus,
        updated_at: DateTime<Utc>,
    ) -> ClientResult<Order> {
        self.check("update_order_items")?;
        self.inner
            .update_order_items(id, items, status, updated_at)
            .await
    }

    async fn mark_orders_paid(
        &self,
        ids: &[String],
        updated_at: DateTime<Utc>,
    ) -> ClientResult<Vec<Order>> {
        self.check("mark_orders_paid")?;
        self.inner.mark_orders_paid(ids, updated_at).await
    }

    async fn upsert_theme(&self, patch: ThemePatch) -> ClientResult<ThemePatch> {
        self.check("upsert_theme")?;
        self.inner.upsert_theme(patch).await
    }

    async fn insert_feedback(&self, feedback: Feedback) -> ClientResult<Feedback> {
        self.check("insert_feedback")?;
        self.inner.insert_feedback(feedback).await
    }

    async fn set_feedback_resolved(&self, id: &str, resolved: bool) -> ClientResult<Feedback> {
        self.check("set_feedback_resolved")?;
        self.inner.set_feedback_resolved(id, resolved).await
    }

    fn subscribe(
        &self,
        entity: EntityKind,
        cafe_id: Option<&str>,
    ) -> broadcast::Receiver<FeedEvent> {
        self.inner.subscribe(entity, cafe_id)
    }

    async fn send_removal(&self, entity: EntityKind, cafe_id: &str, id: &str) -> ClientResult<()> {
        self.check("send_removal")?;
        self.inner.send_removal(entity, cafe_id, id).await
    }

    fn presence_subscribe(
        &self,
        cafe_id: &str,
        table_id: &str,
    ) -> broadcast::Receiver<PresenceSnapshot> {
        self.inner.presence_subscribe(cafe_id, table_id)
    }

    async fn presence_track(
        &self,
        cafe_id: &str,
        table_id: &str,
        member: PresenceMember,
    ) -> ClientResult<()> {
        self.check("presence_track")?;
        self.inner.presence_track(cafe_id, table_id, member).await
    }

    async fn presence_leave(
        &self,
        cafe_id: &str,
        table_id: &str,
        member_id: &str,
    ) -> ClientResult<()> {
        self.check("presence_leave")?;
        self.inner.presence_leave(cafe_id, table_id, member_id).await
    }
}
