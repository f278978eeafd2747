//! In-process store gateway
//!
//! Backs the full [`StoreGateway`] surface with in-memory tables and
//! tokio broadcast channels, mirroring the hosted store's observable
//! behavior closely enough for integration tests: mutations are
//! acknowledged with the stored row, every acknowledged write is also
//! echoed on the matching change feed, and deletes of tables, products
//! and staff do NOT produce a row-level delete event (the replication
//! configuration of the real store does not guarantee old-row content
//! there, which is why the removal broadcast exists).

use super::StoreGateway;
use crate::error::{ClientError, ClientResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use shared::models::{
    Cafe, CafeTable, CafeTableUpdate, CreationCode, Feedback, Product, ProductUpdate, Staff,
    StaffUpdate, ThemePatch,
};
use shared::order::{Order, OrderItem, OrderStatus};
use shared::realtime::{ChangeEvent, EntityKind, FeedEvent, PresenceMember, PresenceSnapshot};
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};
use tokio::sync::{broadcast, RwLock};

const CHANNEL_CAPACITY: usize = 256;

#[derive(Default)]
struct Rows {
    cafes: Vec<Cafe>,
    staff: Vec<Staff>,
    products: Vec<Product>,
    tables: Vec<CafeTable>,
    orders: Vec<Order>,
    themes: Vec<ThemePatch>,
    feedback: Vec<Feedback>,
    codes: Vec<CreationCode>,
    /// (cafe_id, table_id) -> members, ephemeral
    presence: HashMap<(String, String), Vec<PresenceMember>>,
}

type FeedKey = (EntityKind, Option<String>);
type PresenceKey = (String, String);

/// In-memory [`StoreGateway`] implementation
#[derive(Default)]
pub struct MemoryGateway {
    rows: RwLock<Rows>,
    feeds: Mutex<HashMap<FeedKey, broadcast::Sender<FeedEvent>>>,
    presence_feeds: Mutex<HashMap<PresenceKey, broadcast::Sender<PresenceSnapshot>>>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    fn feed_sender(
        &self,
        entity: EntityKind,
        cafe_id: Option<&str>,
    ) -> broadcast::Sender<FeedEvent> {
        let mut feeds = self
            .feeds
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        feeds
            .entry((entity, cafe_id.map(str::to_string)))
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .clone()
    }

    fn presence_sender(&self, cafe_id: &str, table_id: &str) -> broadcast::Sender<PresenceSnapshot> {
        let mut feeds = self
            .presence_feeds
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        feeds
            .entry((cafe_id.to_string(), table_id.to_string()))
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .clone()
    }

    fn emit(&self, entity: EntityKind, cafe_id: Option<&str>, event: FeedEvent) {
        // Nobody listening is fine
        let _ = self.feed_sender(entity, cafe_id).send(event);
    }

    fn emit_presence(&self, cafe_id: &str, table_id: &str, snapshot: PresenceSnapshot) {
        let _ = self.presence_sender(cafe_id, table_id).send(snapshot);
    }

    /// Live subscriber count on a table's presence channel.
    #[cfg(test)]
    pub(crate) fn presence_receiver_count(&self, cafe_id: &str, table_id: &str) -> usize {
        self.presence_sender(cafe_id, table_id).receiver_count()
    }
}

#[async_trait]
impl StoreGateway for MemoryGateway {
    // ===== Queries =====

    async fn list_cafes(&self) -> ClientResult<Vec<Cafe>> {
        Ok(self.rows.read().await.cafes.clone())
    }

    async fn list_staff(&self, cafe_id: &str) -> ClientResult<Vec<Staff>> {
        let rows = self.rows.read().await;
        Ok(rows
            .staff
            .iter()
            .filter(|s| s.cafe_id == cafe_id)
            .cloned()
            .collect())
    }

    async fn list_products(&self, cafe_id: &str) -> ClientResult<Vec<Product>> {
        let rows = self.rows.read().await;
        Ok(rows
            .products
            .iter()
            .filter(|p| p.cafe_id == cafe_id)
            .cloned()
            .collect())
    }

    async fn list_tables(&self, cafe_id: &str) -> ClientResult<Vec<CafeTable>> {
        let rows = self.rows.read().await;
        Ok(rows
            .tables
            .iter()
            .filter(|t| t.cafe_id == cafe_id)
            .cloned()
            .collect())
    }

    async fn list_orders(&self, cafe_id: &str) -> ClientResult<Vec<Order>> {
        let rows = self.rows.read().await;
        Ok(rows
            .orders
            .iter()
            .filter(|o| o.cafe_id == cafe_id)
            .cloned()
            .collect())
    }

    async fn fetch_theme(&self, cafe_id: &str) -> ClientResult<Option<ThemePatch>> {
        let rows = self.rows.read().await;
        Ok(rows.themes.iter().find(|t| t.cafe_id == cafe_id).cloned())
    }

    async fn list_feedback(&self, cafe_id: &str) -> ClientResult<Vec<Feedback>> {
        let rows = self.rows.read().await;
        Ok(rows
            .feedback
            .iter()
            .filter(|f| f.cafe_id.as_deref() == Some(cafe_id))
            .cloned()
            .collect())
    }

    async fn find_creation_code(&self, code: &str) -> ClientResult<Option<CreationCode>> {
        let rows = self.rows.read().await;
        Ok(rows.codes.iter().find(|c| c.code == code).cloned())
    }

    // ===== Café provisioning =====

    async fn insert_cafe(&self, cafe: Cafe) -> ClientResult<Cafe> {
        self.rows.write().await.cafes.push(cafe.clone());
        self.emit(
            EntityKind::Cafe,
            None,
            FeedEvent::Cafe(ChangeEvent::Insert { new: cafe.clone() }),
        );
        Ok(cafe)
    }

    async fn delete_cafe(&self, id: &str) -> ClientResult<()> {
        let mut rows = self.rows.write().await;
        rows.cafes.retain(|c| c.id != id);
        // Owner deletion cascades to all owned entities
        rows.staff.retain(|s| s.cafe_id != id);
        rows.products.retain(|p| p.cafe_id != id);
        rows.tables.retain(|t| t.cafe_id != id);
        rows.orders.retain(|o| o.cafe_id != id);
        rows.themes.retain(|t| t.cafe_id != id);
        drop(rows);
        self.emit(
            EntityKind::Cafe,
            None,
            FeedEvent::Cafe(ChangeEvent::Delete { old_id: id.into() }),
        );
        Ok(())
    }

    async fn insert_creation_code(&self, code: CreationCode) -> ClientResult<CreationCode> {
        self.rows.write().await.codes.push(code.clone());
        Ok(code)
    }

    async fn mark_code_used(&self, id: &str) -> ClientResult<()> {
        let mut rows = self.rows.write().await;
        let code = rows
            .codes
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| ClientError::NotFound(format!("creation code {id}")))?;
        code.used = true;
        Ok(())
    }

    // ===== Staff =====

    async fn insert_staff(&self, staff: Staff) -> ClientResult<Staff> {
        self.rows.write().await.staff.push(staff.clone());
        self.emit(
            EntityKind::Staff,
            Some(&staff.cafe_id),
            FeedEvent::Staff(ChangeEvent::Insert { new: staff.clone() }),
        );
        Ok(staff)
    }

    async fn update_staff(&self, id: &str, patch: StaffUpdate) -> ClientResult<Staff> {
        let mut rows = self.rows.write().await;
        let staff = rows
            .staff
            .iter_mut()
            .find(|s| s.id == id)
            .ok_or_else(|| ClientError::NotFound(format!("staff {id}")))?;
        if let Some(name) = patch.name {
            staff.name = name;
        }
        if let Some(role) = patch.role {
            staff.role = role;
        }
        if let Some(pin) = patch.pin {
            staff.pin = pin;
        }
        if let Some(phone) = patch.phone {
            staff.phone = phone;
        }
        let updated = staff.clone();
        drop(rows);
        self.emit(
            EntityKind::Staff,
            Some(&updated.cafe_id),
            FeedEvent::Staff(ChangeEvent::Update {
                new: updated.clone(),
            }),
        );
        Ok(updated)
    }

    async fn delete_staff(&self, id: &str) -> ClientResult<()> {
        // No row-level delete event: replication limitation (see module docs)
        self.rows.write().await.staff.retain(|s| s.id != id);
        Ok(())
    }

    // ===== Products =====

    async fn insert_product(&self, product: Product) -> ClientResult<Product> {
        self.rows.write().await.products.push(product.clone());
        self.emit(
            EntityKind::Product,
            Some(&product.cafe_id),
            FeedEvent::Product(ChangeEvent::Insert {
                new: product.clone(),
            }),
        );
        Ok(product)
    }

    async fn update_product(&self, id: &str, patch: ProductUpdate) -> ClientResult<Product> {
        let mut rows = self.rows.write().await;
        let product = rows
            .products
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| ClientError::NotFound(format!("product {id}")))?;
        if let Some(name) = patch.name {
            product.name = name;
        }
        if let Some(price) = patch.price {
            product.price = price;
        }
        if let Some(category) = patch.category {
            product.category = category;
        }
        let updated = product.clone();
        drop(rows);
        self.emit(
            EntityKind::Product,
            Some(&updated.cafe_id),
            FeedEvent::Product(ChangeEvent::Update {
                new: updated.clone(),
            }),
        );
        Ok(updated)
    }

    async fn delete_product(&self, id: &str) -> ClientResult<()> {
        // No row-level delete event: replication limitation (see module docs)
        self.rows.write().await.products.retain(|p| p.id != id);
        Ok(())
    }

    async fn rename_product_category(
        &self,
        cafe_id: &str,
        from: &str,
        to: &str,
    ) -> ClientResult<Vec<Product>> {
        let mut rows = self.rows.write().await;
        let mut updated = Vec::new();
        for product in rows
            .products
            .iter_mut()
            .filter(|p| p.cafe_id == cafe_id && p.category == from)
        {
            product.category = to.to_string();
            updated.push(product.clone());
        }
        drop(rows);
        for product in &updated {
            self.emit(
                EntityKind::Product,
                Some(cafe_id),
                FeedEvent::Product(ChangeEvent::Update {
                    new: product.clone(),
                }),
            );
        }
        Ok(updated)
    }

    // ===== Tables =====

    async fn insert_table(&self, table: CafeTable) -> ClientResult<CafeTable> {
        self.rows.write().await.tables.push(table.clone());
        self.emit(
            EntityKind::Table,
            Some(&table.cafe_id),
            FeedEvent::Table(ChangeEvent::Insert { new: table.clone() }),
        );
        Ok(table)
    }

    async fn update_table(&self, id: &str, patch: CafeTableUpdate) -> ClientResult<CafeTable> {
        let mut rows = self.rows.write().await;
        let table = rows
            .tables
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| ClientError::NotFound(format!("table {id}")))?;
        if let Some(name) = patch.name {
            table.name = name;
        }
        let updated = table.clone();
        drop(rows);
        self.emit(
            EntityKind::Table,
            Some(&updated.cafe_id),
            FeedEvent::Table(ChangeEvent::Update {
                new: updated.clone(),
            }),
        );
        Ok(updated)
    }

    async fn set_table_hidden(&self, id: &str, hidden: bool) -> ClientResult<CafeTable> {
        let mut rows = self.rows.write().await;
        let table = rows
            .tables
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| ClientError::NotFound(format!("table {id}")))?;
        table.hidden = hidden;
        let updated = table.clone();
        drop(rows);
        self.emit(
            EntityKind::Table,
            Some(&updated.cafe_id),
            FeedEvent::Table(ChangeEvent::Update {
                new: updated.clone(),
            }),
        );
        Ok(updated)
    }

    // ===== Orders =====

    async fn insert_order(&self, order: Order) -> ClientResult<Order> {
        self.rows.write().await.orders.push(order.clone());
        self.emit(
            EntityKind::Order,
            Some(&order.cafe_id),
            FeedEvent::Order(ChangeEvent::Insert { new: order.clone() }),
        );
        Ok(order)
    }

    async fn update_order_status(
        &self,
        id: &str,
        status: OrderStatus,
        updated_at: DateTime<Utc>,
    ) -> ClientResult<Order> {
        let mut rows = self.rows.write().await;
        let order = rows
            .orders
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or_else(|| ClientError::NotFound(format!("order {id}")))?;
        order.status = status;
        order.updated_at = updated_at;
        let updated = order.clone();
        drop(rows);
        self.emit(
            EntityKind::Order,
            Some(&updated.cafe_id),
            FeedEvent::Order(ChangeEvent::Update {
                new: updated.clone(),
            }),
        );
        Ok(updated)
    }

    async fn update_order_items(
        &self,
        id: &str,
        items: Vec<OrderItem>,
        status: OrderStatus,
        updated_at: DateTime<Utc>,
    ) -> ClientResult<Order> {
        let mut rows = self.rows.write().await;
        let order = rows
            .orders
            .iter_mut()
            .find(|o| o.id == id)
            .ok_or_else(|| ClientError::NotFound(format!("order {id}")))?;
        order.items = items;
        order.status = status;
        order.updated_at = updated_at;
        let updated = order.clone();
        drop(rows);
        self.emit(
            EntityKind::Order,
            Some(&updated.cafe_id),
            FeedEvent::Order(ChangeEvent::Update {
                new: updated.clone(),
            }),
        );
        Ok(updated)
    }

    async fn mark_orders_paid(
        &self,
        ids: &[String],
        updated_at: DateTime<Utc>,
    ) -> ClientResult<Vec<Order>> {
        let mut rows = self.rows.write().await;
        let mut updated = Vec::new();
        for order in rows.orders.iter_mut().filter(|o| ids.contains(&o.id)) {
            if order.status.is_terminal() {
                continue;
            }
            order.status = OrderStatus::Paid;
            order.updated_at = updated_at;
            updated.push(order.clone());
        }
        drop(rows);
        for order in &updated {
            self.emit(
                EntityKind::Order,
                Some(&order.cafe_id),
                FeedEvent::Order(ChangeEvent::Update { new: order.clone() }),
            );
        }
        Ok(updated)
    }

    // ===== Theme / feedback =====

    async fn upsert_theme(&self, patch: ThemePatch) -> ClientResult<ThemePatch> {
        let mut rows = self.rows.write().await;
        let existing = rows.themes.iter_mut().find(|t| t.cafe_id == patch.cafe_id);
        let event = match existing {
            Some(theme) => {
                *theme = patch.clone();
                ChangeEvent::Update { new: patch.clone() }
            }
            None => {
                rows.themes.push(patch.clone());
                ChangeEvent::Insert { new: patch.clone() }
            }
        };
        drop(rows);
        self.emit(
            EntityKind::Theme,
            Some(&patch.cafe_id),
            FeedEvent::Theme(event),
        );
        Ok(patch)
    }

    async fn insert_feedback(&self, feedback: Feedback) -> ClientResult<Feedback> {
        self.rows.write().await.feedback.push(feedback.clone());
        if let Some(cafe_id) = feedback.cafe_id.clone() {
            self.emit(
                EntityKind::Feedback,
                Some(&cafe_id),
                FeedEvent::Feedback(ChangeEvent::Insert {
                    new: feedback.clone(),
                }),
            );
        }
        Ok(feedback)
    }

    async fn set_feedback_resolved(&self, id: &str, resolved: bool) -> ClientResult<Feedback> {
        let mut rows = self.rows.write().await;
        let feedback = rows
            .feedback
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or_else(|| ClientError::NotFound(format!("feedback {id}")))?;
        feedback.resolved = resolved;
        let updated = feedback.clone();
        drop(rows);
        if let Some(cafe_id) = updated.cafe_id.clone() {
            self.emit(
                EntityKind::Feedback,
                Some(&cafe_id),
                FeedEvent::Feedback(ChangeEvent::Update {
                    new: updated.clone(),
                }),
            );
        }
        Ok(updated)
    }

    // ===== Realtime =====

    fn subscribe(
        &self,
        entity: EntityKind,
        cafe_id: Option<&str>,
    ) -> broadcast::Receiver<FeedEvent> {
        self.feed_sender(entity, cafe_id).subscribe()
    }

    async fn send_removal(
        &self,
        entity: EntityKind,
        cafe_id: &str,
        id: &str,
    ) -> ClientResult<()> {
        self.emit(
            entity,
            Some(cafe_id),
            FeedEvent::Removal {
                entity,
                id: id.to_string(),
            },
        );
        Ok(())
    }

    // ===== Presence =====

    fn presence_subscribe(
        &self,
        cafe_id: &str,
        table_id: &str,
    ) -> broadcast::Receiver<PresenceSnapshot> {
        self.presence_sender(cafe_id, table_id).subscribe()
    }

    async fn presence_track(
        &self,
        cafe_id: &str,
        table_id: &str,
        member: PresenceMember,
    ) -> ClientResult<()> {
        let mut rows = self.rows.write().await;
        let members = rows
            .presence
            .entry((cafe_id.to_string(), table_id.to_string()))
            .or_default();
        members.retain(|m| m.id != member.id);
        members.push(member);
        let snapshot = PresenceSnapshot {
            table_id: table_id.to_string(),
            members: members.clone(),
        };
        drop(rows);
        self.emit_presence(cafe_id, table_id, snapshot);
        Ok(())
    }

    async fn presence_leave(
        &self,
        cafe_id: &str,
        table_id: &str,
        member_id: &str,
    ) -> ClientResult<()> {
        let mut rows = self.rows.write().await;
        let key = (cafe_id.to_string(), table_id.to_string());
        if let Some(members) = rows.presence.get_mut(&key) {
            members.retain(|m| m.id != member_id);
            let snapshot = PresenceSnapshot {
                table_id: table_id.to_string(),
                members: members.clone(),
            };
            drop(rows);
            self.emit_presence(cafe_id, table_id, snapshot);
        }
        Ok(())
    }
}
