//! Order lifecycle engine
//!
//! Creation, status transitions, customer cancellation, item removal
//! and bill closing. Every mutation goes through the gateway first and
//! applies the acknowledged row locally; the realtime echo is then a
//! no-op thanks to identity dedup in the collections.

use crate::error::{ClientError, ClientResult};
use crate::state::CafeCollections;
use crate::store::StoreGateway;
use chrono::Utc;
use rust_decimal::Decimal;
use shared::order::{
    CancelOutcome, Order, OrderItem, OrderStatus, RemoveItemResult, CUSTOMER_STAFF_ID,
};
use shared::realtime::ChangeEvent;
use shared::models::Staff;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// One requested order line; name and price are snapshotted from the
/// product catalog at creation time.
#[derive(Debug, Clone)]
pub struct OrderLine {
    pub product_id: String,
    pub quantity: i32,
    pub note: Option<String>,
}

/// Order commands over the active café's collections
pub struct OrderEngine {
    gateway: Arc<dyn StoreGateway>,
    collections: Arc<RwLock<CafeCollections>>,
}

impl OrderEngine {
    pub fn new(
        gateway: Arc<dyn StoreGateway>,
        collections: Arc<RwLock<CafeCollections>>,
    ) -> Self {
        Self {
            gateway,
            collections,
        }
    }

    /// Place an order for a table. `staff_id` is `None` for customer
    /// self-service, recorded under the sentinel staff id. Items are
    /// snapshotted (name, unit price) from the current catalog so later
    /// product edits never change this order's total.
    pub async fn create_order(
        &self,
        table_id: &str,
        staff_id: Option<String>,
        lines: Vec<OrderLine>,
    ) -> ClientResult<Order> {
        if lines.is_empty() {
            return Err(ClientError::Validation("order has no items".into()));
        }
        let (cafe_id, items) = {
            let guard = self.collections.read().await;
            let cafe_id = guard
                .cafe_id
                .clone()
                .ok_or(ClientError::NoCafeSelected)?;
            if !guard.tables.iter().any(|t| t.id == table_id) {
                return Err(ClientError::NotFound(format!("table {table_id}")));
            }
            let mut items = Vec::with_capacity(lines.len());
            for line in &lines {
                if line.quantity < 1 {
                    return Err(ClientError::Validation(format!(
                        "quantity {} for product {}",
                        line.quantity, line.product_id
                    )));
                }
                let product = guard
                    .products
                    .iter()
                    .find(|p| p.id == line.product_id)
                    .ok_or_else(|| ClientError::NotFound(format!("product {}", line.product_id)))?;
                items.push(OrderItem {
                    product_id: product.id.clone(),
                    name: product.name.clone(),
                    price: product.price,
                    quantity: line.quantity,
                    note: line.note.clone(),
                });
            }
            (cafe_id, items)
        };

        let now = Utc::now();
        let order = Order {
            id: Uuid::new_v4().to_string(),
            cafe_id,
            table_id: table_id.to_string(),
            staff_id: staff_id.unwrap_or_else(|| CUSTOMER_STAFF_ID.to_string()),
            items,
            status: OrderStatus::New,
            created_at: now,
            updated_at: now,
        };
        let stored = self.gateway.insert_order(order).await?;
        tracing::info!(
            order_id = %stored.id,
            table_id = %stored.table_id,
            self_service = stored.is_self_service(),
            "Order created"
        );
        self.collections
            .write()
            .await
            .apply_order(ChangeEvent::Insert {
                new: stored.clone(),
            });
        Ok(stored)
    }

    /// Staff-driven status transition, checked against the lifecycle
    /// table and the staff member's role:
    ///
    /// - PREPARING / READY require a kitchen-capable role
    /// - CANCELLED requires a cancel-capable role (and a NEW order)
    /// - SERVED is open to any staff member
    pub async fn transition(
        &self,
        order_id: &str,
        to: OrderStatus,
        staff: &Staff,
    ) -> ClientResult<Order> {
        let from = {
            let guard = self.collections.read().await;
            guard
                .orders
                .iter()
                .find(|o| o.id == order_id)
                .map(|o| o.status)
                .ok_or_else(|| ClientError::NotFound(format!("order {order_id}")))?
        };
        if !from.can_transition(to) {
            return Err(ClientError::InvalidTransition { from, to });
        }
        let permitted = match to {
            OrderStatus::Preparing | OrderStatus::Ready => staff.role.can_prepare(),
            OrderStatus::Cancelled => staff.role.can_cancel(),
            _ => true,
        };
        if !permitted {
            return Err(ClientError::Forbidden(format!(
                "{} cannot move an order to {to}",
                staff.role
            )));
        }

        let updated = self
            .gateway
            .update_order_status(order_id, to, Utc::now())
            .await?;
        tracing::info!(order_id = %order_id, from = %from, to = %to, "Order transitioned");
        self.collections
            .write()
            .await
            .apply_order(ChangeEvent::Update {
                new: updated.clone(),
            });
        Ok(updated)
    }

    /// Customer self-service cancellation. Only a still-NEW order can
    /// be withdrawn; the failure reasons are data, not errors.
    pub async fn cancel_by_customer(&self, order_id: &str) -> ClientResult<CancelOutcome> {
        let status = {
            let guard = self.collections.read().await;
            guard
                .orders
                .iter()
                .find(|o| o.id == order_id)
                .map(|o| o.status)
        };
        let Some(status) = status else {
            return Ok(CancelOutcome::NotFound);
        };
        if status != OrderStatus::New {
            return Ok(CancelOutcome::AlreadyInProgress { status });
        }

        let updated = self
            .gateway
            .update_order_status(order_id, OrderStatus::Cancelled, Utc::now())
            .await?;
        tracing::info!(order_id = %order_id, "Order cancelled by customer");
        self.collections
            .write()
            .await
            .apply_order(ChangeEvent::Update { new: updated });
        Ok(CancelOutcome::Cancelled)
    }

    /// Remove one item by position. Removing the last item cancels the
    /// order in the same write; the list and status change together.
    /// Deliberately not gated on status - a correction after serving is
    /// a staff judgement call.
    pub async fn remove_item(
        &self,
        order_id: &str,
        item_index: usize,
    ) -> ClientResult<RemoveItemResult> {
        let (mut items, status) = {
            let guard = self.collections.read().await;
            let order = guard
                .orders
                .iter()
                .find(|o| o.id == order_id)
                .ok_or_else(|| ClientError::NotFound(format!("order {order_id}")))?;
            (order.items.clone(), order.status)
        };
        if item_index >= items.len() {
            return Err(ClientError::Validation(format!(
                "item index {item_index} out of range ({} items)",
                items.len()
            )));
        }
        items.remove(item_index);
        let next_status = if items.is_empty() {
            OrderStatus::Cancelled
        } else {
            status
        };

        let updated = self
            .gateway
            .update_order_items(order_id, items, next_status, Utc::now())
            .await?;
        tracing::info!(
            order_id = %order_id,
            remaining = updated.items.len(),
            status = %updated.status,
            "Order item removed"
        );
        let result = RemoveItemResult {
            order_id: updated.id.clone(),
            status: updated.status,
            remaining_items: updated.items.len(),
        };
        self.collections
            .write()
            .await
            .apply_order(ChangeEvent::Update { new: updated });
        Ok(result)
    }

    /// Close a table's bill: every billable order on the table becomes
    /// PAID in one multi-row write. Returns the closed orders (empty
    /// when the table had nothing open).
    pub async fn close_table_bill(&self, table_id: &str) -> ClientResult<Vec<Order>> {
        let ids: Vec<String> = {
            let guard = self.collections.read().await;
            guard
                .orders
                .iter()
                .filter(|o| o.table_id == table_id && o.status.is_billable())
                .map(|o| o.id.clone())
                .collect()
        };
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let closed = self.gateway.mark_orders_paid(&ids, Utc::now()).await?;
        tracing::info!(table_id = %table_id, orders = closed.len(), "Table bill closed");
        let mut guard = self.collections.write().await;
        for order in &closed {
            guard.apply_order(ChangeEvent::Update {
                new: order.clone(),
            });
        }
        Ok(closed)
    }

    /// Running total of the table's billable orders.
    pub async fn table_total(&self, table_id: &str) -> Decimal {
        self.collections.read().await.table_total(table_id)
    }

    pub async fn table_occupied(&self, table_id: &str) -> bool {
        self.collections.read().await.table_occupied(table_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryGateway;
    use shared::models::{CafeTable, Product, StaffRole};

    fn staff(role: StaffRole) -> Staff {
        Staff {
            id: "s1".into(),
            cafe_id: "c1".into(),
            name: "Ana".into(),
            role,
            pin: "123456".into(),
            phone: None,
        }
    }

    async fn engine_with_catalog() -> OrderEngine {
        let gateway = Arc::new(MemoryGateway::new());
        let collections = Arc::new(RwLock::new(CafeCollections::default()));
        {
            let mut guard = collections.write().await;
            guard.cafe_id = Some("c1".into());
            guard.products.push(Product {
                id: "p1".into(),
                cafe_id: "c1".into(),
                name: "Cortado".into(),
                price: Decimal::new(250, 2),
                category: "coffee".into(),
            });
            guard.tables.push(CafeTable {
                id: "t1".into(),
                cafe_id: "c1".into(),
                name: "Mesa 1".into(),
                hidden: false,
            });
        }
        OrderEngine::new(gateway, collections)
    }

    fn lines(quantity: i32) -> Vec<OrderLine> {
        vec![OrderLine {
            product_id: "p1".into(),
            quantity,
            note: None,
        }]
    }

    #[tokio::test]
    async fn test_create_snapshots_catalog_price() {
        let engine = engine_with_catalog().await;
        let order = engine.create_order("t1", None, lines(3)).await.unwrap();
        assert_eq!(order.status, OrderStatus::New);
        assert_eq!(order.staff_id, CUSTOMER_STAFF_ID);
        assert_eq!(order.items[0].name, "Cortado");
        assert_eq!(order.total(), Decimal::new(750, 2));
        assert!(engine.table_occupied("t1").await);
    }

    #[tokio::test]
    async fn test_create_rejects_empty_and_unknown() {
        let engine = engine_with_catalog().await;
        assert!(matches!(
            engine.create_order("t1", None, vec![]).await,
            Err(ClientError::Validation(_))
        ));
        assert!(matches!(
            engine
                .create_order(
                    "t1",
                    None,
                    vec![OrderLine {
                        product_id: "ghost".into(),
                        quantity: 1,
                        note: None,
                    }]
                )
                .await,
            Err(ClientError::NotFound(_))
        ));
        assert!(matches!(
            engine.create_order("nowhere", None, lines(1)).await,
            Err(ClientError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_transition_respects_lifecycle_and_roles() {
        let engine = engine_with_catalog().await;
        let order = engine.create_order("t1", None, lines(1)).await.unwrap();

        // Waiter cannot start preparation
        assert!(matches!(
            engine
                .transition(&order.id, OrderStatus::Preparing, &staff(StaffRole::Waiter))
                .await,
            Err(ClientError::Forbidden(_))
        ));
        // Kitchen can
        let order = engine
            .transition(&order.id, OrderStatus::Preparing, &staff(StaffRole::Kitchen))
            .await
            .unwrap();
        assert_eq!(order.status, OrderStatus::Preparing);
        // No skipping PREPARING -> SERVED
        assert!(matches!(
            engine
                .transition(&order.id, OrderStatus::Served, &staff(StaffRole::Manager))
                .await,
            Err(ClientError::InvalidTransition { .. })
        ));
        let order = engine
            .transition(&order.id, OrderStatus::Ready, &staff(StaffRole::Kitchen))
            .await
            .unwrap();
        let order = engine
            .transition(&order.id, OrderStatus::Served, &staff(StaffRole::Waiter))
            .await
            .unwrap();
        assert_eq!(order.status, OrderStatus::Served);
    }

    #[tokio::test]
    async fn test_staff_cancel_only_from_new() {
        let engine = engine_with_catalog().await;
        let order = engine.create_order("t1", None, lines(1)).await.unwrap();
        // Kitchen has no cancel capability
        assert!(matches!(
            engine
                .transition(&order.id, OrderStatus::Cancelled, &staff(StaffRole::Kitchen))
                .await,
            Err(ClientError::Forbidden(_))
        ));
        let order = engine
            .transition(&order.id, OrderStatus::Cancelled, &staff(StaffRole::Waiter))
            .await
            .unwrap();
        assert_eq!(order.status, OrderStatus::Cancelled);
        assert!(!engine.table_occupied("t1").await);
    }

    #[tokio::test]
    async fn test_customer_cancel_outcomes() {
        let engine = engine_with_catalog().await;
        let order = engine.create_order("t1", None, lines(1)).await.unwrap();

        assert_eq!(
            engine.cancel_by_customer("ghost").await.unwrap(),
            CancelOutcome::NotFound
        );
        assert_eq!(
            engine.cancel_by_customer(&order.id).await.unwrap(),
            CancelOutcome::Cancelled
        );

        let order = engine.create_order("t1", None, lines(1)).await.unwrap();
        engine
            .transition(&order.id, OrderStatus::Preparing, &staff(StaffRole::Kitchen))
            .await
            .unwrap();
        assert_eq!(
            engine.cancel_by_customer(&order.id).await.unwrap(),
            CancelOutcome::AlreadyInProgress {
                status: OrderStatus::Preparing
            }
        );
    }

    #[tokio::test]
    async fn test_removing_last_item_cancels_order() {
        let engine = engine_with_catalog().await;
        let order = engine
            .create_order(
                "t1",
                Some("s1".into()),
                vec![
                    OrderLine {
                        product_id: "p1".into(),
                        quantity: 1,
                        note: None,
                    },
                    OrderLine {
                        product_id: "p1".into(),
                        quantity: 2,
                        note: Some("sin azúcar".into()),
                    },
                ],
            )
            .await
            .unwrap();

        let result = engine.remove_item(&order.id, 0).await.unwrap();
        assert_eq!(result.remaining_items, 1);
        assert_eq!(result.status, OrderStatus::New);

        let result = engine.remove_item(&order.id, 0).await.unwrap();
        assert_eq!(result.remaining_items, 0);
        assert_eq!(result.status, OrderStatus::Cancelled);
        assert!(!engine.table_occupied("t1").await);

        assert!(matches!(
            engine.remove_item(&order.id, 5).await,
            Err(ClientError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_removing_last_item_cancels_even_a_served_order() {
        let engine = engine_with_catalog().await;
        let order = engine.create_order("t1", None, lines(1)).await.unwrap();
        for status in [OrderStatus::Preparing, OrderStatus::Ready] {
            engine
                .transition(&order.id, status, &staff(StaffRole::Kitchen))
                .await
                .unwrap();
        }
        engine
            .transition(&order.id, OrderStatus::Served, &staff(StaffRole::Waiter))
            .await
            .unwrap();

        // Removal is not gated on status: emptying a SERVED order still
        // force-cancels it.
        let result = engine.remove_item(&order.id, 0).await.unwrap();
        assert_eq!(result.remaining_items, 0);
        assert_eq!(result.status, OrderStatus::Cancelled);
        assert!(!engine.table_occupied("t1").await);
    }

    #[tokio::test]
    async fn test_close_table_bill_pays_billable_only() {
        let engine = engine_with_catalog().await;
        let o1 = engine.create_order("t1", None, lines(1)).await.unwrap();
        let o2 = engine.create_order("t1", None, lines(2)).await.unwrap();
        engine.cancel_by_customer(&o1.id).await.unwrap();

        let closed = engine.close_table_bill("t1").await.unwrap();
        assert_eq!(closed.len(), 1);
        assert_eq!(closed[0].id, o2.id);
        assert_eq!(closed[0].status, OrderStatus::Paid);
        assert!(!engine.table_occupied("t1").await);
        assert_eq!(engine.table_total("t1").await, Decimal::ZERO);

        // Nothing open: a no-op, not an error
        assert!(engine.close_table_bill("t1").await.unwrap().is_empty());
    }
}
