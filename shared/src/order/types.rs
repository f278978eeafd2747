//! Order entity and payload types

use super::OrderStatus;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Sentinel staff id recorded on customer self-service orders
pub const CUSTOMER_STAFF_ID: &str = "customer";

/// Order item - a snapshot taken at order time
///
/// `name` and `price` are copied from the product when the order is
/// created; later product edits never change historical totals.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderItem {
    pub product_id: String,
    pub name: String,
    /// Unit price snapshot in currency units
    pub price: Decimal,
    /// Always >= 1
    pub quantity: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl OrderItem {
    /// Line total (unit price x quantity).
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// Order entity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Order {
    pub id: String,
    pub cafe_id: String,
    pub table_id: String,
    /// Originating staff id, or [`CUSTOMER_STAFF_ID`] for self-service
    pub staff_id: String,
    pub items: Vec<OrderItem>,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Sum of all item line totals.
    pub fn total(&self) -> Decimal {
        self.items.iter().map(OrderItem::line_total).sum()
    }

    /// Whether the order came from a customer session rather than staff.
    pub fn is_self_service(&self) -> bool {
        self.staff_id == CUSTOMER_STAFF_ID
    }
}

/// Create order payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderCreate {
    pub table_id: String,
    /// Omitted for customer self-service orders
    pub staff_id: Option<String>,
    pub items: Vec<OrderItem>,
}

/// Typed outcome of a customer self-service cancellation
///
/// Cancellation is only permitted while the order is still `NEW`; the
/// failure reasons are part of the contract, not exceptions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE", tag = "result")]
pub enum CancelOutcome {
    Cancelled,
    NotFound,
    /// The kitchen already picked the order up
    AlreadyInProgress {
        status: OrderStatus,
    },
}

/// Result of the transactional remove-item operation
///
/// Removing the last item force-cancels the order; the new status is
/// part of the contract rather than a side effect buried in an update.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RemoveItemResult {
    pub order_id: String,
    /// Status after the removal (CANCELLED when the list became empty)
    pub status: OrderStatus,
    pub remaining_items: usize,
}
