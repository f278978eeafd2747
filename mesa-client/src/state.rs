//! In-memory entity collections for the active café
//!
//! All tenant-scoped state lives here, mutated only from the event loop
//! (feed tasks and engine calls both go through the same `RwLock`).
//! Reconciliation rules:
//!
//! - INSERT: append unless a row with the same identity already exists
//!   (a local optimistic insert racing its realtime echo) - never
//!   duplicate.
//! - UPDATE: replace the matching row; drop silently when absent (the
//!   event may precede local knowledge of the row).
//! - DELETE / removal broadcast: remove by id, idempotently.
//! - Rows whose `cafe_id` does not match the active café are rejected;
//!   cross-tenant leakage is a correctness bug, not a display glitch.

use rust_decimal::Decimal;
use shared::models::{Cafe, CafeTable, Feedback, Product, Staff, ThemePatch};
use shared::order::Order;
use shared::realtime::{ChangeEvent, EntityKind};

/// Tenant-scoped collections mirroring server state
#[derive(Debug, Default)]
pub struct CafeCollections {
    /// The café these collections belong to; `None` means cleared
    pub cafe_id: Option<String>,
    pub staff: Vec<Staff>,
    pub products: Vec<Product>,
    pub tables: Vec<CafeTable>,
    pub orders: Vec<Order>,
    pub theme: Option<ThemePatch>,
    pub feedback: Vec<Feedback>,
}

impl CafeCollections {
    /// Synchronously drop every tenant-scoped row. Called before a new
    /// café's data arrives so nothing stale is ever rendered.
    pub fn clear(&mut self) {
        self.cafe_id = None;
        self.staff.clear();
        self.products.clear();
        self.tables.clear();
        self.orders.clear();
        self.theme = None;
        self.feedback.clear();
    }

    /// Atomically replace all collections with a fresh bulk load.
    #[allow(clippy::too_many_arguments)]
    pub fn replace_all(
        &mut self,
        cafe_id: String,
        staff: Vec<Staff>,
        products: Vec<Product>,
        mut tables: Vec<CafeTable>,
        mut orders: Vec<Order>,
        theme: Option<ThemePatch>,
        feedback: Vec<Feedback>,
    ) {
        tables.sort_by_key(CafeTable::sort_index);
        orders.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        self.cafe_id = Some(cafe_id);
        self.staff = staff;
        self.products = products;
        self.tables = tables;
        self.orders = orders;
        self.theme = theme;
        self.feedback = feedback;
    }

    fn owns(&self, cafe_id: &str) -> bool {
        self.cafe_id.as_deref() == Some(cafe_id)
    }

    // ===== Derived views =====

    /// Live categories: always exactly the sorted distinct category
    /// labels among current products, never independently mutated.
    pub fn categories(&self) -> Vec<String> {
        let mut categories: Vec<String> =
            self.products.iter().map(|p| p.category.clone()).collect();
        categories.sort();
        categories.dedup();
        categories
    }

    /// Tables shown to staff (soft-deleted ones excluded).
    pub fn visible_tables(&self) -> Vec<&CafeTable> {
        self.tables.iter().filter(|t| !t.hidden).collect()
    }

    /// Orders for one table, in the stable rendering order.
    pub fn orders_for_table(&self, table_id: &str) -> Vec<&Order> {
        self.orders
            .iter()
            .filter(|o| o.table_id == table_id)
            .collect()
    }

    /// Running total: every billable order's items summed.
    pub fn table_total(&self, table_id: &str) -> Decimal {
        self.orders
            .iter()
            .filter(|o| o.table_id == table_id && o.status.is_billable())
            .map(Order::total)
            .sum()
    }

    /// A table is occupied iff it has at least one billable order.
    pub fn table_occupied(&self, table_id: &str) -> bool {
        self.orders
            .iter()
            .any(|o| o.table_id == table_id && o.status.is_billable())
    }

    // ===== Reconciliation =====

    pub fn apply_staff(&mut self, event: ChangeEvent<Staff>) {
        match event {
            ChangeEvent::Insert { new } => {
                if !self.owns(&new.cafe_id) {
                    tracing::warn!(cafe_id = %new.cafe_id, "dropping cross-café staff insert");
                    return;
                }
                if !self.staff.iter().any(|s| s.id == new.id) {
                    self.staff.push(new);
                }
            }
            ChangeEvent::Update { new } => {
                if !self.owns(&new.cafe_id) {
                    return;
                }
                if let Some(existing) = self.staff.iter_mut().find(|s| s.id == new.id) {
                    *existing = new;
                }
            }
            ChangeEvent::Delete { old_id } => self.staff.retain(|s| s.id != old_id),
        }
    }

    pub fn apply_product(&mut self, event: ChangeEvent<Product>) {
        match event {
            ChangeEvent::Insert { new } => {
                if !self.owns(&new.cafe_id) {
                    tracing::warn!(cafe_id = %new.cafe_id, "dropping cross-café product insert");
                    return;
                }
                if !self.products.iter().any(|p| p.id == new.id) {
                    self.products.push(new);
                }
            }
            ChangeEvent::Update { new } => {
                if !self.owns(&new.cafe_id) {
                    return;
                }
                if let Some(existing) = self.products.iter_mut().find(|p| p.id == new.id) {
                    *existing = new;
                }
            }
            ChangeEvent::Delete { old_id } => self.products.retain(|p| p.id != old_id),
        }
    }

    /// Tables keep numeric-suffix order after every change.
    pub fn apply_table(&mut self, event: ChangeEvent<CafeTable>) {
        match event {
            ChangeEvent::Insert { new } => {
                if !self.owns(&new.cafe_id) {
                    tracing::warn!(cafe_id = %new.cafe_id, "dropping cross-café table insert");
                    return;
                }
                if !self.tables.iter().any(|t| t.id == new.id) {
                    self.tables.push(new);
                }
            }
            ChangeEvent::Update { new } => {
                if !self.owns(&new.cafe_id) {
                    return;
                }
                if let Some(existing) = self.tables.iter_mut().find(|t| t.id == new.id) {
                    *existing = new;
                }
            }
            ChangeEvent::Delete { old_id } => self.tables.retain(|t| t.id != old_id),
        }
        self.tables.sort_by_key(CafeTable::sort_index);
    }

    pub fn apply_order(&mut self, event: ChangeEvent<Order>) {
        match event {
            ChangeEvent::Insert { new } => {
                if !self.owns(&new.cafe_id) {
                    tracing::warn!(cafe_id = %new.cafe_id, "dropping cross-café order insert");
                    return;
                }
                if !self.orders.iter().any(|o| o.id == new.id) {
                    self.orders.push(new);
                    self.orders
                        .sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
                }
            }
            ChangeEvent::Update { new } => {
                if !self.owns(&new.cafe_id) {
                    return;
                }
                if let Some(existing) = self.orders.iter_mut().find(|o| o.id == new.id) {
                    *existing = new;
                }
            }
            ChangeEvent::Delete { old_id } => self.orders.retain(|o| o.id != old_id),
        }
    }

    pub fn apply_theme(&mut self, event: ChangeEvent<ThemePatch>) {
        match event {
            ChangeEvent::Insert { new } | ChangeEvent::Update { new } => {
                if self.owns(&new.cafe_id) {
                    self.theme = Some(new);
                }
            }
            ChangeEvent::Delete { old_id } => {
                if self.theme.as_ref().is_some_and(|t| t.cafe_id == old_id) {
                    self.theme = None;
                }
            }
        }
    }

    pub fn apply_feedback(&mut self, event: ChangeEvent<Feedback>) {
        match event {
            ChangeEvent::Insert { new } => {
                if !self.feedback.iter().any(|f| f.id == new.id) {
                    self.feedback.push(new);
                }
            }
            ChangeEvent::Update { new } => {
                if let Some(existing) = self.feedback.iter_mut().find(|f| f.id == new.id) {
                    *existing = new;
                }
            }
            ChangeEvent::Delete { old_id } => self.feedback.retain(|f| f.id != old_id),
        }
    }

    /// Apply a removal broadcast: remove by id, idempotently (the
    /// deleting client receives its own broadcast too).
    pub fn apply_removal(&mut self, entity: EntityKind, id: &str) {
        match entity {
            EntityKind::Staff => self.staff.retain(|s| s.id != id),
            EntityKind::Product => self.products.retain(|p| p.id != id),
            EntityKind::Table => {
                self.tables.retain(|t| t.id != id);
                self.tables.sort_by_key(CafeTable::sort_index);
            }
            // Only tables, products and staff use the fallback
            _ => {
                tracing::debug!(entity = %entity, id = %id, "ignoring removal for entity without fallback");
            }
        }
    }
}

/// Untenanted café list kept in sync with the global café feed
#[derive(Debug, Default)]
pub struct CafeDirectory {
    pub cafes: Vec<Cafe>,
}

impl CafeDirectory {
    pub fn replace(&mut self, cafes: Vec<Cafe>) {
        self.cafes = cafes;
    }

    /// Cafés offered on public selection screens.
    pub fn public(&self) -> Vec<&Cafe> {
        self.cafes.iter().filter(|c| !c.hidden).collect()
    }

    pub fn apply(&mut self, event: ChangeEvent<Cafe>) {
        match event {
            ChangeEvent::Insert { new } => {
                if !self.cafes.iter().any(|c| c.id == new.id) {
                    self.cafes.push(new);
                }
            }
            ChangeEvent::Update { new } => {
                if let Some(existing) = self.cafes.iter_mut().find(|c| c.id == new.id) {
                    *existing = new;
                }
            }
            ChangeEvent::Delete { old_id } => self.cafes.retain(|c| c.id != old_id),
        }
    }
}
