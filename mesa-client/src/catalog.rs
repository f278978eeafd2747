//! Catalog administration
//!
//! Manager-side CRUD for products, tables and staff. Deletes follow
//! the delete-then-broadcast protocol: the row delete alone does not
//! reach every peer, so a removal notification is published on the
//! entity's channel right after, and the deleting client applies its
//! own removal locally without waiting for the echo.

use crate::error::{ClientError, ClientResult};
use crate::state::CafeCollections;
use crate::store::StoreGateway;
use shared::models::{
    CafeTable, CafeTableCreate, CafeTableUpdate, Product, ProductCreate, ProductUpdate, Staff,
    StaffCreate, StaffUpdate,
};
use shared::realtime::{ChangeEvent, EntityKind};
use shared::util::is_valid_pin;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Catalog commands over the active café's collections
pub struct CatalogService {
    gateway: Arc<dyn StoreGateway>,
    collections: Arc<RwLock<CafeCollections>>,
}

impl CatalogService {
    pub fn new(
        gateway: Arc<dyn StoreGateway>,
        collections: Arc<RwLock<CafeCollections>>,
    ) -> Self {
        Self {
            gateway,
            collections,
        }
    }

    async fn active_cafe(&self) -> ClientResult<String> {
        self.collections
            .read()
            .await
            .cafe_id
            .clone()
            .ok_or(ClientError::NoCafeSelected)
    }

    // ===== Products =====

    pub async fn create_product(&self, create: ProductCreate) -> ClientResult<Product> {
        let cafe_id = self.active_cafe().await?;
        if create.name.trim().is_empty() {
            return Err(ClientError::Validation("product name is empty".into()));
        }
        if create.price.is_sign_negative() {
            return Err(ClientError::Validation("product price is negative".into()));
        }
        let product = Product {
            id: Uuid::new_v4().to_string(),
            cafe_id,
            name: create.name,
            price: create.price,
            category: create.category,
        };
        let stored = self.gateway.insert_product(product).await?;
        tracing::info!(product_id = %stored.id, "Product created");
        self.collections
            .write()
            .await
            .apply_product(ChangeEvent::Insert {
                new: stored.clone(),
            });
        Ok(stored)
    }

    pub async fn update_product(&self, id: &str, patch: ProductUpdate) -> ClientResult<Product> {
        if patch.price.is_some_and(|p| p.is_sign_negative()) {
            return Err(ClientError::Validation("product price is negative".into()));
        }
        let stored = self.gateway.update_product(id, patch).await?;
        self.collections
            .write()
            .await
            .apply_product(ChangeEvent::Update {
                new: stored.clone(),
            });
        Ok(stored)
    }

    /// Delete then broadcast; the local removal is applied immediately.
    pub async fn delete_product(&self, id: &str) -> ClientResult<()> {
        let cafe_id = self.active_cafe().await?;
        self.gateway.delete_product(id).await?;
        self.gateway
            .send_removal(EntityKind::Product, &cafe_id, id)
            .await?;
        tracing::info!(product_id = %id, "Product deleted");
        self.collections
            .write()
            .await
            .apply_removal(EntityKind::Product, id);
        Ok(())
    }

    /// Rename a category by rewriting every product that carries it.
    /// The category ceases to exist the moment no product references it.
    pub async fn rename_category(&self, from: &str, to: &str) -> ClientResult<Vec<Product>> {
        let cafe_id = self.active_cafe().await?;
        if to.trim().is_empty() {
            return Err(ClientError::Validation("category name is empty".into()));
        }
        let renamed = self
            .gateway
            .rename_product_category(&cafe_id, from, to)
            .await?;
        tracing::info!(from = %from, to = %to, products = renamed.len(), "Category renamed");
        let mut guard = self.collections.write().await;
        for product in &renamed {
            guard.apply_product(ChangeEvent::Update {
                new: product.clone(),
            });
        }
        Ok(renamed)
    }

    // ===== Tables =====

    pub async fn create_table(&self, create: CafeTableCreate) -> ClientResult<CafeTable> {
        let cafe_id = self.active_cafe().await?;
        if create.name.trim().is_empty() {
            return Err(ClientError::Validation("table name is empty".into()));
        }
        let table = CafeTable {
            id: Uuid::new_v4().to_string(),
            cafe_id,
            name: create.name,
            hidden: false,
        };
        let stored = self.gateway.insert_table(table).await?;
        tracing::info!(table_id = %stored.id, name = %stored.name, "Table created");
        self.collections
            .write()
            .await
            .apply_table(ChangeEvent::Insert {
                new: stored.clone(),
            });
        Ok(stored)
    }

    pub async fn rename_table(&self, id: &str, name: String) -> ClientResult<CafeTable> {
        if name.trim().is_empty() {
            return Err(ClientError::Validation("table name is empty".into()));
        }
        let stored = self
            .gateway
            .update_table(id, CafeTableUpdate { name: Some(name) })
            .await?;
        self.collections
            .write()
            .await
            .apply_table(ChangeEvent::Update {
                new: stored.clone(),
            });
        Ok(stored)
    }

    /// Soft-delete (or restore) a table via the named RPC.
    pub async fn set_table_hidden(&self, id: &str, hidden: bool) -> ClientResult<CafeTable> {
        let stored = self.gateway.set_table_hidden(id, hidden).await?;
        tracing::info!(table_id = %id, hidden, "Table visibility changed");
        self.collections
            .write()
            .await
            .apply_table(ChangeEvent::Update {
                new: stored.clone(),
            });
        Ok(stored)
    }

    // ===== Staff =====

    /// PIN must be exactly 6 digits and unique within the café.
    async fn check_pin(&self, pin: &str, exclude_staff_id: Option<&str>) -> ClientResult<()> {
        if !is_valid_pin(pin) {
            return Err(ClientError::Validation(
                "PIN must be exactly 6 digits".into(),
            ));
        }
        let guard = self.collections.read().await;
        let taken = guard
            .staff
            .iter()
            .any(|s| s.pin == pin && Some(s.id.as_str()) != exclude_staff_id);
        if taken {
            return Err(ClientError::Validation(
                "PIN already in use by another staff member".into(),
            ));
        }
        Ok(())
    }

    pub async fn create_staff(&self, create: StaffCreate) -> ClientResult<Staff> {
        let cafe_id = self.active_cafe().await?;
        if create.name.trim().is_empty() {
            return Err(ClientError::Validation("staff name is empty".into()));
        }
        self.check_pin(&create.pin, None).await?;
        let staff = Staff {
            id: Uuid::new_v4().to_string(),
            cafe_id,
            name: create.name,
            role: create.role,
            pin: create.pin,
            phone: create.phone,
        };
        let stored = self.gateway.insert_staff(staff).await?;
        tracing::info!(staff_id = %stored.id, role = ?stored.role, "Staff created");
        self.collections
            .write()
            .await
            .apply_staff(ChangeEvent::Insert {
                new: stored.clone(),
            });
        Ok(stored)
    }

    pub async fn update_staff(&self, id: &str, patch: StaffUpdate) -> ClientResult<Staff> {
        if let Some(pin) = &patch.pin {
            self.check_pin(pin, Some(id)).await?;
        }
        let stored = self.gateway.update_staff(id, patch).await?;
        self.collections
            .write()
            .await
            .apply_staff(ChangeEvent::Update {
                new: stored.clone(),
            });
        Ok(stored)
    }

    pub async fn delete_staff(&self, id: &str) -> ClientResult<()> {
        let cafe_id = self.active_cafe().await?;
        self.gateway.delete_staff(id).await?;
        self.gateway
            .send_removal(EntityKind::Staff, &cafe_id, id)
            .await?;
        tracing::info!(staff_id = %id, "Staff deleted");
        self.collections
            .write()
            .await
            .apply_removal(EntityKind::Staff, id);
        Ok(())
    }
}
