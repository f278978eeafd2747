//! Tenant session controller
//!
//! Owns the active café, the active staff member and the app-loading
//! flag, and sequences all data loading: clear collections, tear down
//! old feeds, bulk-load the new café, then open its feeds. No view
//! ever renders one café's UI against another café's data.

use crate::config::ClientConfig;
use crate::error::ClientResult;
use crate::feeds::{FeedManager, OrderAlert};
use crate::local::LocalStore;
use crate::state::{CafeCollections, CafeDirectory};
use crate::store::StoreGateway;
use crate::theme;
use shared::models::{Staff, StaffRole, Theme};
use std::sync::Arc;
use tokio::sync::{broadcast, watch, RwLock};

/// Session controller - the bootstrap and tenant-switch orchestrator
pub struct SessionController {
    gateway: Arc<dyn StoreGateway>,
    collections: Arc<RwLock<CafeCollections>>,
    directory: Arc<RwLock<CafeDirectory>>,
    feeds: FeedManager,
    local: LocalStore,
    active_staff: Option<Staff>,
    loading_tx: watch::Sender<bool>,
    theme_tx: Arc<watch::Sender<Theme>>,
}

impl SessionController {
    /// Build the data layer. Call [`bootstrap`](Self::bootstrap) next.
    pub fn new(gateway: Arc<dyn StoreGateway>, config: &ClientConfig) -> ClientResult<Self> {
        let collections = Arc::new(RwLock::new(CafeCollections::default()));
        let directory = Arc::new(RwLock::new(CafeDirectory::default()));
        let (loading_tx, _) = watch::channel(false);
        let theme_tx = Arc::new(watch::channel(theme::defaults()).0);
        let feeds = FeedManager::new(
            Arc::clone(&gateway),
            Arc::clone(&collections),
            Arc::clone(&directory),
            Arc::clone(&theme_tx),
        );
        let local = LocalStore::load(&config.local_dir)?;
        Ok(Self {
            gateway,
            collections,
            directory,
            feeds,
            local,
            active_staff: None,
            loading_tx,
            theme_tx,
        })
    }

    // ===== Handles shared with the other services =====

    pub fn gateway(&self) -> Arc<dyn StoreGateway> {
        Arc::clone(&self.gateway)
    }

    pub fn collections(&self) -> Arc<RwLock<CafeCollections>> {
        Arc::clone(&self.collections)
    }

    pub fn directory(&self) -> Arc<RwLock<CafeDirectory>> {
        Arc::clone(&self.directory)
    }

    pub fn theme_sender(&self) -> Arc<watch::Sender<Theme>> {
        Arc::clone(&self.theme_tx)
    }

    /// Tenant-scoped screens must not render while this is true.
    pub fn loading(&self) -> watch::Receiver<bool> {
        self.loading_tx.subscribe()
    }

    /// Notification cues from the order feed.
    pub fn alerts(&self) -> broadcast::Receiver<OrderAlert> {
        self.feeds.alerts()
    }

    // ===== Bootstrap =====

    /// Startup sequence: load the café directory once, open its feed,
    /// then rehydrate any persisted café/staff session.
    pub async fn bootstrap(&mut self) -> ClientResult<()> {
        let cafes = self.gateway.list_cafes().await?;
        self.directory.write().await.replace(cafes);
        self.feeds.open_directory_feed();

        if let Some(cafe_id) = self.local.cafe_id().map(str::to_string) {
            self.load_cafe_data(&cafe_id).await;
            // Restore the staff session only if it belongs to this café
            let persisted = self.local.staff().cloned();
            if let Some(staff) = persisted.filter(|s| s.cafe_id == cafe_id) {
                tracing::info!(staff_id = %staff.id, "Session restored from local store");
                self.active_staff = Some(staff);
            }
        }
        Ok(())
    }

    // ===== Tenant selection =====

    pub fn active_cafe_id(&self) -> Option<String> {
        self.local.cafe_id().map(str::to_string)
    }

    pub fn active_staff(&self) -> Option<&Staff> {
        self.active_staff.as_ref()
    }

    /// Activate a café. Selecting a different café clears the staff
    /// member (forcing re-authentication) and triggers a full reload.
    pub async fn select_cafe(&mut self, cafe_id: &str) -> ClientResult<()> {
        if self.local.cafe_id() == Some(cafe_id) {
            return Ok(());
        }
        self.active_staff = None;
        self.local.set_staff(None)?;
        self.local.set_cafe_id(Some(cafe_id.to_string()))?;
        self.load_cafe_data(cafe_id).await;
        Ok(())
    }

    /// Deselect the café: collections empty synchronously before any
    /// other café's data can arrive.
    pub async fn clear_cafe(&mut self) -> ClientResult<()> {
        self.feeds.close().await;
        self.collections.write().await.clear();
        self.active_staff = None;
        self.local.set_staff(None)?;
        self.local.set_cafe_id(None)?;
        Ok(())
    }

    /// Bulk-load one café and swap the feeds over to it.
    ///
    /// A fetch error on any single collection is logged and that
    /// collection degrades to empty; the UI treats empty as "no data
    /// yet", there is no dedicated error channel for this path.
    async fn load_cafe_data(&mut self, cafe_id: &str) {
        let _ = self.loading_tx.send(true);

        // Old feeds must be fully closed before the new set opens
        self.feeds.close().await;
        self.collections.write().await.clear();

        let (staff, products, tables, orders, theme_patch, feedback) = tokio::join!(
            self.gateway.list_staff(cafe_id),
            self.gateway.list_products(cafe_id),
            self.gateway.list_tables(cafe_id),
            self.gateway.list_orders(cafe_id),
            self.gateway.fetch_theme(cafe_id),
            self.gateway.list_feedback(cafe_id),
        );
        let staff = staff.unwrap_or_else(|e| {
            tracing::error!(error = %e, cafe_id = %cafe_id, "Staff load failed");
            Vec::new()
        });
        let products = products.unwrap_or_else(|e| {
            tracing::error!(error = %e, cafe_id = %cafe_id, "Product load failed");
            Vec::new()
        });
        let tables = tables.unwrap_or_else(|e| {
            tracing::error!(error = %e, cafe_id = %cafe_id, "Table load failed");
            Vec::new()
        });
        let orders = orders.unwrap_or_else(|e| {
            tracing::error!(error = %e, cafe_id = %cafe_id, "Order load failed");
            Vec::new()
        });
        let theme_patch = theme_patch.unwrap_or_else(|e| {
            tracing::error!(error = %e, cafe_id = %cafe_id, "Theme load failed");
            None
        });
        let feedback = feedback.unwrap_or_else(|e| {
            tracing::error!(error = %e, cafe_id = %cafe_id, "Feedback load failed");
            Vec::new()
        });

        {
            let mut guard = self.collections.write().await;
            guard.replace_all(
                cafe_id.to_string(),
                staff,
                products,
                tables,
                orders,
                theme_patch,
                feedback,
            );
            let resolved = theme::resolve(cafe_id, guard.theme.as_ref());
            let _ = self.theme_tx.send(resolved);
        }

        self.feeds.open(cafe_id).await;
        let _ = self.loading_tx.send(false);
        tracing::info!(cafe_id = %cafe_id, "Café data loaded");
    }

    // ===== Staff authentication =====

    /// PIN login against the active café's staff collection. The PIN is
    /// the sole credential and is compared in plaintext (inherited
    /// platform weakness, see DESIGN notes). Returns `None` on no match.
    pub async fn login_with_pin(&mut self, pin: &str) -> ClientResult<Option<Staff>> {
        let guard = self.collections.read().await;
        let Some(cafe_id) = guard.cafe_id.clone() else {
            return Err(crate::error::ClientError::NoCafeSelected);
        };
        let staff = guard.staff.iter().find(|s| s.pin == pin).cloned();
        drop(guard);

        let Some(staff) = staff else {
            tracing::debug!(cafe_id = %cafe_id, "PIN login rejected");
            return Ok(None);
        };
        if staff.role == StaffRole::Manager {
            self.local.mark_manager_seen(&cafe_id)?;
        }
        self.local.set_staff(Some(staff.clone()))?;
        self.active_staff = Some(staff.clone());
        tracing::info!(staff_id = %staff.id, cafe_id = %cafe_id, "Staff logged in");
        Ok(Some(staff))
    }

    /// Clear the staff member, keep the café selection.
    pub fn logout(&mut self) -> ClientResult<()> {
        self.active_staff = None;
        self.local.set_staff(None)
    }

    /// Clear both session keys; the next start needs a fresh login and
    /// café selection.
    pub async fn full_logout(&mut self) -> ClientResult<()> {
        self.feeds.close().await;
        self.collections.write().await.clear();
        self.active_staff = None;
        self.local.clear_session()
    }

    /// Whether this device ever authenticated a manager for `cafe_id`.
    /// Controls the manager entry point's visibility, nothing more.
    pub fn manager_seen(&self, cafe_id: &str) -> bool {
        self.local.manager_seen(cafe_id)
    }

    /// Graceful shutdown of all feed tasks.
    pub async fn shutdown(&mut self) {
        self.feeds.shutdown().await;
    }
}
