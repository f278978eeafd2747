//! Realtime feed manager
//!
//! Opens one subscription per (café, entity) when a café becomes
//! active and tears the whole set down before a new one opens - never
//! overlapping, so a fast café switch cannot let tenant A's events
//! mutate tenant B's collections. Events are applied in delivery
//! order; no ordering is guaranteed across channels.

use crate::state::{CafeCollections, CafeDirectory};
use crate::store::StoreGateway;
use crate::theme;
use shared::order::OrderStatus;
use shared::realtime::{EntityKind, FeedEvent};
use std::sync::Arc;
use tokio::sync::{broadcast, watch, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Notification cues derived from the order feed
#[derive(Debug, Clone)]
pub enum OrderAlert {
    /// A NEW order not previously seen locally arrived (kitchen cue;
    /// detected by order-id set membership, not a push subscription)
    NewOrder {
        order_id: String,
        table_id: String,
        self_service: bool,
    },
}

const ALERT_CAPACITY: usize = 64;

/// Per-café feed set plus the global café directory feed
pub struct FeedManager {
    gateway: Arc<dyn StoreGateway>,
    collections: Arc<RwLock<CafeCollections>>,
    directory: Arc<RwLock<CafeDirectory>>,
    theme_tx: Arc<watch::Sender<shared::models::Theme>>,
    alert_tx: broadcast::Sender<OrderAlert>,
    active: Option<ActiveFeeds>,
    directory_feed: Option<ActiveFeeds>,
}

struct ActiveFeeds {
    token: CancellationToken,
    handles: Vec<JoinHandle<()>>,
}

impl ActiveFeeds {
    /// Cancel and wait for every task. Completion means no event from
    /// this feed set can be applied afterwards.
    async fn shutdown(self) {
        self.token.cancel();
        for handle in self.handles {
            let _ = handle.await;
        }
    }
}

impl FeedManager {
    pub fn new(
        gateway: Arc<dyn StoreGateway>,
        collections: Arc<RwLock<CafeCollections>>,
        directory: Arc<RwLock<CafeDirectory>>,
        theme_tx: Arc<watch::Sender<shared::models::Theme>>,
    ) -> Self {
        let (alert_tx, _) = broadcast::channel(ALERT_CAPACITY);
        Self {
            gateway,
            collections,
            directory,
            theme_tx,
            alert_tx,
            active: None,
            directory_feed: None,
        }
    }

    /// Subscribe to notification cues (kitchen screens, staff devices).
    pub fn alerts(&self) -> broadcast::Receiver<OrderAlert> {
        self.alert_tx.subscribe()
    }

    /// Open the global café directory feed (once, at bootstrap).
    pub fn open_directory_feed(&mut self) {
        if self.directory_feed.is_some() {
            return;
        }
        let token = CancellationToken::new();
        let rx = self.gateway.subscribe(EntityKind::Cafe, None);
        let directory = Arc::clone(&self.directory);
        let task_token = token.clone();
        let handle = tokio::spawn(async move {
            run_feed(task_token, rx, move |event| {
                let directory = Arc::clone(&directory);
                async move {
                    if let FeedEvent::Cafe(change) = event {
                        directory.write().await.apply(change);
                    }
                }
            })
            .await;
        });
        self.directory_feed = Some(ActiveFeeds {
            token,
            handles: vec![handle],
        });
    }

    /// Open the tenant-scoped feed set for `cafe_id`, tearing down any
    /// previous set first.
    pub async fn open(&mut self, cafe_id: &str) {
        self.close().await;

        let token = CancellationToken::new();
        let mut handles = Vec::new();
        let entities = [
            EntityKind::Staff,
            EntityKind::Product,
            EntityKind::Table,
            EntityKind::Order,
            EntityKind::Theme,
            EntityKind::Feedback,
        ];
        for entity in entities {
            let rx = self.gateway.subscribe(entity, Some(cafe_id));
            let collections = Arc::clone(&self.collections);
            let theme_tx = Arc::clone(&self.theme_tx);
            let alert_tx = self.alert_tx.clone();
            let cafe_id = cafe_id.to_string();
            let task_token = token.clone();
            handles.push(tokio::spawn(async move {
                run_feed(task_token, rx, move |event| {
                    let collections = Arc::clone(&collections);
                    let theme_tx = Arc::clone(&theme_tx);
                    let alert_tx = alert_tx.clone();
                    let cafe_id = cafe_id.clone();
                    async move {
                        apply_event(&collections, &theme_tx, &alert_tx, &cafe_id, event).await;
                    }
                })
                .await;
            }));
        }
        tracing::info!(cafe_id = %cafe_id, feeds = handles.len(), "Realtime feeds opened");
        self.active = Some(ActiveFeeds { token, handles });
    }

    /// Tear down the tenant-scoped feed set, waiting for every task.
    pub async fn close(&mut self) {
        if let Some(active) = self.active.take() {
            active.shutdown().await;
            tracing::info!("Realtime feeds closed");
        }
    }

    /// Full shutdown including the directory feed.
    pub async fn shutdown(&mut self) {
        self.close().await;
        if let Some(feed) = self.directory_feed.take() {
            feed.shutdown().await;
        }
    }
}

/// Drive one subscription until cancelled. A lagged receiver is logged
/// and skipped; the session stays usable (connectivity degrades to an
/// indicator, never a blocking error).
async fn run_feed<F, Fut>(
    token: CancellationToken,
    mut rx: broadcast::Receiver<FeedEvent>,
    mut apply: F,
) where
    F: FnMut(FeedEvent) -> Fut,
    Fut: std::future::Future<Output = ()>,
{
    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            event = rx.recv() => match event {
                Ok(event) => apply(event).await,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Feed lagged, events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    tracing::warn!("Feed channel closed");
                    break;
                }
            },
        }
    }
}

/// Funnel one realtime event into the collections.
async fn apply_event(
    collections: &Arc<RwLock<CafeCollections>>,
    theme_tx: &watch::Sender<shared::models::Theme>,
    alert_tx: &broadcast::Sender<OrderAlert>,
    cafe_id: &str,
    event: FeedEvent,
) {
    let mut guard = collections.write().await;
    match event {
        FeedEvent::Staff(change) => guard.apply_staff(change),
        FeedEvent::Product(change) => guard.apply_product(change),
        FeedEvent::Table(change) => guard.apply_table(change),
        FeedEvent::Order(change) => {
            let known_before: bool = match &change {
                shared::realtime::ChangeEvent::Insert { new } => {
                    guard.orders.iter().any(|o| o.id == new.id)
                }
                _ => true,
            };
            let alert = match &change {
                shared::realtime::ChangeEvent::Insert { new }
                    if !known_before && new.status == OrderStatus::New =>
                {
                    Some(OrderAlert::NewOrder {
                        order_id: new.id.clone(),
                        table_id: new.table_id.clone(),
                        self_service: new.is_self_service(),
                    })
                }
                _ => None,
            };
            guard.apply_order(change);
            if let Some(alert) = alert {
                let _ = alert_tx.send(alert);
            }
        }
        FeedEvent::Theme(change) => {
            guard.apply_theme(change);
            let resolved = theme::resolve(cafe_id, guard.theme.as_ref());
            let _ = theme_tx.send(resolved);
        }
        FeedEvent::Feedback(change) => guard.apply_feedback(change),
        FeedEvent::Removal { entity, id } => guard.apply_removal(entity, &id),
        FeedEvent::Cafe(_) => {
            // Café rows ride the global directory feed only
            tracing::debug!("Café event on a tenant feed ignored");
        }
    }
}
