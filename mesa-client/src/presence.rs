//! Table presence tracker
//!
//! Ephemeral who-is-at-this-table state for customer sessions. Nothing
//! is persisted: membership lives in the store's presence groups and
//! evaporates when the member leaves or disconnects. A device is
//! present at one table at a time; joining another table leaves the
//! previous group first.

use crate::error::ClientResult;
use crate::store::StoreGateway;
use shared::realtime::{PresenceMember, PresenceSnapshot};
use std::sync::Arc;
use tokio::sync::{broadcast, watch};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Per-device presence handle
pub struct PresenceTracker {
    gateway: Arc<dyn StoreGateway>,
    member: PresenceMember,
    active: Option<ActivePresence>,
}

struct ActivePresence {
    cafe_id: String,
    table_id: String,
    token: CancellationToken,
    handle: JoinHandle<()>,
    rx: watch::Receiver<PresenceSnapshot>,
}

impl PresenceTracker {
    /// `member` identifies this device in every group it joins.
    pub fn new(gateway: Arc<dyn StoreGateway>, member: PresenceMember) -> Self {
        Self {
            gateway,
            member,
            active: None,
        }
    }

    pub fn member(&self) -> &PresenceMember {
        &self.member
    }

    /// The table this device is currently present at, if any.
    pub fn current_table(&self) -> Option<&str> {
        self.active.as_ref().map(|a| a.table_id.as_str())
    }

    /// Join a table's presence group, leaving any previous one first.
    /// The returned receiver always holds the latest member snapshot.
    pub async fn join(
        &mut self,
        cafe_id: &str,
        table_id: &str,
    ) -> ClientResult<watch::Receiver<PresenceSnapshot>> {
        if let Some(active) = &self.active {
            if active.cafe_id == cafe_id && active.table_id == table_id {
                return Ok(active.rx.clone());
            }
        }
        self.leave().await?;

        // Subscribe before announcing so our own join is observed
        let feed = self.gateway.presence_subscribe(cafe_id, table_id);
        let (tx, rx) = watch::channel(PresenceSnapshot {
            table_id: table_id.to_string(),
            members: Vec::new(),
        });
        let token = CancellationToken::new();
        let handle = tokio::spawn(forward_snapshots(token.clone(), feed, tx));

        if let Err(e) = self
            .gateway
            .presence_track(cafe_id, table_id, self.member.clone())
            .await
        {
            // Never leave the forwarder running for a group we are not in
            token.cancel();
            let _ = handle.await;
            return Err(e);
        }
        tracing::info!(table_id = %table_id, member_id = %self.member.id, "Joined table presence");

        self.active = Some(ActivePresence {
            cafe_id: cafe_id.to_string(),
            table_id: table_id.to_string(),
            token,
            handle,
            rx: rx.clone(),
        });
        Ok(rx)
    }

    /// Leave the current presence group, if any. The forwarder task is
    /// torn down even when the departure announcement fails.
    pub async fn leave(&mut self) -> ClientResult<()> {
        let Some(active) = self.active.take() else {
            return Ok(());
        };
        let announced = self
            .gateway
            .presence_leave(&active.cafe_id, &active.table_id, &self.member.id)
            .await;
        active.token.cancel();
        let _ = active.handle.await;
        announced?;
        tracing::info!(table_id = %active.table_id, member_id = %self.member.id, "Left table presence");
        Ok(())
    }
}

/// Forward group snapshots into the watch channel until cancelled.
async fn forward_snapshots(
    token: CancellationToken,
    mut feed: broadcast::Receiver<PresenceSnapshot>,
    tx: watch::Sender<PresenceSnapshot>,
) {
    loop {
        tokio::select! {
            _ = token.cancelled() => break,
            snapshot = feed.recv() => match snapshot {
                Ok(snapshot) => {
                    let _ = tx.send(snapshot);
                }
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    // Snapshots are self-contained, only the latest matters
                    tracing::debug!(skipped, "Presence feed lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },
        }
    }
}
