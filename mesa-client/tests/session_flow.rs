//! End-to-end flows over the in-process gateway: bootstrap, tenant
//! switching, realtime reconciliation and session persistence.

use mesa_client::orders::{OrderEngine, OrderLine};
use mesa_client::store::StoreGateway;
use mesa_client::{ClientConfig, MemoryGateway, SessionController};
use rust_decimal::Decimal;
use shared::models::{Cafe, CafeTable, Product, Staff, StaffRole, ThemePatch};
use shared::order::OrderStatus;
use shared::realtime::EntityKind;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

/// Poll an async condition until it holds; feeds apply events on their
/// own tasks so tests wait for convergence rather than sleeping blind.
async fn eventually<F, Fut>(what: &str, mut check: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    for _ in 0..400 {
        if check().await {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("timed out waiting for: {what}");
}

fn product(id: &str, cafe_id: &str, name: &str, cents: i64) -> Product {
    Product {
        id: id.into(),
        cafe_id: cafe_id.into(),
        name: name.into(),
        price: Decimal::new(cents, 2),
        category: "coffee".into(),
    }
}

/// Two cafés, each with one manager, one product and one table.
async fn seeded_gateway() -> Arc<MemoryGateway> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
    let gateway = Arc::new(MemoryGateway::new());
    for (cafe_id, name, pin) in [("c1", "Mesa Uno", "111111"), ("c2", "Mesa Dos", "222222")] {
        gateway
            .insert_cafe(Cafe {
                id: cafe_id.into(),
                name: name.into(),
                hidden: false,
            })
            .await
            .unwrap();
        gateway
            .insert_staff(Staff {
                id: format!("{cafe_id}-mgr"),
                cafe_id: cafe_id.into(),
                name: "Ana".into(),
                role: StaffRole::Manager,
                pin: pin.into(),
                phone: None,
            })
            .await
            .unwrap();
        gateway
            .insert_product(product(
                &format!("{cafe_id}-p1"),
                cafe_id,
                "Cortado",
                250,
            ))
            .await
            .unwrap();
        gateway
            .insert_table(CafeTable {
                id: format!("{cafe_id}-t1"),
                cafe_id: cafe_id.into(),
                name: "Mesa 1".into(),
                hidden: false,
            })
            .await
            .unwrap();
    }
    gateway
}

fn config(dir: &std::path::Path) -> ClientConfig {
    ClientConfig::new("http://localhost", "test-key").with_local_dir(dir)
}

#[tokio::test]
async fn test_bootstrap_and_session_rehydration() {
    let gateway = seeded_gateway().await;
    let dir = tempfile::tempdir().unwrap();

    {
        let mut session =
            SessionController::new(gateway.clone(), &config(dir.path())).unwrap();
        session.bootstrap().await.unwrap();
        assert_eq!(session.directory().read().await.cafes.len(), 2);

        session.select_cafe("c1").await.unwrap();
        let staff = session.login_with_pin("111111").await.unwrap();
        assert_eq!(staff.unwrap().id, "c1-mgr");
        assert!(session.manager_seen("c1"));
        session.shutdown().await;
    }

    // A fresh process resumes the same café and staff member
    let mut session = SessionController::new(gateway, &config(dir.path())).unwrap();
    session.bootstrap().await.unwrap();
    assert_eq!(session.active_cafe_id().as_deref(), Some("c1"));
    assert_eq!(
        session.active_staff().map(|s| s.id.as_str()),
        Some("c1-mgr")
    );
    assert_eq!(session.collections().read().await.products.len(), 1);
    session.shutdown().await;
}

#[tokio::test]
async fn test_switching_cafes_never_mixes_tenants() {
    let gateway = seeded_gateway().await;
    let dir = tempfile::tempdir().unwrap();
    let mut session = SessionController::new(gateway.clone(), &config(dir.path())).unwrap();
    session.bootstrap().await.unwrap();

    let collections = session.collections();

    session.select_cafe("c1").await.unwrap();
    {
        let guard = collections.read().await;
        assert!(guard.products.iter().all(|p| p.cafe_id == "c1"));
        assert_eq!(guard.products.len(), 1);
    }

    session.select_cafe("c2").await.unwrap();
    // Switching clears the staff session
    assert!(session.active_staff().is_none());
    {
        let guard = collections.read().await;
        assert!(guard.products.iter().all(|p| p.cafe_id == "c2"));
        assert!(guard.staff.iter().all(|s| s.cafe_id == "c2"));
    }

    // Writes to the old café must not leak into the new one
    gateway
        .insert_product(product("c1-p2", "c1", "Latte", 300))
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    let guard = collections.read().await;
    assert!(guard.products.iter().all(|p| p.cafe_id == "c2"));
    drop(guard);
    session.shutdown().await;
}

#[tokio::test]
async fn test_realtime_echo_is_deduplicated() {
    let gateway = seeded_gateway().await;
    let dir = tempfile::tempdir().unwrap();
    let mut session = SessionController::new(gateway.clone(), &config(dir.path())).unwrap();
    session.bootstrap().await.unwrap();
    session.select_cafe("c1").await.unwrap();

    let engine = OrderEngine::new(session.gateway(), session.collections());
    let order = engine
        .create_order(
            "c1-t1",
            None,
            vec![OrderLine {
                product_id: "c1-p1".into(),
                quantity: 2,
                note: None,
            }],
        )
        .await
        .unwrap();

    // The optimistic local apply raced its realtime echo; either way
    // exactly one row survives.
    tokio::time::sleep(Duration::from_millis(50)).await;
    let collections = session.collections();
    let guard = collections.read().await;
    assert_eq!(
        guard.orders.iter().filter(|o| o.id == order.id).count(),
        1
    );
    drop(guard);
    session.shutdown().await;
}

#[tokio::test]
async fn test_remote_order_raises_one_alert() {
    let gateway = seeded_gateway().await;
    let dir = tempfile::tempdir().unwrap();
    let mut session = SessionController::new(gateway.clone(), &config(dir.path())).unwrap();
    session.bootstrap().await.unwrap();
    session.select_cafe("c1").await.unwrap();
    let mut alerts = session.alerts();

    // Another device places an order; it arrives via the feed only
    let order = shared::order::Order {
        id: "remote-o1".into(),
        cafe_id: "c1".into(),
        table_id: "c1-t1".into(),
        staff_id: shared::order::CUSTOMER_STAFF_ID.into(),
        items: vec![],
        status: OrderStatus::New,
        created_at: chrono::Utc::now(),
        updated_at: chrono::Utc::now(),
    };
    gateway.insert_order(order).await.unwrap();

    let alert = tokio::time::timeout(Duration::from_secs(2), alerts.recv())
        .await
        .expect("no alert arrived")
        .unwrap();
    let mesa_client::feeds::OrderAlert::NewOrder {
        order_id,
        table_id,
        self_service,
    } = alert;
    assert_eq!(order_id, "remote-o1");
    assert_eq!(table_id, "c1-t1");
    assert!(self_service);
    session.shutdown().await;
}

#[tokio::test]
async fn test_removal_broadcast_compensates_missing_delete_events() {
    let gateway = seeded_gateway().await;
    let dir = tempfile::tempdir().unwrap();
    let mut session = SessionController::new(gateway.clone(), &config(dir.path())).unwrap();
    session.bootstrap().await.unwrap();
    session.select_cafe("c1").await.unwrap();

    // The row delete alone produces no feed event; peers only converge
    // through the removal notification.
    gateway.delete_product("c1-p1").await.unwrap();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(session.collections().read().await.products.len(), 1);

    gateway
        .send_removal(EntityKind::Product, "c1", "c1-p1")
        .await
        .unwrap();
    let collections = session.collections();
    eventually("product removed from collections", || {
        let collections = collections.clone();
        async move { collections.read().await.products.is_empty() }
    })
    .await;
    session.shutdown().await;
}

#[tokio::test]
async fn test_theme_feed_updates_resolved_theme() {
    let gateway = seeded_gateway().await;
    let dir = tempfile::tempdir().unwrap();
    let mut session = SessionController::new(gateway.clone(), &config(dir.path())).unwrap();
    session.bootstrap().await.unwrap();
    session.select_cafe("c1").await.unwrap();

    let theme_rx = session.theme_sender().subscribe();
    gateway
        .upsert_theme(ThemePatch {
            cafe_id: "c1".into(),
            card_radius: Some(0),
            ..Default::default()
        })
        .await
        .unwrap();

    eventually("resolved theme picked up the patch", || {
        let mut rx = theme_rx.clone();
        async move {
            rx.borrow_and_update().card_radius == 0
        }
    })
    .await;
    session.shutdown().await;
}

#[tokio::test]
async fn test_logout_variants() {
    let gateway = seeded_gateway().await;
    let dir = tempfile::tempdir().unwrap();
    let mut session = SessionController::new(gateway.clone(), &config(dir.path())).unwrap();
    session.bootstrap().await.unwrap();
    session.select_cafe("c1").await.unwrap();
    session.login_with_pin("111111").await.unwrap();

    // Plain logout keeps the café active
    session.logout().unwrap();
    assert!(session.active_staff().is_none());
    assert_eq!(session.active_cafe_id().as_deref(), Some("c1"));
    assert!(!session.collections().read().await.products.is_empty());

    // Full logout clears everything, including persisted keys
    session.login_with_pin("111111").await.unwrap();
    session.full_logout().await.unwrap();
    assert!(session.active_staff().is_none());
    assert!(session.active_cafe_id().is_none());
    assert!(session.collections().read().await.products.is_empty());
    session.shutdown().await;

    let mut fresh = SessionController::new(gateway, &config(dir.path())).unwrap();
    fresh.bootstrap().await.unwrap();
    assert!(fresh.active_cafe_id().is_none());
    assert!(fresh.active_staff().is_none());
    // The manager-entry hint survives a full logout
    assert!(fresh.manager_seen("c1"));
    fresh.shutdown().await;
}
