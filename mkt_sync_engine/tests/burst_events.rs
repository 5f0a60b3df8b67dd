use std::{sync::Arc, time::Duration};

use log::*;
use mkt_common::Secret;
use mkt_sync_engine::{
    events::{ChannelId, SyncHooks},
    orders::{OrderId, OrderSide, OrderStatus},
    push::LocalTransport,
    traits::StaticCredential,
    SyncEngine,
};
use serde_json::json;
use tokio::runtime::Runtime;

use crate::support::{prepare_env::prepare_test_env, sources::GatedShopSource};

mod support;

const NUM_ORDERS: usize = 40;
const RATE: u64 = 500; // events per second

const STATUSES: [&str; 4] = ["confirmed", "processing", "shipped", "delivered"];

#[test]
fn burst_events() {
    let config = prepare_test_env();
    info!("🚀️ Starting event injection test");
    let sys = Runtime::new().unwrap();
    let delay = Duration::from_millis(1000 / RATE);

    sys.block_on(async move {
        let transport = LocalTransport::new();
        let credentials = StaticCredential::new(Some(Secret::new("token".to_string())));
        let engine = SyncEngine::start(
            config,
            Arc::new(transport.clone()),
            Arc::new(credentials),
            Arc::new(GatedShopSource::default()),
            SyncHooks::default(),
        )
        .await;

        let mut timer = tokio::time::interval(delay);
        info!("🚀️ Injecting {NUM_ORDERS} orders and their status updates, every event delivered twice");
        for i in 0..NUM_ORDERS {
            let order_id = format!("order-{i}");
            let mut events = vec![json!({
                "id": format!("n-{i}-new"),
                "type": "order:new",
                "createdAt": format!("2024-05-01T09:{:02}:00Z", i % 60),
                "metadata": {"orderId": order_id, "subtotal": 1000 * (i + 1), "shippingFee": 250}
            })];
            for (step, status) in STATUSES.iter().enumerate() {
                events.push(json!({
                    "id": format!("n-{i}-{step}"),
                    "type": "order:status",
                    "createdAt": format!("2024-05-01T10:{:02}:{:02}Z", i % 60, step * 10),
                    "metadata": {"orderId": order_id, "status": status}
                }));
            }
            for event in events {
                for _ in 0..2 {
                    timer.tick().await;
                    assert!(transport.deliver(ChannelId::Notifications, "notification", event.clone()).await);
                }
            }
        }
        tokio::time::sleep(Duration::from_millis(200)).await;

        let orchestrator = engine.orchestrator();
        let shop_orders = orchestrator.orders(OrderSide::Shop);
        assert_eq!(shop_orders.len(), NUM_ORDERS);
        // every miss is prepended, so the newest order leads
        assert_eq!(shop_orders[0].id, OrderId::from(format!("order-{}", NUM_ORDERS - 1)));
        for order in &shop_orders {
            assert_eq!(order.status, OrderStatus::Delivered, "{}", order.id);
            assert_eq!(order.shipping_fee.value(), 250);
        }
        let buyer_orders = orchestrator.orders(OrderSide::Buyer);
        assert_eq!(buyer_orders.len(), NUM_ORDERS);
        assert!(buyer_orders.iter().all(|o| o.subtotal.is_zero() && o.status == OrderStatus::Delivered));

        let feed = orchestrator.notifications();
        assert_eq!(feed.len(), 50);
        assert_eq!(feed[0].id, format!("n-{}-3", NUM_ORDERS - 1));
        assert_eq!(orchestrator.unread_count(), 50);
        engine.shutdown();
    });
    info!("🚀️ Event injection test complete");
}
