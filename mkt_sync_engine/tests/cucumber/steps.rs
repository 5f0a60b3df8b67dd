use std::time::Duration;

use cucumber::{gherkin::Step, then, when};
use mkt_common::Secret;
use mkt_sync_engine::{
    events::ChannelId,
    orders::{OrderId, OrderRecord, OrderSide},
    shop::{AuthoritativeStatus, RefreshOutcome, ShopStatus, ShopStatusResponse, ShopSummary},
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

use crate::cucumber::{sync_world::PendingRefresh, SyncWorld};

fn parse_word<T: DeserializeOwned>(word: &str) -> T {
    serde_json::from_value(Value::String(word.to_string())).unwrap_or_else(|e| panic!("Invalid value '{word}'. {e}"))
}

fn order_side(word: &str) -> OrderSide {
    match word {
        "buyer" => OrderSide::Buyer,
        "shop" => OrderSide::Shop,
        _ => panic!("Unknown order cache: {word}"),
    }
}

fn docstring_json(step: &Step) -> Value {
    let doc = step.docstring.as_ref().expect("This step needs a JSON docstring");
    serde_json::from_str(doc).expect("Docstring is not valid JSON")
}

fn all_orders(world: &SyncWorld) -> Vec<OrderRecord> {
    let orchestrator = world.orchestrator();
    let mut orders = orchestrator.orders(OrderSide::Buyer);
    orders.extend(orchestrator.orders(OrderSide::Shop));
    orders
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(25)).await;
}

async fn deliver(world: &mut SyncWorld, payload: Value) -> bool {
    let delivered = world.system().transport.deliver(ChannelId::Notifications, "notification", payload).await;
    settle().await;
    delivered
}

//--------------------------------------      Push events      ---------------------------------------------------------
#[when("a push event arrives:")]
async fn push_event(world: &mut SyncWorld, step: &Step) {
    let payload = docstring_json(step);
    world.system().last_payload = Some(payload.clone());
    assert!(deliver(world, payload).await, "The notifications channel is not open");
}

#[when("the same push event arrives again")]
async fn repeat_push_event(world: &mut SyncWorld) {
    let payload = world.system().last_payload.clone().expect("No push event has arrived yet");
    let snapshot = all_orders(world);
    world.system().snapshot = snapshot;
    assert!(deliver(world, payload).await, "The notifications channel is not open");
}

#[when(expr = "{int} notifications arrive")]
async fn many_notifications(world: &mut SyncWorld, count: usize) {
    for i in 1..=count {
        let payload = json!({"id": format!("n{i}"), "type": "system:notice", "title": format!("Notice {i}")});
        assert!(world.system().transport.deliver(ChannelId::Notifications, "notification", payload).await);
    }
    settle().await;
}

#[when("the credential is revoked")]
async fn revoke_credential(world: &mut SyncWorld) {
    world.system().engine.credential_changed(None);
}

#[when("the user signs in again")]
async fn sign_in_again(world: &mut SyncWorld) {
    world.system().engine.credential_changed(Some(Secret::new("session-token-2".to_string())));
}

#[when("the engine detaches")]
async fn detach(world: &mut SyncWorld) {
    assert!(world.orchestrator().detach(), "The engine was already detached");
}

#[when(expr = "I pause for {int}ms")]
async fn pause(_world: &mut SyncWorld, ms: u64) {
    tokio::time::sleep(Duration::from_millis(ms)).await;
}

#[then(expr = "the {word} channel is connected")]
async fn channel_connected(world: &mut SyncWorld, channel: String) {
    let channel = channel.parse::<ChannelId>().expect("Unknown channel");
    let system = world.system();
    assert!(system.engine.manager().is_connected(channel), "{channel} is not connected");
    assert!(system.transport.is_open(channel), "No session is open for {channel}");
}

#[then("no channel is connected")]
async fn nothing_connected(world: &mut SyncWorld) {
    let system = world.system();
    for channel in ChannelId::ALL {
        assert!(!system.engine.manager().is_connected(channel), "{channel} is still connected");
    }
    assert_eq!(system.transport.live_sessions(), 0);
}

#[then("a push event on the notifications channel is dropped")]
async fn event_dropped(world: &mut SyncWorld) {
    let before = world.orchestrator().notifications().len();
    let delivered = deliver(world, json!({"type": "system:notice", "title": "Nobody is listening"})).await;
    assert!(!delivered, "The event was delivered");
    assert_eq!(world.orchestrator().notifications().len(), before);
}

//--------------------------------------        Orders         ---------------------------------------------------------
#[then(expr = "the {word} order cache holds {int} order(s)")]
async fn order_count(world: &mut SyncWorld, side: String, count: usize) {
    let orders = world.orchestrator().orders(order_side(&side));
    assert_eq!(orders.len(), count, "Unexpected number of {side} orders");
}

#[then(expr = "order {word} in the {word} cache has status {word}")]
async fn order_status(world: &mut SyncWorld, id: String, side: String, status: String) {
    let order = world
        .orchestrator()
        .order(order_side(&side), &OrderId::from(id.as_str()))
        .unwrap_or_else(|| panic!("Order {id} is not in the {side} cache"));
    assert_eq!(order.status.as_str(), status);
}

#[then(expr = "order {word} in the {word} cache includes:")]
async fn order_includes(world: &mut SyncWorld, id: String, side: String, step: &Step) {
    let expected = docstring_json(step);
    let order = world
        .orchestrator()
        .order(order_side(&side), &OrderId::from(id.as_str()))
        .unwrap_or_else(|| panic!("Order {id} is not in the {side} cache"));
    let actual = serde_json::to_value(&order).expect("Order does not serialize");
    let expected = expected.as_object().expect("Expected fields must be a JSON object");
    for (key, value) in expected {
        assert_eq!(actual.get(key), Some(value), "Field {key} of order {id}");
    }
}

#[then(expr = "order {word} in the {word} cache has no {word}")]
async fn order_lacks(world: &mut SyncWorld, id: String, side: String, field: String) {
    let order = world.orchestrator().order(order_side(&side), &OrderId::from(id.as_str())).expect("Order missing");
    let actual = serde_json::to_value(&order).expect("Order does not serialize");
    assert!(actual.get(&field).is_none(), "Order {id} has {field}: {:?}", actual.get(&field));
}

#[then("the order caches are unchanged by the repeat")]
async fn caches_unchanged(world: &mut SyncWorld) {
    let now = all_orders(world);
    assert_eq!(now, world.system().snapshot);
}

//--------------------------------------     Notifications     ---------------------------------------------------------
#[when(expr = "notification {word} is marked as read")]
async fn mark_read(world: &mut SyncWorld, id: String) {
    assert!(world.orchestrator().mark_read(&id), "Notification {id} is not in the feed");
}

#[when("all notifications are marked as read")]
async fn mark_all_read(world: &mut SyncWorld) {
    world.orchestrator().mark_all_read();
}

#[then(expr = "the feed holds {int} notification(s)")]
async fn feed_len(world: &mut SyncWorld, count: usize) {
    assert_eq!(world.orchestrator().notifications().len(), count);
}

#[then(expr = "the newest notification is {word}")]
async fn newest_notification(world: &mut SyncWorld, id: String) {
    let feed = world.orchestrator().notifications();
    assert_eq!(feed.first().map(|n| n.id.as_str()), Some(id.as_str()));
}

#[then(expr = "the oldest notification is {word}")]
async fn oldest_notification(world: &mut SyncWorld, id: String) {
    let feed = world.orchestrator().notifications();
    assert_eq!(feed.last().map(|n| n.id.as_str()), Some(id.as_str()));
}

#[then(expr = "the unread count is {int}")]
async fn unread_count(world: &mut SyncWorld, count: usize) {
    assert_eq!(world.orchestrator().unread_count(), count);
}

//--------------------------------------         Shop          ---------------------------------------------------------
#[when("the legacy shop record is loaded")]
async fn load_legacy(world: &mut SyncWorld) {
    let task = world.orchestrator().load_legacy_shop().expect("No runtime to load the legacy shop on");
    task.await.expect("Legacy shop task panicked");
}

#[when(expr = "shop status refresh {int} is requested and will answer {word}")]
async fn request_refresh(world: &mut SyncWorld, n: u32, status: String) {
    let status: AuthoritativeStatus = parse_word(&status);
    let shop = match status {
        AuthoritativeStatus::NotRegistered => None,
        _ => Some(ShopSummary::new("shop-1", "Test Shop", "open")),
    };
    start_refresh(world, n, ShopStatusResponse::new(status, shop)).await;
}

#[when(expr = "shop status refresh {int} is requested and will answer {word} without a shop record")]
async fn request_refresh_without_shop(world: &mut SyncWorld, n: u32, status: String) {
    let status: AuthoritativeStatus = parse_word(&status);
    start_refresh(world, n, ShopStatusResponse::new(status, None)).await;
}

async fn start_refresh(world: &mut SyncWorld, n: u32, response: ShopStatusResponse) {
    let gate = world.system().source.respond_with(Ok(response));
    let handle = world.orchestrator().refresh_shop_status().expect("No runtime to refresh on");
    // responses pair up with refreshes in request order, so wait until this one has been picked up
    while world.system().source.queued() > 0 {
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    world.system().refreshes.insert(n, PendingRefresh { gate, handle: Some(handle), outcome: None });
}

#[when(expr = "shop status refresh {int} completes")]
async fn complete_refresh(world: &mut SyncWorld, n: u32) {
    let pending = world.system().refreshes.get_mut(&n).unwrap_or_else(|| panic!("Refresh {n} was never requested"));
    pending.gate.notify_one();
    let handle = pending.handle.take().expect("Refresh already completed");
    let outcome = handle.await.expect("Refresh task panicked");
    pending.outcome = Some(outcome);
}

#[then(expr = "shop status refresh {int} was applied")]
async fn refresh_applied(world: &mut SyncWorld, n: u32) {
    let outcome = world.system().refreshes.get(&n).and_then(|p| p.outcome.clone());
    assert!(matches!(outcome, Some(RefreshOutcome::Applied { .. })), "Refresh {n}: {outcome:?}");
}

#[then(expr = "shop status refresh {int} was ignored as stale")]
async fn refresh_stale(world: &mut SyncWorld, n: u32) {
    let outcome = world.system().refreshes.get(&n).and_then(|p| p.outcome.clone());
    assert_eq!(outcome, Some(RefreshOutcome::Stale));
}

#[then(expr = "shop status refresh {int} was discarded")]
async fn refresh_discarded(world: &mut SyncWorld, n: u32) {
    let outcome = world.system().refreshes.get(&n).and_then(|p| p.outcome.clone());
    assert_eq!(outcome, Some(RefreshOutcome::Discarded));
}

#[then(expr = "the shop status is {word}")]
async fn shop_status(world: &mut SyncWorld, status: String) {
    let expected: ShopStatus = parse_word(&status);
    assert_eq!(world.orchestrator().shop_status(), Some(expected));
}

#[then("the shop status is unknown")]
async fn shop_status_unknown(world: &mut SyncWorld) {
    assert_eq!(world.orchestrator().shop_status(), None);
}

#[then("the seller console is loading")]
async fn console_loading(world: &mut SyncWorld) {
    assert!(world.orchestrator().routing().is_loading());
}

#[then(expr = "only the {word} routing flag is set")]
async fn only_flag(world: &mut SyncWorld, flag: String) {
    let routing = world.orchestrator().routing();
    assert!(!routing.is_loading(), "The seller console is still loading");
    let flags = serde_json::to_value(routing.flags()).expect("Flags do not serialize");
    let flags = flags.as_object().expect("Flags serialize as an object");
    assert!(flags.contains_key(&flag), "There is no routing flag called {flag}");
    for (name, value) in flags {
        assert_eq!(value.as_bool(), Some(name == &flag), "Routing flag {name}");
    }
}
