use cucumber::given;
use mkt_sync_engine::shop::{LegacyShop, LegacyShopStatus};

use crate::cucumber::{sync_world::SyncSystem, SyncWorld};

#[given("a running sync engine for a signed-in user")]
async fn running_engine(world: &mut SyncWorld) {
    let system = SyncSystem::new().await;
    world.system = Some(system);
}

#[given(expr = "the legacy shop record says {word}")]
async fn legacy_shop(world: &mut SyncWorld, status: String) {
    let status: LegacyShopStatus =
        serde_json::from_value(serde_json::Value::String(status)).expect("Not a legacy shop status");
    let shop = LegacyShop { id: "shop-1".into(), name: "Test Shop".into(), status };
    world.system().source.set_legacy(Some(shop));
}
