use std::{collections::HashMap, fmt::Debug, sync::Arc};

use cucumber::World;
use log::*;
use mkt_common::Secret;
use mkt_sync_engine::{
    events::SyncHooks,
    orders::OrderRecord,
    push::LocalTransport,
    shop::RefreshOutcome,
    traits::StaticCredential,
    ReconciliationOrchestrator,
    SyncEngine,
};
use serde_json::Value;
use tokio::{sync::Notify, task::JoinHandle};

use crate::support::{prepare_env::prepare_test_env, sources::GatedShopSource};

#[derive(Default, Debug, World)]
pub struct SyncWorld {
    pub system: Option<SyncSystem>,
}

pub struct PendingRefresh {
    pub gate: Arc<Notify>,
    pub handle: Option<JoinHandle<RefreshOutcome>>,
    pub outcome: Option<RefreshOutcome>,
}

pub struct SyncSystem {
    pub engine: SyncEngine,
    pub transport: LocalTransport,
    pub source: GatedShopSource,
    pub refreshes: HashMap<u32, PendingRefresh>,
    pub last_payload: Option<Value>,
    pub snapshot: Vec<OrderRecord>,
}

impl Debug for SyncSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncSystem").field("refreshes", &self.refreshes.len()).finish()
    }
}

impl SyncWorld {
    pub fn system(&mut self) -> &mut SyncSystem {
        self.system.as_mut().expect("Sync engine not initialised")
    }

    pub fn orchestrator(&self) -> &ReconciliationOrchestrator {
        self.system.as_ref().expect("Sync engine not initialised").engine.orchestrator()
    }
}

impl SyncSystem {
    pub async fn new() -> Self {
        let config = prepare_test_env();
        let transport = LocalTransport::new();
        let source = GatedShopSource::default();
        let credentials = StaticCredential::new(Some(Secret::new("session-token".to_string())));
        let engine = SyncEngine::start(
            config,
            Arc::new(transport.clone()),
            Arc::new(credentials),
            Arc::new(source.clone()),
            SyncHooks::default(),
        )
        .await;
        debug!("🚀️ Sync engine ready");
        Self { engine, transport, source, refreshes: HashMap::new(), last_payload: None, snapshot: Vec::new() }
    }
}
