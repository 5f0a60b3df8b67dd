use std::sync::Arc;

use log::*;
use mkt_common::Secret;
use tokio::task::JoinHandle;

use crate::{
    config::SyncConfig,
    errors::SyncError,
    events::{EventHandlers, SyncHooks},
    orchestrator::ReconciliationOrchestrator,
    push::{PushChannelManager, PushTransport},
    traits::{CredentialSource, ShopStatusSource},
};

/// The fully wired sync engine: a push channel manager, its dispatch loop, the orchestrator and the host hooks.
pub struct SyncEngine {
    manager: PushChannelManager,
    orchestrator: ReconciliationOrchestrator,
    dispatch_task: JoinHandle<()>,
}

impl SyncEngine {
    /// Starts the hook handlers and the dispatch loop, attaches the orchestrator and connects the configured channels.
    /// Must be called from within a tokio runtime.
    pub async fn start(
        config: SyncConfig,
        transport: Arc<dyn PushTransport>,
        credentials: Arc<dyn CredentialSource>,
        source: Arc<dyn ShopStatusSource>,
        hooks: SyncHooks,
    ) -> Self {
        let handlers = EventHandlers::new(config.hook_buffer_size, hooks);
        let producers = handlers.producers();
        handlers.start_handlers().await;
        let (mut manager, dispatcher) = PushChannelManager::new(transport, credentials, config.event_buffer_size);
        let dispatch_task = tokio::spawn(dispatcher.run());
        let orchestrator = ReconciliationOrchestrator::new(&config, source, producers);
        orchestrator.attach(&manager);
        for channel in &config.channels {
            if let Err(e) = manager.connect(*channel) {
                info!("🔀️ {e}");
            }
        }
        info!("🔀️ Sync engine started");
        Self { manager, orchestrator, dispatch_task }
    }

    /// As [`SyncEngine::start`], with the configuration read strictly from the environment.
    pub async fn start_from_env(
        transport: Arc<dyn PushTransport>,
        credentials: Arc<dyn CredentialSource>,
        source: Arc<dyn ShopStatusSource>,
        hooks: SyncHooks,
    ) -> Result<Self, SyncError> {
        let config = SyncConfig::try_from_env()?;
        Ok(Self::start(config, transport, credentials, source, hooks).await)
    }

    pub fn orchestrator(&self) -> &ReconciliationOrchestrator {
        &self.orchestrator
    }

    pub fn manager(&self) -> &PushChannelManager {
        &self.manager
    }

    pub fn manager_mut(&mut self) -> &mut PushChannelManager {
        &mut self.manager
    }

    /// Forwards a credential change announced by the host.
    pub fn credential_changed(&mut self, credential: Option<Secret<String>>) {
        self.manager.credential_changed(credential);
    }

    /// Call when the host window regains focus.
    pub fn focus_regained(&mut self) {
        self.manager.recheck_credential();
    }

    /// Detaches the orchestrator, closes every channel and stops the dispatch loop.
    pub fn shutdown(self) {
        let Self { manager, orchestrator, dispatch_task } = self;
        orchestrator.detach();
        drop(manager);
        dispatch_task.abort();
        info!("🔀️ Sync engine stopped");
    }
}
