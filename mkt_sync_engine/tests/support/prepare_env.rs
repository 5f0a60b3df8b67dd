use log::*;
use mkt_sync_engine::SyncConfig;

pub fn prepare_test_env() -> SyncConfig {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    debug!("🚀️ Logging initialised");
    SyncConfig { refresh_on_attach: false, ..SyncConfig::from_env_or_default() }
}
