use log::*;

use crate::SyncConfig;

/// Loads `.env.test` and initialises logging. Safe to call from every test.
pub fn prepare_test_env() -> SyncConfig {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    debug!("🚀️ Logging initialised");
    SyncConfig::from_env_or_default()
}
