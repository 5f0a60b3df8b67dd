use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
    time::Duration,
};

use futures_util::future::BoxFuture;

use crate::{
    errors::SourceError,
    helpers::lock,
    shop::{AuthoritativeStatus, LegacyShop, ShopStatusResponse, ShopSummary},
    traits::ShopStatusSource,
};

type StatusResult = Result<ShopStatusResponse, SourceError>;

struct Script {
    queued: VecDeque<(Duration, StatusResult)>,
    fallback: StatusResult,
    legacy: Result<Option<LegacyShop>, SourceError>,
    status_calls: usize,
}

/// A [`ShopStatusSource`] that replays canned responses.
///
/// Queued responses are served first, in order, each after its own delay. Once the queue is empty every request gets
/// the standing response.
#[derive(Clone)]
pub struct ScriptedShopSource {
    script: Arc<Mutex<Script>>,
}

impl ScriptedShopSource {
    pub fn new(standing: AuthoritativeStatus) -> Self {
        let script = Script {
            queued: VecDeque::new(),
            fallback: Ok(Self::response(standing)),
            legacy: Ok(None),
            status_calls: 0,
        };
        Self { script: Arc::new(Mutex::new(script)) }
    }

    /// A response with a shop record attached, except for `not_registered`.
    pub fn response(status: AuthoritativeStatus) -> ShopStatusResponse {
        let shop = match status {
            AuthoritativeStatus::NotRegistered => None,
            _ => Some(ShopSummary::new("shop-1", "Test Shop", "open")),
        };
        ShopStatusResponse::new(status, shop)
    }

    pub fn queue(&self, delay: Duration, result: StatusResult) -> &Self {
        lock(&self.script).queued.push_back((delay, result));
        self
    }

    pub fn set_standing(&self, result: StatusResult) -> &Self {
        lock(&self.script).fallback = result;
        self
    }

    pub fn set_legacy(&self, legacy: Result<Option<LegacyShop>, SourceError>) -> &Self {
        lock(&self.script).legacy = legacy;
        self
    }

    pub fn status_calls(&self) -> usize {
        lock(&self.script).status_calls
    }
}

impl ShopStatusSource for ScriptedShopSource {
    fn fetch_shop_status(&self) -> BoxFuture<'_, Result<ShopStatusResponse, SourceError>> {
        let (delay, result) = {
            let mut script = lock(&self.script);
            script.status_calls += 1;
            let fallback = script.fallback.clone();
            script.queued.pop_front().unwrap_or((Duration::ZERO, fallback))
        };
        Box::pin(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            result
        })
    }

    fn fetch_legacy_shop(&self) -> BoxFuture<'_, Result<Option<LegacyShop>, SourceError>> {
        let result = lock(&self.script).legacy.clone();
        Box::pin(async move { result })
    }
}
