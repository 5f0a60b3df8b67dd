use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

use futures_util::future::BoxFuture;
use mkt_sync_engine::{
    shop::{LegacyShop, ShopStatusResponse},
    traits::ShopStatusSource,
    SourceError,
};
use tokio::sync::Notify;

type StatusResult = Result<ShopStatusResponse, SourceError>;

/// Serves shop status responses in request order. Each response is held back until its gate is opened, so tests can
/// decide the order in which responses arrive.
#[derive(Clone, Default)]
pub struct GatedShopSource {
    pending: Arc<Mutex<VecDeque<(Arc<Notify>, StatusResult)>>>,
    legacy: Arc<Mutex<Option<LegacyShop>>>,
}

impl GatedShopSource {
    /// Queues a response for the next request, returning the gate that releases it.
    pub fn respond_with(&self, result: StatusResult) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.pending.lock().unwrap().push_back((gate.clone(), result));
        gate
    }

    /// Queues a response that is released as soon as it is requested.
    pub fn respond_now(&self, result: StatusResult) {
        self.respond_with(result).notify_one();
    }

    /// Responses that no request has picked up yet.
    pub fn queued(&self) -> usize {
        self.pending.lock().unwrap().len()
    }

    pub fn set_legacy(&self, shop: Option<LegacyShop>) {
        *self.legacy.lock().unwrap() = shop;
    }
}

impl ShopStatusSource for GatedShopSource {
    fn fetch_shop_status(&self) -> BoxFuture<'_, StatusResult> {
        let next = self.pending.lock().unwrap().pop_front();
        Box::pin(async move {
            match next {
                Some((gate, result)) => {
                    gate.notified().await;
                    result
                },
                None => Err(SourceError::Network("no response queued".into())),
            }
        })
    }

    fn fetch_legacy_shop(&self) -> BoxFuture<'_, Result<Option<LegacyShop>, SourceError>> {
        let shop = self.legacy.lock().unwrap().clone();
        Box::pin(async move { Ok(shop) })
    }
}
