use futures_util::future::BoxFuture;

use crate::{
    errors::SourceError,
    shop::{LegacyShop, ShopStatusResponse},
};

/// The authoritative read side for the seller's shop.
///
/// Futures are boxed and `Send` so that implementations can be shared behind an `Arc<dyn ShopStatusSource>` and
/// refreshes can run on their own tasks.
pub trait ShopStatusSource: Send + Sync {
    /// Fetch the `{ shopStatus, shop }` tuple. This is the single source of truth for the lifecycle state.
    fn fetch_shop_status(&self) -> BoxFuture<'_, Result<ShopStatusResponse, SourceError>>;
    /// Fetch the legacy shop record, or `None` if the user has no shop. Only consulted until the authoritative tuple
    /// has loaded at least once.
    fn fetch_legacy_shop(&self) -> BoxFuture<'_, Result<Option<LegacyShop>, SourceError>>;
}
