//! Order reconciliation.
//!
//! Two [`OrderCache`] instances exist at runtime: one for orders the user placed as a buyer, and one for orders placed
//! against the user's shop. Both fold push events into their records through [`crate::merge`].
mod cache;
mod order_types;

pub use cache::{ApplyOutcome, OrderCache};
pub use order_types::{OrderId, OrderRecord, OrderSide, OrderStatus};
