//! Field-resolution merge utility.
//!
//! Both order caches fold push events into their records through this module, so buyer-side and shop-side
//! reconciliation can never drift apart. The only thing that differs between the two is the [`AliasTable`] used to
//! read the event metadata.
mod aliases;
mod resolve;

pub use aliases::{parse_timestamp, AliasTable, OrderPatch};
pub use resolve::{merge_order, resolve_order, synthesize_order, Resolution};
