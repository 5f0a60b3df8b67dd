use std::collections::HashSet;

use chrono::{DateTime, Utc};
use log::*;
use serde_json::{Map, Value};

use crate::{
    merge::{resolve_order, AliasTable, OrderPatch, Resolution},
    orders::{OrderId, OrderRecord, OrderSide, OrderStatus},
    traits::{Paginated, Pagination},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The order was unknown. A placeholder was synthesized and placed at the head of the list.
    Inserted,
    /// The order was known and at least one field changed.
    Merged,
    /// The order was known and the event changed nothing.
    Unchanged,
    /// The event was older than the cached record and was discarded.
    Stale,
}

/// An upsert-or-merge cache of orders, keyed by order id and kept in list order.
///
/// Records are never removed by reconciliation. Orders synthesized on a cache miss are prepended, so the most recently
/// touched unknown order surfaces first in list views.
#[derive(Debug, Clone)]
pub struct OrderCache {
    side: OrderSide,
    aliases: &'static AliasTable,
    orders: Vec<OrderRecord>,
    pagination: Option<Pagination>,
}

impl OrderCache {
    pub fn new(side: OrderSide) -> Self {
        Self { side, aliases: AliasTable::for_side(side), orders: Vec::new(), pagination: None }
    }

    pub fn side(&self) -> OrderSide {
        self.side
    }

    pub fn aliases(&self) -> &'static AliasTable {
        self.aliases
    }

    /// Folds a single order event into the cache.
    ///
    /// `patch` is the raw event metadata; it is read through this cache's alias table. `at` is the time the event
    /// occurred and must be the same every time the same event is applied.
    pub fn apply_event(
        &mut self,
        order_id: &OrderId,
        explicit_status: Option<&OrderStatus>,
        patch: Option<&Map<String, Value>>,
        at: DateTime<Utc>,
    ) -> ApplyOutcome {
        let patch = patch.map(|m| self.aliases.resolve(m)).unwrap_or_default();
        self.apply_patch(order_id, explicit_status, &patch, at)
    }

    /// As [`Self::apply_event`], for a patch that has already been resolved.
    pub fn apply_patch(
        &mut self,
        order_id: &OrderId,
        explicit_status: Option<&OrderStatus>,
        patch: &OrderPatch,
        at: DateTime<Utc>,
    ) -> ApplyOutcome {
        let position = self.position(order_id);
        let existing = position.map(|i| &self.orders[i]);
        match (position, resolve_order(existing, order_id, explicit_status, patch, at)) {
            (_, Resolution::Created(record)) => {
                trace!("📦️ [{}] Synthesized placeholder for order {order_id}", self.side);
                self.orders.insert(0, record);
                ApplyOutcome::Inserted
            },
            (Some(i), Resolution::Updated(record)) => {
                if self.orders[i] == record {
                    trace!("📦️ [{}] Order {order_id} unchanged", self.side);
                    ApplyOutcome::Unchanged
                } else {
                    trace!("📦️ [{}] Order {order_id} merged", self.side);
                    self.orders[i] = record;
                    ApplyOutcome::Merged
                }
            },
            (None, Resolution::Updated(_)) => {
                // resolve_order only returns Updated when given an existing record
                warn!("📦️ [{}] Order {order_id} resolved as an update, but it is not cached", self.side);
                ApplyOutcome::Unchanged
            },
            (_, Resolution::Stale) => {
                debug!("📦️ [{}] Discarding stale event for order {order_id}", self.side);
                ApplyOutcome::Stale
            },
        }
    }

    /// Seeds the cache from an authoritative list fetch.
    ///
    /// The first page replaces the cache contents. Later pages append records that are not already present. Returns
    /// the number of records added.
    pub fn load_page(&mut self, page: Paginated<OrderRecord>) -> usize {
        let Paginated { items, pagination } = page;
        if pagination.is_first_page() {
            self.orders.clear();
        }
        let mut seen = self.orders.iter().map(|o| o.id.clone()).collect::<HashSet<_>>();
        let before = self.orders.len();
        for record in items {
            if seen.insert(record.id.clone()) {
                self.orders.push(record);
            } else {
                debug!("📦️ [{}] Skipping duplicate order {} in page {}", self.side, record.id, pagination.page);
            }
        }
        self.pagination = Some(pagination);
        let added = self.orders.len() - before;
        debug!("📦️ [{}] Loaded page {} with {added} new orders", self.side, pagination.page);
        added
    }

    pub fn get(&self, order_id: &OrderId) -> Option<&OrderRecord> {
        self.orders.iter().find(|o| &o.id == order_id)
    }

    pub fn records(&self) -> &[OrderRecord] {
        &self.orders
    }

    pub fn iter(&self) -> impl Iterator<Item = &OrderRecord> {
        self.orders.iter()
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }

    /// Pagination block of the most recent list fetch, if any.
    pub fn pagination(&self) -> Option<&Pagination> {
        self.pagination.as_ref()
    }

    fn position(&self, order_id: &OrderId) -> Option<usize> {
        self.orders.iter().position(|o| &o.id == order_id)
    }
}
