use chrono::{DateTime, Utc};
use mkt_common::Amount;

use crate::{
    merge::OrderPatch,
    orders::{OrderId, OrderRecord, OrderStatus},
};

/// The result of resolving a patch against the cache's current knowledge of an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// There was no prior record; this one was synthesized from the patch.
    Created(OrderRecord),
    /// The prior record with the patch applied. It may be identical to the prior record.
    Updated(OrderRecord),
    /// The patch carries an `updatedAt` older than the prior record's, and was ignored.
    Stale,
}

/// Computes the next state of an order from its current state (if any), a patch and an optional status override.
///
/// `at` is the time the triggering event occurred. It is only used for timestamps the patch does not carry, so
/// resolving the same inputs twice always gives the same answer.
pub fn resolve_order(
    existing: Option<&OrderRecord>,
    id: &OrderId,
    explicit_status: Option<&OrderStatus>,
    patch: &OrderPatch,
    at: DateTime<Utc>,
) -> Resolution {
    match existing {
        None => Resolution::Created(synthesize_order(id, explicit_status, patch, at)),
        Some(record) => match merge_order(record, explicit_status, patch, at) {
            Some(next) => Resolution::Updated(next),
            None => Resolution::Stale,
        },
    }
}

/// Builds a placeholder record for an order the cache has never seen.
pub fn synthesize_order(
    id: &OrderId,
    explicit_status: Option<&OrderStatus>,
    patch: &OrderPatch,
    at: DateTime<Utc>,
) -> OrderRecord {
    let status = explicit_status.or(patch.status.as_ref()).cloned().unwrap_or(OrderStatus::Pending);
    let created_at = patch.created_at.unwrap_or(at);
    let updated_at = patch.updated_at.unwrap_or(at).max(created_at);
    OrderRecord {
        id: id.clone(),
        status,
        subtotal: patch.subtotal.unwrap_or(Amount::ZERO),
        shipping_fee: patch.shipping_fee.unwrap_or(Amount::ZERO),
        discount: patch.discount.unwrap_or(Amount::ZERO),
        total_amount: patch.total_amount.or(patch.subtotal).unwrap_or(Amount::ZERO),
        tracking_number: patch.tracking_number.clone(),
        notes: patch.notes.clone(),
        created_at,
        updated_at,
    }
}

/// Applies a patch over an existing record. Returns `None` when the patch is older than the record.
///
/// Only the fields the patch provides are overwritten. `updated_at` never moves backwards, and never falls behind
/// `created_at`.
pub fn merge_order(
    existing: &OrderRecord,
    explicit_status: Option<&OrderStatus>,
    patch: &OrderPatch,
    at: DateTime<Utc>,
) -> Option<OrderRecord> {
    if matches!(patch.updated_at, Some(t) if t < existing.updated_at) {
        return None;
    }
    let mut next = existing.clone();
    if let Some(status) = explicit_status.or(patch.status.as_ref()) {
        next.status = status.clone();
    }
    overwrite(&mut next.subtotal, patch.subtotal);
    overwrite(&mut next.shipping_fee, patch.shipping_fee);
    overwrite(&mut next.discount, patch.discount);
    overwrite(&mut next.total_amount, patch.total_amount);
    if let Some(tracking) = &patch.tracking_number {
        next.tracking_number = Some(tracking.clone());
    }
    if let Some(notes) = &patch.notes {
        next.notes = Some(notes.clone());
    }
    overwrite(&mut next.created_at, patch.created_at);
    next.updated_at = patch.updated_at.unwrap_or(at).max(existing.updated_at).max(next.created_at);
    Some(next)
}

fn overwrite<T>(field: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *field = v;
    }
}

#[cfg(test)]
mod test {
    use chrono::Duration;

    use super::*;

    fn ts(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    fn amount(v: i64) -> Amount {
        Amount::try_from(v).unwrap()
    }

    #[test]
    fn synthesized_orders_use_fallbacks() {
        let at = ts("2024-05-01T10:00:00Z");
        let record = synthesize_order(&"o1".into(), None, &OrderPatch::default(), at);
        assert_eq!(record.status, OrderStatus::Pending);
        assert_eq!(record.total_amount, Amount::ZERO);
        assert_eq!(record.created_at, at);
        assert_eq!(record.updated_at, at);
    }

    #[test]
    fn synthesized_total_falls_back_to_subtotal() {
        let patch = OrderPatch { subtotal: Some(amount(700)), ..Default::default() };
        let record = synthesize_order(&"o1".into(), None, &patch, ts("2024-05-01T10:00:00Z"));
        assert_eq!(record.total_amount, amount(700));
        let patch = OrderPatch { subtotal: Some(amount(700)), total_amount: Some(amount(750)), ..Default::default() };
        let record = synthesize_order(&"o1".into(), None, &patch, ts("2024-05-01T10:00:00Z"));
        assert_eq!(record.total_amount, amount(750));
    }

    #[test]
    fn explicit_status_beats_patch_status() {
        let patch = OrderPatch { status: Some(OrderStatus::Shipped), ..Default::default() };
        let at = ts("2024-05-01T10:00:00Z");
        let record = synthesize_order(&"o1".into(), Some(&OrderStatus::Cancelled), &patch, at);
        assert_eq!(record.status, OrderStatus::Cancelled);
        let merged = merge_order(&record, None, &patch, at).unwrap();
        assert_eq!(merged.status, OrderStatus::Shipped);
    }

    #[test]
    fn absent_fields_never_clobber() {
        let at = ts("2024-05-01T10:00:00Z");
        let mut existing = OrderRecord::new("o1".into(), OrderStatus::Confirmed, at);
        existing.tracking_number = Some("VN123".into());
        existing.total_amount = amount(10_000);
        let patch = OrderPatch { notes: Some("x".into()), ..Default::default() };
        let merged = merge_order(&existing, None, &patch, at + Duration::minutes(1)).unwrap();
        assert_eq!(merged.tracking_number.as_deref(), Some("VN123"));
        assert_eq!(merged.total_amount, amount(10_000));
        assert_eq!(merged.status, OrderStatus::Confirmed);
        assert_eq!(merged.notes.as_deref(), Some("x"));
        assert_eq!(merged.updated_at, at + Duration::minutes(1));
    }

    #[test]
    fn stale_patches_are_rejected() {
        let at = ts("2024-05-01T10:00:00Z");
        let existing = OrderRecord::new("o1".into(), OrderStatus::Delivered, at);
        let patch = OrderPatch {
            status: Some(OrderStatus::Shipped),
            updated_at: Some(at - Duration::hours(1)),
            ..Default::default()
        };
        assert_eq!(merge_order(&existing, None, &patch, at), None);
        assert_eq!(resolve_order(Some(&existing), &existing.id, None, &patch, at), Resolution::Stale);
    }

    #[test]
    fn updated_at_never_moves_backwards() {
        let at = ts("2024-05-01T10:00:00Z");
        let existing = OrderRecord::new("o1".into(), OrderStatus::Pending, at);
        let patch = OrderPatch { status: Some(OrderStatus::Confirmed), ..Default::default() };
        let merged = merge_order(&existing, None, &patch, at - Duration::minutes(5)).unwrap();
        assert_eq!(merged.status, OrderStatus::Confirmed);
        assert_eq!(merged.updated_at, at);
    }

    #[test]
    fn a_later_created_at_pulls_updated_at_along() {
        let at = ts("2024-05-01T10:00:00Z");
        let existing = OrderRecord::new("o1".into(), OrderStatus::Pending, at);
        let created = ts("2024-05-01T12:00:00Z");
        let patch = OrderPatch { created_at: Some(created), ..Default::default() };
        let merged = merge_order(&existing, None, &patch, at).unwrap();
        assert_eq!(merged.created_at, created);
        assert_eq!(merged.updated_at, created);
        assert!(merged.created_at <= merged.updated_at);
    }

    #[test]
    fn merging_is_idempotent() {
        let at = ts("2024-05-01T10:00:00Z");
        let existing = OrderRecord::new("o1".into(), OrderStatus::Pending, at);
        let patch = OrderPatch {
            status: Some(OrderStatus::Shipped),
            tracking_number: Some("VN1".into()),
            ..Default::default()
        };
        let later = at + Duration::seconds(30);
        let once = merge_order(&existing, None, &patch, later).unwrap();
        let twice = merge_order(&once, None, &patch, later).unwrap();
        assert_eq!(once, twice);
    }
}
