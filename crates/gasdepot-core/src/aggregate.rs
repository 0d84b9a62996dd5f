//! # Transaction Aggregator
//!
//! Folds heterogeneous transaction streams into per-item daily totals.
//!
//! ## Data Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     Aggregation Pipeline                                │
//! │                                                                         │
//! │  GasSaleLine[] ────┐                                                   │
//! │                    │    1. bucket by local calendar day                 │
//! │  CylinderTx[] ─────┼──► 2. sanitize quantities (NaN/negative → 0)      │
//! │                    │    3. attribute to the right item                  │
//! │  RefillRecord[] ───┘    4. accumulate per normalized key (+ id map)    │
//! │                    │                                                    │
//! │                    ▼                                                    │
//! │  AggregateOutcome                                                      │
//! │  ├── by_key:  ItemKey → DailyTotals   (primary lookup)                 │
//! │  ├── by_id:   item id → DailyTotals   (fallback for name drift)        │
//! │  └── skipped: records with no identifiable item (diagnostics)          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Attribution Rules
//! - A gas sale is attributed to the *cylinder* it depletes when the line
//!   names one, otherwise to the gas item itself.
//! - A full-cylinder sale's gas link is NOT counted as a gas sale: gas
//!   consumption for full-cylinder sales is tracked only via the
//!   cylinder's own daily entry, avoiding double deduction.
//! - Records whose item name normalizes to the empty key are skipped and
//!   counted, never aggregated together.

use std::collections::HashMap;

use chrono::{DateTime, Local, LocalResult, NaiveDate, TimeZone, Utc};

use crate::normalize::ItemKey;
use crate::types::{CylinderTxKind, CylinderTxRecord, DailyTotals, GasSaleLine, ItemRef, RefillRecord};

// =============================================================================
// Outcome
// =============================================================================

/// Per-item daily totals, keyed two ways.
#[derive(Debug, Clone, Default)]
pub struct AggregateOutcome {
    /// Totals keyed by normalized item name — the primary lookup.
    pub by_key: HashMap<ItemKey, DailyTotals>,

    /// Totals keyed by stable catalog id, where the transaction carried
    /// one. Used as a fallback when name matching fails (catalog renames
    /// between the transaction snapshot and the live catalog).
    pub by_id: HashMap<String, DailyTotals>,

    /// Records excluded because their item could not be identified.
    /// A silent skip by design; surfaced here so callers can log it.
    pub skipped: u64,
}

impl AggregateOutcome {
    /// Looks up totals for an item, preferring the normalized name and
    /// falling back to the stable id.
    pub fn totals_for(&self, key: &ItemKey, id: Option<&str>) -> DailyTotals {
        if let Some(totals) = self.by_key.get(key) {
            return *totals;
        }
        id.and_then(|id| self.by_id.get(id))
            .copied()
            .unwrap_or_default()
    }
}

// =============================================================================
// Day Bounds & Sanitization
// =============================================================================

/// Computes the `[start, end)` instants of a calendar day in local time.
///
/// Transactions are stamped in UTC but bucketed by the day the business
/// actually operated in. A DST-skipped or ambiguous local midnight resolves
/// to the earliest valid instant.
pub fn day_bounds(date: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
    let start = local_midnight(date);
    let end = match date.succ_opt() {
        Some(next) => local_midnight(next),
        // NaiveDate::MAX has no successor; an empty-width day is harmless there.
        None => start,
    };
    (start, end)
}

fn local_midnight(date: NaiveDate) -> DateTime<Utc> {
    // and_hms_opt(0,0,0) is always valid on a NaiveDate
    let midnight = date.and_hms_opt(0, 0, 0).unwrap_or_default();
    match Local.from_local_datetime(&midnight) {
        LocalResult::Single(instant) => instant.with_timezone(&Utc),
        LocalResult::Ambiguous(earliest, _) => earliest.with_timezone(&Utc),
        // Midnight skipped by a DST jump: fall back to the UTC reading
        LocalResult::None => midnight.and_utc(),
    }
}

/// Coerces a raw upstream quantity into a usable count.
///
/// Missing/NaN values are treated as 0; negative movement is not valid
/// input and clamps to 0; fractional quantities floor.
pub fn sanitize_quantity(raw: f64) -> i64 {
    if !raw.is_finite() || raw <= 0.0 {
        return 0;
    }
    raw.floor() as i64
}

// =============================================================================
// Aggregation
// =============================================================================

/// Aggregates one calendar day of raw transactions into per-item totals.
///
/// ## Arguments
/// * `date` - Target calendar day (bucketed in local time)
/// * `gas_sales` - Gas sale lines
/// * `cylinder_tx` - Cylinder sales, deposits, and returns
/// * `refills` - Refill records
///
/// Idempotent and pure: same inputs always yield the same outcome.
pub fn aggregate(
    date: NaiveDate,
    gas_sales: &[GasSaleLine],
    cylinder_tx: &[CylinderTxRecord],
    refills: &[RefillRecord],
) -> AggregateOutcome {
    let (start, end) = day_bounds(date);
    let mut outcome = AggregateOutcome::default();

    for sale in gas_sales {
        if sale.sold_at < start || sale.sold_at >= end {
            continue;
        }
        let qty = sanitize_quantity(sale.quantity);

        // Attribute to the cylinder the gas depletes, when known
        let target = sale.cylinder.as_ref().unwrap_or(&sale.item);
        bump(&mut outcome, target, |t| t.gas_sales_qty += qty);
    }

    for tx in cylinder_tx {
        if tx.recorded_at < start || tx.recorded_at >= end {
            continue;
        }
        let qty = sanitize_quantity(tx.quantity);

        match &tx.kind {
            // The gas link of a full-cylinder sale is intentionally not
            // counted here; see module docs.
            CylinderTxKind::Sale { .. } => {
                bump(&mut outcome, &tx.item, |t| t.cylinder_sales_qty += qty);
            }
            CylinderTxKind::Deposit => {
                bump(&mut outcome, &tx.item, |t| t.deposit_qty += qty);
            }
            CylinderTxKind::Return => {
                bump(&mut outcome, &tx.item, |t| t.return_qty += qty);
            }
        }
    }

    for refill in refills {
        if refill.refilled_at < start || refill.refilled_at >= end {
            continue;
        }
        let qty = sanitize_quantity(refill.quantity);
        bump(&mut outcome, &refill.cylinder, |t| t.refilled += qty);
    }

    outcome
}

/// Applies one movement to both accumulation maps.
///
/// An empty normalized key means the record's item is unidentifiable; the
/// record is excluded (counted in `skipped`) rather than guessed at.
fn bump(outcome: &mut AggregateOutcome, item: &ItemRef, apply: impl Fn(&mut DailyTotals)) {
    let key = item.key();
    if key.is_empty() {
        outcome.skipped += 1;
        return;
    }

    apply(outcome.by_key.entry(key).or_default());

    if let Some(id) = &item.id {
        apply(outcome.by_id.entry(id.clone()).or_default());
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
