//! # Reconciler
//!
//! Closes a calendar day: opening balances + daily movement → closing
//! balances, plus the rollover entries that seed the next day's openings.
//!
//! ## Closing Math
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Per-Item Daily Close                               │
//! │                                                                         │
//! │  openingFull ─┬─ + refilled ── − gasSales ──► closingFull (≥ 0)        │
//! │               │                                                         │
//! │  openingEmpty ┴─► totalUnits = max(0, openF + openE                    │
//! │                                  − cylinderSales − deposits + returns) │
//! │                                                                         │
//! │  closingEmpty = max(0, totalUnits − closingFull)                       │
//! │                                                                         │
//! │  Full is computed first and empty as the remainder, so the two always  │
//! │  sum consistently to totalUnits instead of being independently         │
//! │  estimated and drifting apart.                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Idempotence
//! `reconcile` is a deterministic pure function of its inputs. The UI may
//! trigger reconciliation repeatedly (on view, on date change, on manual
//! recompute); reprocessing the same date with the same inputs always
//! yields the same closing values.

use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::aggregate::AggregateOutcome;
use crate::normalize::ItemKey;
use crate::types::{DailyStockEntry, DailyTotals, Item};

// =============================================================================
// Balances
// =============================================================================

/// An item's cylinder balances at the start of a day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OpeningBalances {
    pub full: i64,
    pub empty: i64,
}

/// An item's reconciled balances at the end of a day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClosingBalances {
    pub full: i64,
    pub empty: i64,

    /// Total cylinder units in possession after the day's movement.
    /// Invariant: `full + empty == total_units`.
    pub total_units: i64,
}

/// Computes a day's closing balances from its opening balances and
/// movement totals.
///
/// Negative intermediate results clamp to zero: movements can exceed the
/// recorded opening stock (data entry lag, corrections), and the ledger
/// must never persist a negative balance.
pub fn close_day(opening: OpeningBalances, totals: &DailyTotals) -> ClosingBalances {
    let full = (opening.full + totals.refilled - totals.gas_sales_qty).max(0);

    let total_units = (opening.full + opening.empty
        - totals.cylinder_sales_qty
        - totals.deposit_qty
        + totals.return_qty)
        .max(0);

    // Whatever is not full is empty
    let empty = (total_units - full).max(0);

    ClosingBalances {
        full,
        empty,
        total_units,
    }
}

// =============================================================================
// Reconcile Outcome
// =============================================================================

/// Result of reconciling one date.
#[derive(Debug, Clone, Default)]
pub struct ReconcileOutcome {
    /// The date's entries, with closings computed.
    pub current: Vec<DailyStockEntry>,

    /// Opening-only entries for `date + 1`, seeded from `current`'s
    /// closings. The store must apply these without overwriting openings
    /// that are already explicitly set for that future day.
    pub next_day_openings: Vec<DailyStockEntry>,
}

// =============================================================================
// Universe
// =============================================================================

/// The set of items a reconciliation pass must process: the union of items
/// with an existing entry for the date, items appearing in the aggregated
/// totals, and the assigned/catalog item list.
///
/// Keyed by normalized name; each key remembers a stable id when any
/// source supplied one. Ordered (BTreeMap) so output is deterministic.
pub fn universe(
    items: &[Item],
    totals: &AggregateOutcome,
    existing: &[DailyStockEntry],
) -> BTreeMap<ItemKey, Option<String>> {
    let mut keys: BTreeMap<ItemKey, Option<String>> = BTreeMap::new();

    for entry in existing {
        if entry.item_key.is_empty() {
            continue;
        }
        merge_key(&mut keys, entry.item_key.clone(), entry.item_id.clone());
    }

    for key in totals.by_key.keys() {
        merge_key(&mut keys, key.clone(), None);
    }

    for item in items {
        let key = item.key();
        if key.is_empty() {
            continue;
        }
        merge_key(&mut keys, key, Some(item.id.clone()));
    }

    keys
}

fn merge_key(keys: &mut BTreeMap<ItemKey, Option<String>>, key: ItemKey, id: Option<String>) {
    let slot = keys.entry(key).or_default();
    if slot.is_none() {
        *slot = id;
    }
}

// =============================================================================
// Reconciliation
// =============================================================================

/// Reconciles one date for every item in the universe.
///
/// ## Opening Defaults
/// ```text
/// openingFull  = existing.openingFull  ?? priorDay.closingFull  ?? 0
/// openingEmpty = existing.openingEmpty ?? priorDay.closingEmpty ?? 0
/// ```
/// If the prior day's reconciliation has not run, this falls back to 0 —
/// lazy best-effort chaining, never a blocking pipeline.
///
/// ## Arguments
/// * `date` - The day being closed
/// * `items` - Assigned/catalog item list
/// * `totals` - Aggregated movement for `date`
/// * `prior_day` - Entries carrying the previous day's closings (any entry
///   whose closings are `None` contributes nothing)
/// * `existing` - Entries already persisted for `date` (explicit openings
///   win over rollover values)
pub fn reconcile(
    date: NaiveDate,
    items: &[Item],
    totals: &AggregateOutcome,
    prior_day: &[DailyStockEntry],
    existing: &[DailyStockEntry],
) -> ReconcileOutcome {
    let mut outcome = ReconcileOutcome::default();
    let next_date = date.succ_opt();

    for (key, item_id) in universe(items, totals, existing) {
        let existing_entry = existing.iter().find(|e| e.item_key == key);
        let prior_entry = prior_day.iter().find(|e| e.item_key == key);

        let opening = OpeningBalances {
            full: existing_entry
                .and_then(|e| e.opening_full)
                .or_else(|| prior_entry.and_then(|e| e.closing_full))
                .unwrap_or(0),
            empty: existing_entry
                .and_then(|e| e.opening_empty)
                .or_else(|| prior_entry.and_then(|e| e.closing_empty))
                .unwrap_or(0),
        };

        let day_totals = totals.totals_for(&key, item_id.as_deref());
        let closing = close_day(opening, &day_totals);

        let mut entry = DailyStockEntry::new(date, key.clone());
        entry.item_id = item_id.or_else(|| existing_entry.and_then(|e| e.item_id.clone()));
        entry.opening_full = Some(opening.full);
        entry.opening_empty = Some(opening.empty);
        entry.refilled = day_totals.refilled;
        entry.cylinder_sales_qty = day_totals.cylinder_sales_qty;
        entry.gas_sales_qty = day_totals.gas_sales_qty;
        entry.deposit_qty = day_totals.deposit_qty;
        entry.return_qty = day_totals.return_qty;
        entry.closing_full = Some(closing.full);
        entry.closing_empty = Some(closing.empty);

        if let Some(next) = next_date {
            let mut rollover = DailyStockEntry::new(next, key);
            rollover.item_id = entry.item_id.clone();
            rollover.opening_full = Some(closing.full);
            rollover.opening_empty = Some(closing.empty);
            outcome.next_day_openings.push(rollover);
        }

        outcome.current.push(entry);
    }

    outcome
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalize::normalize;
    use crate::types::ItemCategory;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    fn item(id: &str, name: &str) -> Item {
        Item {
            id: id.to_string(),
            name: name.to_string(),
            category: ItemCategory::Cylinder,
            cylinder_size: None,
            cylinder_status: None,
        }
    }

    fn totals_for(name: &str, totals: DailyTotals) -> AggregateOutcome {
        let mut outcome = AggregateOutcome::default();
        outcome.by_key.insert(normalize(name), totals);
        outcome
    }

    #[test]
    fn test_close_day_worked_example() {
        // Opening full=10, empty=5; refilled=3, gasSales=4, cylinderSales=1
        let closing = close_day(
            OpeningBalances { full: 10, empty: 5 },
            &DailyTotals {
                refilled: 3,
                gas_sales_qty: 4,
                cylinder_sales_qty: 1,
                deposit_qty: 0,
                return_qty: 0,
            },
        );
        assert_eq!(closing.full, 9);
        assert_eq!(closing.total_units, 14);
        assert_eq!(closing.empty, 5);
    }

    #[test]
    fn test_close_day_clamps_negative_full() {
        // Opening full=0; gasSales=2 → clamped, not negative
        let closing = close_day(
            OpeningBalances { full: 0, empty: 0 },
            &DailyTotals {
                gas_sales_qty: 2,
                ..DailyTotals::default()
            },
        );
        assert_eq!(closing.full, 0);
        assert_eq!(closing.empty, 0);
    }

    #[test]
    fn test_close_day_conservation() {
        // closingFull + closingEmpty == totalUnits whenever it is non-negative
        let cases = [
            (10, 5, DailyTotals { refilled: 3, gas_sales_qty: 4, cylinder_sales_qty: 1, deposit_qty: 0, return_qty: 0 }),
            (0, 0, DailyTotals::default()),
            (7, 3, DailyTotals { return_qty: 2, ..DailyTotals::default() }),
            (2, 2, DailyTotals { deposit_qty: 1, cylinder_sales_qty: 1, ..DailyTotals::default() }),
        ];
        for (full, empty, totals) in cases {
            let closing = close_day(OpeningBalances { full, empty }, &totals);
            assert_eq!(closing.full + closing.empty, closing.total_units);
            assert!(closing.full >= 0 && closing.empty >= 0);
        }
    }

    #[test]
    fn test_reconcile_is_idempotent() {
        let items = vec![item("id-1", "Acme Cylinder 12kg")];
        let totals = totals_for(
            "Acme Cylinder 12kg",
            DailyTotals {
                refilled: 3,
                gas_sales_qty: 4,
                ..DailyTotals::default()
            },
        );

        let first = reconcile(date(), &items, &totals, &[], &[]);
        let second = reconcile(date(), &items, &totals, &[], &[]);
        assert_eq!(first.current, second.current);
        assert_eq!(first.next_day_openings, second.next_day_openings);
    }

    #[test]
    fn test_reconcile_seeds_openings_from_prior_day() {
        // No entry for 2024-03-02; prior day closed full=7, empty=3
        let mut prior = DailyStockEntry::new(date(), normalize("Acme Cylinder 12kg"));
        prior.closing_full = Some(7);
        prior.closing_empty = Some(3);

        let next = date().succ_opt().unwrap();
        let outcome = reconcile(next, &[], &AggregateOutcome::default(), &[prior], &[]);

        let entry = &outcome.current[0];
        assert_eq!(entry.opening_full, Some(7));
        assert_eq!(entry.opening_empty, Some(3));
        assert_eq!(entry.closing_full, Some(7));
        assert_eq!(entry.closing_empty, Some(3));
    }

    #[test]
    fn test_reconcile_explicit_openings_win_over_prior_day() {
        let key = normalize("Acme Cylinder 12kg");

        let mut prior = DailyStockEntry::new(date(), key.clone());
        prior.closing_full = Some(7);
        prior.closing_empty = Some(3);

        let next = date().succ_opt().unwrap();
        let mut existing = DailyStockEntry::new(next, key);
        existing.opening_full = Some(20);
        existing.opening_empty = Some(1);

        let outcome = reconcile(next, &[], &AggregateOutcome::default(), &[prior], &[existing]);
        assert_eq!(outcome.current[0].opening_full, Some(20));
        assert_eq!(outcome.current[0].opening_empty, Some(1));
    }

    #[test]
    fn test_reconcile_rollover_chain() {
        // Day D followed by day D+1 with no explicit override:
        // D+1 openings must equal D closings
        let items = vec![item("id-1", "Acme Cylinder 12kg")];
        let totals = totals_for(
            "Acme Cylinder 12kg",
            DailyTotals {
                refilled: 5,
                gas_sales_qty: 2,
                ..DailyTotals::default()
            },
        );

        let day1 = reconcile(date(), &items, &totals, &[], &[]);
        let closed = &day1.current[0];

        let next = date().succ_opt().unwrap();
        let day2 = reconcile(next, &items, &AggregateOutcome::default(), &day1.current, &[]);

        assert_eq!(day2.current[0].opening_full, closed.closing_full);
        assert_eq!(day2.current[0].opening_empty, closed.closing_empty);
    }

    #[test]
    fn test_reconcile_universe_is_union() {
        // One item from the catalog, one only in totals, one only existing
        let items = vec![item("id-1", "Catalog Item")];
        let totals = totals_for("Totals Item", DailyTotals { refilled: 1, ..DailyTotals::default() });
        let existing = vec![DailyStockEntry::new(date(), normalize("Existing Item"))];

        let outcome = reconcile(date(), &items, &totals, &[], &existing);
        let keys: Vec<&str> = outcome.current.iter().map(|e| e.item_key.as_str()).collect();
        assert_eq!(keys, vec!["catalog item", "existing item", "totals item"]);
    }

    #[test]
    fn test_reconcile_next_day_openings_mirror_closings() {
        let items = vec![item("id-1", "Acme Cylinder 12kg")];
        let totals = totals_for(
            "Acme Cylinder 12kg",
            DailyTotals {
                refilled: 2,
                ..DailyTotals::default()
            },
        );
        let outcome = reconcile(date(), &items, &totals, &[], &[]);

        let current = &outcome.current[0];
        let rollover = &outcome.next_day_openings[0];
        assert_eq!(rollover.date, date().succ_opt().unwrap());
        assert_eq!(rollover.opening_full, current.closing_full);
        assert_eq!(rollover.opening_empty, current.closing_empty);
        assert_eq!(rollover.closing_full, None);
    }
}
