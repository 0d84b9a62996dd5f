//! # Reconcile Service
//!
//! Date-scoped orchestration: load → aggregate → close → persist →
//! rollover.
//!
//! ## One Reconciliation Pass
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │              ReconcileService::reconcile_date(date, scope)              │
//! │                                                                         │
//! │  1. gateway.list_for_date(date)      ← existing entries (explicit      │
//! │                                        openings win)                    │
//! │  2. gateway.list_for_date(date − 1)  ← prior-day closings              │
//! │     └─ items still missing a prior: gateway.previous_before(...)       │
//! │        (the site may have been closed for days)                        │
//! │  3. aggregate(date, sales, cylinder tx, refills)     [pure]            │
//! │  4. reconcile(date, catalog, totals, priors, existing) [pure]          │
//! │  5. gateway.upsert(entry) for every current entry                      │
//! │  6. gateway.seed_opening(rollover) for date + 1                        │
//! │                                                                         │
//! │  Persistence happens only after the full per-item computation          │
//! │  completes — a user switching dates mid-pass just discards the         │
//! │  in-flight result; there are no partial writes to clean up.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The same pass serves both reconciliation scopes. Admin and per-employee
//! runs differ only in which transaction snapshots the caller feeds in and
//! which scope key the entries land under; the algorithm is identical.

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info, warn};

use gasdepot_core::aggregate::aggregate;
use gasdepot_core::reconcile::{close_day, reconcile, universe, OpeningBalances};
use gasdepot_core::types::{CylinderTxRecord, DailyStockEntry, GasSaleLine, Item, RefillRecord};
use gasdepot_db::{Scope, StockEntryRecord};

use crate::gateway::StockGateway;

// =============================================================================
// Report
// =============================================================================

/// What one reconciliation pass produced.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReconcileReport {
    pub date: NaiveDate,

    pub scope: Scope,

    /// The date's reconciled entries (closings computed).
    pub entries: Vec<DailyStockEntry>,

    /// Transaction records excluded for lacking an identifiable item.
    pub skipped: u64,

    /// True when any write only reached the local mirror; the UI should
    /// tell the user the results will sync when back online.
    pub offline: bool,
}

// =============================================================================
// Service
// =============================================================================

/// Runs reconciliation passes against a [`StockGateway`].
///
/// Dependency-injected rather than ambient: callers construct it with the
/// gateway they want (production store, in-memory test store), and there
/// is no global state to reset between runs.
#[derive(Debug, Clone)]
pub struct ReconcileService {
    gateway: Arc<StockGateway>,
}

impl ReconcileService {
    /// Creates a service over the given gateway.
    pub fn new(gateway: Arc<StockGateway>) -> Self {
        ReconcileService { gateway }
    }

    /// The underlying gateway (for reads and manual sync triggers).
    pub fn gateway(&self) -> &StockGateway {
        &self.gateway
    }

    /// Reconciles one calendar date within one scope.
    ///
    /// Safe to call repeatedly — aggregation and closing math are pure,
    /// and persistence is merge-upsert — so the UI may trigger it on
    /// view, on date change, and on manual recompute.
    pub async fn reconcile_date(
        &self,
        date: NaiveDate,
        scope: &Scope,
        catalog: &[Item],
        gas_sales: &[GasSaleLine],
        cylinder_tx: &[CylinderTxRecord],
        refills: &[RefillRecord],
    ) -> ReconcileReport {
        debug!(date = %date, scope = scope.storage_key(), "Reconciling date");

        // 1. Existing entries for the date (explicit openings win)
        let existing: Vec<DailyStockEntry> = self
            .gateway
            .list_for_date(date, scope)
            .await
            .iter()
            .map(StockEntryRecord::to_entry)
            .collect();

        // 2. Aggregate the day's movement
        let totals = aggregate(date, gas_sales, cylinder_tx, refills);
        if totals.skipped > 0 {
            warn!(
                date = %date,
                skipped = totals.skipped,
                "Excluded transaction records with unidentifiable items"
            );
        }

        // 3. Prior-day closings, with a deeper lookup for items whose
        //    immediately prior day was never reconciled
        let mut priors: Vec<DailyStockEntry> = match date.pred_opt() {
            Some(prior_date) => self
                .gateway
                .list_for_date(prior_date, scope)
                .await
                .iter()
                .map(StockEntryRecord::to_entry)
                .map(pseudo_close)
                .collect(),
            None => Vec::new(),
        };

        for key in universe(catalog, &totals, &existing).keys() {
            if priors.iter().any(|p| &p.item_key == key) {
                continue;
            }
            if let Some(previous) = self
                .gateway
                .previous_before(key.as_str(), date, scope)
                .await
            {
                priors.push(pseudo_close(previous.to_entry()));
            }
        }

        // 4. Close the day (pure)
        let outcome = reconcile(date, catalog, &totals, &priors, &existing);

        // 5./6. Persist current entries, then roll openings forward
        let mut offline = false;

        for entry in &outcome.current {
            let record = StockEntryRecord::from_entry(entry, scope);
            offline |= self.gateway.upsert(&record).await.is_offline();
        }

        for rollover in &outcome.next_day_openings {
            let record = StockEntryRecord::opening_seed(rollover, scope);
            offline |= self.gateway.seed_opening(&record).await.is_offline();
        }

        info!(
            date = %date,
            scope = scope.storage_key(),
            items = outcome.current.len(),
            skipped = totals.skipped,
            offline,
            "Reconciliation pass complete"
        );

        ReconcileReport {
            date,
            scope: scope.clone(),
            entries: outcome.current,
            skipped: totals.skipped,
            offline,
        }
    }
}

/// Closes a prior entry on the fly when it carries openings but was never
/// reconciled (e.g. a day that only received rollover openings before the
/// site closed for a stretch). Its own openings and movement are the best
/// known state to chain from; an entry with nothing set contributes
/// nothing, per the 0-default rule.
fn pseudo_close(mut entry: DailyStockEntry) -> DailyStockEntry {
    if entry.is_reconciled() {
        return entry;
    }
    if entry.opening_full.is_none() && entry.opening_empty.is_none() {
        return entry;
    }

    let closing = close_day(
        OpeningBalances {
            full: entry.opening_full.unwrap_or(0),
            empty: entry.opening_empty.unwrap_or(0),
        },
        &entry.totals(),
    );
    entry.closing_full = Some(closing.full);
    entry.closing_empty = Some(closing.empty);
    entry
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, Utc};
    use gasdepot_core::aggregate::day_bounds;
    use gasdepot_core::types::{CylinderStatus, CylinderTxKind, ItemCategory, ItemRef};
    use gasdepot_db::{Database, DbConfig};

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    fn noon(day: u32) -> DateTime<Utc> {
        day_bounds(date(day)).0 + Duration::hours(12)
    }

    fn cylinder_item() -> Item {
        Item {
            id: "item-1".to_string(),
            name: "Acme Cylinder 12kg".to_string(),
            category: ItemCategory::Cylinder,
            cylinder_size: None,
            cylinder_status: None,
        }
    }

    async fn service() -> (Database, ReconcileService) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let gateway = Arc::new(StockGateway::new(&db));
        (db, ReconcileService::new(gateway))
    }

    #[tokio::test]
    async fn test_reconcile_worked_example() {
        let (_db, service) = service().await;
        let catalog = vec![cylinder_item()];

        // Opening full=10, empty=5 entered explicitly for the day
        let mut opening = StockEntryRecord::new(date(1), "acme cylinder 12kg", &Scope::Site);
        opening.opening_full = Some(10);
        opening.opening_empty = Some(5);
        service.gateway().upsert(&opening).await;

        // refilled=3, gasSales=4 (attributed to the cylinder), cylinderSales=1
        let gas_sales = vec![GasSaleLine {
            item: ItemRef::named("Acme Gas"),
            quantity: 4.0,
            cylinder: Some(ItemRef::named("Acme Cylinder 12kg")),
            sold_at: noon(1),
        }];
        let cylinder_tx = vec![CylinderTxRecord {
            item: ItemRef::named("Acme Cylinder 12kg"),
            quantity: 1.0,
            kind: CylinderTxKind::Sale {
                status: CylinderStatus::Empty,
                gas: None,
            },
            recorded_at: noon(1),
        }];
        let refills = vec![RefillRecord {
            cylinder: ItemRef::named("Acme Cylinder 12kg"),
            quantity: 3.0,
            refilled_at: noon(1),
        }];

        let report = service
            .reconcile_date(date(1), &Scope::Site, &catalog, &gas_sales, &cylinder_tx, &refills)
            .await;

        assert!(!report.offline);
        let entry = report
            .entries
            .iter()
            .find(|e| e.item_key.as_str() == "acme cylinder 12kg")
            .unwrap();
        assert_eq!(entry.closing_full, Some(9)); // 10 + 3 − 4
        assert_eq!(entry.closing_empty, Some(5)); // 14 − 9
    }

    #[tokio::test]
    async fn test_reconcile_rolls_into_next_day() {
        let (_db, service) = service().await;
        let catalog = vec![cylinder_item()];

        let mut opening = StockEntryRecord::new(date(1), "acme cylinder 12kg", &Scope::Site);
        opening.opening_full = Some(7);
        opening.opening_empty = Some(3);
        service.gateway().upsert(&opening).await;

        service
            .reconcile_date(date(1), &Scope::Site, &catalog, &[], &[], &[])
            .await;

        // Day 2: no explicit opening, no movement — openings must carry
        // over from day 1's closings
        let report = service
            .reconcile_date(date(2), &Scope::Site, &catalog, &[], &[], &[])
            .await;

        let entry = &report.entries[0];
        assert_eq!(entry.opening_full, Some(7));
        assert_eq!(entry.opening_empty, Some(3));
        assert_eq!(entry.closing_full, Some(7));
        assert_eq!(entry.closing_empty, Some(3));
    }

    #[tokio::test]
    async fn test_reconcile_skips_closed_days_via_previous_lookup() {
        let (_db, service) = service().await;
        let catalog = vec![cylinder_item()];

        let mut opening = StockEntryRecord::new(date(1), "acme cylinder 12kg", &Scope::Site);
        opening.opening_full = Some(12);
        opening.opening_empty = Some(4);
        service.gateway().upsert(&opening).await;

        service
            .reconcile_date(date(1), &Scope::Site, &catalog, &[], &[], &[])
            .await;

        // Days 2–4 never reconciled (site closed). Day 4 has no entry at
        // all, so day 5 seeds through the previous-entry lookup, landing
        // on day 2's rollover openings (12/4)
        let report = service
            .reconcile_date(date(5), &Scope::Site, &catalog, &[], &[], &[])
            .await;

        let entry = &report.entries[0];
        assert_eq!(entry.opening_full, Some(12));
        assert_eq!(entry.opening_empty, Some(4));
    }

    #[tokio::test]
    async fn test_reconcile_is_idempotent() {
        let (_db, service) = service().await;
        let catalog = vec![cylinder_item()];

        let refills = vec![RefillRecord {
            cylinder: ItemRef::named("Acme Cylinder 12kg"),
            quantity: 3.0,
            refilled_at: noon(1),
        }];

        let first = service
            .reconcile_date(date(1), &Scope::Site, &catalog, &[], &[], &refills)
            .await;
        let second = service
            .reconcile_date(date(1), &Scope::Site, &catalog, &[], &[], &refills)
            .await;

        assert_eq!(first.entries, second.entries);
    }

    #[tokio::test]
    async fn test_scopes_do_not_mix() {
        let (db, service) = service().await;
        let catalog = vec![cylinder_item()];
        let employee = Scope::Employee("emp-1".to_string());

        service
            .reconcile_date(date(1), &employee, &catalog, &[], &[], &[])
            .await;

        let site_rows = db.stock().list_for_date(date(1), &Scope::Site).await.unwrap();
        let emp_rows = db.stock().list_for_date(date(1), &employee).await.unwrap();
        assert!(site_rows.is_empty());
        assert_eq!(emp_rows.len(), 1);
    }

    #[tokio::test]
    async fn test_reconcile_degrades_to_mirror_when_offline() {
        let (db, service) = service().await;
        let catalog = vec![cylinder_item()];

        sqlx::query("ALTER TABLE daily_stock RENAME TO daily_stock_offline")
            .execute(db.pool())
            .await
            .unwrap();

        let report = service
            .reconcile_date(date(1), &Scope::Site, &catalog, &[], &[], &[])
            .await;

        assert!(report.offline);
        assert_eq!(report.entries.len(), 1);

        // The pass's results are readable from the mirror
        let listed = service.gateway().list_for_date(date(1), &Scope::Site).await;
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].closing_full, Some(0));
    }
}
