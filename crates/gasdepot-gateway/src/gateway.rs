//! # Stock Gateway
//!
//! The single remote-then-local persistence abstraction for daily stock.
//!
//! ## Fallback Policy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    StockGateway Write Path                              │
//! │                                                                         │
//! │  upsert(record)                                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  StockRepository.upsert() ──── Ok ──► mirror.apply_upsert()            │
//! │       │                               state = ONLINE                    │
//! │       │                               → PersistOutcome::Persisted      │
//! │      Err                                                                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  mirror.apply_upsert()  ← the user's change is never lost              │
//! │  mirror.queue(Upsert)   ← replayed by sync_pending()                   │
//! │  state = OFFLINE                                                       │
//! │  → PersistOutcome::CachedOffline  ("saved locally, will sync")         │
//! │                                                                         │
//! │  Reads prefer the remote result and fall back to the mirror only      │
//! │  when the remote call fails. No call site implements its own          │
//! │  fallback; this type is the one place the policy lives.               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Persistence failure is never fatal and never blocks the workflow: the
//! caller learns the result may be stale via [`PersistOutcome`] and the
//! explicit [`is_online`](StockGateway::is_online) state.

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, info, warn};

use gasdepot_db::{Database, Scope, StockEntryRecord, StockRepository};

use crate::mirror::{LocalMirror, PendingOp};

// =============================================================================
// Outcomes
// =============================================================================

/// Where a write ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PersistOutcome {
    /// Written to the remote store (and mirrored).
    Persisted,

    /// Remote store unreachable; written to the local mirror and queued
    /// for sync. The user should see "saved locally, will sync when
    /// online".
    CachedOffline,
}

impl PersistOutcome {
    /// True when the write only reached the local mirror.
    pub fn is_offline(&self) -> bool {
        matches!(self, PersistOutcome::CachedOffline)
    }
}

/// Result of replaying queued writes after a reconnect.
#[derive(Debug, Clone, Copy, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    /// Writes that reached the remote store.
    pub replayed: usize,

    /// Writes that failed again and stay queued.
    pub failed: usize,
}

// =============================================================================
// Stock Gateway
// =============================================================================

/// Remote-preferring, mirror-backed access to the daily stock ledger.
#[derive(Debug)]
pub struct StockGateway {
    repo: StockRepository,
    mirror: LocalMirror,
    online: AtomicBool,
}

impl StockGateway {
    /// Creates a gateway over the given database.
    ///
    /// Starts optimistically online; the first failed remote call flips
    /// the state.
    pub fn new(db: &Database) -> Self {
        StockGateway {
            repo: db.stock(),
            mirror: LocalMirror::new(),
            online: AtomicBool::new(true),
        }
    }

    /// Whether the last remote call succeeded.
    pub fn is_online(&self) -> bool {
        self.online.load(Ordering::Relaxed)
    }

    /// Number of writes waiting to be replayed.
    pub fn pending_count(&self) -> usize {
        self.mirror.pending_count()
    }

    // -------------------------------------------------------------------------
    // Writes
    // -------------------------------------------------------------------------

    /// Upserts a record, falling back to the local mirror on failure.
    pub async fn upsert(&self, record: &StockEntryRecord) -> PersistOutcome {
        match self.repo.upsert(record).await {
            Ok(()) => {
                self.mirror.apply_upsert(record);
                self.mark_online();
                PersistOutcome::Persisted
            }
            Err(e) => {
                warn!(
                    error = %e,
                    date = %record.date,
                    item = %record.item_name,
                    "Upsert failed; saved locally, will sync when online"
                );
                self.mirror.apply_upsert(record);
                self.mirror.queue(PendingOp::Upsert, record.clone());
                self.mark_offline();
                PersistOutcome::CachedOffline
            }
        }
    }

    /// Writes a rollover opening seed, falling back to the mirror on
    /// failure. Seed semantics are preserved across the fallback: a
    /// queued seed replays as a seed, so it can never overwrite openings
    /// set on the remote side in the meantime.
    pub async fn seed_opening(&self, record: &StockEntryRecord) -> PersistOutcome {
        match self.repo.seed_opening(record).await {
            Ok(()) => {
                self.mirror.apply_seed(record);
                self.mark_online();
                PersistOutcome::Persisted
            }
            Err(e) => {
                warn!(
                    error = %e,
                    date = %record.date,
                    item = %record.item_name,
                    "Opening seed failed; saved locally, will sync when online"
                );
                self.mirror.apply_seed(record);
                self.mirror.queue(PendingOp::SeedOpening, record.clone());
                self.mark_offline();
                PersistOutcome::CachedOffline
            }
        }
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    /// Lists a date's records, preferring the remote store.
    ///
    /// A successful remote read refreshes the mirror for that date (with
    /// unsynced local writes overlaid); a failed one serves the mirror.
    pub async fn list_for_date(&self, date: NaiveDate, scope: &Scope) -> Vec<StockEntryRecord> {
        match self.repo.list_for_date(date, scope).await {
            Ok(remote) => {
                self.mark_online();
                self.mirror.refresh_date(date, scope, &remote);
                self.mirror.list_for_date(date, scope)
            }
            Err(e) => {
                warn!(error = %e, date = %date, "Remote list failed; serving local mirror");
                self.mark_offline();
                self.mirror.list_for_date(date, scope)
            }
        }
    }

    /// The most recent record for an item strictly before `date`,
    /// preferring the remote store.
    pub async fn previous_before(
        &self,
        item_name: &str,
        date: NaiveDate,
        scope: &Scope,
    ) -> Option<StockEntryRecord> {
        match self.repo.previous_before(item_name, date, scope).await {
            Ok(record) => {
                self.mark_online();
                record
            }
            Err(e) => {
                warn!(
                    error = %e,
                    item = item_name,
                    "Remote previous-entry lookup failed; serving local mirror"
                );
                self.mark_offline();
                self.mirror.previous_before(item_name, date, scope)
            }
        }
    }

    // -------------------------------------------------------------------------
    // Sync
    // -------------------------------------------------------------------------

    /// Replays queued writes against the remote store.
    ///
    /// Writes replay in the order they were queued; a write that fails
    /// again goes back to the queue. The gateway is online again once a
    /// replay pass ends with nothing failed.
    pub async fn sync_pending(&self) -> SyncReport {
        let pending = self.mirror.take_pending();
        if pending.is_empty() {
            debug!("No pending writes to sync");
            return SyncReport::default();
        }

        info!(count = pending.len(), "Replaying queued stock writes");

        let mut report = SyncReport::default();
        for write in pending {
            let result = match write.op {
                PendingOp::Upsert => self.repo.upsert(&write.record).await,
                PendingOp::SeedOpening => self.repo.seed_opening(&write.record).await,
            };

            match result {
                Ok(()) => report.replayed += 1,
                Err(e) => {
                    warn!(
                        error = %e,
                        date = %write.record.date,
                        item = %write.record.item_name,
                        "Replay failed; write stays queued"
                    );
                    self.mirror.requeue(write);
                    report.failed += 1;
                }
            }
        }

        if report.failed == 0 {
            self.mark_online();
        } else {
            self.mark_offline();
        }

        info!(
            replayed = report.replayed,
            failed = report.failed,
            "Sync pass complete"
        );
        report
    }

    fn mark_online(&self) {
        self.online.store(true, Ordering::Relaxed);
    }

    fn mark_offline(&self) {
        self.online.store(false, Ordering::Relaxed);
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use gasdepot_db::DbConfig;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    fn record(day: u32, item: &str) -> StockEntryRecord {
        StockEntryRecord::new(date(day), item, &Scope::Site)
    }

    /// Simulates the backend going away while the process keeps running.
    async fn take_backend_down(db: &Database) {
        sqlx::query("ALTER TABLE daily_stock RENAME TO daily_stock_offline")
            .execute(db.pool())
            .await
            .unwrap();
    }

    async fn bring_backend_up(db: &Database) {
        sqlx::query("ALTER TABLE daily_stock_offline RENAME TO daily_stock")
            .execute(db.pool())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_online_upsert_persists_and_mirrors() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let gateway = StockGateway::new(&db);

        let mut rec = record(1, "acme cylinder 12kg");
        rec.closing_full = Some(9);

        let outcome = gateway.upsert(&rec).await;
        assert_eq!(outcome, PersistOutcome::Persisted);
        assert!(gateway.is_online());
        assert_eq!(gateway.pending_count(), 0);

        let listed = gateway.list_for_date(date(1), &Scope::Site).await;
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].closing_full, Some(9));
    }

    #[tokio::test]
    async fn test_offline_upsert_caches_and_stays_readable() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let gateway = StockGateway::new(&db);

        take_backend_down(&db).await;

        let mut rec = record(1, "acme cylinder 12kg");
        rec.closing_full = Some(9);

        let outcome = gateway.upsert(&rec).await;
        assert!(outcome.is_offline());
        assert!(!gateway.is_online());
        assert_eq!(gateway.pending_count(), 1);

        // The entry still appears in subsequent reads, served by the mirror
        let listed = gateway.list_for_date(date(1), &Scope::Site).await;
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].closing_full, Some(9));
    }

    #[tokio::test]
    async fn test_sync_pending_replays_after_reconnect() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let gateway = StockGateway::new(&db);

        take_backend_down(&db).await;

        let mut rec = record(1, "acme cylinder 12kg");
        rec.opening_full = Some(10);
        rec.closing_full = Some(9);
        gateway.upsert(&rec).await;

        let mut seed = record(2, "acme cylinder 12kg");
        seed.opening_full = Some(9);
        gateway.seed_opening(&seed).await;
        assert_eq!(gateway.pending_count(), 2);

        bring_backend_up(&db).await;

        let report = gateway.sync_pending().await;
        assert_eq!(report.replayed, 2);
        assert_eq!(report.failed, 0);
        assert!(gateway.is_online());
        assert_eq!(gateway.pending_count(), 0);

        // The remote store now has both writes
        let repo = db.stock();
        let day1 = repo.list_for_date(date(1), &Scope::Site).await.unwrap();
        assert_eq!(day1[0].closing_full, Some(9));
        let day2 = repo.list_for_date(date(2), &Scope::Site).await.unwrap();
        assert_eq!(day2[0].opening_full, Some(9));
    }

    #[tokio::test]
    async fn test_sync_pending_requeues_failures() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let gateway = StockGateway::new(&db);

        take_backend_down(&db).await;
        gateway.upsert(&record(1, "acme cylinder 12kg")).await;

        // Backend still down: replay fails, write stays queued
        let report = gateway.sync_pending().await;
        assert_eq!(report.replayed, 0);
        assert_eq!(report.failed, 1);
        assert!(!gateway.is_online());
        assert_eq!(gateway.pending_count(), 1);
    }

    #[tokio::test]
    async fn test_queued_seed_replays_as_seed() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let gateway = StockGateway::new(&db);

        take_backend_down(&db).await;
        let mut seed = record(2, "acme cylinder 12kg");
        seed.opening_full = Some(7);
        gateway.seed_opening(&seed).await;
        bring_backend_up(&db).await;

        // While offline, day 2's openings were edited remotely
        let mut edited = record(2, "acme cylinder 12kg");
        edited.opening_full = Some(20);
        db.stock().upsert(&edited).await.unwrap();

        gateway.sync_pending().await;

        // The replayed seed must not clobber the explicit edit
        let rows = db.stock().list_for_date(date(2), &Scope::Site).await.unwrap();
        assert_eq!(rows[0].opening_full, Some(20));
    }
}
