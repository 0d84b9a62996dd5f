//! # Local Mirror
//!
//! The in-memory offline mirror of the daily stock ledger.
//!
//! ## Two Halves
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        LocalMirror                                      │
//! │                                                                         │
//! │  ┌───────────────────────────┐   ┌──────────────────────────────────┐  │
//! │  │        snapshot           │   │             outbox               │  │
//! │  │                           │   │                                  │  │
//! │  │  merged view of every     │   │  writes that failed against the  │  │
//! │  │  record this process has  │   │  remote store, kept in order,    │  │
//! │  │  seen (remote reads +     │   │  replayed verbatim on reconnect  │  │
//! │  │  local writes)            │   │  (upsert stays upsert, seed      │  │
//! │  │                           │   │  stays seed)                     │  │
//! │  └───────────────────────────┘   └──────────────────────────────────┘  │
//! │                                                                         │
//! │  Both halves are read-modify-written as whole collections under one    │
//! │  Mutex each — coarse-grained on purpose: a site reconciles dozens of   │
//! │  items per day, not millions.                                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The mirror applies the SAME merge semantics as the store (provided
//! field wins, omitted field kept; rollover seeds fill only unset
//! openings), so reads served from the mirror are indistinguishable in
//! shape from remote reads.

use std::sync::Mutex;

use chrono::NaiveDate;

use gasdepot_db::{Scope, StockEntryRecord};

// =============================================================================
// Pending Writes
// =============================================================================

/// Which store operation a queued write must replay as.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingOp {
    /// Field-merge upsert.
    Upsert,
    /// Rollover opening seed (fill-if-unset only).
    SeedOpening,
}

/// One write awaiting replay against the remote store.
#[derive(Debug, Clone)]
pub struct PendingWrite {
    pub op: PendingOp,
    pub record: StockEntryRecord,
}

// =============================================================================
// Local Mirror
// =============================================================================

/// In-memory mirror of the ledger plus the outbox of unsynced writes.
#[derive(Debug, Default)]
pub struct LocalMirror {
    snapshot: Mutex<Vec<StockEntryRecord>>,
    outbox: Mutex<Vec<PendingWrite>>,
}

impl LocalMirror {
    /// Creates an empty mirror.
    pub fn new() -> Self {
        LocalMirror::default()
    }

    // -------------------------------------------------------------------------
    // Snapshot writes
    // -------------------------------------------------------------------------

    /// Merges a record into the snapshot (store upsert semantics).
    pub fn apply_upsert(&self, record: &StockEntryRecord) {
        let mut snapshot = self.snapshot.lock().expect("mirror mutex poisoned");
        match snapshot.iter_mut().find(|r| r.same_slot(record)) {
            Some(stored) => stored.merge_from(record),
            None => snapshot.push(record.clone()),
        }
    }

    /// Applies a rollover seed to the snapshot (fill-if-unset semantics).
    pub fn apply_seed(&self, record: &StockEntryRecord) {
        let mut snapshot = self.snapshot.lock().expect("mirror mutex poisoned");
        match snapshot.iter_mut().find(|r| r.same_slot(record)) {
            Some(stored) => stored.seed_openings_from(record),
            None => {
                // Nothing stored yet: the seed becomes the slot,
                // openings only
                let mut slot =
                    StockEntryRecord::new(record.date, record.item_name.clone(), &record.scope());
                slot.opening_full = record.opening_full;
                slot.opening_empty = record.opening_empty;
                snapshot.push(slot);
            }
        }
    }

    /// Replaces the snapshot's records for one date/scope with a remote
    /// read, then re-applies any outbox writes for that date/scope on top
    /// so unsynced local changes stay visible.
    pub fn refresh_date(&self, date: NaiveDate, scope: &Scope, remote: &[StockEntryRecord]) {
        {
            let mut snapshot = self.snapshot.lock().expect("mirror mutex poisoned");
            snapshot.retain(|r| !(r.date == date && &r.scope() == scope));
            snapshot.extend(remote.iter().cloned());
        }

        let pending: Vec<PendingWrite> = {
            let outbox = self.outbox.lock().expect("mirror mutex poisoned");
            outbox
                .iter()
                .filter(|w| w.record.date == date && &w.record.scope() == scope)
                .cloned()
                .collect()
        };

        for write in pending {
            match write.op {
                PendingOp::Upsert => self.apply_upsert(&write.record),
                PendingOp::SeedOpening => self.apply_seed(&write.record),
            }
        }
    }

    // -------------------------------------------------------------------------
    // Snapshot reads
    // -------------------------------------------------------------------------

    /// Lists the snapshot's records for one date/scope, ordered by item.
    pub fn list_for_date(&self, date: NaiveDate, scope: &Scope) -> Vec<StockEntryRecord> {
        let snapshot = self.snapshot.lock().expect("mirror mutex poisoned");
        let mut records: Vec<StockEntryRecord> = snapshot
            .iter()
            .filter(|r| r.date == date && &r.scope() == scope)
            .cloned()
            .collect();
        records.sort_by(|a, b| a.item_name.cmp(&b.item_name));
        records
    }

    /// The most recent snapshot record for an item strictly before `date`.
    pub fn previous_before(
        &self,
        item_name: &str,
        date: NaiveDate,
        scope: &Scope,
    ) -> Option<StockEntryRecord> {
        let key = gasdepot_core::normalize(item_name);
        let snapshot = self.snapshot.lock().expect("mirror mutex poisoned");
        snapshot
            .iter()
            .filter(|r| r.key() == key && &r.scope() == scope && r.date < date)
            .max_by_key(|r| r.date)
            .cloned()
    }

    // -------------------------------------------------------------------------
    // Outbox
    // -------------------------------------------------------------------------

    /// Queues a failed write for replay.
    pub fn queue(&self, op: PendingOp, record: StockEntryRecord) {
        let mut outbox = self.outbox.lock().expect("mirror mutex poisoned");
        outbox.push(PendingWrite { op, record });
    }

    /// Takes every queued write, leaving the outbox empty.
    /// Failed replays must be handed back via [`requeue`](Self::requeue).
    pub fn take_pending(&self) -> Vec<PendingWrite> {
        let mut outbox = self.outbox.lock().expect("mirror mutex poisoned");
        std::mem::take(&mut *outbox)
    }

    /// Returns a write to the outbox after a failed replay.
    pub fn requeue(&self, write: PendingWrite) {
        let mut outbox = self.outbox.lock().expect("mirror mutex poisoned");
        outbox.push(write);
    }

    /// Number of writes awaiting replay.
    pub fn pending_count(&self) -> usize {
        self.outbox.lock().expect("mirror mutex poisoned").len()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, day).unwrap()
    }

    fn record(day: u32, item: &str) -> StockEntryRecord {
        StockEntryRecord::new(date(day), item, &Scope::Site)
    }

    #[test]
    fn test_apply_upsert_merges_slots() {
        let mirror = LocalMirror::new();

        let mut first = record(1, "acme cylinder 12kg");
        first.opening_full = Some(10);
        mirror.apply_upsert(&first);

        let mut second = record(1, "acme cylinder 12kg");
        second.closing_full = Some(9);
        mirror.apply_upsert(&second);

        let rows = mirror.list_for_date(date(1), &Scope::Site);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].opening_full, Some(10));
        assert_eq!(rows[0].closing_full, Some(9));
    }

    #[test]
    fn test_apply_seed_respects_existing_openings() {
        let mirror = LocalMirror::new();

        let mut edited = record(2, "acme cylinder 12kg");
        edited.opening_full = Some(20);
        mirror.apply_upsert(&edited);

        let mut seed = record(2, "acme cylinder 12kg");
        seed.opening_full = Some(7);
        seed.opening_empty = Some(3);
        mirror.apply_seed(&seed);

        let rows = mirror.list_for_date(date(2), &Scope::Site);
        assert_eq!(rows[0].opening_full, Some(20));
        assert_eq!(rows[0].opening_empty, Some(3));
    }

    #[test]
    fn test_refresh_keeps_pending_writes_visible() {
        let mirror = LocalMirror::new();

        // A local write that failed to reach the remote store
        let mut local = record(1, "acme cylinder 12kg");
        local.closing_full = Some(5);
        mirror.apply_upsert(&local);
        mirror.queue(PendingOp::Upsert, local);

        // Remote comes back with an older view of the same slot
        let mut remote = record(1, "acme cylinder 12kg");
        remote.opening_full = Some(10);
        mirror.refresh_date(date(1), &Scope::Site, &[remote]);

        let rows = mirror.list_for_date(date(1), &Scope::Site);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].opening_full, Some(10)); // from remote
        assert_eq!(rows[0].closing_full, Some(5)); // local overlay survived
    }

    #[test]
    fn test_previous_before_scans_snapshot() {
        let mirror = LocalMirror::new();
        for day in [1, 3] {
            let mut rec = record(day, "Acme Cylinder 12kg");
            rec.closing_full = Some(day as i64);
            mirror.apply_upsert(&rec);
        }

        let previous = mirror
            .previous_before("acme  cylinder 12kg", date(5), &Scope::Site)
            .unwrap();
        assert_eq!(previous.date, date(3));

        assert!(mirror
            .previous_before("acme cylinder 12kg", date(1), &Scope::Site)
            .is_none());
    }

    #[test]
    fn test_outbox_take_and_requeue() {
        let mirror = LocalMirror::new();
        mirror.queue(PendingOp::Upsert, record(1, "a"));
        mirror.queue(PendingOp::SeedOpening, record(2, "a"));
        assert_eq!(mirror.pending_count(), 2);

        let pending = mirror.take_pending();
        assert_eq!(pending.len(), 2);
        assert_eq!(mirror.pending_count(), 0);

        mirror.requeue(pending.into_iter().next().unwrap());
        assert_eq!(mirror.pending_count(), 1);
    }
}
