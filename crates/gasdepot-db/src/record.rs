//! # Stock Entry Records
//!
//! The wire/storage shape of a daily stock entry, plus the reconciliation
//! scope it belongs to.
//!
//! ## Record vs Domain Entry
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  gasdepot_core::DailyStockEntry      StockEntryRecord (this module)    │
//! │  ──────────────────────────────      ──────────────────────────────    │
//! │  in-memory reconciliation shape      what travels over the wire and    │
//! │  (ItemKey, movement always set)      sits in daily_stock (every        │
//! │                                      numeric field optional so a       │
//! │                                      PARTIAL upsert is expressible:    │
//! │                                      None = "keep the stored value")   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Scopes
//! Two reconciliation scopes exist side by side and must never mix: the
//! admin/site scope and the per-employee scope. Aggregation sources differ,
//! the algorithms don't. In storage the site scope is the empty
//! employee_id string, so SQLite's UNIQUE index behaves deterministically.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use gasdepot_core::{DailyStockEntry, ItemKey};

// =============================================================================
// Scope
// =============================================================================

/// Which reconciliation stream a record belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Scope {
    /// The admin/site-wide stream (admin sales, admin refills).
    Site,

    /// One employee's stream (employee sales, stock-assignment receipts).
    Employee(String),
}

impl Scope {
    /// The value stored in the `employee_id` column ('' for site scope).
    pub fn storage_key(&self) -> &str {
        match self {
            Scope::Site => "",
            Scope::Employee(id) => id,
        }
    }

    /// Rebuilds a scope from a stored `employee_id` value.
    pub fn from_storage_key(key: &str) -> Self {
        if key.is_empty() {
            Scope::Site
        } else {
            Scope::Employee(key.to_string())
        }
    }
}

// =============================================================================
// Stock Entry Record
// =============================================================================

/// One persisted (or persistable) daily stock record.
///
/// Every numeric field is optional: an upsert carrying `None` leaves the
/// stored value untouched, which is what makes repeated submissions
/// idempotent and lets rollover write openings without clobbering a day
/// that was already edited.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StockEntryRecord {
    /// Calendar day, no time component.
    pub date: NaiveDate,

    /// Normalized item key.
    pub item_name: String,

    /// Per-employee scope marker; `None` for the admin/site scope.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee_id: Option<String>,

    pub opening_full: Option<i64>,
    pub opening_empty: Option<i64>,

    pub refilled: Option<i64>,
    pub cylinder_sales: Option<i64>,
    pub gas_sales: Option<i64>,
    pub deposit_qty: Option<i64>,
    pub return_qty: Option<i64>,

    pub closing_full: Option<i64>,
    pub closing_empty: Option<i64>,
}

impl StockEntryRecord {
    /// Creates an all-`None` record for a date/item/scope.
    pub fn new(date: NaiveDate, item_name: impl Into<String>, scope: &Scope) -> Self {
        StockEntryRecord {
            date,
            item_name: item_name.into(),
            employee_id: match scope {
                Scope::Site => None,
                Scope::Employee(id) => Some(id.clone()),
            },
            opening_full: None,
            opening_empty: None,
            refilled: None,
            cylinder_sales: None,
            gas_sales: None,
            deposit_qty: None,
            return_qty: None,
            closing_full: None,
            closing_empty: None,
        }
    }

    /// Builds the full record for a reconciled domain entry.
    pub fn from_entry(entry: &DailyStockEntry, scope: &Scope) -> Self {
        let mut record = StockEntryRecord::new(entry.date, entry.item_key.as_str(), scope);
        record.opening_full = entry.opening_full;
        record.opening_empty = entry.opening_empty;
        record.refilled = Some(entry.refilled);
        record.cylinder_sales = Some(entry.cylinder_sales_qty);
        record.gas_sales = Some(entry.gas_sales_qty);
        record.deposit_qty = Some(entry.deposit_qty);
        record.return_qty = Some(entry.return_qty);
        record.closing_full = entry.closing_full;
        record.closing_empty = entry.closing_empty;
        record
    }

    /// Builds the opening-only rollover record for a domain entry.
    ///
    /// Carries nothing but the seeded openings, so applying it can never
    /// touch movements or closings of the target day.
    pub fn opening_seed(entry: &DailyStockEntry, scope: &Scope) -> Self {
        let mut record = StockEntryRecord::new(entry.date, entry.item_key.as_str(), scope);
        record.opening_full = entry.opening_full;
        record.opening_empty = entry.opening_empty;
        record
    }

    /// Converts back into the in-memory reconciliation shape.
    pub fn to_entry(&self) -> DailyStockEntry {
        let mut entry = DailyStockEntry::new(self.date, self.key());
        entry.opening_full = self.opening_full;
        entry.opening_empty = self.opening_empty;
        entry.refilled = self.refilled.unwrap_or(0);
        entry.cylinder_sales_qty = self.cylinder_sales.unwrap_or(0);
        entry.gas_sales_qty = self.gas_sales.unwrap_or(0);
        entry.deposit_qty = self.deposit_qty.unwrap_or(0);
        entry.return_qty = self.return_qty.unwrap_or(0);
        entry.closing_full = self.closing_full;
        entry.closing_empty = self.closing_empty;
        entry
    }

    /// The record's normalized item key.
    pub fn key(&self) -> ItemKey {
        gasdepot_core::normalize(&self.item_name)
    }

    /// The record's reconciliation scope.
    pub fn scope(&self) -> Scope {
        match &self.employee_id {
            Some(id) if !id.is_empty() => Scope::Employee(id.clone()),
            _ => Scope::Site,
        }
    }

    /// True when both records address the same `(date, item, scope)` slot.
    pub fn same_slot(&self, other: &StockEntryRecord) -> bool {
        self.date == other.date
            && self.key() == other.key()
            && self.scope() == other.scope()
    }

    /// Merges an incoming partial record into this one: every field the
    /// incoming record provides wins, every omitted field keeps its
    /// previous value. Mirrors the store's ON CONFLICT merge exactly.
    pub fn merge_from(&mut self, incoming: &StockEntryRecord) {
        merge_field(&mut self.opening_full, incoming.opening_full);
        merge_field(&mut self.opening_empty, incoming.opening_empty);
        merge_field(&mut self.refilled, incoming.refilled);
        merge_field(&mut self.cylinder_sales, incoming.cylinder_sales);
        merge_field(&mut self.gas_sales, incoming.gas_sales);
        merge_field(&mut self.deposit_qty, incoming.deposit_qty);
        merge_field(&mut self.return_qty, incoming.return_qty);
        merge_field(&mut self.closing_full, incoming.closing_full);
        merge_field(&mut self.closing_empty, incoming.closing_empty);
    }

    /// Applies a rollover seed: openings are filled only while unset.
    /// Mirrors the store's opening-seed write exactly.
    pub fn seed_openings_from(&mut self, incoming: &StockEntryRecord) {
        if self.opening_full.is_none() {
            self.opening_full = incoming.opening_full;
        }
        if self.opening_empty.is_none() {
            self.opening_empty = incoming.opening_empty;
        }
    }
}

fn merge_field(slot: &mut Option<i64>, incoming: Option<i64>) {
    if incoming.is_some() {
        *slot = incoming;
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    #[test]
    fn test_scope_storage_key_round_trip() {
        assert_eq!(Scope::Site.storage_key(), "");
        assert_eq!(Scope::Employee("emp-1".into()).storage_key(), "emp-1");

        assert_eq!(Scope::from_storage_key(""), Scope::Site);
        assert_eq!(
            Scope::from_storage_key("emp-1"),
            Scope::Employee("emp-1".into())
        );
    }

    #[test]
    fn test_merge_provided_fields_win() {
        let mut stored = StockEntryRecord::new(date(), "acme cylinder 12kg", &Scope::Site);
        stored.opening_full = Some(10);
        stored.gas_sales = Some(4);

        let mut incoming = StockEntryRecord::new(date(), "acme cylinder 12kg", &Scope::Site);
        incoming.gas_sales = Some(6);
        incoming.closing_full = Some(9);

        stored.merge_from(&incoming);
        assert_eq!(stored.opening_full, Some(10)); // omitted → kept
        assert_eq!(stored.gas_sales, Some(6)); // provided → replaced
        assert_eq!(stored.closing_full, Some(9)); // provided → filled
    }

    #[test]
    fn test_seed_openings_never_overwrite() {
        let mut stored = StockEntryRecord::new(date(), "acme cylinder 12kg", &Scope::Site);
        stored.opening_full = Some(20);

        let mut seed = StockEntryRecord::new(date(), "acme cylinder 12kg", &Scope::Site);
        seed.opening_full = Some(7);
        seed.opening_empty = Some(3);

        stored.seed_openings_from(&seed);
        assert_eq!(stored.opening_full, Some(20)); // already set → kept
        assert_eq!(stored.opening_empty, Some(3)); // unset → seeded
    }

    #[test]
    fn test_entry_record_round_trip() {
        let mut entry = DailyStockEntry::new(date(), gasdepot_core::normalize("Acme Cyl"));
        entry.opening_full = Some(10);
        entry.opening_empty = Some(5);
        entry.refilled = 3;
        entry.gas_sales_qty = 4;
        entry.closing_full = Some(9);
        entry.closing_empty = Some(5);

        let record = StockEntryRecord::from_entry(&entry, &Scope::Employee("emp-1".into()));
        assert_eq!(record.scope(), Scope::Employee("emp-1".into()));

        let back = record.to_entry();
        assert_eq!(back, entry);
    }

    #[test]
    fn test_same_slot_separates_scopes() {
        let site = StockEntryRecord::new(date(), "acme cyl", &Scope::Site);
        let employee = StockEntryRecord::new(date(), "acme cyl", &Scope::Employee("emp-1".into()));
        assert!(!site.same_slot(&employee));
        assert!(site.same_slot(&site.clone()));
    }
}
