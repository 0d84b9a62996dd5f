//! # Stock Repository
//!
//! Database operations for the `daily_stock` ledger.
//!
//! ## Key Operations
//! - Merge-upsert: partial records fill only the fields they carry
//! - Opening-seed: rollover writes that never overwrite an edited day
//! - Date listing and "most recent before" lookups per scope
//!
//! ## Merge-Upsert Semantics
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │              Why ON CONFLICT ... COALESCE(excluded, stored)?           │
//! │                                                                         │
//! │  Stored row:    opening_full=10  gas_sales=4   closing_full=NULL       │
//! │  Upsert record: opening_full=—   gas_sales=6   closing_full=9          │
//! │                         │                                               │
//! │                         ▼                                               │
//! │  Result row:    opening_full=10  gas_sales=6   closing_full=9          │
//! │                                                                         │
//! │  Every provided field wins; every omitted field keeps its previous     │
//! │  value. Repeated submissions of the same record are therefore          │
//! │  idempotent — they can never double count a day's movement.            │
//! │                                                                         │
//! │  The opening-seed write flips the COALESCE order on the two opening    │
//! │  columns: COALESCE(stored, excluded) — rollover only fills openings    │
//! │  that are still NULL, never a day someone already edited.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{NaiveDate, Utc};
use sqlx::SqlitePool;
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use crate::record::{Scope, StockEntryRecord};

/// Repository for daily stock ledger operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = StockRepository::new(pool);
///
/// repo.upsert(&record).await?;
/// let entries = repo.list_for_date(date, &Scope::Site).await?;
/// ```
#[derive(Debug, Clone)]
pub struct StockRepository {
    pool: SqlitePool,
}

/// Row shape read back from `daily_stock`.
///
/// `employee_id` is stored as '' for the site scope; the public record
/// type uses `Option<String>` instead.
#[derive(Debug, sqlx::FromRow)]
struct StockRow {
    date: NaiveDate,
    item_name: String,
    employee_id: String,
    opening_full: Option<i64>,
    opening_empty: Option<i64>,
    refilled: Option<i64>,
    cylinder_sales: Option<i64>,
    gas_sales: Option<i64>,
    deposit_qty: Option<i64>,
    return_qty: Option<i64>,
    closing_full: Option<i64>,
    closing_empty: Option<i64>,
}

impl From<StockRow> for StockEntryRecord {
    fn from(row: StockRow) -> Self {
        StockEntryRecord {
            date: row.date,
            item_name: row.item_name,
            employee_id: if row.employee_id.is_empty() {
                None
            } else {
                Some(row.employee_id)
            },
            opening_full: row.opening_full,
            opening_empty: row.opening_empty,
            refilled: row.refilled,
            cylinder_sales: row.cylinder_sales,
            gas_sales: row.gas_sales,
            deposit_qty: row.deposit_qty,
            return_qty: row.return_qty,
            closing_full: row.closing_full,
            closing_empty: row.closing_empty,
        }
    }
}

const SELECT_COLUMNS: &str = "date, item_name, employee_id, \
     opening_full, opening_empty, \
     refilled, cylinder_sales, gas_sales, deposit_qty, return_qty, \
     closing_full, closing_empty";

impl StockRepository {
    /// Creates a new StockRepository.
    pub fn new(pool: SqlitePool) -> Self {
        StockRepository { pool }
    }

    /// Upserts a (possibly partial) daily stock record.
    ///
    /// Merge semantics: each field the record provides replaces the stored
    /// value; each `None` field keeps it. The conflict key is
    /// `(date, item_name, employee_id)`.
    pub async fn upsert(&self, record: &StockEntryRecord) -> DbResult<()> {
        debug!(
            date = %record.date,
            item = %record.item_name,
            scope = record.scope().storage_key(),
            "Upserting daily stock record"
        );

        let id = Uuid::new_v4().to_string();
        let employee_id = record.scope().storage_key().to_string();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO daily_stock (
                id, date, item_name, employee_id,
                opening_full, opening_empty,
                refilled, cylinder_sales, gas_sales, deposit_qty, return_qty,
                closing_full, closing_empty, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            ON CONFLICT(date, item_name, employee_id) DO UPDATE SET
                opening_full   = COALESCE(excluded.opening_full,   daily_stock.opening_full),
                opening_empty  = COALESCE(excluded.opening_empty,  daily_stock.opening_empty),
                refilled       = COALESCE(excluded.refilled,       daily_stock.refilled),
                cylinder_sales = COALESCE(excluded.cylinder_sales, daily_stock.cylinder_sales),
                gas_sales      = COALESCE(excluded.gas_sales,      daily_stock.gas_sales),
                deposit_qty    = COALESCE(excluded.deposit_qty,    daily_stock.deposit_qty),
                return_qty     = COALESCE(excluded.return_qty,     daily_stock.return_qty),
                closing_full   = COALESCE(excluded.closing_full,   daily_stock.closing_full),
                closing_empty  = COALESCE(excluded.closing_empty,  daily_stock.closing_empty),
                updated_at     = excluded.updated_at
            "#,
        )
        .bind(id)
        .bind(record.date)
        .bind(&record.item_name)
        .bind(employee_id)
        .bind(record.opening_full)
        .bind(record.opening_empty)
        .bind(record.refilled)
        .bind(record.cylinder_sales)
        .bind(record.gas_sales)
        .bind(record.deposit_qty)
        .bind(record.return_qty)
        .bind(record.closing_full)
        .bind(record.closing_empty)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Writes a rollover opening seed.
    ///
    /// Only `opening_full`/`opening_empty` are touched, and only while the
    /// stored values are still NULL: a day whose openings were already set
    /// (explicit edit or earlier rollover) is left alone.
    pub async fn seed_opening(&self, record: &StockEntryRecord) -> DbResult<()> {
        debug!(
            date = %record.date,
            item = %record.item_name,
            scope = record.scope().storage_key(),
            "Seeding rollover openings"
        );

        let id = Uuid::new_v4().to_string();
        let employee_id = record.scope().storage_key().to_string();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO daily_stock (
                id, date, item_name, employee_id,
                opening_full, opening_empty, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(date, item_name, employee_id) DO UPDATE SET
                opening_full  = COALESCE(daily_stock.opening_full,  excluded.opening_full),
                opening_empty = COALESCE(daily_stock.opening_empty, excluded.opening_empty),
                updated_at    = excluded.updated_at
            "#,
        )
        .bind(id)
        .bind(record.date)
        .bind(&record.item_name)
        .bind(employee_id)
        .bind(record.opening_full)
        .bind(record.opening_empty)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Lists all records for a date within one scope.
    pub async fn list_for_date(
        &self,
        date: NaiveDate,
        scope: &Scope,
    ) -> DbResult<Vec<StockEntryRecord>> {
        let rows: Vec<StockRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM daily_stock \
             WHERE date = ?1 AND employee_id = ?2 \
             ORDER BY item_name"
        ))
        .bind(date)
        .bind(scope.storage_key())
        .fetch_all(&self.pool)
        .await?;

        debug!(date = %date, count = rows.len(), "Listed daily stock records");
        Ok(rows.into_iter().map(StockEntryRecord::from).collect())
    }

    /// Returns the most recent record for an item strictly before `date`,
    /// within one scope.
    ///
    /// Used to seed opening balances when the immediately prior day was
    /// never reconciled (e.g. the site was closed for a weekend).
    pub async fn previous_before(
        &self,
        item_name: &str,
        date: NaiveDate,
        scope: &Scope,
    ) -> DbResult<Option<StockEntryRecord>> {
        let row: Option<StockRow> = sqlx::query_as(&format!(
            "SELECT {SELECT_COLUMNS} FROM daily_stock \
             WHERE item_name = ?1 AND employee_id = ?2 AND date < ?3 \
             ORDER BY date DESC LIMIT 1"
        ))
        .bind(item_name)
        .bind(scope.storage_key())
        .bind(date)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(StockEntryRecord::from))
    }

    /// Counts records within one scope (for diagnostics).
    pub async fn count(&self, scope: &Scope) -> DbResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM daily_stock WHERE employee_id = ?1")
                .bind(scope.storage_key())
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
