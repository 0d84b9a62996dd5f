//! # Seed Data Generator
//!
//! Populates the database with a few weeks of reconciled daily stock for
//! development.
//!
//! ## Usage
//! ```bash
//! # Seed 14 days (default) into ./data/gasdepot.db
//! cargo run -p gasdepot-db --bin seed
//!
//! # Custom span and database path
//! cargo run -p gasdepot-db --bin seed -- --days 30 --db ./data/dev.db
//! ```
//!
//! ## Generated Data
//! A small cylinder catalog with deterministic pseudo-random daily
//! movement (refills, gas sales, cylinder sales, deposits, returns).
//! Each day is closed with the real engine math and rolled into the
//! next, so the resulting ledger chains exactly like production data.

use chrono::{Duration, Utc};
use std::env;
use tracing::{info, Level};

use gasdepot_core::reconcile::{close_day, OpeningBalances};
use gasdepot_core::types::DailyTotals;
use gasdepot_db::{Database, DbConfig, Scope, StockEntryRecord};

/// Cylinder items seeded into the ledger, with a starting full/empty split.
const CATALOG: &[(&str, i64, i64)] = &[
    ("acme cylinder 12kg", 24, 6),
    ("acme cylinder 45kg", 10, 2),
    ("bharat cylinder 14kg", 18, 9),
    ("prime cylinder 5kg", 30, 0),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let args: Vec<String> = env::args().collect();
    let days = arg_value(&args, "--days")
        .and_then(|v| v.parse::<i64>().ok())
        .unwrap_or(14);
    let db_path = arg_value(&args, "--db").unwrap_or_else(|| "./data/gasdepot.db".to_string());

    info!(days, db = %db_path, "Seeding daily stock ledger");

    let db = Database::new(DbConfig::new(&db_path)).await?;
    let repo = db.stock();

    let start = Utc::now().date_naive() - Duration::days(days);

    for (index, (name, opening_full, opening_empty)) in CATALOG.iter().enumerate() {
        let mut opening = OpeningBalances {
            full: *opening_full,
            empty: *opening_empty,
        };

        for offset in 0..days {
            let date = start + Duration::days(offset);
            let totals = daily_movement(index, offset, opening.full);
            let closing = close_day(opening, &totals);

            let mut record = StockEntryRecord::new(date, *name, &Scope::Site);
            record.opening_full = Some(opening.full);
            record.opening_empty = Some(opening.empty);
            record.refilled = Some(totals.refilled);
            record.cylinder_sales = Some(totals.cylinder_sales_qty);
            record.gas_sales = Some(totals.gas_sales_qty);
            record.deposit_qty = Some(totals.deposit_qty);
            record.return_qty = Some(totals.return_qty);
            record.closing_full = Some(closing.full);
            record.closing_empty = Some(closing.empty);
            repo.upsert(&record).await?;

            // Roll the close forward exactly like the reconciler does
            if let Some(next) = date.succ_opt() {
                let mut seed = StockEntryRecord::new(next, *name, &Scope::Site);
                seed.opening_full = Some(closing.full);
                seed.opening_empty = Some(closing.empty);
                repo.seed_opening(&seed).await?;
            }

            opening = OpeningBalances {
                full: closing.full,
                empty: closing.empty,
            };
        }
    }

    let count = repo.count(&Scope::Site).await?;

    println!();
    println!("✓ Seed complete!");
    println!("  Items:   {}", CATALOG.len());
    println!("  Days:    {days}");
    println!("  Records: {count}");

    db.close().await;
    Ok(())
}

/// Deterministic pseudo-random movement for one item-day.
///
/// Sales never exceed what is plausibly on hand, so the generated ledger
/// stays clamp-free and easy to eyeball.
fn daily_movement(item: usize, offset: i64, on_hand_full: i64) -> DailyTotals {
    let mix = (item as i64 * 31 + offset * 17) % 7;

    DailyTotals {
        refilled: (mix + 1) % 5,
        gas_sales_qty: (mix % 4).min(on_hand_full),
        cylinder_sales_qty: mix % 2,
        deposit_qty: i64::from(mix == 5),
        return_qty: i64::from(mix == 2),
    }
}

/// Returns the value following a `--flag` argument, if present.
fn arg_value(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1))
        .cloned()
}
