//! # gasdepot-db: Database Layer for GasDepot
//!
//! This crate provides database access for the GasDepot stock engine.
//! It uses SQLite for local storage with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       GasDepot Data Flow                                │
//! │                                                                         │
//! │  ReconcileService (gasdepot-gateway)                                   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    gasdepot-db (THIS CRATE)                     │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌─────────────────┐   ┌──────────────┐  │   │
//! │  │   │   Database    │    │  StockRepository │   │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │  (merge-upsert,  │   │  (embedded)  │  │   │
//! │  │   │               │◄───│   opening-seed,  │   │              │  │   │
//! │  │   │ SqlitePool    │    │   list/previous) │   │ 001_daily_   │  │   │
//! │  │   │ Management    │    │                  │   │  stock.sql   │  │   │
//! │  │   └───────────────┘    └─────────────────┘   └──────────────┘  │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database (daily_stock ledger)                                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`record`] - The wire/storage record shape and reconciliation scopes
//! - [`repository`] - Repository implementation for daily_stock
//!
//! ## Usage
//!
//! ```rust,ignore
//! use gasdepot_db::{Database, DbConfig, Scope};
//!
//! let db = Database::new(DbConfig::new("path/to/gasdepot.db")).await?;
//! let entries = db.stock().list_for_date(date, &Scope::Site).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod record;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use record::{Scope, StockEntryRecord};
pub use repository::StockRepository;
