//! # gasdepot-core: Pure Reconciliation Logic for GasDepot
//!
//! This crate is the **heart** of the GasDepot stock engine. It contains
//! all reconciliation and reservation logic as pure functions with zero
//! I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      GasDepot Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │              Dashboard / Reports / Sales Entry (JS)             │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                gasdepot-gateway (orchestration)                 │   │
//! │  │    ReconcileService, StockGateway, offline mirror               │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ gasdepot-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │  ┌───────────┐ ┌───────────┐ ┌───────────┐ ┌───────────────┐  │   │
//! │  │  │ normalize │ │ aggregate │ │ reconcile │ │    reserve    │  │   │
//! │  │  │  ItemKey  │ │DailyTotals│ │ close_day │ │ soft holds on │  │   │
//! │  │  │ same_item │ │ by key+id │ │ rollover  │ │ unsaved lines │  │   │
//! │  │  └───────────┘ └───────────┘ └───────────┘ └───────────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                  gasdepot-db (daily_stock ledger)               │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Item, DailyStockEntry, transactions, CartLine)
//! - [`normalize`] - The single join-key function for item identity
//! - [`aggregate`] - Transaction streams → per-item daily totals
//! - [`reconcile`] - Opening + movement → closing balances, rollover
//! - [`reserve`] - Soft reservations held by unsaved cart lines
//! - [`error`] - Domain error types
//! - [`validation`] - Input rule validation
//!
//! ## Design Principles
//!
//! 1. **Pure Functions**: Every function is deterministic - same input = same output
//! 2. **No I/O**: Database, network, file system access is FORBIDDEN here
//! 3. **Integer Stock**: Balances are whole units (i64); raw upstream
//!    quantities are sanitized once, at the aggregation boundary
//! 4. **Explicit Errors**: All errors are typed, never strings or panics
//!
//! ## Example Usage
//!
//! ```rust
//! use gasdepot_core::reconcile::{close_day, OpeningBalances};
//! use gasdepot_core::types::DailyTotals;
//!
//! let closing = close_day(
//!     OpeningBalances { full: 10, empty: 5 },
//!     &DailyTotals {
//!         refilled: 3,
//!         gas_sales_qty: 4,
//!         cylinder_sales_qty: 1,
//!         deposit_qty: 0,
//!         return_qty: 0,
//!     },
//! );
//!
//! // full: 10 + 3 − 4 = 9; total units: 15 − 1 = 14; empty: 14 − 9 = 5
//! assert_eq!((closing.full, closing.empty), (9, 5));
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod aggregate;
pub mod error;
pub mod normalize;
pub mod reconcile;
pub mod reserve;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================
// These allow users to do `use gasdepot_core::ItemKey` instead of
// `use gasdepot_core::normalize::ItemKey`

pub use aggregate::{aggregate, AggregateOutcome};
pub use error::{EngineError, EngineResult, ValidationError};
pub use normalize::{normalize, same_item, ItemKey};
pub use reconcile::{close_day, reconcile, ClosingBalances, OpeningBalances, ReconcileOutcome};
pub use reserve::{available_stock, check_line, reserved, StockQuery};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum quantity of a single cart line
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
/// Configurable per-site in future versions.
pub const MAX_LINE_QUANTITY: i64 = 999;

/// Maximum lines allowed in a single unsaved cart
///
/// ## Business Reason
/// Prevents runaway carts and ensures reasonable order sizes.
pub const MAX_CART_LINES: usize = 100;
