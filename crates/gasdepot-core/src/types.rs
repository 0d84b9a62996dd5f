//! # Domain Types
//!
//! Core domain types for the GasDepot stock reconciliation engine.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌──────────────────┐   ┌──────────────────┐    │
//! │  │      Item       │   │ DailyStockEntry  │   │   DailyTotals    │    │
//! │  │  ─────────────  │   │  ──────────────  │   │  ──────────────  │    │
//! │  │  id (UUID)      │   │  date            │   │  refilled        │    │
//! │  │  name           │   │  item_key        │   │  gas_sales_qty   │    │
//! │  │  category       │   │  opening_full/   │   │  cylinder_sales  │    │
//! │  │  cylinder_size  │   │   empty          │   │  deposit_qty     │    │
//! │  │  cylinder_status│   │  closing_full/   │   │  return_qty      │    │
//! │  └─────────────────┘   │   empty          │   └──────────────────┘    │
//! │                        └──────────────────┘                            │
//! │                                                                         │
//! │  Transactions (read-only snapshots from upstream):                     │
//! │  GasSaleLine · CylinderTxRecord · RefillRecord                         │
//! │                                                                         │
//! │  Transient (never persisted):                                          │
//! │  CartLine — one unsaved order line feeding the reservation math        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Transactions reference items by display name and, where available, by a
//! stable catalog id ([`ItemRef`]). Names drift (renames, stray spaces), so
//! ids are preferred for matching, with the normalized name as fallback.
//!
//! ## Why Closed Enums?
//! The reference behavior dispatched on raw strings ("gas"/"cylinder",
//! "full"/"empty"). Representing these as closed tagged variants makes
//! every new category a compile-time-visible change, with exhaustive
//! matching in the aggregator and reservation calculator.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::normalize::ItemKey;

// =============================================================================
// Category / Size / Status
// =============================================================================

/// Product category: the two pools the engine reconciles across.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ItemCategory {
    /// Bulk gas sold by quantity; each sold unit empties a full cylinder.
    Gas,
    /// A physical cylinder unit, tracked as full or empty.
    Cylinder,
}

/// Physical cylinder size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum CylinderSize {
    Large,
    Small,
}

/// Fill state of a cylinder: distinct inventory pools for one physical item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum CylinderStatus {
    Empty,
    Full,
}

// =============================================================================
// Item / ItemRef
// =============================================================================

/// A catalog product.
///
/// Items are owned by the external catalog; the engine treats them as
/// read-only reference data looked up by id or normalized name.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name shown in the catalog and on reports.
    pub name: String,

    /// Product category.
    pub category: ItemCategory,

    /// Cylinder size, when the item is (or maps to) a cylinder.
    pub cylinder_size: Option<CylinderSize>,

    /// Set when the item denotes a specific cylinder state
    /// (e.g. "Acme 12kg (empty)" as its own catalog row).
    pub cylinder_status: Option<CylinderStatus>,
}

impl Item {
    /// Returns the item's normalized lookup key.
    #[inline]
    pub fn key(&self) -> ItemKey {
        crate::normalize::normalize(&self.name)
    }

    /// Returns a reference carrying both the stable id and the name.
    pub fn item_ref(&self) -> ItemRef {
        ItemRef {
            id: Some(self.id.clone()),
            name: self.name.clone(),
        }
    }
}

/// A reference to an item as it appears inside a transaction snapshot.
///
/// Upstream records always carry a display name; the stable catalog id is
/// present only when the recording system knew it. Matching prefers the id
/// and falls back to the normalized name (see `normalize::same_item`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ItemRef {
    /// Stable catalog id, when known.
    pub id: Option<String>,

    /// Display name as spelled by the upstream system.
    pub name: String,
}

impl ItemRef {
    /// Builds a reference from a display name only.
    pub fn named(name: impl Into<String>) -> Self {
        ItemRef {
            id: None,
            name: name.into(),
        }
    }

    /// Builds a reference carrying a stable id and a display name.
    pub fn with_id(id: impl Into<String>, name: impl Into<String>) -> Self {
        ItemRef {
            id: Some(id.into()),
            name: name.into(),
        }
    }

    /// Returns the normalized lookup key for this reference.
    #[inline]
    pub fn key(&self) -> ItemKey {
        crate::normalize::normalize(&self.name)
    }
}

// =============================================================================
// Daily Totals
// =============================================================================

/// Per-item movement totals for one calendar day.
///
/// Produced by the aggregator, consumed by the reconciler. All counts are
/// non-negative; invalid upstream quantities are sanitized to zero before
/// they reach this type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DailyTotals {
    /// Empty cylinders converted to full during the day.
    pub refilled: i64,

    /// Gas sales attributed to this item (a gas sale empties a full cylinder).
    pub gas_sales_qty: i64,

    /// Cylinder units sold.
    pub cylinder_sales_qty: i64,

    /// Cylinder units that left the site as purchase deposits.
    pub deposit_qty: i64,

    /// Cylinder units returned into the site's possession.
    pub return_qty: i64,
}

impl DailyTotals {
    /// True when no movement was recorded.
    pub fn is_empty(&self) -> bool {
        *self == DailyTotals::default()
    }
}

// =============================================================================
// Daily Stock Entry
// =============================================================================

/// The reconciled record for one item on one calendar date.
///
/// ## Lifecycle
/// Created/updated by the reconciler whenever its date is processed. The
/// next day's entry is created as a side effect of rollover: its openings
/// are seeded from this day's closings, but only while not already
/// explicitly set for that future day.
///
/// ## Why `Option` Openings?
/// A loaded entry may exist without explicit openings (e.g. created by an
/// aggregation pass before any prior day closed). `None` means "not set" —
/// the reconciler then falls back to the prior day's closing, then to 0 —
/// which is a different thing from an explicit zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DailyStockEntry {
    /// Calendar day, no time component.
    #[ts(as = "String")]
    pub date: NaiveDate,

    /// Normalized item key (the join key across all sources).
    pub item_key: ItemKey,

    /// Stable catalog id, when known.
    pub item_id: Option<String>,

    /// Opening full-cylinder count, when explicitly set.
    pub opening_full: Option<i64>,

    /// Opening empty-cylinder count, when explicitly set.
    pub opening_empty: Option<i64>,

    /// During-the-day movement.
    pub refilled: i64,
    pub cylinder_sales_qty: i64,
    pub gas_sales_qty: i64,
    pub deposit_qty: i64,
    pub return_qty: i64,

    /// Closing full-cylinder count; present once the day is reconciled.
    pub closing_full: Option<i64>,

    /// Closing empty-cylinder count; present once the day is reconciled.
    pub closing_empty: Option<i64>,
}

impl DailyStockEntry {
    /// Creates an empty (no movement, nothing set) entry for a date/key.
    pub fn new(date: NaiveDate, item_key: ItemKey) -> Self {
        DailyStockEntry {
            date,
            item_key,
            item_id: None,
            opening_full: None,
            opening_empty: None,
            refilled: 0,
            cylinder_sales_qty: 0,
            gas_sales_qty: 0,
            deposit_qty: 0,
            return_qty: 0,
            closing_full: None,
            closing_empty: None,
        }
    }

    /// Returns the day's movement as [`DailyTotals`].
    pub fn totals(&self) -> DailyTotals {
        DailyTotals {
            refilled: self.refilled,
            gas_sales_qty: self.gas_sales_qty,
            cylinder_sales_qty: self.cylinder_sales_qty,
            deposit_qty: self.deposit_qty,
            return_qty: self.return_qty,
        }
    }

    /// True once both closing balances have been computed.
    pub fn is_reconciled(&self) -> bool {
        self.closing_full.is_some() && self.closing_empty.is_some()
    }
}

// =============================================================================
// Transaction Records
// =============================================================================

/// A gas sale line from the sales snapshot.
///
/// `cylinder` names the specific full cylinder the gas was filled from, if
/// the upstream system recorded it. The aggregator attributes the sale to
/// that cylinder (the unit it depletes), falling back to the gas item.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct GasSaleLine {
    pub item: ItemRef,

    /// Raw upstream quantity; sanitized during aggregation.
    #[serde(default)]
    pub quantity: f64,

    /// The full cylinder this sale is filled from, if applicable.
    pub cylinder: Option<ItemRef>,

    #[ts(as = "String")]
    pub sold_at: DateTime<Utc>,
}

/// What kind of cylinder movement a [`CylinderTxRecord`] represents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CylinderTxKind {
    /// A cylinder unit sold in the given fill state. Selling a *full*
    /// cylinder swaps in gas from `gas`; that consumption is tracked via
    /// the cylinder's own daily entry and never double-counted as a gas
    /// sale.
    Sale {
        status: CylinderStatus,
        gas: Option<ItemRef>,
    },

    /// A unit leaving the site's possession as part of a purchase.
    Deposit,

    /// A unit coming back into the site's possession.
    Return,
}

/// A cylinder transaction (sale, deposit, or return) from the snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CylinderTxRecord {
    pub item: ItemRef,

    /// Raw upstream quantity; sanitized during aggregation.
    #[serde(default)]
    pub quantity: f64,

    pub kind: CylinderTxKind,

    #[ts(as = "String")]
    pub recorded_at: DateTime<Utc>,
}

/// A refill: empty cylinders converted to full.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RefillRecord {
    pub cylinder: ItemRef,

    /// Raw upstream quantity; sanitized during aggregation.
    #[serde(default)]
    pub quantity: f64,

    #[ts(as = "String")]
    pub refilled_at: DateTime<Utc>,
}

// =============================================================================
// Cart Line
// =============================================================================

/// One unsaved line of the sale being built.
///
/// Exists only while an order is entered; discarded on submit or cancel.
/// Never persisted — the reservation calculator reads the current line
/// list to compute soft holds before a new line is accepted.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub category: ItemCategory,
    pub item: ItemRef,
    pub quantity: i64,

    /// Fill state being sold, for cylinder lines.
    pub cylinder_status: Option<CylinderStatus>,

    /// For gas lines: the full cylinder consumed at submit time.
    pub linked_cylinder: Option<ItemRef>,

    /// For full-cylinder lines: the gas product swapped in.
    pub linked_gas: Option<ItemRef>,
}

// =============================================================================
// Unit Tests
// =============================================================================
