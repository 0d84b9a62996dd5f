//! # Name Normalizer
//!
//! Canonicalizes item display names into stable lookup keys.
//!
//! ## Why a Single Join-Key Function?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                   Item Identity Across Sources                          │
//! │                                                                         │
//! │  Gas sale line:        " Acme  Gas "                                   │
//! │  Cylinder transaction: "ACME GAS"                                      │
//! │  Catalog product:      "Acme Gas"                                      │
//! │  Persisted entry:      "acme gas"                                      │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  normalize() ──► ItemKey("acme gas")  ← the ONE equality               │
//! │                                                                         │
//! │  Upstream systems spell the same item inconsistently (extra spaces,    │
//! │  mixed case). Every aggregation and matching key passes through this   │
//! │  function; it is the only place identity ambiguity is resolved.        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! An empty key means "unidentified": the aggregator and reconciler skip
//! such records instead of silently lumping them together.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::types::ItemRef;

// =============================================================================
// Item Key
// =============================================================================

/// A normalized item lookup key.
///
/// Produced exclusively by [`normalize`]; two keys compare equal exactly
/// when the underlying display names denote the same item. Ordered so that
/// reconciliation output is deterministic.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS,
)]
#[serde(transparent)]
#[ts(export)]
pub struct ItemKey(String);

impl ItemKey {
    /// Returns the key as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// An empty key marks a record whose item could not be identified.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for ItemKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// Normalization
// =============================================================================

/// Canonicalizes a raw display name into an [`ItemKey`].
///
/// ## Behavior
/// - Trims leading/trailing whitespace
/// - Collapses internal whitespace runs to a single space
/// - Lowercases
///
/// Empty or whitespace-only input yields the empty key.
///
/// ## Example
/// ```rust
/// use gasdepot_core::normalize::normalize;
///
/// assert_eq!(normalize(" Acme  Gas "), normalize("acme gas"));
/// assert!(normalize("   ").is_empty());
/// ```
pub fn normalize(raw: &str) -> ItemKey {
    let collapsed = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    ItemKey(collapsed.to_lowercase())
}

/// Tests whether two item references denote the same item.
///
/// ## Matching Order
/// 1. Stable id, when both sides carry one (survives catalog renames)
/// 2. Normalized name otherwise (empty keys never match anything)
pub fn same_item(a: &ItemRef, b: &ItemRef) -> bool {
    if let (Some(left), Some(right)) = (&a.id, &b.id) {
        return left == right;
    }

    let (left, right) = (normalize(&a.name), normalize(&b.name));
    !left.is_empty() && left == right
}

// =============================================================================
// Unit Tests
// =============================================================================
