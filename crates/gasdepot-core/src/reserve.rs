//! # Reservation Calculator
//!
//! Computes how much of an item's stock is already claimed by the unsaved
//! lines of the cart being built, so availability checks can subtract
//! these soft holds before a new line is accepted.
//!
//! ## Why Soft Reservations?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │              The Over-Sell Problem This Solves                          │
//! │                                                                         │
//! │  Authoritative available stock for "Cylinder A" (full): 2             │
//! │                                                                         │
//! │  Line 1: gas sale, qty 2, filled from Cylinder A   ← holds 2 fulls    │
//! │  Line 2: sell Cylinder A (full), qty 1             ← needs 1 full     │
//! │                                                                         │
//! │  Each line is individually under the ceiling, but together they        │
//! │  oversell. reserved() makes line 2 see:                                │
//! │      available(2) − reserved(2) = 0 remaining → REJECTED               │
//! │                                                                         │
//! │  Cross-item dependencies both ways:                                    │
//! │  • a gas line consumes a FULL cylinder at submit time                  │
//! │  • a full-cylinder line consumes gas from its linked gas product       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The calculator never mutates persisted state: it reads only the
//! transient `CartLine` list and the externally supplied authoritative
//! available count. Checks happen at line entry, not at submit time.

use crate::error::{EngineError, EngineResult};
use crate::normalize::same_item;
use crate::types::{CartLine, CylinderStatus, ItemCategory, ItemRef};

// =============================================================================
// Stock Query
// =============================================================================

/// What availability is being asked about.
#[derive(Debug, Clone)]
pub enum StockQuery {
    /// Gas units of the given gas product.
    Gas { item: ItemRef },

    /// Cylinder units of the given item in the given fill state.
    Cylinder {
        item: ItemRef,
        status: CylinderStatus,
    },
}

impl StockQuery {
    fn item(&self) -> &ItemRef {
        match self {
            StockQuery::Gas { item } => item,
            StockQuery::Cylinder { item, .. } => item,
        }
    }
}

// =============================================================================
// Reservation Math
// =============================================================================

/// Sums the quantity already claimed by cart lines for the queried
/// item/status, cross-references included.
///
/// ## Rules (summed over all existing lines)
/// - A gas line for the queried gas item reserves gas.
/// - A gas line whose linked cylinder is the queried full-cylinder item
///   reserves that cylinder (the sale consumes a full at submit time).
/// - A cylinder line matching item and status reserves that status.
/// - A full-cylinder line whose linked gas is the queried gas item
///   reserves that gas.
pub fn reserved(cart: &[CartLine], query: &StockQuery) -> i64 {
    cart.iter()
        .map(|line| match (line.category, query) {
            (ItemCategory::Gas, StockQuery::Gas { item }) => {
                if same_item(&line.item, item) {
                    line.quantity
                } else {
                    0
                }
            }

            (ItemCategory::Gas, StockQuery::Cylinder { item, status }) => {
                let consumes_full = *status == CylinderStatus::Full
                    && line
                        .linked_cylinder
                        .as_ref()
                        .is_some_and(|cylinder| same_item(cylinder, item));
                if consumes_full {
                    line.quantity
                } else {
                    0
                }
            }

            (ItemCategory::Cylinder, StockQuery::Cylinder { item, status }) => {
                if line.cylinder_status == Some(*status) && same_item(&line.item, item) {
                    line.quantity
                } else {
                    0
                }
            }

            (ItemCategory::Cylinder, StockQuery::Gas { item }) => {
                let consumes_gas = line.cylinder_status == Some(CylinderStatus::Full)
                    && line
                        .linked_gas
                        .as_ref()
                        .is_some_and(|gas| same_item(gas, item));
                if consumes_gas {
                    line.quantity
                } else {
                    0
                }
            }
        })
        .sum()
}

/// Units still available after subtracting soft reservations, clamped ≥ 0.
pub fn available_stock(authoritative: i64, cart: &[CartLine], query: &StockQuery) -> i64 {
    (authoritative - reserved(cart, query)).max(0)
}

/// Validates a requested line quantity against `available − reserved`.
///
/// Must run BEFORE the line is added to the cart (the cart passed here is
/// the set of *other* lines). Returns a stock-insufficient error carrying
/// the counts the UI surfaces to the user.
pub fn check_line(
    authoritative: i64,
    cart: &[CartLine],
    query: &StockQuery,
    requested: i64,
) -> EngineResult<()> {
    let held = reserved(cart, query);
    let remaining = (authoritative - held).max(0);

    if requested > remaining {
        return Err(EngineError::InsufficientStock {
            item: query.item().key().to_string(),
            available: authoritative,
            reserved: held,
            remaining,
            requested,
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn gas_line(name: &str, qty: i64, cylinder: Option<&str>) -> CartLine {
        CartLine {
            category: ItemCategory::Gas,
            item: ItemRef::named(name),
            quantity: qty,
            cylinder_status: None,
            linked_cylinder: cylinder.map(ItemRef::named),
            linked_gas: None,
        }
    }

    fn cylinder_line(
        name: &str,
        qty: i64,
        status: CylinderStatus,
        gas: Option<&str>,
    ) -> CartLine {
        CartLine {
            category: ItemCategory::Cylinder,
            item: ItemRef::named(name),
            quantity: qty,
            cylinder_status: Some(status),
            linked_cylinder: None,
            linked_gas: gas.map(ItemRef::named),
        }
    }

    fn full_query(name: &str) -> StockQuery {
        StockQuery::Cylinder {
            item: ItemRef::named(name),
            status: CylinderStatus::Full,
        }
    }

    #[test]
    fn test_gas_line_reserves_gas() {
        let cart = vec![gas_line("Acme Gas", 3, None)];
        let query = StockQuery::Gas {
            item: ItemRef::named("acme gas"),
        };
        assert_eq!(reserved(&cart, &query), 3);
    }

    #[test]
    fn test_gas_line_reserves_linked_full_cylinder() {
        let cart = vec![gas_line("Acme Gas", 2, Some("Cylinder A"))];

        assert_eq!(reserved(&cart, &full_query("Cylinder A")), 2);

        // Empty pool of the same cylinder is untouched
        let empty_query = StockQuery::Cylinder {
            item: ItemRef::named("Cylinder A"),
            status: CylinderStatus::Empty,
        };
        assert_eq!(reserved(&cart, &empty_query), 0);
    }

    #[test]
    fn test_cylinder_line_reserves_matching_status() {
        let cart = vec![cylinder_line("Cylinder A", 4, CylinderStatus::Empty, None)];

        let empty_query = StockQuery::Cylinder {
            item: ItemRef::named("cylinder a"),
            status: CylinderStatus::Empty,
        };
        assert_eq!(reserved(&cart, &empty_query), 4);
        assert_eq!(reserved(&cart, &full_query("cylinder a")), 0);
    }

    #[test]
    fn test_full_cylinder_line_reserves_linked_gas() {
        let cart = vec![cylinder_line(
            "Cylinder A",
            2,
            CylinderStatus::Full,
            Some("Acme Gas"),
        )];
        let query = StockQuery::Gas {
            item: ItemRef::named("Acme Gas"),
        };
        assert_eq!(reserved(&cart, &query), 2);
    }

    #[test]
    fn test_empty_cylinder_line_does_not_reserve_gas() {
        let cart = vec![cylinder_line(
            "Cylinder A",
            2,
            CylinderStatus::Empty,
            Some("Acme Gas"),
        )];
        let query = StockQuery::Gas {
            item: ItemRef::named("Acme Gas"),
        };
        assert_eq!(reserved(&cart, &query), 0);
    }

    #[test]
    fn test_check_line_rejects_oversell() {
        // Worked example: gas line for 2 units linked to Cylinder A;
        // authoritative full stock for Cylinder A is 2 → adding a
        // full-cylinder sale line for qty 1 must be rejected
        let cart = vec![gas_line("Cylinder A", 2, Some("Cylinder A"))];
        let query = full_query("Cylinder A");

        let err = check_line(2, &cart, &query, 1).unwrap_err();
        match err {
            EngineError::InsufficientStock {
                available,
                reserved,
                remaining,
                requested,
                ..
            } => {
                assert_eq!(available, 2);
                assert_eq!(reserved, 2);
                assert_eq!(remaining, 0);
                assert_eq!(requested, 1);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_check_line_accepts_within_remaining() {
        let cart = vec![gas_line("Cylinder A", 1, Some("Cylinder A"))];
        assert!(check_line(3, &cart, &full_query("Cylinder A"), 2).is_ok());
    }

    #[test]
    fn test_cart_never_double_spends() {
        // Lines individually under the ceiling must collectively respect it
        let available = 5;
        let mut cart: Vec<CartLine> = Vec::new();
        let query = full_query("Cylinder A");

        for _ in 0..5 {
            if check_line(available, &cart, &query, 1).is_ok() {
                cart.push(cylinder_line("Cylinder A", 1, CylinderStatus::Full, None));
            }
        }
        assert!(check_line(available, &cart, &query, 1).is_err());

        let held: i64 = cart.iter().map(|l| l.quantity).sum();
        assert!(held <= available);
    }

    #[test]
    fn test_available_stock_clamps_to_zero() {
        let cart = vec![cylinder_line("Cylinder A", 9, CylinderStatus::Full, None)];
        assert_eq!(available_stock(4, &cart, &full_query("Cylinder A")), 0);
    }
}
