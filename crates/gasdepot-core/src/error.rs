//! # Error Types
//!
//! Domain-specific error types for gasdepot-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  gasdepot-core errors (this file)                                      │
//! │  ├── EngineError      - Reconciliation/reservation failures            │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  gasdepot-db errors (separate crate)                                   │
//! │  └── DbError          - Database operation failures                    │
//! │                                                                         │
//! │  Flow: ValidationError → EngineError → DbError → UI layer              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Include context in error messages (item name, counts, etc.)
//! 3. Errors are enum variants, never String
//! 4. Each error variant maps to a user-facing message
//!
//! None of these errors is fatal to the surrounding application: a
//! stock-insufficient result rejects one cart line, a validation failure
//! rejects one input field, and persistence failures never reach this
//! enum at all (they degrade to the local mirror in gasdepot-gateway).

use thiserror::Error;

// =============================================================================
// Engine Error
// =============================================================================

/// Reconciliation and reservation errors.
///
/// These errors represent business rule violations. They should be caught
/// and translated to user-friendly messages by the UI layer.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Requested quantity exceeds what is left after soft reservations.
    ///
    /// ## When This Occurs
    /// - A cart line is added (or its quantity raised) beyond
    ///   `authoritative available − reserved by other unsaved lines`
    ///
    /// ## User Workflow
    /// ```text
    /// Add line "Cylinder A (full)" qty 1
    ///      │
    ///      ▼
    /// available=2, reserved by cart=2 → remaining=0
    ///      │
    ///      ▼
    /// InsufficientStock { item: "cylinder a", remaining: 0, requested: 1 }
    ///      │
    ///      ▼
    /// UI shows: "Only 0 cylinder a left (2 held by this order)"
    /// ```
    #[error(
        "Insufficient stock for {item}: available {available}, reserved {reserved}, \
         remaining {remaining}, requested {requested}"
    )]
    InsufficientStock {
        item: String,
        available: i64,
        reserved: i64,
        remaining: i64,
        requested: i64,
    },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when user input doesn't meet requirements.
/// Used for early validation before reconciliation math runs or a
/// persistence attempt is made.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must be zero or greater (stock levels, closing balances).
    #[error("{field} must not be negative")]
    MustBeNonNegative { field: String },

    /// Invalid format (e.g., invalid UUID).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Convenience type alias for Results with EngineError.
pub type EngineResult<T> = Result<T, EngineError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = EngineError::InsufficientStock {
            item: "acme gas".to_string(),
            available: 5,
            reserved: 3,
            remaining: 2,
            requested: 4,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for acme gas: available 5, reserved 3, remaining 2, requested 4"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        let err = ValidationError::Required {
            field: "item name".to_string(),
        };
        assert_eq!(err.to_string(), "item name is required");

        let err = ValidationError::MustBeNonNegative {
            field: "closing full".to_string(),
        };
        assert_eq!(err.to_string(), "closing full must not be negative");
    }

    #[test]
    fn test_validation_converts_to_engine_error() {
        let validation_err = ValidationError::MustBePositive {
            field: "quantity".to_string(),
        };
        let engine_err: EngineError = validation_err.into();
        assert!(matches!(engine_err, EngineError::Validation(_)));
    }
}
