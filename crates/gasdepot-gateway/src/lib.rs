//! # gasdepot-gateway: Persistence Gateway for GasDepot
//!
//! This crate owns the remote-then-local persistence policy and the
//! reconciliation orchestration built on top of it.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    GasDepot Gateway Layer                               │
//! │                                                                         │
//! │  UI layer (reports, sales entry)                                       │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                gasdepot-gateway (THIS CRATE)                    │   │
//! │  │                                                                 │   │
//! │  │  ReconcileService ──► StockGateway ──► LocalMirror              │   │
//! │  │  (load, aggregate,    (remote first,   (snapshot + outbox       │   │
//! │  │   close, persist,      mirror on        of unsynced writes)     │   │
//! │  │   rollover)            failure)                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  gasdepot-db (daily_stock ledger)                                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Why One Gateway?
//! The reference behavior scattered remote-then-local fallbacks across
//! every call site. Consolidating them here gives a single place for the
//! policy, an explicit online/offline state, and an outbox that replays
//! failed writes on reconnect instead of losing them.
//!
//! ## Modules
//!
//! - [`gateway`] - Remote-preferring reads/writes with mirror fallback
//! - [`mirror`] - In-memory snapshot + outbox of writes awaiting replay
//! - [`service`] - Date-scoped reconciliation passes

// =============================================================================
// Module Declarations
// =============================================================================

pub mod gateway;
pub mod mirror;
pub mod service;

// =============================================================================
// Re-exports
// =============================================================================

pub use gateway::{PersistOutcome, StockGateway, SyncReport};
pub use mirror::{LocalMirror, PendingOp, PendingWrite};
pub use service::{ReconcileReport, ReconcileService};
