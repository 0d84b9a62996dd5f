//! # Repository Module
//!
//! Repository implementations for database entities.
//!
//! ## Pattern
//! Each repository:
//! - Owns a clone of the connection pool (cheap, shares the real pool)
//! - Exposes async methods returning `DbResult<T>`
//! - Keeps ALL SQL for its table in one place

pub mod stock;

pub use stock::StockRepository;
