//! Domain model for tiered eligibility.
//!
//! # Responsibility
//! - Define principals, gated catalog items and time-bound tasks.
//! - Keep tier classification rules next to the data they classify.
//!
//! # Invariants
//! - Every record is identified by a stable UUID.
//! - Model types are read-only projections of the backing store.

pub mod catalog;
pub mod principal;
pub mod task;
