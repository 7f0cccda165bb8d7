//! # Carve Ownership
//!
//! Data-ownership classification over every observed table.
//!
//! Independent of the call graph: this crate compares the unit's table
//! accesses against the whole project's and decides, for each table seen
//! in either document, whether the carved-out service can own it, must
//! treat it as read-only, or inherits a write conflict that needs a human
//! decision.

mod classifier;

pub use classifier::classify_tables;
