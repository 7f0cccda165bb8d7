//! # Carve Resolver
//!
//! Resolution and inference over scanned call sites:
//!
//! ```text
//! CallSite[] ──> SymbolResolver ──> CallPartition
//!                                        │
//!                                        ├──> ContractInferencer ──> FunctionContract[]
//!                                        └──> frequency::estimate_tiers ──> tiers
//! ```
//!
//! All three stages are deterministic: the partition, the contracts, and
//! the tiers depend only on their inputs, never on traversal order.

mod contracts;
mod frequency;
mod symbols;

pub use contracts::ContractInferencer;
pub use frequency::estimate_tiers;
pub use symbols::SymbolResolver;
