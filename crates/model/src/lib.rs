//! # Carve Model
//!
//! Shared typed model for the call-graph & data-ownership resolver.
//!
//! ## Document flow
//!
//! ```text
//! LegacyAnalysis (unit) ──┐
//! LegacyAnalysis (project)├──> scanner ──> CallSite[]
//!                         │        │
//!                         │        └──> resolver ──> CallPartition
//!                         │                  │
//!                         │                  ├──> FunctionContract[]
//!                         │                  └──> frequency tiers
//!                         └──> ownership ──> TableOwnership[]
//!                                     │
//!                                     └──> assembler ──> ServiceContract
//!                                                        + Diagnostics
//! ```
//!
//! All documents crossing a crate boundary are serde-serializable; the
//! boundary artifacts additionally carry JSON schemas via `schemars`.

mod callsite;
mod contract;
mod diagnostics;
mod error;
mod legacy;

pub use callsite::{
    CallKind, CallPartition, CallSite, Confidence, MatchKind, ResolvedCall, UnresolvedCall,
    UnresolvedReason, MAX_SNIPPET_CHARS,
};
pub use contract::{
    AccessorSource, ContractSummary, FrequencyTier, FunctionContract, OwnershipClass,
    OwnershipConfidence, ServiceContract, TableOwnership,
};
pub use diagnostics::{Diagnostic, DiagnosticCategory, Diagnostics, Severity};
pub use error::{ModelError, Result};
pub use legacy::{AccessKind, FunctionDef, LegacyAnalysis, LineRange, ParamDef, TableAccess};
