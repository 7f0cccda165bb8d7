//! # Carve Scanner
//!
//! Call-site harvesting over a legacy project tree.
//!
//! Given the typed analysis of an extraction unit, the scanner walks the
//! rest of the project and detects textual references to the unit's
//! classes, free functions, and files:
//!
//! ```text
//! project tree ──> walk ──> pattern passes ──> dedup + order ──> CallSite[]
//! ```
//!
//! Detection is deliberately shallow: regex passes with bounded paren
//! matching, no parsing. Anything the passes cannot name with confidence
//! is still recorded, marked low-confidence, for the resolver to place in
//! the unresolved partition.

mod error;
mod patterns;
mod scanner;

pub use error::{Result, ScanError};
pub use patterns::{CallPattern, FileView, PatternContext};
pub use scanner::CallSiteScanner;
