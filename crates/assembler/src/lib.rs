//! # Carve Assembler
//!
//! Final merge stage and the pipeline entry point.
//!
//! ```text
//! LegacyAnalysis (unit) ──> scan ──> resolve ──> infer ──┐
//!                                         │              ├──> assemble
//!                                         └──> tier ─────┤
//! LegacyAnalysis (project) ──> classify ─────────────────┘
//! ```
//!
//! The assembler itself is a pure merge; [`Pipeline`] wires the stages for
//! callers that want the whole chain in one call.

mod assemble;
mod error;
mod pipeline;

pub use assemble::assemble;
pub use error::{PipelineError, Result};
pub use pipeline::{Pipeline, PipelineOutput};
