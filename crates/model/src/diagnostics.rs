//! Run-level diagnostics accumulated across the pipeline.
//!
//! Partial blindness is expected when analyzing legacy source, so every
//! non-fatal condition lands here instead of interrupting a stage. The list
//! is always emitted alongside the contract, even on a fully clean run.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticCategory {
    /// A source file could not be read or decoded and was skipped.
    SkippedFile,
    /// Multiple definition candidates; a heuristic pick was recorded.
    AmbiguousResolution,
    /// A call site landed in the unresolved partition.
    UnresolvedCall,
    /// Ownership ran without the whole-project document.
    DegradedOwnership,
    /// An upstream section was missing and emitted empty.
    MissingSection,
}

impl DiagnosticCategory {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SkippedFile => "skipped_file",
            Self::AmbiguousResolution => "ambiguous_resolution",
            Self::UnresolvedCall => "unresolved_call",
            Self::DegradedOwnership => "degraded_ownership",
            Self::MissingSection => "missing_section",
        }
    }
}

/// One auditable condition observed during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Diagnostic {
    pub severity: Severity,
    pub category: DiagnosticCategory,
    pub message: String,

    #[serde(default)]
    pub file: Option<String>,

    #[serde(default)]
    pub line: Option<usize>,
}

impl Diagnostic {
    pub fn warning(category: DiagnosticCategory, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Warning,
            category,
            message: message.into(),
            file: None,
            line: None,
        }
    }

    pub fn info(category: DiagnosticCategory, message: impl Into<String>) -> Self {
        Self {
            severity: Severity::Info,
            category,
            message: message.into(),
            file: None,
            line: None,
        }
    }

    #[must_use]
    pub fn at(mut self, file: impl Into<String>, line: Option<usize>) -> Self {
        self.file = Some(file.into());
        self.line = line;
        self
    }
}

/// Ordered accumulator for the run's diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.entries.push(diagnostic);
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.entries.extend(other.entries);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Count of entries in the given category.
    #[must_use]
    pub fn count_of(&self, category: DiagnosticCategory) -> usize {
        self.entries
            .iter()
            .filter(|d| d.category == category)
            .count()
    }
}
