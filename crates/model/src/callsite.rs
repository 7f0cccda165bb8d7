//! Call sites and the resolved/unresolved partition.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::legacy::FunctionDef;

/// Longest caller-line snippet carried on a call site.
pub const MAX_SNIPPET_CHARS: usize = 200;

/// How the scanner matched a call site textually.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum CallKind {
    /// `Class::method(...)`
    StaticCall,
    /// `receiver->method(...)`
    MethodCall,
    /// Bare `function(...)`
    DirectCall,
    /// `include`/`require` of a file inside the unit subtree.
    Include,
}

impl CallKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::StaticCall => "static_call",
            Self::MethodCall => "method_call",
            Self::DirectCall => "direct_call",
            Self::Include => "include",
        }
    }
}

/// Scanner confidence in the detected target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Confidence {
    High,
    Low,
}

/// A location where the extraction unit appears to be invoked or included
/// from outside its own subtree. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CallSite {
    /// Caller file, relative to the project root.
    pub caller_file: String,

    /// 1-indexed line of the call.
    pub caller_line: usize,

    /// Raw matched call text, e.g. `UserRepo::getUser(5)`.
    pub call_expression: String,

    /// Literal target name, or `None` when the target is held in a variable.
    pub target_symbol: Option<String>,

    /// Class qualifier for static-style calls.
    pub target_class: Option<String>,

    /// Argument texts captured by paren-depth counting; nested calls stay
    /// opaque.
    pub argument_texts: Vec<String>,

    pub resolution_confidence: Confidence,

    pub kind: CallKind,

    /// Trimmed caller line, capped at [`MAX_SNIPPET_CHARS`].
    pub snippet: String,
}

impl CallSite {
    /// De-duplication identity: two textual passes reporting the same
    /// expression at the same location count once.
    #[must_use]
    pub fn dedup_key(&self) -> (&str, usize, &str) {
        (&self.caller_file, self.caller_line, &self.call_expression)
    }
}

/// How a resolved call was matched to its definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum MatchKind {
    Exact,
    Heuristic,
}

/// Why a call site could not be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum UnresolvedReason {
    NoDefinition,
    AmbiguousDynamicTarget,
    MultipleCandidates,
}

impl UnresolvedReason {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NoDefinition => "no_definition",
            Self::AmbiguousDynamicTarget => "ambiguous_dynamic_target",
            Self::MultipleCandidates => "multiple_candidates",
        }
    }
}

/// A call site matched to a definition inside the unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ResolvedCall {
    pub call_site: CallSite,
    pub matched_definition: FunctionDef,
    pub match_kind: MatchKind,
}

/// A call site with no usable resolution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct UnresolvedCall {
    pub call_site: CallSite,
    pub reason: UnresolvedReason,
}

/// The total partition of all scanned call sites: every `CallSite` lands in
/// exactly one of the two lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct CallPartition {
    pub resolved: Vec<ResolvedCall>,
    pub unresolved: Vec<UnresolvedCall>,
}

impl CallPartition {
    /// Total number of call sites across both sides.
    #[must_use]
    pub fn total(&self) -> usize {
        self.resolved.len() + self.unresolved.len()
    }
}
