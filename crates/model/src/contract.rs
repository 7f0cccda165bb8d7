//! Contract-side output types: per-function contracts, table ownership,
//! frequency tiers, and the final service contract document.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::legacy::ParamDef;

/// The preserved input/output contract of one resolved target function,
/// folded together from its definition and every observed caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FunctionContract {
    pub function_name: String,

    #[serde(default)]
    pub containing_class: Option<String>,

    /// Declared parameters, copied verbatim from the definition. Call-site
    /// evidence never alters declared inputs.
    pub input_parameters: Vec<ParamDef>,

    /// Most specific return-shape hint observed so far, if any.
    #[serde(default)]
    pub output_type_hint: Option<String>,

    /// Union of result fields any caller was seen to access. Empty means
    /// downstream generation must preserve all known output fields.
    pub fields_used_by_callers: BTreeSet<String>,

    /// Plain sum of resolved calls to this function, not de-duplicated per
    /// file.
    pub call_count: usize,

    /// Distinct files containing at least one caller.
    pub caller_files: BTreeSet<String>,
}

impl FunctionContract {
    /// Canonical `Class::name` (or bare `name`) key for this contract.
    #[must_use]
    pub fn target_key(&self) -> String {
        match &self.containing_class {
            Some(class) => format!("{class}::{}", self.function_name),
            None => self.function_name.clone(),
        }
    }
}

/// Relative call-volume bucket used to prioritize resilience budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum FrequencyTier {
    Hot,
    Warm,
    Cold,
}

impl FrequencyTier {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hot => "hot",
            Self::Warm => "warm",
            Self::Cold => "cold",
        }
    }
}

/// Which side of the extraction boundary an access came from.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum AccessorSource {
    Unit,
    RestOfProject,
}

/// Ownership classification for a table, relative to the unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum OwnershipClass {
    Owned,
    ReadOnly,
    SharedConflict,
}

impl OwnershipClass {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Owned => "owned",
            Self::ReadOnly => "read_only",
            Self::SharedConflict => "shared_conflict",
        }
    }
}

/// Whether the classification could be cross-checked against the whole
/// project. `Unverified` means the project-wide document was unavailable and
/// conflicts could not be detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum OwnershipConfidence {
    Verified,
    Unverified,
}

/// Ownership evidence and classification for one observed table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TableOwnership {
    pub table_name: String,

    /// Sides observed writing the table.
    pub writers: BTreeSet<AccessorSource>,

    /// Sides observed reading the table.
    pub readers: BTreeSet<AccessorSource>,

    pub classification: OwnershipClass,

    pub confidence: OwnershipConfidence,
}

/// Headline counts for a contract document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ContractSummary {
    pub function_contracts: usize,
    pub resolved_calls: usize,
    pub unresolved_calls: usize,
    pub files_affected: usize,
    pub tables_owned: usize,
    pub tables_read_only: usize,
    pub tables_shared_conflict: usize,
}

/// The boundary artifact handed to the downstream code generator. Written
/// once per run; consumers treat it as immutable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ServiceContract {
    pub unit_name: String,

    /// Opaque transport hint supplied by the caller, never interpreted here.
    pub transport_hint: String,

    pub function_contracts: Vec<FunctionContract>,

    pub table_ownership: Vec<TableOwnership>,

    /// `Class::name` (or bare name) → tier.
    pub frequency_tiers: BTreeMap<String, FrequencyTier>,

    pub summary: ContractSummary,
}
