//! The pre-computed legacy analysis document consumed by every stage.
//!
//! One document exists per scanned unit (submodule) and one for the whole
//! project. Both are produced by the external lexical analyzer and are
//! read-only inputs: the resolver never mutates them.

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use crate::error::{ModelError, Result};

/// Inclusive line range of a definition (1-indexed).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct LineRange {
    pub start: usize,
    pub end: usize,
}

/// A declared parameter of a legacy function or method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ParamDef {
    /// Parameter name without any sigil.
    pub name: String,

    /// Type inferred by the source lexer, when it managed to infer one.
    #[serde(default)]
    pub inferred_type: Option<String>,
}

/// A function or method definition inside the analyzed subtree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct FunctionDef {
    /// Function or method name.
    pub name: String,

    /// Class the definition belongs to, absent for free functions.
    #[serde(default)]
    pub containing_class: Option<String>,

    /// Declared parameter list, in declaration order.
    #[serde(default)]
    pub params: Vec<ParamDef>,

    /// File the definition lives in, relative to the analyzed root.
    pub file: String,

    /// Line range of the definition.
    pub line_range: LineRange,
}

impl FunctionDef {
    /// Canonical `Class::name` (or bare `name`) key for this definition.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        match &self.containing_class {
            Some(class) => format!("{class}::{}", self.name),
            None => self.name.clone(),
        }
    }
}

/// Whether a table access reads or writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AccessKind {
    Read,
    Write,
}

impl AccessKind {
    /// Parse an operation label. The external analyzer emits either the
    /// normalized `read`/`write` form or the raw SQL verb it observed.
    pub fn parse(label: &str) -> Option<Self> {
        match label.to_ascii_lowercase().as_str() {
            "read" | "select" => Some(Self::Read),
            "write" | "insert" | "update" | "delete" => Some(Self::Write),
            _ => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Read => "read",
            Self::Write => "write",
        }
    }
}

impl<'de> Deserialize<'de> for AccessKind {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let label = String::deserialize(deserializer)?;
        Self::parse(&label).ok_or_else(|| {
            serde::de::Error::custom(format!("unknown table operation: {label:?}"))
        })
    }
}

/// A single observed database table access.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TableAccess {
    /// Table name (normalized to lowercase on load).
    pub table: String,

    pub operation: AccessKind,

    /// File the access was observed in.
    pub file: String,

    /// Line of the access, when the analyzer recorded one.
    #[serde(default)]
    pub line: Option<usize>,
}

/// The legacy analysis document: function definitions plus table accesses
/// for one scanned subtree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct LegacyAnalysis {
    pub functions: Vec<FunctionDef>,
    pub table_accesses: Vec<TableAccess>,
}

impl LegacyAnalysis {
    /// Parse and validate a document from raw JSON.
    ///
    /// A structurally invalid document is the one fatal condition in the
    /// pipeline: no meaningful partial analysis is possible without it.
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let mut analysis: Self = serde_json::from_str(raw)?;
        analysis.validate()?;
        analysis.normalize();
        Ok(analysis)
    }

    /// Load a document from a file on disk.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ModelError::ReadDocument {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&raw)
    }

    fn validate(&self) -> Result<()> {
        for (idx, def) in self.functions.iter().enumerate() {
            if def.name.is_empty() {
                return Err(ModelError::InvalidAnalysis(format!(
                    "functions[{idx}] has an empty name"
                )));
            }
            if def.file.is_empty() {
                return Err(ModelError::InvalidAnalysis(format!(
                    "functions[{idx}] ({}) has an empty file path",
                    def.name
                )));
            }
            if def.line_range.end < def.line_range.start {
                return Err(ModelError::InvalidAnalysis(format!(
                    "functions[{idx}] ({}) has an inverted line range",
                    def.name
                )));
            }
        }
        for (idx, access) in self.table_accesses.iter().enumerate() {
            if access.table.is_empty() {
                return Err(ModelError::InvalidAnalysis(format!(
                    "table_accesses[{idx}] has an empty table name"
                )));
            }
        }
        Ok(())
    }

    /// Lowercase table names so classification compares like with like.
    fn normalize(&mut self) {
        for access in &mut self.table_accesses {
            access.table = access.table.to_ascii_lowercase();
        }
    }

    /// All class names defined in this subtree.
    #[must_use]
    pub fn class_names(&self) -> BTreeSet<String> {
        self.functions
            .iter()
            .filter_map(|def| def.containing_class.clone())
            .collect()
    }

    /// Names of free functions (no containing class) defined in this subtree.
    #[must_use]
    pub fn free_function_names(&self) -> BTreeSet<String> {
        self.functions
            .iter()
            .filter(|def| def.containing_class.is_none())
            .map(|def| def.name.clone())
            .collect()
    }

    /// Distinct set of files covered by this document.
    #[must_use]
    pub fn file_set(&self) -> BTreeSet<String> {
        self.functions
            .iter()
            .map(|def| def.file.clone())
            .chain(self.table_accesses.iter().map(|access| access.file.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn minimal_doc() -> &'static str {
        r#"{
            "functions": [
                {
                    "name": "getUser",
                    "containing_class": "UserRepo",
                    "params": [{"name": "id", "inferred_type": "int"}],
                    "file": "modules/auth/user_repo.php",
                    "line_range": {"start": 10, "end": 42}
                },
                {
                    "name": "hash_password",
                    "params": [{"name": "raw"}],
                    "file": "modules/auth/helpers.php",
                    "line_range": {"start": 3, "end": 9}
                }
            ],
            "table_accesses": [
                {"table": "Users", "operation": "SELECT", "file": "modules/auth/user_repo.php", "line": 20},
                {"table": "users", "operation": "write", "file": "modules/auth/user_repo.php", "line": 31}
            ]
        }"#
    }

    #[test]
    fn parses_and_normalizes_document() {
        let analysis = LegacyAnalysis::from_json_str(minimal_doc()).unwrap();
        assert_eq!(analysis.functions.len(), 2);
        // SQL verb spelling maps onto read/write and table names lowercase.
        assert_eq!(analysis.table_accesses[0].operation, AccessKind::Read);
        assert_eq!(analysis.table_accesses[0].table, "users");
        assert_eq!(analysis.table_accesses[1].operation, AccessKind::Write);
    }

    #[test]
    fn derives_name_sets() {
        let analysis = LegacyAnalysis::from_json_str(minimal_doc()).unwrap();
        assert!(analysis.class_names().contains("UserRepo"));
        assert!(analysis.free_function_names().contains("hash_password"));
        assert!(!analysis.free_function_names().contains("getUser"));
        assert_eq!(analysis.file_set().len(), 2);
    }

    #[test]
    fn missing_required_section_is_fatal() {
        let err = LegacyAnalysis::from_json_str(r#"{"functions": []}"#).unwrap_err();
        assert!(matches!(err, ModelError::ParseDocument(_)));
    }

    #[test]
    fn empty_function_name_is_fatal() {
        let raw = r#"{
            "functions": [{"name": "", "file": "a.php", "line_range": {"start": 1, "end": 1}}],
            "table_accesses": []
        }"#;
        let err = LegacyAnalysis::from_json_str(raw).unwrap_err();
        assert!(matches!(err, ModelError::InvalidAnalysis(_)));
    }

    #[test]
    fn unknown_operation_is_fatal() {
        let raw = r#"{
            "functions": [],
            "table_accesses": [{"table": "users", "operation": "truncate", "file": "a.php"}]
        }"#;
        assert!(LegacyAnalysis::from_json_str(raw).is_err());
    }

    #[test]
    fn qualified_name_includes_class() {
        let analysis = LegacyAnalysis::from_json_str(minimal_doc()).unwrap();
        assert_eq!(analysis.functions[0].qualified_name(), "UserRepo::getUser");
        assert_eq!(analysis.functions[1].qualified_name(), "hash_password");
    }
}
