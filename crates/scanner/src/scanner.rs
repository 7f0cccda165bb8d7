//! Walks the project tree and harvests inbound call sites.
//!
//! The scanner reads every candidate source file outside the extraction
//! unit, runs each detection pass over it, then de-duplicates and orders
//! the merged result so downstream stages see a stable stream.

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use regex::Regex;

use carve_model::{CallSite, Diagnostic, DiagnosticCategory, Diagnostics, LegacyAnalysis};

use crate::error::{Result, ScanError};
use crate::patterns::{default_patterns, CallPattern, FileView, PatternContext};

/// Source extensions considered callers.
const SOURCE_EXTENSIONS: &[&str] = &["php", "phtml", "inc"];

static LOCAL_FUNCTION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\bfunction\s+([A-Za-z_]\w*)\s*\(").expect("local function pattern"));

static INSTANCE_BINDING: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$([A-Za-z_]\w*)\s*=\s*new\s+([A-Za-z_]\w*)").expect("instance binding pattern")
});

/// Scans the project for call sites that reference the extraction unit.
pub struct CallSiteScanner {
    project_root: PathBuf,
    unit_path: String,
    patterns: Vec<Box<dyn CallPattern>>,
}

impl CallSiteScanner {
    /// `unit_path` is the unit subtree, relative to `project_root`.
    pub fn new(project_root: impl AsRef<Path>, unit_path: &str) -> Result<Self> {
        let project_root = project_root.as_ref().to_path_buf();
        if !project_root.is_dir() {
            return Err(ScanError::MissingRoot(
                project_root.display().to_string(),
            ));
        }
        let unit_path = unit_path.trim_matches('/').replace('\\', "/");
        if !project_root.join(&unit_path).exists() {
            return Err(ScanError::MissingUnit(unit_path));
        }
        Ok(Self {
            project_root,
            unit_path,
            patterns: default_patterns(),
        })
    }

    /// Harvest every call site outside the unit that references a unit
    /// symbol or file. Unreadable files are skipped with a diagnostic;
    /// the result is de-duplicated and ordered by (file, line, expression).
    pub fn scan(
        &self,
        unit: &LegacyAnalysis,
        diagnostics: &mut Diagnostics,
    ) -> Vec<CallSite> {
        let unit_classes = unit.class_names();
        let unit_functions = unit.free_function_names();
        info!(
            "scanning {} for references to unit {} ({} classes, {} free functions)",
            self.project_root.display(),
            self.unit_path,
            unit_classes.len(),
            unit_functions.len()
        );

        let mut sites = Vec::new();
        for path in self.candidate_files() {
            let rel_path = match path.strip_prefix(&self.project_root) {
                Ok(rel) => rel.to_string_lossy().replace('\\', "/"),
                Err(_) => continue,
            };
            let source = match fs::read(&path) {
                Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
                Err(err) => {
                    warn!("skipping unreadable file {rel_path}: {err}");
                    diagnostics.push(
                        Diagnostic::warning(
                            DiagnosticCategory::SkippedFile,
                            format!("could not read source file: {err}"),
                        )
                        .at(rel_path, None),
                    );
                    continue;
                }
            };
            sites.extend(self.scan_source(&rel_path, &source, &unit_classes, &unit_functions));
        }

        sites.sort_by(|a, b| {
            (&a.caller_file, a.caller_line, &a.call_expression)
                .cmp(&(&b.caller_file, b.caller_line, &b.call_expression))
        });
        sites.dedup_by(|a, b| a.dedup_key() == b.dedup_key());
        info!("harvested {} call sites", sites.len());
        sites
    }

    fn scan_source(
        &self,
        rel_path: &str,
        source: &str,
        unit_classes: &BTreeSet<String>,
        unit_functions: &BTreeSet<String>,
    ) -> Vec<CallSite> {
        // Full-line comments are blanked in place so line numbers hold.
        let lines: Vec<String> = source
            .lines()
            .map(|line| {
                let trimmed = line.trim_start();
                if trimmed.starts_with("//") || trimmed.starts_with('#') || trimmed.starts_with('*')
                {
                    String::new()
                } else {
                    line.to_string()
                }
            })
            .collect();

        let local_functions: BTreeSet<String> = lines
            .iter()
            .flat_map(|line| LOCAL_FUNCTION.captures_iter(line))
            .map(|caps| caps[1].to_string())
            .collect();

        // Only bindings to unit classes matter for receiver resolution.
        let instance_vars: HashMap<String, String> = lines
            .iter()
            .flat_map(|line| INSTANCE_BINDING.captures_iter(line))
            .filter(|caps| unit_classes.contains(&caps[2]))
            .map(|caps| (caps[1].to_string(), caps[2].to_string()))
            .collect();

        let view = FileView {
            rel_path,
            lines: &lines,
        };
        let ctx = PatternContext {
            unit_classes,
            unit_functions,
            unit_path: &self.unit_path,
            local_functions: &local_functions,
            instance_vars: &instance_vars,
        };

        let mut sites = Vec::new();
        for pattern in &self.patterns {
            let found = pattern.scan(&view, &ctx);
            if !found.is_empty() {
                debug!("{}: {} sites via {}", rel_path, found.len(), pattern.name());
            }
            sites.extend(found);
        }
        sites
    }

    /// Candidate caller files: sources under the project root, excluding
    /// the unit subtree itself.
    fn candidate_files(&self) -> Vec<PathBuf> {
        let unit_dir = self.project_root.join(&self.unit_path);
        let mut files: Vec<PathBuf> = WalkBuilder::new(&self.project_root)
            .hidden(true)
            .git_ignore(true)
            .build()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_some_and(|t| t.is_file()))
            .map(|entry| entry.into_path())
            .filter(|path| !path.starts_with(&unit_dir))
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| SOURCE_EXTENSIONS.contains(&ext))
            })
            .collect();
        files.sort();
        files
    }
}
