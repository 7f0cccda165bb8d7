//! Table-ownership classification relative to the extraction unit.
//!
//! Pure over its two documents: no file system access, and the output is
//! independent of the order accesses appear in either document. The
//! project-wide document includes the unit's own rows, so the unit's file
//! set is subtracted before anything counts as external evidence.

use std::collections::{BTreeMap, BTreeSet};

use log::{debug, warn};

use carve_model::{
    AccessKind, AccessorSource, Diagnostic, DiagnosticCategory, Diagnostics, LegacyAnalysis,
    OwnershipClass, OwnershipConfidence, TableOwnership,
};

#[derive(Default)]
struct Evidence {
    writers: BTreeSet<AccessorSource>,
    readers: BTreeSet<AccessorSource>,
}

impl Evidence {
    fn record(&mut self, source: AccessorSource, operation: AccessKind) {
        match operation {
            AccessKind::Write => self.writers.insert(source),
            AccessKind::Read => self.readers.insert(source),
        };
    }
}

/// Classify every table seen in either document: one entry per distinct
/// table name.
///
/// Without the project-wide document the classifier runs degraded: external
/// writers cannot be ruled out, so every entry is marked unverified and a
/// diagnostic is emitted.
pub fn classify_tables(
    unit: &LegacyAnalysis,
    project: Option<&LegacyAnalysis>,
    diagnostics: &mut Diagnostics,
) -> Vec<TableOwnership> {
    let mut evidence: BTreeMap<String, Evidence> = BTreeMap::new();
    for access in &unit.table_accesses {
        evidence
            .entry(access.table.clone())
            .or_default()
            .record(AccessorSource::Unit, access.operation);
    }

    let confidence = match project {
        Some(project) => {
            let unit_files = unit.file_set();
            for access in &project.table_accesses {
                if unit_files.contains(&access.file) {
                    continue;
                }
                evidence
                    .entry(access.table.clone())
                    .or_default()
                    .record(AccessorSource::RestOfProject, access.operation);
            }
            OwnershipConfidence::Verified
        }
        None => {
            warn!("no project-wide analysis; ownership conflicts cannot be detected");
            diagnostics.push(Diagnostic::warning(
                DiagnosticCategory::DegradedOwnership,
                "project-wide analysis unavailable; table ownership is unverified",
            ));
            OwnershipConfidence::Unverified
        }
    };

    let tables: Vec<TableOwnership> = evidence
        .into_iter()
        .map(|(table_name, evidence)| {
            let classification = classify_one(&evidence);
            TableOwnership {
                table_name,
                writers: evidence.writers,
                readers: evidence.readers,
                classification,
                confidence,
            }
        })
        .collect();
    debug!("classified {} tables", tables.len());
    tables
}

/// Precedence: an uncontested unit writer owns the table; a unit that
/// never writes only reads it; contested writes are a shared conflict.
/// A table nobody writes falls out as read-only.
fn classify_one(evidence: &Evidence) -> OwnershipClass {
    let unit_writes = evidence.writers.contains(&AccessorSource::Unit);
    let external_writes = evidence.writers.contains(&AccessorSource::RestOfProject);
    match (unit_writes, external_writes) {
        (true, false) => OwnershipClass::Owned,
        (true, true) => OwnershipClass::SharedConflict,
        (false, _) => OwnershipClass::ReadOnly,
    }
}
