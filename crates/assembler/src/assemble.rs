//! Pure merge of the upstream stage outputs into one `ServiceContract`.

use std::collections::{BTreeMap, BTreeSet};

use log::info;

use carve_model::{
    CallPartition, ContractSummary, Diagnostic, DiagnosticCategory, Diagnostics, FrequencyTier,
    FunctionContract, OwnershipClass, ServiceContract, TableOwnership,
};

/// Merge all stage outputs into the boundary artifact.
///
/// An empty upstream section is emitted as-is with an informational note;
/// the remaining sections still assemble. No section is ever recomputed
/// here: the assembler only merges and counts.
pub fn assemble(
    unit_name: &str,
    transport_hint: &str,
    partition: &CallPartition,
    function_contracts: Vec<FunctionContract>,
    table_ownership: Vec<TableOwnership>,
    frequency_tiers: BTreeMap<String, FrequencyTier>,
    diagnostics: &mut Diagnostics,
) -> ServiceContract {
    if function_contracts.is_empty() {
        diagnostics.push(Diagnostic::info(
            DiagnosticCategory::MissingSection,
            "no function contracts: no call sites resolved against the unit",
        ));
    }
    if table_ownership.is_empty() {
        diagnostics.push(Diagnostic::info(
            DiagnosticCategory::MissingSection,
            "no table ownership entries: the unit accesses no tables",
        ));
    }

    let files_affected: BTreeSet<&str> = partition
        .resolved
        .iter()
        .map(|r| r.call_site.caller_file.as_str())
        .chain(
            partition
                .unresolved
                .iter()
                .map(|u| u.call_site.caller_file.as_str()),
        )
        .collect();

    let count_class = |class: OwnershipClass| {
        table_ownership
            .iter()
            .filter(|t| t.classification == class)
            .count()
    };
    let summary = ContractSummary {
        function_contracts: function_contracts.len(),
        resolved_calls: partition.resolved.len(),
        unresolved_calls: partition.unresolved.len(),
        files_affected: files_affected.len(),
        tables_owned: count_class(OwnershipClass::Owned),
        tables_read_only: count_class(OwnershipClass::ReadOnly),
        tables_shared_conflict: count_class(OwnershipClass::SharedConflict),
    };

    info!(
        "assembled contract for {unit_name}: {} functions, {} tables, {}/{} calls resolved",
        summary.function_contracts, table_ownership.len(), summary.resolved_calls,
        partition.total()
    );

    ServiceContract {
        unit_name: unit_name.to_string(),
        transport_hint: transport_hint.to_string(),
        function_contracts,
        table_ownership,
        frequency_tiers,
        summary,
    }
}
