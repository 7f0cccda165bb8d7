//! End-to-end runs over small synthetic project trees.

use std::collections::BTreeSet;
use std::fs;

use pretty_assertions::assert_eq;
use tempfile::TempDir;

use carve_assembler::{Pipeline, PipelineOutput};
use carve_model::{
    DiagnosticCategory, FrequencyTier, LegacyAnalysis, OwnershipClass, OwnershipConfidence,
    UnresolvedReason,
};

fn project_with(files: &[(&str, &str)]) -> TempDir {
    let dir = TempDir::new().unwrap();
    for (rel, content) in files {
        let path = dir.path().join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }
    dir
}

fn get_user_unit() -> LegacyAnalysis {
    LegacyAnalysis::from_json_str(
        r#"{
            "functions": [
                {
                    "name": "getUser",
                    "params": [{"name": "id", "inferred_type": "int"}],
                    "file": "modules/auth/repo.php",
                    "line_range": {"start": 3, "end": 20}
                }
            ],
            "table_accesses": [
                {"table": "users", "operation": "select", "file": "modules/auth/repo.php"}
            ]
        }"#,
    )
    .unwrap()
}

fn run(dir: &TempDir, unit: &LegacyAnalysis, project: Option<&LegacyAnalysis>) -> PipelineOutput {
    Pipeline::new(dir.path(), "modules/auth", "http")
        .run(unit, project)
        .unwrap()
}

#[test]
fn caller_field_usage_folds_into_one_contract() {
    let dir = project_with(&[
        ("modules/auth/repo.php", "<?php\n"),
        ("pages/profile.php", "<?php\necho getUser(5).email;\n"),
        ("pages/admin.php", "<?php\necho getUser(9).name;\n"),
    ]);
    let output = run(&dir, &get_user_unit(), None);

    let contracts = &output.contract.function_contracts;
    assert_eq!(contracts.len(), 1);
    assert_eq!(contracts[0].function_name, "getUser");
    assert_eq!(contracts[0].call_count, 2);
    assert_eq!(
        contracts[0].fields_used_by_callers,
        ["email".to_string(), "name".to_string()].into()
    );
    assert_eq!(contracts[0].caller_files.len(), 2);
    assert_eq!(contracts[0].input_parameters[0].name, "id");
}

#[test]
fn uncontested_unit_writes_classify_as_owned() {
    let dir = project_with(&[("modules/auth/repo.php", "<?php\n")]);
    let unit = LegacyAnalysis::from_json_str(
        r#"{
            "functions": [],
            "table_accesses": [
                {"table": "orders", "operation": "insert", "file": "modules/auth/repo.php"}
            ]
        }"#,
    )
    .unwrap();
    let project = LegacyAnalysis::from_json_str(
        r#"{
            "functions": [],
            "table_accesses": [
                {"table": "orders", "operation": "insert", "file": "modules/auth/repo.php"},
                {"table": "orders", "operation": "select", "file": "reports/daily.php"},
                {"table": "orders", "operation": "select", "file": "admin/orders.php"}
            ]
        }"#,
    )
    .unwrap();
    let output = run(&dir, &unit, Some(&project));

    let tables = &output.contract.table_ownership;
    assert_eq!(tables.len(), 1);
    assert_eq!(tables[0].classification, OwnershipClass::Owned);
    assert_eq!(tables[0].confidence, OwnershipConfidence::Verified);
    assert_eq!(output.contract.summary.tables_owned, 1);
}

#[test]
fn contested_writes_classify_as_shared_conflict() {
    let dir = project_with(&[("modules/auth/repo.php", "<?php\n")]);
    let unit = LegacyAnalysis::from_json_str(
        r#"{
            "functions": [],
            "table_accesses": [
                {"table": "users", "operation": "update", "file": "modules/auth/repo.php"}
            ]
        }"#,
    )
    .unwrap();
    let project = LegacyAnalysis::from_json_str(
        r#"{
            "functions": [],
            "table_accesses": [
                {"table": "users", "operation": "insert", "file": "billing/sync.php"}
            ]
        }"#,
    )
    .unwrap();
    let output = run(&dir, &unit, Some(&project));

    assert_eq!(
        output.contract.table_ownership[0].classification,
        OwnershipClass::SharedConflict
    );
}

#[test]
fn variable_class_receiver_is_never_silently_matched() {
    let dir = project_with(&[
        ("modules/auth/repo.php", "<?php\n"),
        ("pages/router.php", "<?php\n$cls::method();\n"),
    ]);
    let output = run(&dir, &get_user_unit(), None);

    assert_eq!(output.contract.summary.resolved_calls, 0);
    assert_eq!(output.contract.summary.unresolved_calls, 1);
    assert!(output
        .diagnostics
        .iter()
        .any(|d| d.category == DiagnosticCategory::UnresolvedCall
            && d.message.contains(UnresolvedReason::AmbiguousDynamicTarget.as_str())));
}

#[test]
fn missing_project_document_degrades_instead_of_aborting() {
    let dir = project_with(&[("modules/auth/repo.php", "<?php\n")]);
    let unit = LegacyAnalysis::from_json_str(
        r#"{
            "functions": [],
            "table_accesses": [
                {"table": "users", "operation": "insert", "file": "modules/auth/repo.php"}
            ]
        }"#,
    )
    .unwrap();
    let output = run(&dir, &unit, None);

    let tables = &output.contract.table_ownership;
    assert_eq!(tables[0].classification, OwnershipClass::Owned);
    assert_eq!(tables[0].confidence, OwnershipConfidence::Unverified);
    assert_eq!(
        output.diagnostics.count_of(DiagnosticCategory::DegradedOwnership),
        1
    );
}

#[test]
fn every_call_site_lands_in_exactly_one_partition() {
    let dir = project_with(&[
        ("modules/auth/repo.php", "<?php\n"),
        (
            "pages/mixed.php",
            "<?php\ngetUser(1);\nghostFunction();\n$cls::route();\nrequire_once('modules/auth/repo.php');\n",
        ),
    ]);
    let output = run(&dir, &get_user_unit(), None);

    // getUser resolves; the dynamic receiver and the include do not.
    // ghostFunction is not a unit symbol, so it is never harvested.
    assert_eq!(output.contract.summary.resolved_calls, 1);
    assert_eq!(output.contract.summary.unresolved_calls, 2);
    assert_eq!(output.contract.summary.files_affected, 1);
}

#[test]
fn repeated_runs_are_identical() {
    let dir = project_with(&[
        ("modules/auth/repo.php", "<?php\n"),
        ("a.php", "<?php\n$u = getUser(1);\necho $u->name;\n"),
        ("b.php", "<?php\ngetUser(2);\n"),
    ]);
    let unit = get_user_unit();

    let first = run(&dir, &unit, None);
    let second = run(&dir, &unit, None);
    assert_eq!(first, second);
}

#[test]
fn adding_callers_never_shrinks_observed_fields() {
    let base_files = [
        ("modules/auth/repo.php", "<?php\n"),
        ("a.php", "<?php\n$u = getUser(1);\necho $u->name;\n"),
    ];
    let extended_files = [
        ("modules/auth/repo.php", "<?php\n"),
        ("a.php", "<?php\n$u = getUser(1);\necho $u->name;\n"),
        ("b.php", "<?php\n$v = getUser(2);\necho $v['email'];\n"),
    ];
    let unit = get_user_unit();

    let base = run(&project_with(&base_files), &unit, None);
    let extended = run(&project_with(&extended_files), &unit, None);

    let base_fields: &BTreeSet<String> =
        &base.contract.function_contracts[0].fields_used_by_callers;
    let extended_fields = &extended.contract.function_contracts[0].fields_used_by_callers;
    assert!(base_fields.is_subset(extended_fields));
    assert!(extended_fields.contains("email"));
}

#[test]
fn few_functions_all_tier_warm() {
    let dir = project_with(&[
        ("modules/auth/repo.php", "<?php\n"),
        ("a.php", "<?php\ngetUser(1);\ngetUser(2);\n"),
    ]);
    let output = run(&dir, &get_user_unit(), None);

    assert_eq!(
        output.contract.frequency_tiers.get("getUser"),
        Some(&FrequencyTier::Warm)
    );
}

#[test]
fn output_serializes_with_embedded_diagnostics() {
    let dir = project_with(&[("modules/auth/repo.php", "<?php\n")]);
    let output = run(&dir, &get_user_unit(), None);

    let json = serde_json::to_value(&output).unwrap();
    assert!(json.get("contract").is_some());
    assert!(json.get("diagnostics").is_some());
    let parsed: PipelineOutput = serde_json::from_value(json).unwrap();
    assert_eq!(parsed, output);
}
