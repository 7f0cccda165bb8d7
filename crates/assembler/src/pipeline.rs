//! One-call entry point wiring the full analysis chain.

use std::path::{Path, PathBuf};

use log::info;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use carve_model::{Diagnostics, LegacyAnalysis, ServiceContract};
use carve_ownership::classify_tables;
use carve_resolver::{estimate_tiers, ContractInferencer, SymbolResolver};
use carve_scanner::CallSiteScanner;

use crate::assemble::assemble;
use crate::error::Result;

/// Everything one run produces: the contract plus every non-fatal
/// condition observed while building it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PipelineOutput {
    pub contract: ServiceContract,
    pub diagnostics: Diagnostics,
}

/// The full chain: scan → resolve → {infer, tier} + classify → assemble.
pub struct Pipeline {
    project_root: PathBuf,
    unit_path: String,
    transport_hint: String,
}

impl Pipeline {
    pub fn new(
        project_root: impl AsRef<Path>,
        unit_path: impl Into<String>,
        transport_hint: impl Into<String>,
    ) -> Self {
        Self {
            project_root: project_root.as_ref().to_path_buf(),
            unit_path: unit_path.into(),
            transport_hint: transport_hint.into(),
        }
    }

    /// Run every stage over the given analysis documents.
    ///
    /// Fails only on a missing project root or unit subtree; every other
    /// condition degrades into the output's diagnostics.
    pub fn run(
        &self,
        unit: &LegacyAnalysis,
        project: Option<&LegacyAnalysis>,
    ) -> Result<PipelineOutput> {
        let mut diagnostics = Diagnostics::new();
        let unit_name = self
            .unit_path
            .trim_matches('/')
            .rsplit('/')
            .next()
            .unwrap_or(&self.unit_path)
            .to_string();
        info!("analyzing unit {unit_name} under {}", self.project_root.display());

        let scanner = CallSiteScanner::new(&self.project_root, &self.unit_path)?;
        let sites = scanner.scan(unit, &mut diagnostics);

        let resolver = SymbolResolver::new(&unit.functions);
        let partition = resolver.resolve(sites, &mut diagnostics);

        let inferencer = ContractInferencer::new(&self.project_root);
        let contracts = inferencer.infer(&partition);
        let tiers = estimate_tiers(&contracts);

        let tables = classify_tables(unit, project, &mut diagnostics);

        let contract = assemble(
            &unit_name,
            &self.transport_hint,
            &partition,
            contracts,
            tables,
            tiers,
            &mut diagnostics,
        );
        Ok(PipelineOutput {
            contract,
            diagnostics,
        })
    }
}
