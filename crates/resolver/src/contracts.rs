//! Folding resolved calls into per-function contracts.
//!
//! The fold is commutative: contracts come out identical regardless of the
//! order resolved calls arrive in. Declared parameters are authoritative;
//! caller evidence only ever adds observed field usage, never rewrites the
//! declared inputs.

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fs;
use std::path::{Path, PathBuf};

use log::{debug, trace};
use once_cell::sync::Lazy;
use regex::Regex;

use carve_model::{CallPartition, FunctionContract, ResolvedCall};

static ASSIGNED_VAR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$([A-Za-z_]\w*)\s*=[^=]").expect("assignment pattern"));

/// Return-shape hint recorded once any caller accesses a result field.
const RECORD_HINT: &str = "record";

/// Infers function contracts from the resolved partition plus caller
/// source inspection.
pub struct ContractInferencer {
    project_root: PathBuf,
}

impl ContractInferencer {
    pub fn new(project_root: impl AsRef<Path>) -> Self {
        Self {
            project_root: project_root.as_ref().to_path_buf(),
        }
    }

    /// Fold the resolved calls into one contract per target function,
    /// ordered by canonical target key.
    pub fn infer(&self, partition: &CallPartition) -> Vec<FunctionContract> {
        let mut contracts: BTreeMap<String, FunctionContract> = BTreeMap::new();
        let mut source_cache: HashMap<String, Option<Vec<String>>> = HashMap::new();

        for resolved in &partition.resolved {
            let def = &resolved.matched_definition;
            let key = def.qualified_name();
            let contract = contracts.entry(key).or_insert_with(|| FunctionContract {
                function_name: def.name.clone(),
                containing_class: def.containing_class.clone(),
                input_parameters: def.params.clone(),
                output_type_hint: None,
                fields_used_by_callers: BTreeSet::new(),
                call_count: 0,
                caller_files: BTreeSet::new(),
            });

            contract.call_count += 1;
            contract
                .caller_files
                .insert(resolved.call_site.caller_file.clone());

            let fields = self.observed_fields(resolved, &mut source_cache);
            if !fields.is_empty() {
                // Any observed field access implies a structured result.
                contract.output_type_hint = Some(RECORD_HINT.to_string());
                contract.fields_used_by_callers.extend(fields);
            }
        }

        debug!("inferred {} function contracts", contracts.len());
        contracts.into_values().collect()
    }

    /// Result fields the caller touches near this call site. Unreadable
    /// caller files yield no evidence, leaving the conservative empty set.
    fn observed_fields(
        &self,
        resolved: &ResolvedCall,
        cache: &mut HashMap<String, Option<Vec<String>>>,
    ) -> Vec<String> {
        let site = &resolved.call_site;
        let lines = match cache
            .entry(site.caller_file.clone())
            .or_insert_with(|| self.load_lines(&site.caller_file))
        {
            Some(lines) => lines,
            None => return Vec::new(),
        };
        let Some(call_line) = site.caller_line.checked_sub(1).and_then(|i| lines.get(i))
        else {
            return Vec::new();
        };

        let mut fields = Vec::new();

        // Chained access directly on the call result.
        if let Some(after) = call_line
            .find(&site.call_expression)
            .map(|pos| &call_line[pos + site.call_expression.len()..])
        {
            fields.extend(leading_field_access(after));
        }

        // Accesses on the variable the result was assigned to, anywhere
        // below the call. A truncated scan would emit a partial field set,
        // and a non-empty set tells downstream it may drop the rest.
        let call_pos = call_line.find(&site.call_expression).unwrap_or(0);
        if let Some(caps) = ASSIGNED_VAR
            .captures_iter(&call_line[..call_pos])
            .last()
        {
            let var = caps[1].to_string();
            for line in lines.iter().skip(site.caller_line) {
                fields.extend(fields_of_variable(line, &var));
            }
            trace!(
                "{}:{} result variable ${var}: {} field accesses",
                site.caller_file,
                site.caller_line,
                fields.len()
            );
        }

        fields
    }

    fn load_lines(&self, rel_path: &str) -> Option<Vec<String>> {
        let bytes = fs::read(self.project_root.join(rel_path)).ok()?;
        Some(
            String::from_utf8_lossy(&bytes)
                .lines()
                .map(str::to_string)
                .collect(),
        )
    }
}

/// Field accessed immediately at the start of `text`, as in
/// `...getUser(5)->name`, `...getUser(5).email`, or `...getUser(5)['email']`.
fn leading_field_access(text: &str) -> Option<String> {
    static LEADING: Lazy<Regex> = Lazy::new(|| {
        Regex::new(
            r#"^\s*(?:->\s*([A-Za-z_]\w*)|\.([A-Za-z_]\w*)|\[\s*['"]([A-Za-z_]\w*)['"]\s*\])(\s*\()?"#,
        )
        .expect("leading field pattern")
    });
    let caps = LEADING.captures(text)?;
    if caps.get(4).is_some() {
        // Chained method call, not a field read.
        return None;
    }
    caps.get(1)
        .or_else(|| caps.get(2))
        .or_else(|| caps.get(3))
        .map(|m| m.as_str().to_string())
}

/// All fields accessed on `$var` within one line: `$var->f`, `$var['f']`,
/// `$var["f"]`. A trailing `(` marks a method call, not a field.
fn fields_of_variable(line: &str, var: &str) -> Vec<String> {
    static FIELD_OF: Lazy<Regex> = Lazy::new(|| {
        Regex::new(
            r#"\$([A-Za-z_]\w*)\s*(?:->\s*([A-Za-z_]\w*)(\s*\()?|\[\s*['"]([A-Za-z_]\w*)['"]\s*\])"#,
        )
        .expect("variable field pattern")
    });
    FIELD_OF
        .captures_iter(line)
        .filter(|caps| &caps[1] == var && caps.get(3).is_none())
        .filter_map(|caps| {
            caps.get(2)
                .or_else(|| caps.get(4))
                .map(|m| m.as_str().to_string())
        })
        .collect()
}
