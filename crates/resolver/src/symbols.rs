//! Deterministic mapping of call sites onto unit definitions.
//!
//! Every call site lands in exactly one partition: resolved against a
//! single definition, or unresolved with a machine-readable reason. The
//! same inputs always yield the same partition.

use std::collections::HashMap;

use log::debug;

use carve_model::{
    CallKind, CallPartition, CallSite, Diagnostic, DiagnosticCategory, Diagnostics, FunctionDef,
    MatchKind, ResolvedCall, UnresolvedCall, UnresolvedReason,
};

/// Resolves scanned call sites against the unit's function definitions.
pub struct SymbolResolver<'a> {
    definitions: &'a [FunctionDef],
    by_qualified: HashMap<String, Vec<usize>>,
    free_by_name: HashMap<&'a str, Vec<usize>>,
}

impl<'a> SymbolResolver<'a> {
    #[must_use]
    pub fn new(definitions: &'a [FunctionDef]) -> Self {
        let mut by_qualified: HashMap<String, Vec<usize>> = HashMap::new();
        let mut free_by_name: HashMap<&'a str, Vec<usize>> = HashMap::new();
        for (idx, def) in definitions.iter().enumerate() {
            if def.containing_class.is_some() {
                by_qualified.entry(def.qualified_name()).or_default().push(idx);
            } else {
                free_by_name.entry(def.name.as_str()).or_default().push(idx);
            }
        }
        Self {
            definitions,
            by_qualified,
            free_by_name,
        }
    }

    /// Partition the call sites. Total: every input site appears in exactly
    /// one of the two output lists.
    pub fn resolve(
        &self,
        sites: Vec<CallSite>,
        diagnostics: &mut Diagnostics,
    ) -> CallPartition {
        let mut partition = CallPartition::default();
        for site in sites {
            match self.resolve_one(&site, diagnostics) {
                Ok((def_idx, match_kind)) => partition.resolved.push(ResolvedCall {
                    call_site: site,
                    matched_definition: self.definitions[def_idx].clone(),
                    match_kind,
                }),
                Err(reason) => {
                    diagnostics.push(
                        Diagnostic::info(
                            DiagnosticCategory::UnresolvedCall,
                            format!("{}: {}", reason.as_str(), site.call_expression),
                        )
                        .at(site.caller_file.clone(), Some(site.caller_line)),
                    );
                    partition.unresolved.push(UnresolvedCall {
                        call_site: site,
                        reason,
                    });
                }
            }
        }
        debug!(
            "partitioned {} resolved / {} unresolved",
            partition.resolved.len(),
            partition.unresolved.len()
        );
        partition
    }

    fn resolve_one(
        &self,
        site: &CallSite,
        diagnostics: &mut Diagnostics,
    ) -> std::result::Result<(usize, MatchKind), UnresolvedReason> {
        // Inclusion references never match a function definition; literal
        // ones carry a path, dynamic ones carry nothing resolvable.
        if site.kind == CallKind::Include {
            return Err(if site.target_symbol.is_some() {
                UnresolvedReason::NoDefinition
            } else {
                UnresolvedReason::AmbiguousDynamicTarget
            });
        }

        let symbol = match &site.target_symbol {
            Some(symbol) => symbol,
            None => return Err(UnresolvedReason::AmbiguousDynamicTarget),
        };

        let candidates: &[usize] = match &site.target_class {
            Some(class) => self
                .by_qualified
                .get(&format!("{class}::{symbol}"))
                .map_or(&[], Vec::as_slice),
            None => self
                .free_by_name
                .get(symbol.as_str())
                .map_or(&[], Vec::as_slice),
        };

        match candidates {
            [] => Err(UnresolvedReason::NoDefinition),
            [only] => Ok((*only, MatchKind::Exact)),
            many => self.disambiguate(site, many, diagnostics),
        }
    }

    /// Several definitions share the target name. Arity narrows first;
    /// failing that, bare calls fall back to definition order while
    /// class-qualified duplicates stay unresolved.
    fn disambiguate(
        &self,
        site: &CallSite,
        candidates: &[usize],
        diagnostics: &mut Diagnostics,
    ) -> std::result::Result<(usize, MatchKind), UnresolvedReason> {
        let arity = site.argument_texts.len();
        let by_arity: Vec<usize> = candidates
            .iter()
            .copied()
            .filter(|&idx| self.definitions[idx].params.len() == arity)
            .collect();
        if let [only] = by_arity.as_slice() {
            return Ok((*only, MatchKind::Heuristic));
        }

        if site.target_class.is_some() {
            return Err(UnresolvedReason::MultipleCandidates);
        }

        // Candidate lists are built in definition order, so the first
        // entry is the first candidate the document declares.
        let pool = if by_arity.is_empty() { candidates } else { &by_arity };
        let Some(&pick) = pool.first() else {
            return Err(UnresolvedReason::MultipleCandidates);
        };

        let def = &self.definitions[pick];
        diagnostics.push(
            Diagnostic::warning(
                DiagnosticCategory::AmbiguousResolution,
                format!(
                    "{} candidates for '{}'; matched definition at {}:{}",
                    candidates.len(),
                    site.call_expression,
                    def.file,
                    def.line_range.start
                ),
            )
            .at(site.caller_file.clone(), Some(site.caller_line)),
        );
        Ok((pick, MatchKind::Heuristic))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use carve_model::{Confidence, LineRange, ParamDef};
    use pretty_assertions::assert_eq;

    fn def(name: &str, class: Option<&str>, params: usize, file: &str, start: usize) -> FunctionDef {
        FunctionDef {
            name: name.to_string(),
            containing_class: class.map(str::to_string),
            params: (0..params)
                .map(|i| ParamDef {
                    name: format!("p{i}"),
                    inferred_type: None,
                })
                .collect(),
            file: file.to_string(),
            line_range: LineRange {
                start,
                end: start + 10,
            },
        }
    }

    fn site(symbol: Option<&str>, class: Option<&str>, args: usize, kind: CallKind) -> CallSite {
        CallSite {
            caller_file: "index.php".to_string(),
            caller_line: 4,
            call_expression: format!(
                "{}{}(...)",
                class.map(|c| format!("{c}::")).unwrap_or_default(),
                symbol.unwrap_or("$dyn")
            ),
            target_symbol: symbol.map(str::to_string),
            target_class: class.map(str::to_string),
            argument_texts: (0..args).map(|i| format!("$a{i}")).collect(),
            resolution_confidence: if symbol.is_some() {
                Confidence::High
            } else {
                Confidence::Low
            },
            kind,
            snippet: String::new(),
        }
    }

    #[test]
    fn partition_is_total() {
        let defs = vec![def("getUser", Some("UserRepo"), 1, "a.php", 1)];
        let resolver = SymbolResolver::new(&defs);
        let sites = vec![
            site(Some("getUser"), Some("UserRepo"), 1, CallKind::StaticCall),
            site(Some("ghost"), Some("UserRepo"), 0, CallKind::StaticCall),
            site(None, None, 0, CallKind::MethodCall),
        ];
        let mut diagnostics = Diagnostics::new();
        let partition = resolver.resolve(sites, &mut diagnostics);

        assert_eq!(partition.resolved.len() + partition.unresolved.len(), 3);
        assert_eq!(partition.resolved.len(), 1);
    }

    #[test]
    fn exact_match_on_qualified_name() {
        let defs = vec![
            def("getUser", Some("UserRepo"), 1, "a.php", 1),
            def("getUser", Some("AdminRepo"), 1, "b.php", 1),
        ];
        let resolver = SymbolResolver::new(&defs);
        let mut diagnostics = Diagnostics::new();
        let partition = resolver.resolve(
            vec![site(Some("getUser"), Some("AdminRepo"), 1, CallKind::StaticCall)],
            &mut diagnostics,
        );

        assert_eq!(partition.resolved.len(), 1);
        assert_eq!(
            partition.resolved[0].matched_definition.containing_class.as_deref(),
            Some("AdminRepo")
        );
        assert_eq!(partition.resolved[0].match_kind, MatchKind::Exact);
    }

    #[test]
    fn arity_disambiguates_free_functions() {
        let defs = vec![
            def("format", None, 1, "a.php", 1),
            def("format", None, 2, "a.php", 20),
        ];
        let resolver = SymbolResolver::new(&defs);
        let mut diagnostics = Diagnostics::new();
        let partition = resolver.resolve(
            vec![site(Some("format"), None, 2, CallKind::DirectCall)],
            &mut diagnostics,
        );

        assert_eq!(partition.resolved.len(), 1);
        assert_eq!(partition.resolved[0].matched_definition.params.len(), 2);
        assert_eq!(partition.resolved[0].match_kind, MatchKind::Heuristic);
    }

    #[test]
    fn unbreakable_tie_picks_first_definition_in_document_order_with_warning() {
        // "b.php" is declared first; document order wins even though
        // "a.php" sorts first lexically.
        let defs = vec![
            def("format", None, 1, "b.php", 5),
            def("format", None, 1, "a.php", 9),
        ];
        let resolver = SymbolResolver::new(&defs);
        let mut diagnostics = Diagnostics::new();
        let partition = resolver.resolve(
            vec![site(Some("format"), None, 1, CallKind::DirectCall)],
            &mut diagnostics,
        );

        assert_eq!(partition.resolved.len(), 1);
        assert_eq!(partition.resolved[0].matched_definition.file, "b.php");
        assert_eq!(
            diagnostics.count_of(DiagnosticCategory::AmbiguousResolution),
            1
        );
    }

    #[test]
    fn duplicate_qualified_definitions_stay_unresolved() {
        let defs = vec![
            def("getUser", Some("UserRepo"), 1, "a.php", 1),
            def("getUser", Some("UserRepo"), 1, "a_copy.php", 1),
        ];
        let resolver = SymbolResolver::new(&defs);
        let mut diagnostics = Diagnostics::new();
        let partition = resolver.resolve(
            vec![site(Some("getUser"), Some("UserRepo"), 2, CallKind::StaticCall)],
            &mut diagnostics,
        );

        assert_eq!(partition.unresolved.len(), 1);
        assert_eq!(
            partition.unresolved[0].reason,
            UnresolvedReason::MultipleCandidates
        );
    }

    #[test]
    fn dynamic_target_is_unresolved_not_dropped() {
        let defs = vec![def("getUser", Some("UserRepo"), 1, "a.php", 1)];
        let resolver = SymbolResolver::new(&defs);
        let mut diagnostics = Diagnostics::new();
        let partition = resolver.resolve(
            vec![site(None, None, 0, CallKind::StaticCall)],
            &mut diagnostics,
        );

        assert_eq!(partition.unresolved.len(), 1);
        assert_eq!(
            partition.unresolved[0].reason,
            UnresolvedReason::AmbiguousDynamicTarget
        );
        assert_eq!(diagnostics.count_of(DiagnosticCategory::UnresolvedCall), 1);
    }

    #[test]
    fn includes_never_match_function_definitions() {
        let defs = vec![def("getUser", Some("UserRepo"), 1, "a.php", 1)];
        let resolver = SymbolResolver::new(&defs);
        let mut diagnostics = Diagnostics::new();
        let mut include = site(
            Some("modules/auth/user_repo.php"),
            None,
            1,
            CallKind::Include,
        );
        include.call_expression = "require_once('modules/auth/user_repo.php')".to_string();
        let partition = resolver.resolve(vec![include], &mut diagnostics);

        assert_eq!(partition.unresolved.len(), 1);
        assert_eq!(partition.unresolved[0].reason, UnresolvedReason::NoDefinition);
    }

    #[test]
    fn resolution_is_deterministic_across_input_order() {
        let defs = vec![
            def("format", None, 1, "b.php", 5),
            def("format", None, 1, "a.php", 9),
        ];
        let resolver = SymbolResolver::new(&defs);

        let forward = {
            let mut d = Diagnostics::new();
            resolver.resolve(
                vec![
                    site(Some("format"), None, 1, CallKind::DirectCall),
                    site(Some("ghost"), None, 0, CallKind::DirectCall),
                ],
                &mut d,
            )
        };
        let backward = {
            let mut d = Diagnostics::new();
            resolver.resolve(
                vec![
                    site(Some("ghost"), None, 0, CallKind::DirectCall),
                    site(Some("format"), None, 1, CallKind::DirectCall),
                ],
                &mut d,
            )
        };

        assert_eq!(
            forward.resolved[0].matched_definition,
            backward.resolved[0].matched_definition
        );
    }
}
