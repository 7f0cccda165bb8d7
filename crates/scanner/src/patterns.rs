//! Independent textual detection passes.
//!
//! Each pass scans one file view and yields `CallSite` candidates; the
//! scanner merges, de-duplicates, and orders them. Passes are bounded-depth
//! token/paren scanners, not a parser: recall can be improved by adding a
//! pass without touching the resolver's contract.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{BTreeSet, HashMap};

use carve_model::{CallKind, CallSite, Confidence, MAX_SNIPPET_CHARS};

/// One scanned file, split into lines. Paths are relative to the project
/// root.
pub struct FileView<'a> {
    pub rel_path: &'a str,
    pub lines: &'a [String],
}

/// Shared lookup context for all passes over one file.
pub struct PatternContext<'a> {
    /// Class names defined inside the unit.
    pub unit_classes: &'a BTreeSet<String>,

    /// Free function names defined inside the unit.
    pub unit_functions: &'a BTreeSet<String>,

    /// Unit subtree path relative to the project root.
    pub unit_path: &'a str,

    /// Free functions declared in the scanned file itself; calls to these
    /// are local, not cross-boundary.
    pub local_functions: &'a BTreeSet<String>,

    /// `$var = new Class(...)` bindings observed in the scanned file, for
    /// resolving `$var->method(...)` receivers.
    pub instance_vars: &'a HashMap<String, String>,
}

/// A single detection pass over one file.
pub trait CallPattern {
    fn name(&self) -> &'static str;

    fn scan(&self, view: &FileView<'_>, ctx: &PatternContext<'_>) -> Vec<CallSite>;
}

/// The default pass set, in a fixed order for reproducible output.
#[must_use]
pub fn default_patterns() -> Vec<Box<dyn CallPattern>> {
    vec![
        Box::new(StaticCallPattern),
        Box::new(MethodCallPattern),
        Box::new(DirectCallPattern),
        Box::new(IncludePattern),
    ]
}

fn snippet_of(line: &str) -> String {
    line.trim().chars().take(MAX_SNIPPET_CHARS).collect()
}

/// Capture the argument text following an opening parenthesis by simple
/// depth counting, bounded to the line. Nested calls stay opaque text.
fn capture_arguments(rest: &str) -> (String, Vec<String>) {
    let mut depth = 1usize;
    let mut inner = String::new();
    for ch in rest.chars() {
        match ch {
            '(' => {
                depth += 1;
                inner.push(ch);
            }
            ')' => {
                depth -= 1;
                if depth == 0 {
                    break;
                }
                inner.push(ch);
            }
            _ => inner.push(ch),
        }
    }
    let args = split_top_level(&inner);
    (inner, args)
}

/// Split captured argument text on top-level commas only.
fn split_top_level(inner: &str) -> Vec<String> {
    if inner.trim().is_empty() {
        return Vec::new();
    }
    let mut args = Vec::new();
    let mut depth = 0usize;
    let mut current = String::new();
    for ch in inner.chars() {
        match ch {
            '(' | '[' | '{' => {
                depth += 1;
                current.push(ch);
            }
            ')' | ']' | '}' => {
                depth = depth.saturating_sub(1);
                current.push(ch);
            }
            ',' if depth == 0 => {
                args.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(ch),
        }
    }
    if !current.trim().is_empty() {
        args.push(current.trim().to_string());
    }
    args
}

// ---------------------------------------------------------------------------
// Static-style invocation: Class::method(...)
// ---------------------------------------------------------------------------

pub struct StaticCallPattern;

static STATIC_CALL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\$?[A-Za-z_]\w*)::(\$?[A-Za-z_]\w*)\s*\(").expect("static call pattern")
});

impl CallPattern for StaticCallPattern {
    fn name(&self) -> &'static str {
        "static_call"
    }

    fn scan(&self, view: &FileView<'_>, ctx: &PatternContext<'_>) -> Vec<CallSite> {
        let mut sites = Vec::new();
        for (idx, line) in view.lines.iter().enumerate() {
            for caps in STATIC_CALL.captures_iter(line) {
                let class_tok = &caps[1];
                let method_tok = &caps[2];
                let whole = caps.get(0).expect("match");
                let (inner, args) = capture_arguments(&line[whole.end()..]);
                let expression = format!("{class_tok}::{method_tok}({inner})");

                let site = if class_tok.starts_with('$') {
                    // Variable-held class name: never guessed at.
                    CallSite {
                        caller_file: view.rel_path.to_string(),
                        caller_line: idx + 1,
                        call_expression: expression,
                        target_symbol: None,
                        target_class: None,
                        argument_texts: args,
                        resolution_confidence: Confidence::Low,
                        kind: CallKind::StaticCall,
                        snippet: snippet_of(line),
                    }
                } else if ctx.unit_classes.contains(class_tok) {
                    let dynamic_method = method_tok.starts_with('$');
                    CallSite {
                        caller_file: view.rel_path.to_string(),
                        caller_line: idx + 1,
                        call_expression: expression,
                        target_symbol: (!dynamic_method).then(|| method_tok.to_string()),
                        target_class: Some(class_tok.to_string()),
                        argument_texts: args,
                        resolution_confidence: if dynamic_method {
                            Confidence::Low
                        } else {
                            Confidence::High
                        },
                        kind: CallKind::StaticCall,
                        snippet: snippet_of(line),
                    }
                } else {
                    continue;
                };
                sites.push(site);
            }
        }
        sites
    }
}

// ---------------------------------------------------------------------------
// Method invocation: receiver->method(...)
// ---------------------------------------------------------------------------

pub struct MethodCallPattern;

static METHOD_CALL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(\$?[A-Za-z_]\w*)\s*->\s*([A-Za-z_]\w*)\s*\(").expect("method call pattern")
});

impl CallPattern for MethodCallPattern {
    fn name(&self) -> &'static str {
        "method_call"
    }

    fn scan(&self, view: &FileView<'_>, ctx: &PatternContext<'_>) -> Vec<CallSite> {
        let mut sites = Vec::new();
        for (idx, line) in view.lines.iter().enumerate() {
            for caps in METHOD_CALL.captures_iter(line) {
                let receiver = &caps[1];
                let method = &caps[2];

                let class = if let Some(var) = receiver.strip_prefix('$') {
                    match ctx.instance_vars.get(var) {
                        Some(class) => class.clone(),
                        None => continue,
                    }
                } else if ctx.unit_classes.contains(receiver) {
                    receiver.to_string()
                } else {
                    continue;
                };

                let whole = caps.get(0).expect("match");
                let (inner, args) = capture_arguments(&line[whole.end()..]);
                sites.push(CallSite {
                    caller_file: view.rel_path.to_string(),
                    caller_line: idx + 1,
                    call_expression: format!("{receiver}->{method}({inner})"),
                    target_symbol: Some(method.to_string()),
                    target_class: Some(class),
                    argument_texts: args,
                    resolution_confidence: Confidence::High,
                    kind: CallKind::MethodCall,
                    snippet: snippet_of(line),
                });
            }
        }
        sites
    }
}

// ---------------------------------------------------------------------------
// Direct function invocation: function_name(...)
// ---------------------------------------------------------------------------

pub struct DirectCallPattern;

static DIRECT_CALL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"([A-Za-z_]\w*)\s*\(").expect("direct call pattern"));

impl CallPattern for DirectCallPattern {
    fn name(&self) -> &'static str {
        "direct_call"
    }

    fn scan(&self, view: &FileView<'_>, ctx: &PatternContext<'_>) -> Vec<CallSite> {
        let mut sites = Vec::new();
        for (idx, line) in view.lines.iter().enumerate() {
            for caps in DIRECT_CALL.captures_iter(line) {
                let name = caps.get(1).expect("capture");
                let symbol = name.as_str();
                if !ctx.unit_functions.contains(symbol) || ctx.local_functions.contains(symbol) {
                    continue;
                }
                // Skip qualified calls, declarations, and constructor calls:
                // those belong to the other passes.
                let prefix = &line[..name.start()];
                if prefix.ends_with("->")
                    || prefix.ends_with("::")
                    || prefix.ends_with('$')
                    || prefix.trim_end().ends_with("new")
                    || prefix.trim_end().ends_with("function")
                {
                    continue;
                }

                let whole = caps.get(0).expect("match");
                let (inner, args) = capture_arguments(&line[whole.end()..]);
                sites.push(CallSite {
                    caller_file: view.rel_path.to_string(),
                    caller_line: idx + 1,
                    call_expression: format!("{symbol}({inner})"),
                    target_symbol: Some(symbol.to_string()),
                    target_class: None,
                    argument_texts: args,
                    resolution_confidence: Confidence::High,
                    kind: CallKind::DirectCall,
                    snippet: snippet_of(line),
                });
            }
        }
        sites
    }
}

// ---------------------------------------------------------------------------
// Inclusion reference: include/require of a unit file
// ---------------------------------------------------------------------------

pub struct IncludePattern;

static INCLUDE_LITERAL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"\b(include_once|require_once|include|require)\s*\(?\s*['"]([^'"]+)['"]"#)
        .expect("include literal pattern")
});

static INCLUDE_DYNAMIC: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(include_once|require_once|include|require)\s*\(?\s*([^;]*\$[^;]*);")
        .expect("include dynamic pattern")
});

/// Does an include path reference the unit subtree after normalization?
fn path_in_unit(include_path: &str, unit_path: &str) -> bool {
    let include_path = include_path.replace('\\', "/");
    let unit_path = unit_path.replace('\\', "/");
    if include_path.contains(&unit_path) {
        return true;
    }
    // Relative includes like "../auth/User.php" for a unit at "modules/auth".
    if let Some(basename) = unit_path.rsplit('/').next() {
        if include_path.contains(&format!("/{basename}/"))
            || include_path.starts_with(&format!("{basename}/"))
        {
            return true;
        }
    }
    false
}

impl CallPattern for IncludePattern {
    fn name(&self) -> &'static str {
        "include"
    }

    fn scan(&self, view: &FileView<'_>, ctx: &PatternContext<'_>) -> Vec<CallSite> {
        let mut sites = Vec::new();
        for (idx, line) in view.lines.iter().enumerate() {
            for caps in INCLUDE_LITERAL.captures_iter(line) {
                let directive = &caps[1];
                let path = &caps[2];
                if !path_in_unit(path, ctx.unit_path) {
                    continue;
                }
                sites.push(CallSite {
                    caller_file: view.rel_path.to_string(),
                    caller_line: idx + 1,
                    call_expression: format!("{directive}('{path}')"),
                    target_symbol: Some(path.to_string()),
                    target_class: None,
                    argument_texts: vec![path.to_string()],
                    resolution_confidence: Confidence::High,
                    kind: CallKind::Include,
                    snippet: snippet_of(line),
                });
            }

            // Concatenated or variable include targets: recorded for
            // visibility when they mention the unit, never auto-resolved.
            for caps in INCLUDE_DYNAMIC.captures_iter(line) {
                let directive = &caps[1];
                let arg = caps[2].trim().trim_end_matches(')');
                if INCLUDE_LITERAL.is_match(line) {
                    continue;
                }
                let basename = ctx.unit_path.rsplit('/').next().unwrap_or(ctx.unit_path);
                if !arg.contains(ctx.unit_path) && !arg.contains(basename) {
                    continue;
                }
                sites.push(CallSite {
                    caller_file: view.rel_path.to_string(),
                    caller_line: idx + 1,
                    call_expression: format!("{directive}({arg})"),
                    target_symbol: None,
                    target_class: None,
                    argument_texts: vec![arg.to_string()],
                    resolution_confidence: Confidence::Low,
                    kind: CallKind::Include,
                    snippet: snippet_of(line),
                });
            }
        }
        sites
    }
}
