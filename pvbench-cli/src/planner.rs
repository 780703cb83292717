//! Suite Planner
//!
//! Narrows a registry to the cases selected on the command line and renders
//! the resulting plan for `list` / `--dry-run`.
//!
//! Unlike name-sorted benchmark plans, registration order is preserved: it
//! is the order cases run and are reported in.

use pvbench_core::CaseRegistry;
use regex::Regex;

/// Keep only the cases whose name matches `filter`
pub fn build_plan(registry: CaseRegistry, filter: Option<&Regex>) -> CaseRegistry {
    match filter {
        Some(re) => registry.into_selected(|case| re.is_match(case.name())),
        None => registry,
    }
}

/// Tree rendering of a plan, one line per case
pub fn format_plan(registry: &CaseRegistry, len: u32) -> String {
    let mut output = format!("pvbench plan ({len} pushes per invocation):\n");
    for case in registry {
        let kind = case
            .kind()
            .map(|kind| kind.to_string())
            .unwrap_or_else(|| "custom".to_string());
        output.push_str(&format!("├── {} [{}]", case.name(), kind));
        if let Some(reason) = case.skip_reason() {
            output.push_str(&format!(" (skipped: {reason})"));
        }
        output.push('\n');
    }
    output.push_str(&format!("{} cases found.\n", registry.len()));
    output
}
