//! Human-readable plan summary.
//!
//! A stable, line-oriented rendering of a resolved plan: one block per pair
//! with its field mappings, unmapped targets, and nested conversions, then
//! the diagnostics. Used by the CLI report and by determinism tests -- the
//! same plan always renders to the same bytes.

use std::fmt::Write;

use recast_resolve::{ResolvedFieldMapping, ResolvedPlan};

/// Render the whole plan as a text report.
pub fn render_summary(plan: &ResolvedPlan) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "plan: {} pair(s), {} diagnostic(s)",
        plan.pairs.len(),
        plan.diagnostics.len()
    );
    for pair in &plan.pairs {
        let suffix = if pair.generated_target { " (generated target)" } else { "" };
        let _ = writeln!(out, "pair {}{}", pair.pair_key(), suffix);
        for req in &pair.requires {
            let _ = writeln!(out, "  requires {}: {}", req.name, req.ty);
        }
        for field in &pair.fields {
            let _ = writeln!(out, "  {}", render_field(field));
        }
        for unmapped in &pair.unmapped {
            let _ = writeln!(
                out,
                "  unmapped {} [{}] {}",
                unmapped.path,
                unmapped.reason.as_str(),
                unmapped.detail
            );
        }
        for nested in &pair.nested {
            let state = if nested.resolved.is_some() { "" } else { " (unresolved)" };
            let _ = writeln!(out, "  nested {}{}", nested.key(), state);
        }
    }
    if plan.diagnostics.is_empty() {
        let _ = writeln!(out, "diagnostics: none");
    } else {
        let _ = writeln!(out, "diagnostics:");
        for diagnostic in plan.diagnostics.iter() {
            let _ = writeln!(out, "  {}", diagnostic);
        }
    }
    out
}

fn render_field(field: &ResolvedFieldMapping) -> String {
    let targets: Vec<String> = field.targets.iter().map(ToString::to_string).collect();
    let mut line = format!("field {}", targets.join(", "));
    if !field.sources.is_empty() {
        let sources: Vec<String> = field.sources.iter().map(ToString::to_string).collect();
        line.push_str(" <- ");
        line.push_str(&sources.join(", "));
    }
    let _ = write!(
        line,
        " [{}, {}, {:.2}] {}",
        field.strategy,
        field.origin,
        field.confidence,
        field.explanation
    );
    if !field.depends_on.is_empty() {
        let _ = write!(line, " (after {})", field.depends_on.join(", "));
    }
    line
}
