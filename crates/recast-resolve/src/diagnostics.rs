//! Diagnostics accumulated during resolution.
//!
//! Resolution never aborts on malformed input: every input-derived failure
//! gets a stable code and lands in the bag at one of three severities. A
//! plan is valid iff the bag holds no errors; warnings and infos never
//! invalidate anything.

use std::fmt;

use serde::Serialize;

/// Diagnostic severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Info => "info",
            Severity::Warning => "warning",
            Severity::Error => "error",
        };
        write!(f, "{}", s)
    }
}

/// Stable diagnostic codes, as surfaced to downstream tooling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum DiagnosticCode {
    #[serde(rename = "resolve_failed")]
    ResolveFailed,
    #[serde(rename = "121_mapping_error")]
    OneToOneMappingError,
    #[serde(rename = "field_mapping_error")]
    FieldMappingError,
    #[serde(rename = "ignore_parse_error")]
    IgnoreParseError,
    #[serde(rename = "auto_mapping_error")]
    AutoMappingError,
    #[serde(rename = "mapping_override")]
    MappingOverride,
    #[serde(rename = "unmapped_field")]
    UnmappedField,
    #[serde(rename = "requires_conflict")]
    RequiresConflict,
    #[serde(rename = "extra_target_invalid")]
    ExtraTargetInvalid,
    #[serde(rename = "extra_dependency_cycle")]
    ExtraDependencyCycle,
    #[serde(rename = "extra_dependency_missing")]
    ExtraDependencyMissing,
    #[serde(rename = "nested_resolve_error")]
    NestedResolveError,
    #[serde(rename = "max_recursion_depth")]
    MaxRecursionDepth,
    #[serde(rename = "recursive_pair_self_reference")]
    RecursivePairSelfReference,
    #[serde(rename = "requires_type_conflict")]
    RequiresTypeConflict,
}

impl DiagnosticCode {
    /// The stable identifier string.
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticCode::ResolveFailed => "resolve_failed",
            DiagnosticCode::OneToOneMappingError => "121_mapping_error",
            DiagnosticCode::FieldMappingError => "field_mapping_error",
            DiagnosticCode::IgnoreParseError => "ignore_parse_error",
            DiagnosticCode::AutoMappingError => "auto_mapping_error",
            DiagnosticCode::MappingOverride => "mapping_override",
            DiagnosticCode::UnmappedField => "unmapped_field",
            DiagnosticCode::RequiresConflict => "requires_conflict",
            DiagnosticCode::ExtraTargetInvalid => "extra_target_invalid",
            DiagnosticCode::ExtraDependencyCycle => "extra_dependency_cycle",
            DiagnosticCode::ExtraDependencyMissing => "extra_dependency_missing",
            DiagnosticCode::NestedResolveError => "nested_resolve_error",
            DiagnosticCode::MaxRecursionDepth => "max_recursion_depth",
            DiagnosticCode::RecursivePairSelfReference => "recursive_pair_self_reference",
            DiagnosticCode::RequiresTypeConflict => "requires_type_conflict",
        }
    }
}

impl fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One diagnostic entry.
#[derive(Debug, Clone, Serialize)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: DiagnosticCode,
    pub message: String,
    /// The `source->target` pair key the diagnostic belongs to, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pair: Option<String>,
    /// The field path involved, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl Diagnostic {
    pub fn new(severity: Severity, code: DiagnosticCode, message: impl Into<String>) -> Self {
        Diagnostic {
            severity,
            code,
            message: message.into(),
            pair: None,
            path: None,
        }
    }

    pub fn with_pair(mut self, pair: impl Into<String>) -> Self {
        self.pair = Some(pair.into());
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}]", self.severity, self.code)?;
        if let Some(pair) = &self.pair {
            write!(f, " {}", pair)?;
        }
        if let Some(path) = &self.path {
            write!(f, " `{}`", path)?;
        }
        write!(f, ": {}", self.message)
    }
}

/// The accumulating diagnostics bag.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Diagnostics::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.entries.push(diagnostic);
    }

    pub fn info(&mut self, code: DiagnosticCode, message: impl Into<String>) {
        self.push(Diagnostic::new(Severity::Info, code, message));
    }

    pub fn warning(&mut self, code: DiagnosticCode, message: impl Into<String>) {
        self.push(Diagnostic::new(Severity::Warning, code, message));
    }

    pub fn error(&mut self, code: DiagnosticCode, message: impl Into<String>) {
        self.push(Diagnostic::new(Severity::Error, code, message));
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    pub fn infos(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter(|d| d.severity == Severity::Info)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter(|d| d.severity == Severity::Warning)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter(|d| d.severity == Severity::Error)
    }

    pub fn has_errors(&self) -> bool {
        self.errors().next().is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_are_stable() {
        assert_eq!(DiagnosticCode::OneToOneMappingError.as_str(), "121_mapping_error");
        assert_eq!(DiagnosticCode::RecursivePairSelfReference.as_str(), "recursive_pair_self_reference");
    }

    #[test]
    fn display_includes_pair_and_path() {
        let d = Diagnostic::new(Severity::Warning, DiagnosticCode::MappingOverride, "already mapped")
            .with_pair("a.A->b.B")
            .with_path("Name");
        assert_eq!(d.to_string(), "warning [mapping_override] a.A->b.B `Name`: already mapped");
    }

    #[test]
    fn validity_tracks_errors_only() {
        let mut bag = Diagnostics::new();
        bag.warning(DiagnosticCode::MappingOverride, "w");
        bag.info(DiagnosticCode::UnmappedField, "i");
        assert!(!bag.has_errors());
        bag.error(DiagnosticCode::ResolveFailed, "e");
        assert!(bag.has_errors());
        assert_eq!(bag.errors().count(), 1);
        assert_eq!(bag.len(), 3);
    }
}
