//! The resolver core.
//!
//! Orchestrates the five priority tiers for every declared type mapping,
//! discovers nested struct pairs implied by the chosen strategies, recurses
//! with cycle tolerance and a depth bound, derives ordering edges from
//! `def.target` annotations, and sorts every output list so two runs over
//! the same inputs are byte-identical.

use std::collections::BTreeMap;
use std::fmt;

use rustc_hash::{FxHashMap, FxHashSet};

use recast_graph::{FieldPath, TypeGraph, TypeId, TypeKind};
use recast_mapping::{FieldRule, Hint, IgnoreRule, MappingDocument, TypeMapping};
use recast_match::{rank_candidates, Candidate, Compat};

use crate::diagnostics::{Diagnostic, DiagnosticCode, Diagnostics, Severity};
use crate::plan::{
    Cardinality, NestedConversion, Origin, PairId, ResolvedFieldMapping, ResolvedPlan,
    ResolvedTypePair, Strategy, UnmappedReason, UnmappedTarget,
};
use crate::strategy;
use crate::{requires, synth};

/// Tuning knobs for resolution. The defaults match what the suggestion
/// exporter reports as "the thresholds in force".
#[derive(Debug, Clone)]
pub struct ResolveConfig {
    /// Minimum combined score for auto-accepting a candidate.
    pub min_confidence: f64,
    /// Minimum lead over the runner-up for auto-acceptance.
    pub min_gap: f64,
    /// Top-two candidates within this distance count as ambiguous.
    pub ambiguity_threshold: f64,
    /// Fail the whole run when any error diagnostic is produced.
    pub strict: bool,
    /// How many ranked candidates to keep on unmapped targets.
    pub max_candidates: usize,
    /// Whether to recursively resolve nested pairs.
    pub recursive: bool,
    /// Bound on nested-pair recursion depth.
    pub max_recursion_depth: usize,
    /// Name-score gate for the structural fallback (struct/struct,
    /// slice/slice, array/array pairs auto-accepted on name alone).
    pub structural_fallback_name_score: f64,
}

impl Default for ResolveConfig {
    fn default() -> Self {
        ResolveConfig {
            min_confidence: 0.7,
            min_gap: 0.15,
            ambiguity_threshold: 0.1,
            strict: false,
            max_candidates: 5,
            recursive: true,
            max_recursion_depth: 10,
            structural_fallback_name_score: 0.8,
        }
    }
}

/// Fatal resolution failure. Only strict mode produces one; non-strict runs
/// always return a best-effort plan with the problems in its diagnostics.
#[derive(Debug)]
pub enum ResolveError {
    /// Strict mode and the diagnostics bag holds at least one error.
    Strict { diagnostics: Diagnostics },
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResolveError::Strict { diagnostics } => write!(
                f,
                "strict mode: resolution produced {} error(s)",
                diagnostics.errors().count()
            ),
        }
    }
}

impl std::error::Error for ResolveError {}

/// Resolve a mapping document against the type graph.
///
/// Synthesizes every requested virtual target first (the only graph
/// mutation), then resolves each declared mapping through the five priority
/// tiers. The returned plan references the graph by [`TypeId`]; the graph
/// stays with the caller.
pub fn resolve(
    graph: &mut TypeGraph,
    doc: &MappingDocument,
    config: &ResolveConfig,
) -> Result<ResolvedPlan, ResolveError> {
    let mut diagnostics = Diagnostics::new();
    synth::populate_virtual_targets(graph, doc, &mut diagnostics);
    let graph: &TypeGraph = graph;

    let mut resolver = Resolver {
        graph,
        doc,
        config,
        pairs: Vec::new(),
        cache: FxHashMap::default(),
        stack: Vec::new(),
        diagnostics,
    };
    let mut roots = Vec::new();
    for mapping in &doc.mappings {
        if let Some(pair_id) = resolver.resolve_type_mapping(mapping, 0) {
            roots.push(pair_id);
        }
    }
    requires::deduce(&mut resolver.pairs, graph, &mut resolver.diagnostics);

    let plan = ResolvedPlan {
        pairs: resolver.pairs,
        roots,
        transforms: doc.transforms.clone(),
        diagnostics: resolver.diagnostics,
    };
    if config.strict && plan.diagnostics.has_errors() {
        return Err(ResolveError::Strict { diagnostics: plan.diagnostics });
    }
    Ok(plan)
}

/// Per-invocation resolution state. The pair cache is both the dedup
/// mechanism and the cycle breaker: a pair is pre-inserted before its own
/// resolution starts, so any descent that revisits it shares the record.
struct Resolver<'a> {
    graph: &'a TypeGraph,
    doc: &'a MappingDocument,
    config: &'a ResolveConfig,
    pairs: Vec<ResolvedTypePair>,
    cache: FxHashMap<String, PairId>,
    /// Pair keys currently on the resolution stack, for self-reference info.
    stack: Vec<String>,
    diagnostics: Diagnostics,
}

impl<'a> Resolver<'a> {
    fn resolve_type_mapping(&mut self, mapping: &TypeMapping, depth: usize) -> Option<PairId> {
        let source_id = TypeId::parse(&mapping.source);
        let target_id = TypeId::parse(&mapping.target);
        let pair_key = format!("{}->{}", source_id, target_id);

        if let Some(&cached) = self.cache.get(&pair_key) {
            if self.stack.contains(&pair_key) {
                self.diagnostics.push(
                    Diagnostic::new(
                        Severity::Info,
                        DiagnosticCode::RecursivePairSelfReference,
                        "pair is already being resolved; sharing the in-progress record",
                    )
                    .with_pair(pair_key.as_str()),
                );
            }
            return Some(cached);
        }

        if self.graph.get(&source_id).is_none() {
            self.diagnostics.push(
                Diagnostic::new(
                    Severity::Error,
                    DiagnosticCode::ResolveFailed,
                    format!("source type `{}` not found in graph", source_id),
                )
                .with_pair(pair_key.as_str()),
            );
            return None;
        }
        if self.graph.get(&target_id).is_none() {
            self.diagnostics.push(
                Diagnostic::new(
                    Severity::Error,
                    DiagnosticCode::ResolveFailed,
                    format!(
                        "target type `{}` not found in graph (set generate_target to synthesize it)",
                        target_id
                    ),
                )
                .with_pair(pair_key.as_str()),
            );
            return None;
        }
        let generated_target = self.graph.is_synthesized(&target_id);

        self.check_requires_conflicts(mapping, &source_id, &pair_key);

        // Pre-insert the pair so cyclic descents share it.
        let pair_id = PairId(self.pairs.len());
        self.pairs.push(ResolvedTypePair {
            source: source_id.clone(),
            target: target_id.clone(),
            fields: Vec::new(),
            unmapped: Vec::new(),
            nested: Vec::new(),
            requires: mapping.requires.clone(),
            generated_target,
        });
        self.cache.insert(pair_key.clone(), pair_id);
        self.stack.push(pair_key.clone());

        let mut fields: Vec<ResolvedFieldMapping> = Vec::new();
        let mut unmapped: Vec<UnmappedTarget> = Vec::new();
        let mut claimed: FxHashSet<String> = FxHashSet::default();

        self.apply_one_to_one(mapping, &source_id, &target_id, &pair_key, &mut claimed, &mut fields);
        for rule in &mapping.fields {
            self.apply_rule(
                rule,
                Origin::Fields,
                DiagnosticCode::FieldMappingError,
                &source_id,
                &target_id,
                &pair_key,
                &mut claimed,
                &mut fields,
            );
        }
        self.apply_ignores(mapping, &target_id, &pair_key, &mut claimed, &mut fields);
        for rule in &mapping.auto {
            self.apply_rule(
                rule,
                Origin::AutoRule,
                DiagnosticCode::AutoMappingError,
                &source_id,
                &target_id,
                &pair_key,
                &mut claimed,
                &mut fields,
            );
        }
        self.auto_match(&source_id, &target_id, &pair_key, &claimed, &mut fields, &mut unmapped);

        self.derive_dependencies(&target_id, &pair_key, &mut fields);

        let mut nested = self.detect_nested(&source_id, &target_id, &fields);
        self.resolve_nested(&mut nested, &pair_key, depth);

        fields.sort_by(|a, b| {
            a.origin
                .tier()
                .cmp(&b.origin.tier())
                .then_with(|| a.primary_target().cmp(&b.primary_target()))
        });
        unmapped.sort_by(|a, b| a.path.cmp(&b.path));
        nested.sort_by_key(NestedConversion::key);

        let pair = &mut self.pairs[pair_id.0];
        pair.fields = fields;
        pair.unmapped = unmapped;
        pair.nested = nested;
        self.stack.pop();
        Some(pair_id)
    }

    /// Warn when a requires argument shares a name with a source field.
    fn check_requires_conflicts(&mut self, mapping: &TypeMapping, source_id: &TypeId, pair_key: &str) {
        let Some(info) = self.graph.get(source_id) else { return };
        let Some(resolved) = self.graph.resolve_alias(info) else { return };
        for req in &mapping.requires {
            if resolved.field(&req.name).is_some() {
                self.diagnostics.push(
                    Diagnostic::new(
                        Severity::Warning,
                        DiagnosticCode::RequiresConflict,
                        format!(
                            "requires argument `{}` shadows a source field of the same name",
                            req.name
                        ),
                    )
                    .with_pair(pair_key),
                );
            }
        }
    }

    // ── Tier 1: one-to-one renames ──────────────────────────────────────

    fn apply_one_to_one(
        &mut self,
        mapping: &TypeMapping,
        source_id: &TypeId,
        target_id: &TypeId,
        pair_key: &str,
        claimed: &mut FxHashSet<String>,
        fields: &mut Vec<ResolvedFieldMapping>,
    ) {
        for (src_raw, tgt_raw) in &mapping.one_to_one {
            let src_path = match FieldPath::parse(src_raw) {
                Ok(path) => path,
                Err(e) => {
                    self.warn_entry(DiagnosticCode::OneToOneMappingError, pair_key, src_raw, e);
                    continue;
                }
            };
            let tgt_path = match FieldPath::parse(tgt_raw) {
                Ok(path) => path,
                Err(e) => {
                    self.warn_entry(DiagnosticCode::OneToOneMappingError, pair_key, tgt_raw, e);
                    continue;
                }
            };
            let tgt_key = tgt_path.to_string();
            if claimed.contains(&tgt_key) {
                self.warn_override(pair_key, &tgt_key, Origin::OneToOne);
                continue;
            }
            let src_ty = match src_path.resolve(self.graph, source_id) {
                Ok(ty) => ty,
                Err(e) => {
                    self.warn_entry(DiagnosticCode::OneToOneMappingError, pair_key, src_raw, e);
                    continue;
                }
            };
            let tgt_ty = match tgt_path.resolve(self.graph, target_id) {
                Ok(ty) => ty,
                Err(e) => {
                    self.warn_entry(DiagnosticCode::OneToOneMappingError, pair_key, tgt_raw, e);
                    continue;
                }
            };
            let choice = strategy::select(self.graph, Some(&src_ty), Some(&tgt_ty), Hint::None);
            claimed.insert(tgt_key);
            fields.push(ResolvedFieldMapping {
                targets: vec![tgt_path],
                sources: vec![src_path],
                origin: Origin::OneToOne,
                cardinality: Cardinality::OneToOne,
                strategy: choice.strategy,
                transform: None,
                default: None,
                confidence: 1.0,
                explanation: choice.reason,
                hint: Hint::None,
                extra: BTreeMap::new(),
                depends_on: Vec::new(),
            });
        }
    }

    // ── Tiers 2 and 4: explicit field/auto rules ────────────────────────

    #[allow(clippy::too_many_arguments)]
    fn apply_rule(
        &mut self,
        rule: &FieldRule,
        origin: Origin,
        code: DiagnosticCode,
        source_id: &TypeId,
        target_id: &TypeId,
        pair_key: &str,
        claimed: &mut FxHashSet<String>,
        fields: &mut Vec<ResolvedFieldMapping>,
    ) {
        let target_raw = rule.target_paths();
        if target_raw.is_empty() {
            self.diagnostics.push(
                Diagnostic::new(Severity::Warning, code, "rule has no target path")
                    .with_pair(pair_key),
            );
            return;
        }
        let mut targets: Vec<FieldPath> = Vec::new();
        for raw in &target_raw {
            match FieldPath::parse(raw) {
                Ok(path) => targets.push(path),
                Err(e) => {
                    self.warn_entry(code, pair_key, raw, e);
                    return;
                }
            }
        }
        for target in &targets {
            if claimed.contains(&target.to_string()) {
                self.warn_override(pair_key, &target.to_string(), origin);
                return;
            }
        }
        let mut sources: Vec<FieldPath> = Vec::new();
        for raw in rule.source_paths() {
            match FieldPath::parse(raw) {
                Ok(path) => sources.push(path),
                Err(e) => {
                    self.warn_entry(code, pair_key, raw, e);
                    return;
                }
            }
        }
        // Validate every referenced path; a single bad entry downgrades the
        // rule to a warning without touching the rest of the mapping.
        let mut src_terminal = None;
        for (i, source) in sources.iter().enumerate() {
            match source.resolve(self.graph, source_id) {
                Ok(ty) => {
                    if i == 0 {
                        src_terminal = Some(ty);
                    }
                }
                Err(e) => {
                    self.warn_entry(code, pair_key, &source.to_string(), e);
                    return;
                }
            }
        }
        let tgt_terminal = match targets[0].resolve(self.graph, target_id) {
            Ok(ty) => ty,
            Err(e) => {
                self.warn_entry(code, pair_key, &targets[0].to_string(), e);
                return;
            }
        };

        let (chosen, transform, explanation) = if let Some(literal) = &rule.default {
            (
                Strategy::Default,
                None,
                format!("assigns literal default `{}`", literal),
            )
        } else if let Some(name) = &rule.transform {
            (
                Strategy::Transform,
                Some(name.clone()),
                format!("invokes user transform `{}`", name),
            )
        } else {
            let choice =
                strategy::select(self.graph, src_terminal.as_ref(), Some(&tgt_terminal), rule.hint);
            (choice.strategy, None, choice.reason)
        };

        let cardinality = Cardinality::from_counts(sources.len(), targets.len());
        for target in &targets {
            claimed.insert(target.to_string());
        }
        fields.push(ResolvedFieldMapping {
            targets,
            sources,
            origin,
            cardinality,
            strategy: chosen,
            transform,
            default: rule.default.clone(),
            confidence: 1.0,
            explanation,
            hint: rule.hint,
            extra: rule.extra.clone(),
            depends_on: Vec::new(),
        });
    }

    // ── Tier 3: explicit ignores ────────────────────────────────────────

    fn apply_ignores(
        &mut self,
        mapping: &TypeMapping,
        target_id: &TypeId,
        pair_key: &str,
        claimed: &mut FxHashSet<String>,
        fields: &mut Vec<ResolvedFieldMapping>,
    ) {
        for entry in &mapping.ignore {
            let raw = entry.path();
            let path = match FieldPath::parse(raw) {
                Ok(path) => path,
                Err(e) => {
                    self.warn_entry(DiagnosticCode::IgnoreParseError, pair_key, raw, e);
                    continue;
                }
            };
            let key = path.to_string();
            if claimed.contains(&key) {
                self.warn_override(pair_key, &key, Origin::Ignore);
                continue;
            }
            if let Err(e) = path.resolve(self.graph, target_id) {
                self.warn_entry(DiagnosticCode::IgnoreParseError, pair_key, raw, e);
                continue;
            }
            let explanation = match entry {
                IgnoreRule::Annotated { reason, .. } => format!("explicitly ignored: {}", reason),
                IgnoreRule::Path(_) => "explicitly ignored".to_string(),
            };
            claimed.insert(key);
            fields.push(ResolvedFieldMapping {
                targets: vec![path],
                sources: Vec::new(),
                origin: Origin::Ignore,
                cardinality: Cardinality::OneToOne,
                strategy: Strategy::Ignore,
                transform: None,
                default: None,
                confidence: 1.0,
                explanation,
                hint: Hint::None,
                extra: BTreeMap::new(),
                depends_on: Vec::new(),
            });
        }
    }

    // ── Tier 5: algorithmic auto-match ──────────────────────────────────

    fn auto_match(
        &mut self,
        source_id: &TypeId,
        target_id: &TypeId,
        pair_key: &str,
        claimed: &FxHashSet<String>,
        fields: &mut Vec<ResolvedFieldMapping>,
        unmapped: &mut Vec<UnmappedTarget>,
    ) {
        let graph = self.graph;
        let source_struct = graph.get(source_id).and_then(|info| graph.resolve_alias(info));
        let target_struct = graph.get(target_id).and_then(|info| graph.resolve_alias(info));
        let (Some(src), Some(tgt)) = (source_struct, target_struct) else { return };
        if !src.is_struct() || !tgt.is_struct() {
            return;
        }

        for field in &tgt.fields {
            if !field.exported || self.is_claimed(claimed, &field.name) {
                continue;
            }
            let set = rank_candidates(self.graph, src, field);

            let accepted: Option<Candidate> = set
                .high_confidence(self.config.min_confidence, self.config.min_gap)
                .cloned()
                .or_else(|| {
                    let best = set.best()?;
                    let structural = best.name_score >= self.config.structural_fallback_name_score
                        && self.structural_pair(&best.source_type, &field.ty);
                    structural.then(|| best.clone())
                });

            match accepted {
                Some(candidate) => {
                    let choice = strategy::select(
                        self.graph,
                        Some(&candidate.source_type),
                        Some(&field.ty),
                        Hint::None,
                    );
                    fields.push(ResolvedFieldMapping {
                        targets: vec![FieldPath::field(&field.name)],
                        sources: vec![FieldPath::field(&candidate.name)],
                        origin: Origin::AutoMatch,
                        cardinality: Cardinality::OneToOne,
                        strategy: choice.strategy,
                        transform: None,
                        default: None,
                        confidence: candidate.score,
                        explanation: format!(
                            "auto-matched `{}` (name {:.2}, type {}): {}",
                            candidate.name, candidate.name_score, candidate.compat, choice.reason
                        ),
                        hint: Hint::None,
                        extra: BTreeMap::new(),
                        depends_on: Vec::new(),
                    });
                }
                None => {
                    let (reason, detail) = self.unmatched_reason(&set, &field.name);
                    self.diagnostics.push(
                        Diagnostic::new(
                            Severity::Info,
                            DiagnosticCode::UnmappedField,
                            detail.clone(),
                        )
                        .with_pair(pair_key)
                        .with_path(field.name.as_str()),
                    );
                    unmapped.push(UnmappedTarget {
                        path: field.name.clone(),
                        target_type: field.ty.clone(),
                        reason,
                        detail,
                        candidates: set.top(self.config.max_candidates).to_vec(),
                    });
                }
            }
        }
    }

    /// A field counts as claimed when an earlier tier consumed its exact
    /// name or any path rooted at it.
    fn is_claimed(&self, claimed: &FxHashSet<String>, name: &str) -> bool {
        if claimed.contains(name) {
            return true;
        }
        claimed.iter().any(|path| {
            path.strip_prefix(name)
                .is_some_and(|rest| rest.starts_with('.') || rest.starts_with("[]"))
        })
    }

    /// Both sides are struct/struct, slice/slice, or array/array after
    /// alias resolution.
    fn structural_pair(&self, source: &TypeId, target: &TypeId) -> bool {
        let graph = self.graph;
        let kind_of = |id: &TypeId| -> Option<TypeKind> {
            let info = graph.get(id)?;
            Some(graph.resolve_alias(info)?.kind)
        };
        matches!(
            (kind_of(source), kind_of(target)),
            (Some(TypeKind::Struct), Some(TypeKind::Struct))
                | (Some(TypeKind::Slice), Some(TypeKind::Slice))
                | (Some(TypeKind::Array), Some(TypeKind::Array))
        )
    }

    fn unmatched_reason(
        &self,
        set: &recast_match::CandidateSet,
        field: &str,
    ) -> (UnmappedReason, String) {
        let best = set.best();
        let compatible = best.is_some_and(|b| b.compat != Compat::Incompatible);
        if best.is_none() || !compatible {
            return (
                UnmappedReason::NoCompatibleSource,
                format!("no exported source field is compatible with `{}`", field),
            );
        }
        let best = best.expect("checked above");
        if set.ambiguous(self.config.ambiguity_threshold) {
            let runner_up = set.top(2).get(1).expect("ambiguity implies two");
            return (
                UnmappedReason::Ambiguous,
                format!(
                    "ambiguous match for `{}`: `{}` ({:.2}) vs `{}` ({:.2}) within {:.2}",
                    field,
                    best.name,
                    best.score,
                    runner_up.name,
                    runner_up.score,
                    self.config.ambiguity_threshold
                ),
            );
        }
        if best.score < self.config.min_confidence {
            return (
                UnmappedReason::BelowThreshold,
                format!(
                    "best candidate `{}` for `{}` scored {:.2}, below min confidence {:.2}",
                    best.name, field, best.score, self.config.min_confidence
                ),
            );
        }
        (
            UnmappedReason::Unmatched,
            format!(
                "candidate `{}` for `{}` scored {:.2} but did not clear the acceptance gates (gap {:.2})",
                best.name, field, best.score, self.config.min_gap
            ),
        )
    }

    // ── Ordering edges from `def.target` annotations ────────────────────

    fn derive_dependencies(
        &mut self,
        target_id: &TypeId,
        pair_key: &str,
        fields: &mut [ResolvedFieldMapping],
    ) {
        // Validated (field index, dependency path) edges.
        let mut edges: Vec<(usize, String)> = Vec::new();
        let mut invalid: Vec<(String, String)> = Vec::new();
        for (i, mapping) in fields.iter().enumerate() {
            let Some(raw) = mapping.extra.get("def.target") else { continue };
            match FieldPath::parse(raw) {
                Ok(path) if path.resolve(self.graph, target_id).is_ok() => {
                    edges.push((i, path.to_string()));
                }
                Ok(_) => invalid.push((
                    raw.clone(),
                    format!("`def.target` path `{}` does not resolve on `{}`", raw, target_id),
                )),
                Err(e) => invalid.push((raw.clone(), format!("bad `def.target` path: {}", e))),
            }
        }
        for (path, message) in invalid {
            self.diagnostics.push(
                Diagnostic::new(Severity::Error, DiagnosticCode::ExtraTargetInvalid, message)
                    .with_pair(pair_key)
                    .with_path(path),
            );
        }

        // Producer index: which field mapping assigns each target path.
        let mut producers: FxHashMap<String, usize> = FxHashMap::default();
        for (i, mapping) in fields.iter().enumerate() {
            for target in &mapping.targets {
                producers.insert(target.to_string(), i);
            }
        }
        let dep_of: FxHashMap<usize, String> = edges.iter().cloned().collect();

        for (i, dependency) in &edges {
            let own: Vec<String> = fields[*i].targets.iter().map(|t| t.to_string()).collect();
            let mut cyclic = own.contains(dependency);
            if !cyclic {
                // Follow the dependency chain; landing back on one of our
                // own targets closes a cycle (covers mutual references).
                let mut seen: FxHashSet<String> = FxHashSet::default();
                let mut current = dependency.clone();
                loop {
                    if !seen.insert(current.clone()) {
                        break;
                    }
                    let Some(producer) = producers.get(&current) else { break };
                    let Some(next) = dep_of.get(producer) else { break };
                    if own.contains(next) {
                        cyclic = true;
                        break;
                    }
                    current = next.clone();
                }
            }
            if cyclic {
                self.diagnostics.push(
                    Diagnostic::new(
                        Severity::Error,
                        DiagnosticCode::ExtraDependencyCycle,
                        format!("`def.target` dependency on `{}` forms a cycle", dependency),
                    )
                    .with_pair(pair_key)
                    .with_path(fields[*i].primary_target()),
                );
                continue;
            }
            if !producers.contains_key(dependency) {
                self.diagnostics.push(
                    Diagnostic::new(
                        Severity::Error,
                        DiagnosticCode::ExtraDependencyMissing,
                        format!("no mapping produces `{}`", dependency),
                    )
                    .with_pair(pair_key)
                    .with_path(fields[*i].primary_target()),
                );
                continue;
            }
            let deps = &mut fields[*i].depends_on;
            if !deps.contains(dependency) {
                deps.push(dependency.clone());
                deps.sort();
            }
        }
    }

    // ── Nested pair detection and recursion ─────────────────────────────

    fn detect_nested(
        &self,
        source_id: &TypeId,
        target_id: &TypeId,
        fields: &[ResolvedFieldMapping],
    ) -> Vec<NestedConversion> {
        let mut nested: Vec<NestedConversion> = Vec::new();
        for mapping in fields {
            if !mapping.strategy.induces_nested_pair() {
                continue;
            }
            let (Some(src_path), Some(tgt_path)) = (mapping.sources.first(), mapping.targets.first())
            else {
                continue;
            };
            let Ok(src_ty) = src_path.resolve(self.graph, source_id) else { continue };
            let Ok(tgt_ty) = tgt_path.resolve(self.graph, target_id) else { continue };
            let (Some(src_struct), Some(tgt_struct)) =
                (self.terminal_struct(&src_ty), self.terminal_struct(&tgt_ty))
            else {
                continue;
            };
            if src_struct == tgt_struct {
                continue;
            }
            let reference = mapping.primary_target();
            match nested
                .iter_mut()
                .find(|n| n.source == src_struct && n.target == tgt_struct)
            {
                Some(existing) => {
                    if !existing.referenced_by.contains(&reference) {
                        existing.referenced_by.push(reference);
                    }
                }
                None => nested.push(NestedConversion {
                    source: src_struct,
                    target: tgt_struct,
                    referenced_by: vec![reference],
                    resolved: None,
                }),
            }
        }
        nested
    }

    /// Walk pointers, collections, and aliases down to a struct terminal.
    fn terminal_struct(&self, id: &TypeId) -> Option<TypeId> {
        let mut info = self.graph.get(id)?;
        let mut hops = 0;
        loop {
            match info.kind {
                TypeKind::Struct => return Some(info.id.clone()),
                TypeKind::Pointer | TypeKind::Slice | TypeKind::Array => {
                    info = self.graph.get(info.element.as_ref()?)?;
                }
                TypeKind::Alias => {
                    info = self.graph.get(info.underlying.as_ref()?)?;
                }
                _ => return None,
            }
            hops += 1;
            if hops > 32 {
                return None;
            }
        }
    }

    fn resolve_nested(&mut self, nested: &mut [NestedConversion], pair_key: &str, depth: usize) {
        if !self.config.recursive {
            return;
        }
        for conversion in nested.iter_mut() {
            if depth + 1 > self.config.max_recursion_depth {
                self.diagnostics.push(
                    Diagnostic::new(
                        Severity::Warning,
                        DiagnosticCode::MaxRecursionDepth,
                        format!(
                            "nested pair `{}` not resolved: recursion depth limit {} reached",
                            conversion.key(),
                            self.config.max_recursion_depth
                        ),
                    )
                    .with_pair(pair_key),
                );
                continue;
            }
            // A declared mapping for the inner pair contributes its explicit
            // rules; otherwise the pair resolves purely algorithmically.
            let declared = self
                .doc
                .mappings
                .iter()
                .find(|m| {
                    TypeId::parse(&m.source) == conversion.source
                        && TypeId::parse(&m.target) == conversion.target
                })
                .cloned();
            let mapping = declared.unwrap_or_else(|| {
                TypeMapping::new(conversion.source.to_string(), conversion.target.to_string())
            });
            match self.resolve_type_mapping(&mapping, depth + 1) {
                Some(pair_id) => conversion.resolved = Some(pair_id),
                None => {
                    self.diagnostics.push(
                        Diagnostic::new(
                            Severity::Warning,
                            DiagnosticCode::NestedResolveError,
                            format!("nested pair `{}` could not be resolved", conversion.key()),
                        )
                        .with_pair(pair_key),
                    );
                }
            }
        }
    }

    // ── Diagnostic shorthands ───────────────────────────────────────────

    fn warn_entry(
        &mut self,
        code: DiagnosticCode,
        pair_key: &str,
        path: &str,
        error: impl fmt::Display,
    ) {
        self.diagnostics.push(
            Diagnostic::new(Severity::Warning, code, error.to_string())
                .with_pair(pair_key)
                .with_path(path),
        );
    }

    fn warn_override(&mut self, pair_key: &str, target: &str, origin: Origin) {
        self.diagnostics.push(
            Diagnostic::new(
                Severity::Warning,
                DiagnosticCode::MappingOverride,
                format!(
                    "target `{}` already mapped by a higher-priority tier; `{}` entry ignored",
                    target,
                    origin.as_str()
                ),
            )
            .with_pair(pair_key)
            .with_path(target),
        );
    }
}
