//! The recast CLI.
//!
//! `recastc resolve` loads a type graph (JSON, as emitted by a graph
//! provider) and a mapping document (YAML), resolves, and prints the plan
//! report. `recastc suggest` additionally folds the plan back into an
//! annotated mapping document. Exit codes: 0 for a valid plan, 1 for a plan
//! with errors or a usage failure, 2 for a strict-mode abort.

use std::fmt;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};

use recast_graph::TypeGraph;
use recast_mapping::MappingDocument;
use recast_resolve::{resolve, ResolveConfig, ResolveError, ResolvedPlan};
use recast_suggest::{export, render_summary};

#[derive(Parser)]
#[command(name = "recastc", version, about = "Plan struct casting functions from a mapping document")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve a mapping document against a type graph and print the report.
    Resolve(ResolveArgs),
    /// Resolve, then emit the suggested mapping document as YAML.
    Suggest(SuggestArgs),
}

#[derive(Args)]
struct ResolveArgs {
    /// Type graph JSON produced by a graph provider.
    #[arg(long)]
    graph: PathBuf,
    /// Mapping document YAML.
    #[arg(long)]
    mapping: PathBuf,
    /// Abort with a nonzero exit if any error diagnostic is produced.
    #[arg(long)]
    strict: bool,
    /// Minimum combined score for auto-accepting a candidate.
    #[arg(long, default_value_t = 0.7)]
    min_confidence: f64,
    /// Minimum lead over the runner-up for auto-acceptance.
    #[arg(long, default_value_t = 0.15)]
    min_gap: f64,
    /// Top-two candidates within this distance count as ambiguous.
    #[arg(long, default_value_t = 0.1)]
    ambiguity_threshold: f64,
    /// Ranked candidates kept per unmapped target.
    #[arg(long, default_value_t = 5)]
    max_candidates: usize,
    /// Bound on nested-pair recursion depth.
    #[arg(long, default_value_t = 10)]
    max_recursion_depth: usize,
    /// Name-score gate for the structural auto-match fallback.
    #[arg(long, default_value_t = 0.8)]
    structural_fallback_name_score: f64,
    /// Do not recursively resolve nested pairs.
    #[arg(long)]
    no_recurse: bool,
    /// Print the plan as JSON instead of the text report.
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct SuggestArgs {
    #[command(flatten)]
    resolve: ResolveArgs,
    /// Write the suggested document here instead of stdout.
    #[arg(long)]
    out: Option<PathBuf>,
}

impl ResolveArgs {
    fn config(&self) -> ResolveConfig {
        ResolveConfig {
            min_confidence: self.min_confidence,
            min_gap: self.min_gap,
            ambiguity_threshold: self.ambiguity_threshold,
            strict: self.strict,
            max_candidates: self.max_candidates,
            recursive: !self.no_recurse,
            max_recursion_depth: self.max_recursion_depth,
            structural_fallback_name_score: self.structural_fallback_name_score,
        }
    }
}

/// A CLI-level failure: bad input files, not resolution problems (those go
/// through the diagnostics bag).
#[derive(Debug)]
enum CliError {
    Read { path: PathBuf, source: std::io::Error },
    Write { path: PathBuf, source: std::io::Error },
    GraphParse { path: PathBuf, source: serde_json::Error },
    MappingParse { path: PathBuf, source: serde_yaml::Error },
    PlanEncode(serde_json::Error),
    SuggestEncode(serde_yaml::Error),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Read { path, source } => {
                write!(f, "cannot read `{}`: {}", path.display(), source)
            }
            CliError::Write { path, source } => {
                write!(f, "cannot write `{}`: {}", path.display(), source)
            }
            CliError::GraphParse { path, source } => {
                write!(f, "invalid type graph `{}`: {}", path.display(), source)
            }
            CliError::MappingParse { path, source } => {
                write!(f, "invalid mapping document `{}`: {}", path.display(), source)
            }
            CliError::PlanEncode(source) => write!(f, "cannot encode plan: {}", source),
            CliError::SuggestEncode(source) => {
                write!(f, "cannot encode suggested document: {}", source)
            }
        }
    }
}

impl std::error::Error for CliError {}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let result = match &cli.command {
        Command::Resolve(args) => run_resolve(args),
        Command::Suggest(args) => run_suggest(args),
    };
    match result {
        Ok(code) => code,
        Err(err) => {
            eprintln!("recastc: {}", err);
            ExitCode::FAILURE
        }
    }
}

fn run_resolve(args: &ResolveArgs) -> Result<ExitCode, CliError> {
    let (mut graph, doc) = load_inputs(args)?;
    match resolve(&mut graph, &doc, &args.config()) {
        Ok(plan) => {
            if args.json {
                let encoded =
                    serde_json::to_string_pretty(&plan).map_err(CliError::PlanEncode)?;
                println!("{}", encoded);
            } else {
                print!("{}", render_summary(&plan));
            }
            Ok(exit_for(&plan))
        }
        Err(err) => Ok(report_strict(err)),
    }
}

fn run_suggest(args: &SuggestArgs) -> Result<ExitCode, CliError> {
    let (mut graph, doc) = load_inputs(&args.resolve)?;
    match resolve(&mut graph, &doc, &args.resolve.config()) {
        Ok(plan) => {
            let suggested = export(&plan, &graph);
            let encoded =
                serde_yaml::to_string(&suggested).map_err(CliError::SuggestEncode)?;
            match &args.out {
                Some(path) => std::fs::write(path, &encoded).map_err(|source| {
                    CliError::Write { path: path.clone(), source }
                })?,
                None => print!("{}", encoded),
            }
            Ok(exit_for(&plan))
        }
        Err(err) => Ok(report_strict(err)),
    }
}

fn load_inputs(args: &ResolveArgs) -> Result<(TypeGraph, MappingDocument), CliError> {
    let graph_text = read(&args.graph)?;
    let graph: TypeGraph = serde_json::from_str(&graph_text).map_err(|source| {
        CliError::GraphParse { path: args.graph.clone(), source }
    })?;
    let mapping_text = read(&args.mapping)?;
    let doc: MappingDocument = serde_yaml::from_str(&mapping_text).map_err(|source| {
        CliError::MappingParse { path: args.mapping.clone(), source }
    })?;
    Ok((graph, doc))
}

fn read(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path)
        .map_err(|source| CliError::Read { path: path.to_path_buf(), source })
}

fn exit_for(plan: &ResolvedPlan) -> ExitCode {
    if plan.is_valid() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn report_strict(err: ResolveError) -> ExitCode {
    let ResolveError::Strict { diagnostics } = err;
    for diagnostic in diagnostics.iter() {
        eprintln!("recastc: {}", diagnostic);
    }
    ExitCode::from(2)
}
