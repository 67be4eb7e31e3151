//! planguard command-line interface.
//!
//! Evaluates a JSON plan against the TOML rule files in a policy directory
//! and exits non-zero when any deny rule fires.
//!
//! Usage:
//!   planguard evaluate tfplan.json --policy-dir policy
//!   planguard evaluate tfplan.json --policy-dir policy --all-namespaces
//!   planguard evaluate tfplan.json --policy-dir policy --namespace s3_hygiene --output json

mod output;

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use planguard_contracts::error::{PlanguardError, PlanguardResult};
use planguard_core::Reporter;
use planguard_plan::{JsonPlanLoader, LoaderOptions, PlannedResourceMatcher, DEFAULT_MAX_EMBEDDED_DEPTH};
use planguard_policy::{NamespaceSelection, PolicyRegistry, PredicateEvaluator};

use output::OutputFormat;

// ── CLI definition ────────────────────────────────────────────────────────────

/// planguard: compliance rules for infrastructure plans.
#[derive(Parser)]
#[command(
    name = "planguard",
    version,
    about = "Evaluate compliance rules against a planned infrastructure change",
    long_about = "Loads a JSON plan, runs the rules found under a policy directory against\n\
                  its planned resources, and reports every violation before anything is\n\
                  provisioned."
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Evaluate a plan against the rules in a policy directory.
    Evaluate(EvaluateArgs),
}

#[derive(Args)]
struct EvaluateArgs {
    /// Path to the JSON plan.
    plan: PathBuf,

    /// Directory holding `*.toml` rule files (searched recursively).
    #[arg(long, short = 'p', default_value = "policy")]
    policy_dir: PathBuf,

    /// Evaluate every namespace instead of only `main`.
    #[arg(long, conflicts_with = "namespace")]
    all_namespaces: bool,

    /// Evaluate this namespace; repeat to select several.
    #[arg(long, short = 'n')]
    namespace: Vec<String>,

    /// Output format.
    #[arg(long, short = 'o', value_enum, default_value_t = OutputFormat::Stdout)]
    output: OutputFormat,

    /// Levels of JSON-inside-a-string to decode.
    #[arg(long, default_value_t = DEFAULT_MAX_EMBEDDED_DEPTH)]
    max_embedded_depth: usize,

    /// Exit with code 2 when warnings are found.
    #[arg(long)]
    fail_on_warn: bool,

    /// Exit with code 2 when a rule could not be evaluated.
    #[arg(long)]
    fail_on_exception: bool,
}

impl EvaluateArgs {
    fn selection(&self) -> NamespaceSelection {
        if self.all_namespaces {
            NamespaceSelection::All
        } else if self.namespace.is_empty() {
            NamespaceSelection::Default
        } else {
            NamespaceSelection::Named(self.namespace.clone())
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    // Logs go to stderr so stdout stays parseable.  Set RUST_LOG=debug for
    // verbose output.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Command::Evaluate(args) => evaluate(&args),
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("planguard: {}", e);
            std::process::exit(output::EXIT_FAILED);
        }
    }
}

// ── Commands ──────────────────────────────────────────────────────────────────

fn evaluate(args: &EvaluateArgs) -> PlanguardResult<i32> {
    // Rules first: a broken rule file should fail before the plan is read.
    let registry = PolicyRegistry::from_dir(&args.policy_dir)?;
    let rule_sets = registry.select(&args.selection());

    let loader = JsonPlanLoader::with_options(LoaderOptions {
        max_embedded_depth: args.max_embedded_depth,
    });
    let document = loader.load_file(&args.plan)?;

    let reporter = Reporter::new(Box::new(PlannedResourceMatcher), Box::new(PredicateEvaluator));
    let report = reporter.report(&rule_sets, &document);

    let plan = args.plan.display().to_string();
    debug!(plan = %plan, passed = report.passed(), "writing results");
    match args.output {
        OutputFormat::Stdout => print!("{}", output::render_text(&plan, &report)),
        OutputFormat::Json => {
            let json = output::render_json(&plan, &report).map_err(|e| PlanguardError::ConfigError {
                reason: format!("failed to serialize report: {}", e),
            })?;
            println!("{}", json);
        }
    }

    Ok(output::exit_code(
        &report,
        args.fail_on_warn,
        args.fail_on_exception,
    ))
}
