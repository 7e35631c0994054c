use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result, anyhow};
use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use serde::{Deserialize, Serialize};
use table_reconcile::{
    ComparisonResult, Config, KeyColumn, LogicalTable, PositionedFragment, ReconcileWarning,
    compare_across_files_with, merge_tables, reconstruct_table_with, unify_headers,
};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(
    name = "tabrecon",
    version,
    about = "Rebuild tables from positioned text and reconcile records across files"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Rebuild one table from a JSON dump of positioned text fragments.
    Reconstruct(ReconstructArgs),
    /// Compare tables from two or more files on a key column.
    Compare(CompareArgs),
}

#[derive(Debug, Args)]
struct ReconstructArgs {
    /// Fragments JSON: an array of fragments or an array of pages.
    #[arg(short, long)]
    input: PathBuf,

    /// Output JSON path (stdout when omitted).
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// TOML file with threshold overrides.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Section label for the rebuilt table.
    #[arg(long)]
    section: Option<String>,

    /// Print warnings to stderr.
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Args)]
struct CompareArgs {
    /// Table JSON per file, in file order. Repeat for every file.
    #[arg(short, long = "input", required = true, num_args = 1)]
    inputs: Vec<PathBuf>,

    /// Key column: a 0-based index or a header name.
    #[arg(short, long, default_value = "0")]
    key: String,

    /// Output JSON path (stdout when omitted).
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// TOML file with threshold overrides.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Match keys exactly only.
    #[arg(long)]
    no_fuzzy: bool,

    /// Print warnings to stderr.
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FragmentInput {
    Pages(Vec<Vec<PositionedFragment>>),
    Flat(Vec<PositionedFragment>),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum TableInput {
    Many(Vec<LogicalTable>),
    One(LogicalTable),
}

#[derive(Debug, Serialize)]
struct ComparisonEnvelope<'a> {
    generated_at: String,
    files: Vec<String>,
    key_column: usize,
    #[serde(flatten)]
    result: &'a ComparisonResult,
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    path.map_or_else(
        || Ok(Config::default()),
        |path| {
            Config::load(path)
                .with_context(|| format!("failed to load config '{}'", path.display()))
        },
    )
}

fn read_json<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<T> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("failed to read '{}'", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse '{}'", path.display()))
}

fn write_json<T: Serialize>(output: Option<&Path>, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    match output {
        Some(path) => fs::write(path, json + "\n")
            .with_context(|| format!("failed to write '{}'", path.display())),
        None => {
            println!("{json}");
            Ok(())
        }
    }
}

fn log_warnings(warnings: &[ReconcileWarning], verbose: bool) {
    if warnings.is_empty() {
        return;
    }

    eprintln!("warning: {} issue(s) detected", warnings.len());
    if verbose {
        for warning in warnings {
            eprintln!(
                "  - {:?} page={:?} file={:?} count={:?}: {}",
                warning.code, warning.page, warning.file, warning.count, warning.message
            );
        }
    }
}

fn run_reconstruct(args: &ReconstructArgs) -> Result<usize> {
    let mut config = load_config(args.config.as_deref())?;
    if args.section.is_some() {
        config.reconstruct.section.clone_from(&args.section);
    }

    let pages = match read_json::<FragmentInput>(&args.input)? {
        FragmentInput::Pages(pages) => pages,
        FragmentInput::Flat(fragments) => vec![fragments],
    };
    let reconstruction = reconstruct_table_with(&pages, &config.reconstruct);
    log_warnings(&reconstruction.warnings, args.verbose);
    write_json(args.output.as_deref(), &reconstruction.table)?;

    Ok(reconstruction.table.rows.len())
}

fn run_compare(args: &CompareArgs) -> Result<usize> {
    if args.inputs.len() < 2 {
        anyhow::bail!("compare needs at least two --input files");
    }

    let mut config = load_config(args.config.as_deref())?;
    if args.no_fuzzy {
        config.matching.fuzzy = false;
    }

    let tables_per_file = args
        .inputs
        .iter()
        .map(|path| {
            read_json::<TableInput>(path).map(|input| match input {
                TableInput::Many(tables) => tables,
                TableInput::One(table) => vec![table],
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let key = args
        .key
        .parse::<KeyColumn>()
        .map_err(|error| anyhow!("invalid --key: {error}"))?;
    let unified = unify_headers(
        &tables_per_file
            .iter()
            .map(|tables| merge_tables(tables).0)
            .collect::<Vec<_>>(),
    );
    let key_column = key.resolve(&unified).context("failed to resolve --key")?;

    let result = compare_across_files_with(&tables_per_file, key_column, &config.matching);
    log_warnings(&result.warnings, args.verbose);

    let envelope = ComparisonEnvelope {
        generated_at: Utc::now().to_rfc3339(),
        files: args
            .inputs
            .iter()
            .map(|path| path.display().to_string())
            .collect(),
        key_column: key_column.min(unified.len().saturating_sub(1)),
        result: &result,
    };
    write_json(args.output.as_deref(), &envelope)?;

    Ok(result.records.len())
}

fn main() -> ExitCode {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("table_reconcile=warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .without_time()
        .init();

    let cli = Cli::parse();
    let outcome = match &cli.command {
        Commands::Reconstruct(args) => run_reconstruct(args),
        Commands::Compare(args) => run_compare(args),
    };

    match outcome {
        Ok(0) => ExitCode::from(2),
        Ok(_) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::from(1)
        }
    }
}
