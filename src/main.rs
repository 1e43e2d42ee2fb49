//! Command-line interface for datagen
//!
//! # Usage Examples
//!
//! ```bash
//! # Generate into a single JSON array on stdout
//! datagen run people.json
//!
//! # Nested documents, written to a file
//! datagen run people.yaml --format nested --output people.json
//!
//! # One file per entity type, serial keys named `id`
//! datagen run people.yaml --format split --output out/ \
//!   --primary-key-name id --primary-key-kind serial
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand};
use datagen::{open_emitter, Interpreter, InterpreterConfig, OutputFormat};
use datagen_generator::{GenContext, PrimaryKey, PrimaryKeyKind, WordDictionary, DEFAULT_PRIMARY_KEY_NAME};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "datagen")]
#[command(about = "Generate synthetic entities from declarative templates")]
#[command(long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Evaluate a script and emit every generated entity
    Run(RunArgs),
}

#[derive(clap::Args)]
struct RunArgs {
    /// Script file (JSON, or YAML when the extension is .yaml/.yml)
    script: PathBuf,

    /// Output file, or directory for --format split (default: stdout)
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Output shape
    #[arg(long, value_enum, default_value = "flat")]
    format: OutputFormat,

    /// Seed for the random number generator
    #[arg(long, default_value = "42", env = "DATAGEN_SEED")]
    seed: u64,

    /// YAML file with extra dictionary categories
    #[arg(long)]
    dictionary: Option<PathBuf>,

    /// Omit the $type and $extends metadata fields
    #[arg(long)]
    no_metadata: bool,

    /// Primary key field name for entities that do not declare one
    #[arg(long, default_value = DEFAULT_PRIMARY_KEY_NAME)]
    primary_key_name: String,

    /// Primary key kind for entities that do not declare one
    #[arg(long, value_parser = parse_primary_key_kind, default_value = "uid")]
    primary_key_kind: PrimaryKeyKind,
}

fn parse_primary_key_kind(s: &str) -> Result<PrimaryKeyKind, String> {
    s.parse()
}

fn main() -> anyhow::Result<()> {
    if let Err(e) = run() {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
    Ok(())
}

fn run() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run(args) => run_script(args),
    }
}

fn run_script(args: RunArgs) -> anyhow::Result<()> {
    let mut dictionary = WordDictionary::builtin();
    if let Some(path) = &args.dictionary {
        let extra = WordDictionary::from_file(path)
            .with_context(|| format!("Failed to load dictionary from {path:?}"))?;
        dictionary = dictionary.merge(extra);
    }

    let config = InterpreterConfig::default()
        .with_primary_key(PrimaryKey::new(args.primary_key_name, args.primary_key_kind))
        .with_metadata(!args.no_metadata);
    let ctx = GenContext::new(args.seed).with_dictionary(Arc::new(dictionary));

    let mut emitter = open_emitter(args.format, args.output.as_deref())?;
    let mut interpreter = Interpreter::new(config, ctx);

    let reports = interpreter
        .run_file(&args.script, emitter.as_mut())
        .with_context(|| format!("Failed to evaluate {:?}", args.script))?;
    emitter.finalize().context("Failed to finalize output")?;

    for report in &reports {
        tracing::info!(entity = %report.entity, count = report.ids.len(), "Generation complete");
    }
    Ok(())
}
