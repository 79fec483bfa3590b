//! Reference Page CLI
//!
//! Command-line tool for rendering bibliography, glossary and apidocs
//! reference pages from a YAML configuration.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use mkrefs::{MkRefsError, PipelineContext, RefKind, RenderOutcome};

#[derive(Parser)]
#[command(name = "mkrefs")]
#[command(about = "Render reference pages from a knowledge graph")]
#[command(version)]
struct Cli {
    /// Log per-query detail
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render the bibliography page
    Biblio(RenderArgs),
    /// Render the glossary page
    Glossary(RenderArgs),
    /// Render the API reference page
    Apidocs(RenderArgs),
    /// Render every configured page
    All(RenderArgs),
}

#[derive(Args)]
struct RenderArgs {
    /// Path to the YAML configuration
    #[arg(default_value = "mkrefs.yml")]
    config: PathBuf,

    /// Documentation directory, overriding `docs_dir` from the configuration
    #[arg(long)]
    docs_dir: Option<PathBuf>,

    /// Print the grouped entries as JSON to stdout
    #[arg(long)]
    dump_groups: bool,
}

fn report(outcome: &RenderOutcome, dump_groups: bool) -> Result<(), MkRefsError> {
    eprintln!(
        "Rendered {} entries in {} groups to {}",
        outcome.entries,
        outcome.groups,
        outcome.page.display()
    );

    if dump_groups {
        println!("{}", serde_json::to_string_pretty(&outcome.collection)?);
    }
    Ok(())
}

fn run_one(kind: RefKind, args: RenderArgs) -> Result<bool, MkRefsError> {
    let mut ctx = PipelineContext::from_config_file(&args.config, args.docs_dir.as_deref())?;
    let outcome = ctx.render(kind)?;
    report(&outcome, args.dump_groups)?;
    Ok(true)
}

/// Returns false when any page failed; failures are already logged
fn run_all(args: RenderArgs) -> Result<bool, MkRefsError> {
    let mut ctx = PipelineContext::from_config_file(&args.config, args.docs_dir.as_deref())?;

    let mut failed = Vec::new();
    for (kind, result) in ctx.render_all() {
        match result {
            Ok(outcome) => report(&outcome, args.dump_groups)?,
            Err(_) => failed.push(kind.to_string()),
        }
    }

    if !failed.is_empty() {
        eprintln!("Failed to render: {}", failed.join(", "));
    }
    Ok(failed.is_empty())
}

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Biblio(args) => run_one(RefKind::Biblio, args),
        Commands::Glossary(args) => run_one(RefKind::Glossary, args),
        Commands::Apidocs(args) => run_one(RefKind::Apidocs, args),
        Commands::All(args) => run_all(args),
    };

    match result {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    }
}
