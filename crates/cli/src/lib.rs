use anyhow::{bail, Context as AnyhowContext, Result};
use clap::{Args, Parser, Subcommand};
use config::FileConfig;
use http_oracle::HttpOracle;
use nodepatch_engine::{BatchController, FsStore, ProjectPath};
use nodepatch_markup_index::{IndexerConfig, Language, MarkupIndexer};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

mod config;
mod http_oracle;
mod report;

/// Exit code when a session finished but committed nothing
const EXIT_NOTHING_COMMITTED: i32 = 2;

fn print_stdout(text: &str) -> Result<()> {
    use std::io::Write;

    let mut stdout = io::stdout().lock();
    if let Err(err) = stdout
        .write_all(text.as_bytes())
        .and_then(|_| stdout.write_all(b"\n"))
        .and_then(|_| stdout.flush())
    {
        if err.kind() == io::ErrorKind::BrokenPipe {
            return Ok(());
        }
        return Err(err.into());
    }
    Ok(())
}

#[derive(Parser)]
#[command(name = "nodepatch")]
#[command(about = "Node-level analysis and patching of JSX/TSX components", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Only log warnings and errors
    #[arg(short, long, global = true)]
    quiet: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the markup nodes of a single file
    Index(IndexArgs),

    /// Run a patch session over a set of files
    Run(RunArgs),
}

#[derive(Args)]
struct IndexArgs {
    /// File to index
    file: PathBuf,

    /// Lines of surrounding context captured per node
    #[arg(long, default_value_t = 3)]
    context_lines: usize,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Args)]
struct RunArgs {
    /// Project root every file path is resolved against
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Natural-language change request
    #[arg(short, long)]
    request: String,

    /// Files to analyse, relative to the root
    #[arg(required = true)]
    files: Vec<String>,

    /// TOML config with [engine] and [oracle] tables
    #[arg(long)]
    config: Option<PathBuf>,

    /// Run the whole pipeline but never write
    #[arg(long)]
    dry_run: bool,

    /// Number of files processed concurrently
    #[arg(long)]
    concurrency: Option<usize>,

    /// Output the session report as JSON
    #[arg(long)]
    json: bool,
}

pub async fn main_entry() -> Result<()> {
    let mut cli = Cli::parse();

    // Keep stdout clean for JSON consumers
    let json_output = match &cli.command {
        Commands::Index(args) => args.json,
        Commands::Run(args) => args.json,
    };
    if json_output {
        cli.quiet = true;
    }

    let mut builder = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    match cli.command {
        Commands::Index(args) => run_index(args).await,
        Commands::Run(args) => {
            let committed = run_session(args).await?;
            if committed == 0 {
                std::process::exit(EXIT_NOTHING_COMMITTED);
            }
            Ok(())
        }
    }
}

async fn run_index(args: IndexArgs) -> Result<()> {
    let language = Language::from_path(&args.file);
    if !language.supports_markup() {
        bail!("Unsupported file type: {}", args.file.display());
    }

    let content = tokio::fs::read_to_string(&args.file)
        .await
        .with_context(|| format!("Failed to read {}", args.file.display()))?;
    let config = IndexerConfig::default().with_context_lines(args.context_lines);
    let nodes = MarkupIndexer::with_config(config, language)?
        .try_index(&content)
        .with_context(|| format!("Failed to index {}", args.file.display()))?;
    log::info!("Indexed {} markup node(s) in {}", nodes.len(), args.file.display());

    if args.json {
        print_stdout(&serde_json::to_string_pretty(&nodes)?)?;
    } else {
        print_stdout(&report::render_nodes(&args.file.display().to_string(), &nodes))?;
    }
    Ok(())
}

/// Returns the number of committed files
async fn run_session(args: RunArgs) -> Result<usize> {
    let mut file_config = FileConfig::resolve(args.config.as_deref())?;
    if args.dry_run {
        file_config.engine.dry_run = true;
    }
    if let Some(concurrency) = args.concurrency {
        file_config.engine.file_concurrency = concurrency;
    }

    let root = std::fs::canonicalize(&args.root)
        .with_context(|| format!("Project root not found: {}", args.root.display()))?;
    let files = resolve_files(&root, &args.files)?;

    let oracle = HttpOracle::new(&file_config.oracle)?;
    log::debug!("Oracle endpoint: {}", oracle.endpoint());
    let controller = BatchController::new(file_config.engine, Arc::new(oracle), Arc::new(FsStore::new(root.clone())))
        .context("Invalid engine configuration")?;

    let report = controller.run(&args.request, files).await;
    log::info!(
        "Session finished: {}/{} file(s) modified",
        report.files_modified,
        report.files_analyzed
    );

    if args.json {
        print_stdout(&serde_json::to_string_pretty(&report)?)?;
    } else {
        print_stdout(&report::render_session(&report))?;
    }
    Ok(report.files_modified)
}

fn resolve_files(root: &Path, raw: &[String]) -> Result<Vec<ProjectPath>> {
    raw.iter()
        .map(|file| ProjectPath::new(root, file).with_context(|| format!("Invalid file path: {file}")))
        .collect()
}
