//! Literature Review Deduplication - Entry Point
//!
//! Works on a JSON corpus file: scan it for duplicates, import a file into it,
//! or import the results of a catalog search.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use tokio_stream::StreamExt;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use litreview_dedup::{
    BatchImportController, Config, DuplicateDetector, ImportOptions, ImportSource, InMemoryStore,
    JobSource, MergeResolver, RecordStore, ScanSession, SemanticScholarClient, formatters, import,
    dedup::{AUTHOR_YEAR_TITLE_THRESHOLD, FUZZY_TITLE_THRESHOLD},
    store::ProjectScope,
};

#[derive(Parser, Debug)]
#[command(name = "litreview-dedup")]
#[command(about = "Duplicate detection and batch import for literature reviews")]
#[command(version)]
struct Cli {
    /// Semantic Scholar API key (optional, enables higher rate limits)
    #[arg(long, env = "SEMANTIC_SCHOLAR_API_KEY", global = true)]
    api_key: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "RUST_LOG", global = true)]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, global = true)]
    json_logs: bool,

    /// Report format
    #[arg(long, default_value = "markdown", global = true)]
    format: Format,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Scan a corpus for duplicate pairs
    Scan {
        /// Corpus file (JSON array of records)
        #[arg(long)]
        corpus: PathBuf,

        /// Only scan records of this project
        #[arg(long)]
        project: Option<String>,

        /// Merge DOI and exact-title pairs, keeping the more complete record
        #[arg(long)]
        auto_merge: bool,

        /// Title similarity a pair must exceed to match as fuzzy-title
        #[arg(
            long,
            default_value_t = FUZZY_TITLE_THRESHOLD,
            value_parser = clap::value_parser!(u8).range(0..=100)
        )]
        fuzzy_threshold: u8,

        /// Title similarity a pair must exceed to match as author-year-similar
        #[arg(
            long,
            default_value_t = AUTHOR_YEAR_TITLE_THRESHOLD,
            value_parser = clap::value_parser!(u8).range(0..=100)
        )]
        author_year_threshold: u8,
    },

    /// Import an id list or CSV/TSV file into a corpus
    Import {
        /// Source file: one PMID/DOI per line, or .csv/.tsv with a title column
        #[arg(long)]
        source: PathBuf,

        #[command(flatten)]
        job: JobArgs,
    },

    /// Import the results of a catalog search into a corpus
    Search {
        /// Free-text query
        #[arg(long)]
        query: String,

        /// Maximum number of results to import
        #[arg(long, default_value = "100")]
        limit: usize,

        #[command(flatten)]
        job: JobArgs,
    },
}

/// Options shared by every import job.
#[derive(Debug, Args)]
struct JobArgs {
    /// Corpus file (created if missing)
    #[arg(long)]
    corpus: PathBuf,

    /// Items per chunk
    #[arg(long, env = "LITREVIEW_CHUNK_SIZE")]
    chunk_size: Option<usize>,

    /// Delay between catalog fetches in milliseconds
    #[arg(long, env = "LITREVIEW_FETCH_DELAY_MS")]
    fetch_delay_ms: Option<u64>,

    /// Import items even if they already exist
    #[arg(long)]
    no_dedup: bool,

    /// Project stamped on imported records
    #[arg(long)]
    project: Option<String>,
}

impl JobArgs {
    fn options(&self, config: &Config) -> ImportOptions {
        let mut options = ImportOptions::from_config(config);
        if let Some(chunk_size) = self.chunk_size {
            options.chunk_size = chunk_size;
        }
        if let Some(ms) = self.fetch_delay_ms {
            options.fetch_delay = Duration::from_millis(ms);
        }
        options.check_duplicates = !self.no_dedup;
        options.project_id = self.project.clone();
        options
    }
}

#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
enum Format {
    /// Human-readable Markdown
    #[default]
    Markdown,
    /// Compact JSON
    Json,
}

fn init_tracing(log_level: &str, json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    // Logs go to stderr so reports on stdout stay clean
    if json {
        subscriber.with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr)).init();
    } else {
        subscriber
            .with(tracing_subscriber::fmt::layer().compact().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(&cli.log_level, cli.json_logs);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting litreview-dedup");

    // Chunk size and fetch delay come from flags, which also read the environment
    let config = match cli.api_key.clone() {
        Some(key) => Config::new(Some(key)),
        None => Config::from_env()?,
    };

    match cli.command {
        Command::Scan { corpus, project, auto_merge, fuzzy_threshold, author_year_threshold } => {
            let detector = DuplicateDetector::with_thresholds(fuzzy_threshold, author_year_threshold);
            run_scan(corpus, project, detector, auto_merge, cli.format).await
        }
        Command::Import { source, job } => {
            // Format errors are reported before any job starts
            let source = import::parse_file(&source).await?;
            let options = job.options(&config);
            run_import(job.corpus, JobSource::from(source), options, config, cli.format).await
        }
        Command::Search { query, limit, job } => {
            let options = job.options(&config);
            let source = JobSource::CatalogSearch { query, limit };
            run_import(job.corpus, source, options, config, cli.format).await
        }
    }
}

async fn run_scan(
    corpus: PathBuf,
    project: Option<String>,
    detector: DuplicateDetector,
    auto_merge: bool,
    format: Format,
) -> anyhow::Result<()> {
    let store = Arc::new(InMemoryStore::load_json(&corpus).await?);
    let scope = ProjectScope::from_project(project.as_deref());
    let records = store.list_all(&scope).await?;

    let mut session = ScanSession::scan(detector, &records);

    if auto_merge {
        let resolver = MergeResolver::new(store.clone());
        let merged = session.auto_merge_exact(&resolver).await?;
        store.save_json(&corpus).await?;
        tracing::info!(merged, "Auto-merge finished");
    }

    match format {
        Format::Markdown => println!("{}", formatters::format_pairs_markdown(session.pairs())),
        Format::Json => {
            let report = formatters::pairs_report_json(session.pairs());
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}

async fn run_import(
    corpus: PathBuf,
    source: JobSource,
    options: ImportOptions,
    config: Config,
    format: Format,
) -> anyhow::Result<()> {
    let store = Arc::new(InMemoryStore::load_json(&corpus).await?);

    let mut controller = BatchImportController::new(store.clone());
    if !matches!(source, JobSource::Parsed(ImportSource::Tabular { .. })) {
        controller = controller.with_catalog(Arc::new(SemanticScholarClient::new(config)?));
    }

    let job = controller.start(source, options)?;

    let mut updates = job.subscribe();
    let mut last_chunk = usize::MAX;
    loop {
        tokio::select! {
            update = updates.next() => {
                let Some(update) = update else { break };
                if update.completed_chunks != last_chunk {
                    last_chunk = update.completed_chunks;
                    tracing::info!(
                        chunk = update.completed_chunks,
                        total_chunks = update.total_chunks,
                        percent = update.progress_percent(),
                        "Import progress"
                    );
                }
                if update.status.is_terminal() {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::warn!("Interrupted, cancelling import");
                controller.cancel().ok();
            }
        }
    }

    let report = job.wait().await;
    store.save_json(&corpus).await?;

    match format {
        Format::Markdown => println!("{}", formatters::format_job_markdown(&report)),
        Format::Json => {
            println!("{}", serde_json::to_string_pretty(&formatters::job_report_json(&report))?);
        }
    }
    Ok(())
}
