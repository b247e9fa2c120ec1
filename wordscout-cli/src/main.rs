use anyhow::Context;
use clap::Parser;
use colored::Colorize;
use std::io::{self, Write};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use wordscout::{
    config::{parse_buffer_capacity, parse_thread_count},
    search::run_search_loop,
    CliOverrides, EncodingMode, IndexConfig, IndexError, IndexingPipeline, OutputFormat,
};

/// Startup failed; nothing was indexed or searched
const EXIT_FATAL: i32 = 1;
/// Searches were being served when the run failed
const EXIT_RUNTIME: i32 = 3;

/// Index files on a pool of threads and answer word searches read from stdin.
///
/// Each stdin line is a query: `<word>` searches everything indexed so far,
/// `<filename> <word>` waits for that file and searches only it.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Number of indexer threads (must be > 0)
    threads: usize,

    /// File listing the files to index, one per line
    #[arg(conflicts_with = "root")]
    file_list: Option<PathBuf>,

    /// Walk this directory instead of reading a file list
    #[arg(short = 'd', long)]
    root: Option<PathBuf>,

    /// Additional configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Capacity of the scanner -> indexer buffer
    #[arg(short = 'b', long)]
    buffer_size: Option<usize>,

    /// File extensions to include when walking (e.g. rs,txt)
    #[arg(short = 'e', long)]
    extensions: Option<String>,

    /// Patterns to ignore when walking (glob format)
    #[arg(short, long)]
    ignore: Vec<String>,

    /// How to handle invalid UTF-8 sequences (failfast|lossy)
    #[arg(long, value_parser = ["failfast", "lossy"])]
    encoding: Option<String>,

    /// Print one JSON object per query instead of plain text
    #[arg(long)]
    json: bool,

    /// Give up on `<filename> <word>` searches after this long (e.g. 5s)
    #[arg(long)]
    wait_timeout: Option<humantime::Duration>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    log_level: Option<String>,

    /// Print the effective configuration and exit
    #[arg(long)]
    print_config: bool,
}

impl Cli {
    fn overrides(&self) -> anyhow::Result<CliOverrides> {
        let encoding_mode = self.encoding.as_deref().map(|e| match e {
            "failfast" => EncodingMode::FailFast,
            _ => EncodingMode::Lossy,
        });
        let file_extensions = self.extensions.as_ref().map(|e| {
            e.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect::<Vec<_>>()
        });

        Ok(CliOverrides {
            thread_count: Some(parse_thread_count(self.threads)?),
            buffer_capacity: self.buffer_size.map(parse_buffer_capacity).transpose()?,
            file_list: self.file_list.clone(),
            root_path: self.root.clone(),
            file_extensions,
            ignore_patterns: self.ignore.clone(),
            encoding_mode,
            log_level: self.log_level.clone(),
        })
    }
}

fn init_logging(log_level: &str) {
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(io::stderr)
        .with_target(false)
        .with_thread_names(true);

    // RUST_LOG wins over the configured level
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

fn exit_code(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<IndexError>() {
        Some(e) if !e.is_fatal() => EXIT_RUNTIME,
        _ => EXIT_FATAL,
    }
}

fn main() {
    if let Err(e) = run() {
        eprintln!("{} {:#}", "error:".red().bold(), e);
        std::process::exit(exit_code(&e));
    }
}

fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let overrides = cli.overrides()?;

    let config = IndexConfig::load_from(cli.config.as_deref())
        .context("Failed to load configuration")?
        .merge_with_cli(overrides);
    init_logging(&config.log_level);

    if cli.print_config {
        print!("{}", config.to_yaml()?);
        return Ok(());
    }

    let handle = IndexingPipeline::start(&config)?;
    let mut searcher = handle.searcher();
    if let Some(timeout) = cli.wait_timeout {
        searcher = searcher.with_wait_timeout(timeout.into());
    }
    let format = if cli.json {
        OutputFormat::Json
    } else {
        OutputFormat::Text
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let answered = run_search_loop(&searcher, io::stdin().lock(), &mut out, format)
        .map_err(IndexError::from)
        .context("Failed to serve searches")?;
    out.flush().map_err(IndexError::from)?;
    info!("Answered {} queries, waiting for indexing to finish", answered);

    let stats = handle.wait()?;
    info!(
        "Done: {} of {} files indexed",
        stats.files_indexed, stats.files_scanned
    );
    Ok(())
}
