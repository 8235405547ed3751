use anyhow::{Context as AnyhowContext, Result};
use chunkprep_chunker::{
    mib_to_bytes, Chunk, ChunkBuilder, ChunkerConfig, ChunkingStats, SplitStrategy,
};
use clap::{Parser, ValueEnum};
use serde::Serialize;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

pub mod manifest;

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

#[derive(Parser, Debug)]
#[command(name = "chunkprep")]
#[command(about = "Pack text and files into token-bounded chunks for LLM requests", long_about = None)]
#[command(version)]
pub struct Cli {
    /// JSON manifest of input items ("-" reads stdin)
    #[arg(short, long, default_value = "-")]
    pub manifest: String,

    /// TOML config file (default: PROMPT_CHUNK_* environment variables)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Maximum tokens of text per chunk
    #[arg(long)]
    pub token_limit: Option<usize>,

    /// Maximum files per chunk
    #[arg(long)]
    pub max_files: Option<usize>,

    /// Files above this size (MiB) are dropped
    #[arg(long)]
    pub max_single_file_mb: Option<u64>,

    /// Cumulative file size cap per chunk (MiB)
    #[arg(long)]
    pub max_total_files_mb: Option<u64>,

    /// How to break up a single text above the token limit
    #[arg(long, value_enum)]
    pub split: Option<SplitArg>,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Quiet mode: log only warnings/errors (stdout is reserved for JSON)
    #[arg(long)]
    pub quiet: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum SplitArg {
    Words,
    Natural,
}

impl From<SplitArg> for SplitStrategy {
    fn from(arg: SplitArg) -> Self {
        match arg {
            SplitArg::Words => Self::Words,
            SplitArg::Natural => Self::Natural,
        }
    }
}

/// Output document printed on stdout
#[derive(Debug, Serialize)]
pub struct ChunkReport {
    pub chunks: Vec<Chunk>,
    pub stats: ChunkingStats,
}

/// Config file or environment first, then explicit flags on top
pub fn resolve_config(cli: &Cli) -> Result<ChunkerConfig> {
    let mut config = match &cli.config {
        Some(path) => ChunkerConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => ChunkerConfig::from_env(),
    };

    if let Some(limit) = cli.token_limit {
        config.token_limit = limit;
    }
    if let Some(max_files) = cli.max_files {
        config.max_files_per_chunk = max_files;
    }
    if let Some(mib) = cli.max_single_file_mb {
        config.max_single_file_size = mib_to_bytes(mib);
    }
    if let Some(mib) = cli.max_total_files_mb {
        config.max_total_files_size = mib_to_bytes(mib);
    }
    if let Some(split) = cli.split {
        config.split_strategy = split.into();
    }
    Ok(config)
}

fn read_manifest(source: &str) -> Result<(String, PathBuf)> {
    if source == "-" {
        let mut raw = String::new();
        io::stdin()
            .read_to_string(&mut raw)
            .context("Failed to read manifest from stdin")?;
        return Ok((raw, PathBuf::from(".")));
    }

    let path = Path::new(source);
    let raw = fs::read_to_string(path)
        .with_context(|| format!("Failed to read manifest {}", path.display()))?;
    let base_dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| PathBuf::from("."), Path::to_path_buf);
    Ok((raw, base_dir))
}

/// Build chunks for the manifest named on the command line
pub fn run(cli: &Cli) -> Result<ChunkReport> {
    let config = resolve_config(cli)?;
    let builder = ChunkBuilder::new(config).context("Invalid chunking configuration")?;

    let (raw, base_dir) = read_manifest(&cli.manifest)?;
    let entries = manifest::parse_manifest(&raw)?;
    log::debug!("Loaded {} manifest entries", entries.len());
    let items = manifest::into_items(entries, &base_dir)?;

    let chunks = builder.build_chunks(items)?;
    let stats = ChunkingStats::collect(&chunks);
    log::info!("{stats}");
    Ok(ChunkReport { chunks, stats })
}

fn init_logging(cli: &Cli) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();
}

pub fn main_entry() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli);

    let report = run(&cli)?;
    let json = if cli.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    print_stdout(&json)
}
