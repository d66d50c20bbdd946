//! BubbleReader - reading-ordered text extraction for manga pages
//!
//! Runs the stdin/stdout OCR command server by default, or processes a single
//! image or fragment file from the command line.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use bubble_reader::app::{run_command_loop, ReaderSession};
use bubble_reader::config::{self, AppConfig};
use bubble_reader::layout::{group_paragraphs, Fragment};
use bubble_reader::storage;

/// BubbleReader - manga OCR paragraph grouping
#[derive(Parser, Debug)]
#[command(name = "bubble-reader")]
#[command(about = "Extract text from manga pages and group it into reading-ordered paragraphs")]
struct Args {
    /// Configuration file (defaults to config.toml in the user config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log level when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info")]
    log_level: Level,

    #[command(subcommand)]
    command: Option<Mode>,
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// Serve init/read_text/close commands on stdin (default)
    Serve,
    /// Read one image and print the JSON reply
    Read {
        /// Image file
        image: PathBuf,
        /// OCR language
        #[arg(short, long)]
        lang: Option<String>,
        /// Print only the paragraph list
        #[arg(long)]
        paragraphs_only: bool,
    },
    /// Group a JSON list of fragments into paragraphs
    Group {
        /// File holding `[{"bbox": [[x, y], ...], "text": ..., "confidence": ...}, ...]`
        fragments: PathBuf,
        /// Override the clustering distance factor
        #[arg(long)]
        max_distance_factor: Option<f64>,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // stdout carries protocol replies, so logs go to stderr
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.log_level.to_string()));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let config = load_or_default_config(args.config.as_deref())?;

    match args.command.unwrap_or(Mode::Serve) {
        Mode::Serve => serve(config),
        Mode::Read {
            image,
            lang,
            paragraphs_only,
        } => read_one(config, &image, lang, paragraphs_only),
        Mode::Group {
            fragments,
            max_distance_factor,
        } => group_file(config, &fragments, max_distance_factor),
    }
}

/// Load configuration from an explicit path, the user config dir, or defaults
fn load_or_default_config(explicit: Option<&Path>) -> Result<AppConfig> {
    if let Some(path) = explicit {
        let config = config::load_config(path)?;
        info!("Loaded configuration from {:?}", path);
        return Ok(config);
    }

    match storage::default_config_path() {
        Ok(path) if path.exists() => match config::load_config(&path) {
            Ok(config) => {
                info!("Loaded configuration from {:?}", path);
                return Ok(config);
            }
            Err(e) => warn!("Ignoring unreadable configuration: {:#}", e),
        },
        Ok(_) => {}
        Err(e) => warn!("No configuration directory: {:#}", e),
    }

    info!("Using default configuration");
    Ok(AppConfig::default())
}

fn serve(config: AppConfig) -> Result<()> {
    let mut session = ReaderSession::new(config);
    let stdin = io::stdin();
    let stdout = io::stdout();
    run_command_loop(&mut session, stdin.lock(), stdout.lock())
}

fn read_one(config: AppConfig, image: &Path, lang: Option<String>, paragraphs_only: bool) -> Result<()> {
    let language = lang.unwrap_or_else(|| config.ocr.language.clone());
    let mut session = ReaderSession::new(config);
    let response = session.read_text(image, &language);

    let mut out = BufWriter::new(io::stdout().lock());
    match (&response.outcome, paragraphs_only) {
        (Some(outcome), true) => serde_json::to_writer_pretty(&mut out, &outcome.paragraphs)?,
        _ => serde_json::to_writer_pretty(&mut out, &response)?,
    }
    writeln!(out)?;

    if !response.is_success() {
        anyhow::bail!(response.message.unwrap_or_default());
    }
    Ok(())
}

fn group_file(config: AppConfig, path: &Path, max_distance_factor: Option<f64>) -> Result<()> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read fragments: {:?}", path))?;
    let fragments: Vec<Fragment> = serde_json::from_str(&content)
        .with_context(|| format!("Invalid fragment list: {:?}", path))?;

    let mut policy = config.layout;
    if let Some(factor) = max_distance_factor {
        policy = policy.with_max_distance_factor(factor);
    }

    let paragraphs = group_paragraphs(&fragments, &policy);
    info!("{} fragments -> {} paragraphs", fragments.len(), paragraphs.len());

    let mut out = BufWriter::new(io::stdout().lock());
    serde_json::to_writer_pretty(&mut out, &paragraphs)?;
    writeln!(out)?;
    Ok(())
}
