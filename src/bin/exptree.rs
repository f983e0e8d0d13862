//! exptree CLI - Summarize a directory of exposures as a tag tree
//!
//! Thin wrapper over the library: Clap handles argument parsing, the library
//! does discovery, extraction and grouping, and this file decides how
//! failures reach the user (one line on stderr, non-zero exit).

// Exclude from coverage - CLI binary tested via integration tests
#![cfg_attr(tarpaulin, ignore)]

use anyhow::Context;
use clap::{ArgAction, Parser};
use exposure_tree::{
    discover_files, extract_records, tui, Config, FlatRenderer, HeaderExtractor, Theme,
    TreeBuilder, TreeSession,
};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

/// Summarize astronomical exposures as a collapsible tag tree.
#[derive(Parser, Debug)]
#[command(name = "exptree")]
#[command(version = exposure_tree::VERSION)]
#[command(about = "Summarize astronomical exposures as a collapsible tag tree")]
#[command(after_help = "Examples:
  # Browse tonight's frames interactively (/ to search, q to quit)
  exptree indata/20240425

  # Print groups and runs without the individual files
  exptree indata/20240425 --simple

  # Print everything, including individual files
  exptree indata/20240425 -s --depth 3 --pattern 'SDC*.fits'
")]
struct Cli {
    /// Exposure file or directory
    #[arg(value_name = "PATH", default_value = ".")]
    path: PathBuf,

    /// Print an indented text listing instead of the interactive view
    #[arg(short = 's', long = "simple")]
    simple: bool,

    /// Glob pattern for exposure files [default: *.fits]
    #[arg(long = "pattern", value_name = "GLOB")]
    pattern: Option<String>,

    /// Levels printed below the root in simple mode [default: 2]
    #[arg(long = "depth", value_name = "N")]
    depth: Option<usize>,

    /// JSON configuration file. Defaults to <PATH>/.exptree.json
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Drop the depth markers
    #[arg(long = "plain")]
    plain: bool,

    /// Log progress to stderr (-v info, -vv debug)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)),
        )
        .with_writer(io::stderr.with_filter(outside_tui))
        .with_target(false)
        .try_init();
}

// Nothing is logged while the interactive view owns the terminal
fn outside_tui(_: &tracing::Metadata<'_>) -> bool {
    !tui::is_active()
}

/// Load the config that applies to `path`, falling back to defaults
fn load_config(explicit: Option<&Path>, path: &Path) -> Config {
    if let Some(config_path) = explicit {
        return match Config::from_file(config_path) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("Warning: Could not load config file: {}", e);
                Config::default()
            }
        };
    }

    let dir = if path.is_dir() {
        path
    } else {
        path.parent().unwrap_or(Path::new("."))
    };
    match Config::locate(dir) {
        Some(found) => {
            debug!(config = %found.display(), "using config file");
            Config::from_file(&found).unwrap_or_else(|e| {
                eprintln!("Warning: Ignoring {}: {}", found.display(), e);
                Config::default()
            })
        }
        None => Config::default(),
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = load_config(cli.config.as_deref(), &cli.path);
    if let Some(pattern) = cli.pattern {
        config.pattern = pattern;
    }
    if let Some(depth) = cli.depth {
        config.depth = depth;
    }
    if cli.plain {
        config.theme = Theme::Plain;
    }

    let files = discover_files(&cli.path, &config.pattern)?;
    info!(count = files.len(), "summarizing exposures");

    let extractor = HeaderExtractor::new(config.header.clone());
    let root = extract_records(&files, &extractor)
        .and_then(|records| {
            TreeBuilder::with_priority_tags(config.priority_tags.iter().cloned()).build(&records)
        })
        .context("building tree")?;

    if cli.simple {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        FlatRenderer::new(config.theme)
            .with_max_level(Some(config.depth))
            .write_to(&root, &mut out)?;
        out.flush()?;
        return Ok(());
    }

    let mut session = TreeSession::from_tree(&root, config.theme);
    tui::run(&mut session)?;
    Ok(())
}

fn main() -> ExitCode {
    // Fix broken pipe panic when piping to head/tail/etc.
    // Reset SIGPIPE to default behavior (terminate quietly)
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }

    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
