use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::builder::RangedU64ValueParser;
use clap::Parser;
use extractdoc::{generate, Destination, ExitCode, ExtractError, Renderer};
use extractdoc_config::{Config, LoadOptions, MAX_DEPTH};
use tracing_subscriber::EnvFilter;

/// Render `/// !show` regions, `/// !! text` lines and `/// !tree` listings
/// from source files into Markdown.
#[derive(Parser, Debug)]
#[command(name = "extractdoc", version, about, long_about = None)]
pub struct Cli {
    /// Glob pattern selecting files or directories to scan (`**` recurses)
    #[arg(value_name = "PATHNAME")]
    pub pathname: String,

    /// File to create or overwrite, or `-` for standard output
    #[arg(value_name = "DESTINATION")]
    pub destination: String,

    /// Directory levels to descend into when a match is a directory
    #[arg(
        long,
        value_name = "N",
        value_parser = RangedU64ValueParser::<usize>::new().range(0..=MAX_DEPTH as u64)
    )]
    pub depth: Option<usize>,

    /// Configuration file to apply on top of discovered `.extractdoc.toml` files
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log progress to stderr
    #[arg(short, long)]
    pub verbose: bool,
}

/// Entry point for CLI execution. Returns the desired exit code.
pub fn run() -> Result<i32> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let code = if err.use_stderr() {
                ExitCode::Usage
            } else {
                ExitCode::Success
            };
            err.print()?;
            return Ok(code as i32);
        }
    };

    init_tracing(cli.verbose);
    execute(cli)
}

/// Load configuration, apply command-line overrides, and render.
pub fn execute(cli: Cli) -> Result<i32> {
    let mut load = LoadOptions::default();
    if let Some(path) = &cli.config {
        load = load.with_override_path(path);
    }
    let config = Config::load(load).context("failed to load configuration")?;
    tracing::debug!(layers = ?config.sources.layers, "configuration loaded");

    let mut options = config.render.to_options();
    if let Some(depth) = cli.depth {
        options.depth = depth;
    }

    let renderer = Renderer::new(options)?;
    let destination = Destination::parse(&cli.destination);

    generate(&cli.pathname, &destination, &renderer)
        .with_context(|| format!("failed to render '{}'", cli.pathname))?;

    Ok(ExitCode::Success as i32)
}

/// Map a failure to the process exit code, preferring the code of any
/// rendering error in the chain.
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<ExtractError>())
        .map(ExtractError::exit_code)
        .unwrap_or(ExitCode::Failure) as i32
}

fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!("extractdoc={level},extractdoc_cli={level}"))
    });

    // A subscriber may already be installed when embedded in another binary.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
