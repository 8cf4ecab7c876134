use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use envrender::{RenderConfig, DEFAULT_PREFIX};
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Render a template from environment variables.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Source template file
    #[arg(short = 's', long = "source")]
    source: PathBuf,
    /// Target file; stdout when omitted
    #[arg(short = 't', long = "target")]
    target: Option<PathBuf>,
    /// Prefix of the environment variables to read
    #[arg(short = 'p', long = "prefix", default_value = DEFAULT_PREFIX)]
    prefix: String,
    /// Print how each template field resolves instead of rendering
    #[arg(long)]
    explain: bool,
    /// Debug logging
    #[arg(short = 'v', long)]
    verbose: bool,
}

impl From<Args> for RenderConfig {
    fn from(args: Args) -> Self {
        Self {
            source: args.source,
            target: args.target,
            prefix: args.prefix,
            explain: args.explain,
        }
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

// Usage errors exit like a missing source.
const USAGE_EXIT: u8 = 1;

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            return if e.use_stderr() {
                ExitCode::from(USAGE_EXIT)
            } else {
                ExitCode::SUCCESS
            };
        }
    };
    init_logging(args.verbose);

    let config = RenderConfig::from(args);
    match envrender::run(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::from(e.exit_code())
        }
    }
}
