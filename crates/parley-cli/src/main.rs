//! Parley CLI entry point.
//!
//! Command-line tools for working with response templates:
//! - `parley resolve` - Resolve a template against a fixture
//! - `parley stages` - List the resolution stages and their placeholders
//! - `parley eval` - Evaluate a sandbox expression

mod commands;
mod output;

use std::io::stderr;
use std::process::exit;

use clap::{Parser, Subcommand, ValueEnum};
use commands::{run_eval, run_resolve, run_stages, EvalArgs, ResolveArgs, StagesArgs};
use tracing_subscriber::EnvFilter;

/// Parley response template tools.
#[derive(Debug, Parser)]
#[command(name = "parley")]
#[command(about = "Parley response template tools", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Color output control
    #[arg(long, value_enum, default_value_t = ColorWhen::Auto, global = true)]
    pub color: ColorWhen,

    /// Log every resolution stage to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// When to use colored output.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ColorWhen {
    Auto,
    Always,
    Never,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Resolve a response template
    Resolve(ResolveArgs),
    /// List resolution stages in order
    Stages(StagesArgs),
    /// Evaluate a sandbox expression
    Eval(EvalArgs),
}

/// Set up color output based on user preference.
fn setup_colors(color_when: ColorWhen) {
    match color_when {
        ColorWhen::Auto => {
            // owo-colors automatically checks TTY, NO_COLOR, FORCE_COLOR
        }
        ColorWhen::Always => {
            owo_colors::set_override(true);
        }
        ColorWhen::Never => {
            owo_colors::set_override(false);
        }
    }
}

/// `RUST_LOG` wins; otherwise warnings, or stage traces with `--verbose`.
fn setup_logging(verbose: bool) {
    let default = if verbose { "parley=trace" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> miette::Result<()> {
    let cli = Cli::parse();
    setup_colors(cli.color);
    setup_logging(cli.verbose);

    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .build(),
        )
    }))?;

    let result = match cli.command {
        Commands::Resolve(args) => run_resolve(args).await,
        Commands::Stages(args) => run_stages(&args),
        Commands::Eval(args) => run_eval(args).await,
    };

    match result {
        Ok(code) => exit(code),
        Err(e) => {
            eprintln!("{e:?}");
            exit(exitcode::SOFTWARE);
        }
    }
}
