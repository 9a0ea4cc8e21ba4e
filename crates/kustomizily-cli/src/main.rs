//! Kustomizily CLI - split a Kubernetes manifest stream into a kustomize tree

use std::path::PathBuf;

use clap::Parser;
use kustomizily_core::{DEFAULT_MAX_DOCUMENT_SIZE, Options};
use tracing_subscriber::EnvFilter;

mod commands;
mod display;
mod error;
mod exit_codes;

#[derive(Parser)]
#[command(name = "kustomizily")]
#[command(author = "Kustomizily Contributors")]
#[command(version)]
#[command(
    about = "Split a multi-document Kubernetes manifest stream into a kustomize directory tree",
    long_about = None
)]
struct Cli {
    /// Input file, `-` reads from stdin
    #[arg(short, long, env = "KUSTOMIZILY_INPUT", default_value = commands::build::STDIN)]
    input: PathBuf,

    /// Output directory
    #[arg(short, long, env = "KUSTOMIZILY_OUTPUT", default_value = "./kustomizily")]
    output: PathBuf,

    /// Print what would be written instead of writing it
    #[arg(short, long, env = "KUSTOMIZILY_DRY_RUN")]
    dry_run: bool,

    /// Largest accepted document, in bytes
    #[arg(
        long,
        env = "KUSTOMIZILY_MAX_DOCUMENT_SIZE",
        default_value_t = DEFAULT_MAX_DOCUMENT_SIZE
    )]
    max_document_size: usize,

    /// Suppress the summary
    #[arg(short, long)]
    quiet: bool,

    /// Enable debug output
    #[arg(long)]
    debug: bool,
}

fn init_tracing(cli: &Cli) {
    let default = if cli.debug {
        "kustomizily=debug"
    } else if cli.quiet {
        "kustomizily=warn"
    } else {
        "kustomizily=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    // Setup miette for nice error display
    miette::set_panic_hook();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if err.use_stderr() => {
            let _ = err.print();
            std::process::exit(exit_codes::USAGE_ERROR);
        }
        Err(err) => err.exit(),
    };

    init_tracing(&cli);

    let options = Options {
        max_document_size: cli.max_document_size,
    };

    match commands::build::run(&cli.input, &cli.output, cli.dry_run, options) {
        Ok(summary) => {
            if !cli.quiet {
                display::print_summary(&summary, &cli.output, cli.dry_run);
            }
        }
        Err(err) => {
            let code = err.exit_code();
            eprintln!("{:?}", miette::Report::new(err));
            std::process::exit(code);
        }
    }
}
