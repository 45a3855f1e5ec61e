//! Membrane store CLI
//!
//! Command-line interface for prime-factorized tensor membranes: scripted
//! store sessions and shape arithmetic.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use membrane_cli::commands::shape::{describe_factorization, describe_shape};
use membrane_cli::{load_config, run_session};
use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "membrane")]
#[command(about = "Membrane - prime-factorized tensor membrane store", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file path
    #[arg(short, long, global = true, default_value = "membrane.toml")]
    config: PathBuf,
}

#[derive(Subcommand)]
enum Commands {
    /// Run store commands from a script, or from stdin
    Run {
        /// Script file, one command per line
        #[arg(short, long)]
        script: Option<PathBuf>,
    },

    /// Show rank, volume and strides of a shape such as 2,3,5
    Shape {
        /// Comma-separated axis sizes
        primes: String,
    },

    /// Factorize a positive integer into primes
    Factor {
        /// Number to factorize
        n: u32,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr so script output stays clean on stdout
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_writer(io::stderr)
        .init();

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match cli.command {
        Commands::Run { script } => {
            let config = load_config(&cli.config)?;
            let summary = match script {
                Some(path) => {
                    let file = File::open(&path)
                        .with_context(|| format!("Failed to open script {}", path.display()))?;
                    run_session(&config, BufReader::new(file), &mut out)?
                }
                None => run_session(&config, io::stdin().lock(), &mut out)?,
            };
            tracing::info!(
                executed = summary.executed,
                failed = summary.failed,
                "Session complete"
            );
        }

        Commands::Shape { primes } => {
            out.write_all(describe_shape(&primes)?.as_bytes())?;
        }

        Commands::Factor { n } => {
            out.write_all(describe_factorization(n)?.as_bytes())?;
        }
    }

    Ok(())
}
