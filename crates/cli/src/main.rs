//! # mealforge-cli
//!
//! Runs the response pipeline from the command line, either over text that
//! was already produced by a model or against a live provider.

mod generate;
mod process;

use anyhow::Result;
use clap::{Parser, Subcommand};
use generate::{handle_generate, GenerateArgs};
use process::{handle_process, ProcessArgs};
use tracing_subscriber::{fmt, EnvFilter};

// --- CLI Definition ---

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Normalize a saved model response into a record
    Process(ProcessArgs),
    /// Ask a provider for a record and normalize the answer
    Generate(GenerateArgs),
}

// --- Main Application Entry ---

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Records go to stdout, so logs go to stderr.
    let subscriber = fmt::Subscriber::builder()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::from_default_env())
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let cli = Cli::parse();

    match &cli.command {
        Commands::Process(args) => {
            if let Err(e) = handle_process(args) {
                eprintln!("Process failed: {e}");
                std::process::exit(1);
            }
        }
        Commands::Generate(args) => {
            if let Err(e) = handle_generate(args).await {
                eprintln!("Generate failed: {e}");
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
