//! orb-export - Orb asset export tool
//!
//! Converts FBX binary scenes to the engine-ready Orb container format
//! (.orb) and decodes existing containers for inspection.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "orb-export")]
#[command(about = "Orb asset export tool")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert one or more FBX scenes into a single Orb container
    Convert {
        /// Input .fbx files, merged in argument order
        #[arg(required = true)]
        inputs: Vec<PathBuf>,

        /// Output .orb file (defaults to the first input with an .orb
        /// extension)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Decode an Orb container and print its contents
    Analyze {
        /// Input .orb file
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Convert { inputs, output } => {
            let output = output.unwrap_or_else(|| inputs[0].with_extension("orb"));
            tracing::info!("Converting {:?} -> {:?}", inputs, output);
            orb_export::convert_files(&inputs, &output)?;
            tracing::info!("Done!");
        }

        Commands::Analyze { input } => {
            tracing::info!("Analyzing {:?}", input);
            orb_export::analyze(&input)?;
        }
    }

    Ok(())
}
