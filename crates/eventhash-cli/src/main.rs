//! eventhash CLI - compute EPCIS event hashes for XML and JSON documents.

use clap::{Args, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod errors;
mod input;
mod output;

use commands::{canonicalize, hash};
use input::Format;

#[derive(Parser)]
#[command(name = "eventhash")]
#[command(about = "Compute canonical EPCIS event hashes")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace). RUST_LOG wins when set.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every command that canonicalizes events.
#[derive(Args, Clone)]
pub struct CanonicalArgs {
    /// Input document (or stdin if not provided)
    pub input: Option<String>,
    /// Source syntax
    #[arg(long, value_enum, default_value_t = Format::Auto)]
    pub format: Format,
    /// CBV version governing field order and the identifier tag (2.0 or 2.1)
    #[arg(long, default_value = "2.0")]
    pub cbv: String,
    /// Additional comma-separated field names to exclude
    #[arg(long)]
    pub exclude: Option<String>,
    /// Do not exclude the default fields (errorDeclaration, recordTime, eventID, @context)
    #[arg(long)]
    pub no_default_excludes: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the hash identifiers of every event
    Hash {
        #[command(flatten)]
        common: CanonicalArgs,
        /// Digest algorithm(s), comma-separated or repeated (default: sha-256)
        #[arg(long, short)]
        algorithm: Vec<String>,
        /// Also output the pre-hash string
        #[arg(long)]
        prehash: bool,
        /// String placed between pre-hash lines
        #[arg(long, default_value = "")]
        join: String,
        /// Print one bare value per line instead of JSON (single output only)
        #[arg(long)]
        single: bool,
    },
    /// Print the pre-hash lines of every event
    Canonicalize {
        #[command(flatten)]
        common: CanonicalArgs,
    },
}

fn init_tracing(verbose: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Hash {
            common,
            algorithm,
            prehash,
            join,
            single,
        } => hash::run(common, algorithm, prehash, join, single),
        Commands::Canonicalize { common } => canonicalize::run(common),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
