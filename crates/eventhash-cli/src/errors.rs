use eventhash_canonical::ConfigError;
use eventhash_reader::ReaderError;
use thiserror::Error;

/// Errors surfaced by CLI commands.
#[derive(Error, Debug)]
pub enum CliError {
    /// The input could not be opened or read.
    #[error("failed to read {path}: {source}")]
    Input {
        path: String,
        source: std::io::Error,
    },
    /// Invalid flag combination or value.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    /// The document could not be read or hashed.
    #[error(transparent)]
    Reader(#[from] ReaderError),
    /// Results could not be written.
    #[error("failed to write output: {0}")]
    Output(#[from] std::io::Error),
    /// Results could not be serialized.
    #[error("failed to serialize results: {0}")]
    Serialize(#[from] serde_json::Error),
}
