use thiserror::Error;

/// Errors raised while turning an event tree into its pre-hash string.
#[derive(Debug, Error)]
pub enum CanonicalError {
    /// A time-valued field could not be parsed as an instant.
    #[error("{field} ('{value}') is not a valid timestamp")]
    InvalidTimestamp {
        /// Field name that failed to parse.
        field: String,
        /// Offending value.
        value: String,
    },
}

/// Errors raised while building a [`HashConfig`](crate::HashConfig).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// No outputs were requested.
    #[error("at least one output (digest algorithm or \"prehash\") must be requested")]
    NoOutputs,
    /// The single-string result shape can only carry one output.
    #[error("{count} outputs requested but the single-string result shape carries exactly one")]
    MultipleOutputsForSingleShape {
        /// Number of requested outputs.
        count: usize,
    },
    /// The CBV version selector was not recognised.
    #[error("unknown CBV version '{0}' (expected 2.0 or 2.1)")]
    UnknownVersion(String),
}
