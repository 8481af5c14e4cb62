//! Hash configuration: CBV version, excluded fields, join string and outputs.
//!
//! A [`HashConfig`] is immutable once built. Share it freely across threads;
//! changing any setting means building a new value.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::digest::HashOutput;
use crate::errors::ConfigError;
use crate::schema::FieldSchema;

/// Fields left out of the pre-hash string unless the caller clears them.
pub const DEFAULT_EXCLUDED_FIELDS: &[&str] =
    &["errorDeclaration", "recordTime", "eventID", "@context"];

/// Digest algorithm used when the caller requests none.
pub const DEFAULT_OUTPUT: &str = "sha-256";

/// Standard version governing field ordering and the `ver` tag of identifiers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CbvVersion {
    /// CBV 2.0: extensions are hoisted after every standard field.
    #[default]
    #[serde(rename = "2.0")]
    V2_0,
    /// CBV 2.1: extensions nested in a standard field stay inside it.
    #[serde(rename = "2.1")]
    V2_1,
}

/// Where user-extension fields land in the pre-hash string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtensionPlacement {
    /// All extensions follow all standard fields.
    Hoisted,
    /// Extensions render inside the standard field that contains them.
    Inline,
}

impl CbvVersion {
    /// Tag appended to digest identifiers (`?ver=...`).
    pub fn tag(&self) -> &'static str {
        match self {
            Self::V2_0 => "CBV2.0",
            Self::V2_1 => "CBV2.1",
        }
    }

    /// Extension placement rule of this version.
    pub fn extension_placement(&self) -> ExtensionPlacement {
        match self {
            Self::V2_0 => ExtensionPlacement::Hoisted,
            Self::V2_1 => ExtensionPlacement::Inline,
        }
    }
}

impl fmt::Display for CbvVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for CbvVersion {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "2.0" | "CBV2.0" | "V1" => Ok(Self::V2_0),
            "2.1" | "CBV2.1" | "V2" => Ok(Self::V2_1),
            _ => Err(ConfigError::UnknownVersion(s.to_string())),
        }
    }
}

/// Splits a comma-separated field list, trimming each entry.
pub fn parse_field_list(list: &str) -> impl Iterator<Item = String> + '_ {
    list.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
}

/// Immutable per-run hashing configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashConfig {
    version: CbvVersion,
    excluded: BTreeSet<String>,
    join: String,
    outputs: Vec<HashOutput>,
}

impl Default for HashConfig {
    fn default() -> Self {
        Self {
            version: CbvVersion::default(),
            excluded: DEFAULT_EXCLUDED_FIELDS.iter().map(|f| f.to_string()).collect(),
            join: String::new(),
            outputs: vec![HashOutput::parse(DEFAULT_OUTPUT)],
        }
    }
}

impl HashConfig {
    /// Starts a builder seeded with the defaults.
    pub fn builder() -> HashConfigBuilder {
        HashConfigBuilder::default()
    }

    /// Selected CBV version.
    pub fn version(&self) -> CbvVersion {
        self.version
    }

    /// Field ordering catalog for the selected version.
    pub fn schema(&self) -> &'static FieldSchema {
        FieldSchema::for_version(self.version)
    }

    /// Whether a field name is excluded from canonicalization.
    pub fn is_excluded(&self, name: &str) -> bool {
        self.excluded.contains(name)
    }

    /// Excluded field names, sorted.
    pub fn excluded_fields(&self) -> impl Iterator<Item = &str> {
        self.excluded.iter().map(String::as_str)
    }

    /// String placed between pre-hash lines in `prehash` outputs.
    pub fn join(&self) -> &str {
        &self.join
    }

    /// Requested outputs in request order.
    pub fn outputs(&self) -> &[HashOutput] {
        &self.outputs
    }

    /// Fails unless exactly one output is requested.
    pub fn require_single_output(&self) -> Result<&HashOutput, ConfigError> {
        match self.outputs.as_slice() {
            [single] => Ok(single),
            [] => Err(ConfigError::NoOutputs),
            many => Err(ConfigError::MultipleOutputsForSingleShape { count: many.len() }),
        }
    }
}

/// Builder for [`HashConfig`].
///
/// ```rust
/// use eventhash_canonical::{CbvVersion, HashConfig};
///
/// let config = HashConfig::builder()
///     .version(CbvVersion::V2_1)
///     .exclude_fields("certificationInfo, sensorElementList")
///     .outputs(["prehash", "sha3-512"])
///     .build()?;
/// assert!(config.is_excluded("certificationInfo"));
/// assert_eq!(config.outputs().len(), 2);
/// # Ok::<(), eventhash_canonical::ConfigError>(())
/// ```
#[derive(Debug, Clone)]
pub struct HashConfigBuilder {
    config: HashConfig,
}

impl Default for HashConfigBuilder {
    fn default() -> Self {
        Self {
            config: HashConfig::default(),
        }
    }
}

impl HashConfigBuilder {
    /// Selects the CBV version.
    pub fn version(mut self, version: CbvVersion) -> Self {
        self.config.version = version;
        self
    }

    /// Adds comma-separated field names to the exclusion set.
    pub fn exclude_fields(mut self, list: &str) -> Self {
        self.config.excluded.extend(parse_field_list(list));
        self
    }

    /// Empties the exclusion set, defaults included.
    pub fn clear_excluded_fields(mut self) -> Self {
        self.config.excluded.clear();
        self
    }

    /// Restores the default exclusion set, dropping any additions.
    pub fn default_excluded_fields(mut self) -> Self {
        self.config.excluded = HashConfig::default().excluded;
        self
    }

    /// Sets the string placed between lines of `prehash` outputs.
    pub fn join_with(mut self, join: impl Into<String>) -> Self {
        self.config.join = join.into();
        self
    }

    /// Replaces the requested outputs (algorithm names or `prehash`).
    pub fn outputs<I, S>(mut self, outputs: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.config.outputs = outputs
            .into_iter()
            .map(|name| HashOutput::parse(name.as_ref()))
            .collect();
        self
    }

    /// Validates and freezes the configuration.
    pub fn build(self) -> Result<HashConfig, ConfigError> {
        if self.config.outputs.is_empty() {
            return Err(ConfigError::NoOutputs);
        }
        Ok(self.config)
    }
}
