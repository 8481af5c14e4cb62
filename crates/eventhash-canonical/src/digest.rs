//! Digest algorithms and `ni:///` identifier formatting.

use std::fmt;

use md2::Md2;
use md5::Md5;
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use sha1::Sha1;
use sha2::{Digest as _, Sha224, Sha256, Sha384, Sha512};
use sha3::{Sha3_224, Sha3_256, Sha3_384, Sha3_512};

use crate::canonicalizer::CanonicalForm;
use crate::config::CbvVersion;

/// Output name that returns the pre-hash string instead of a digest.
pub const PREHASH: &str = "prehash";

/// Supported digest algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DigestAlg {
    /// SHA-1.
    #[serde(rename = "sha-1")]
    Sha1,
    /// SHA-224.
    #[serde(rename = "sha-224")]
    Sha224,
    /// SHA-256 (the default).
    #[serde(rename = "sha-256")]
    Sha256,
    /// SHA-384.
    #[serde(rename = "sha-384")]
    Sha384,
    /// SHA-512.
    #[serde(rename = "sha-512")]
    Sha512,
    /// SHA3-224.
    #[serde(rename = "sha3-224")]
    Sha3_224,
    /// SHA3-256.
    #[serde(rename = "sha3-256")]
    Sha3_256,
    /// SHA3-384.
    #[serde(rename = "sha3-384")]
    Sha3_384,
    /// SHA3-512.
    #[serde(rename = "sha3-512")]
    Sha3_512,
    /// MD2.
    #[serde(rename = "md2")]
    Md2,
    /// MD5.
    #[serde(rename = "md5")]
    Md5,
}

impl DigestAlg {
    /// Every supported algorithm.
    pub const ALL: [DigestAlg; 11] = [
        Self::Sha1,
        Self::Sha224,
        Self::Sha256,
        Self::Sha384,
        Self::Sha512,
        Self::Sha3_224,
        Self::Sha3_256,
        Self::Sha3_384,
        Self::Sha3_512,
        Self::Md2,
        Self::Md5,
    ];

    /// Lowercase hyphenated algorithm name used in identifiers.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Sha1 => "sha-1",
            Self::Sha224 => "sha-224",
            Self::Sha256 => "sha-256",
            Self::Sha384 => "sha-384",
            Self::Sha512 => "sha-512",
            Self::Sha3_224 => "sha3-224",
            Self::Sha3_256 => "sha3-256",
            Self::Sha3_384 => "sha3-384",
            Self::Sha3_512 => "sha3-512",
            Self::Md2 => "md2",
            Self::Md5 => "md5",
        }
    }

    /// Looks up an algorithm by name, case-insensitively.
    pub fn from_name(name: &str) -> Option<Self> {
        let wanted = name.trim().to_ascii_lowercase();
        Self::ALL.into_iter().find(|alg| alg.name() == wanted)
    }

    /// Looks up an algorithm by name, substituting SHA-256 when it is unknown.
    pub fn from_name_or_default(name: &str) -> Self {
        Self::from_name(name).unwrap_or_else(|| {
            tracing::warn!(requested = %name, fallback = "sha-256", "unsupported digest algorithm");
            Self::Sha256
        })
    }

    /// Lowercase hex digest of `data`.
    pub fn hex_digest(&self, data: &[u8]) -> String {
        match self {
            Self::Sha1 => hex::encode(Sha1::digest(data)),
            Self::Sha224 => hex::encode(Sha224::digest(data)),
            Self::Sha256 => hex::encode(Sha256::digest(data)),
            Self::Sha384 => hex::encode(Sha384::digest(data)),
            Self::Sha512 => hex::encode(Sha512::digest(data)),
            Self::Sha3_224 => hex::encode(Sha3_224::digest(data)),
            Self::Sha3_256 => hex::encode(Sha3_256::digest(data)),
            Self::Sha3_384 => hex::encode(Sha3_384::digest(data)),
            Self::Sha3_512 => hex::encode(Sha3_512::digest(data)),
            Self::Md2 => hex::encode(Md2::digest(data)),
            Self::Md5 => hex::encode(Md5::digest(data)),
        }
    }
}

impl fmt::Display for DigestAlg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Builds `ni:///<alg>;<hex>?ver=<tag>` over the UTF-8 bytes of `prehash`.
pub fn ni_identifier(alg: DigestAlg, prehash: &str, version: CbvVersion) -> String {
    format!(
        "ni:///{};{}?ver={}",
        alg.name(),
        alg.hex_digest(prehash.as_bytes()),
        version.tag()
    )
}

/// One requested output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HashOutput {
    /// The pre-hash string itself.
    PreHash,
    /// A digest identifier. `requested` keeps the caller's spelling, which is
    /// the key in [`DigestResult`]; `alg` is the algorithm actually used.
    Digest {
        /// Name as requested.
        requested: String,
        /// Resolved algorithm.
        alg: DigestAlg,
    },
}

impl HashOutput {
    /// Parses an output name; unknown algorithm names fall back to SHA-256.
    pub fn parse(name: &str) -> Self {
        let trimmed = name.trim();
        if trimmed.eq_ignore_ascii_case(PREHASH) {
            Self::PreHash
        } else {
            Self::Digest {
                requested: trimmed.to_string(),
                alg: DigestAlg::from_name_or_default(trimmed),
            }
        }
    }

    /// Key under which this output appears in a [`DigestResult`].
    pub fn key(&self) -> &str {
        match self {
            Self::PreHash => PREHASH,
            Self::Digest { requested, .. } => requested,
        }
    }

    /// Renders this output for one canonicalized event.
    pub fn render(&self, form: &CanonicalForm, join: &str, version: CbvVersion) -> String {
        match self {
            Self::PreHash => form.joined(join),
            Self::Digest { alg, .. } => ni_identifier(*alg, &form.digest_input(), version),
        }
    }
}

/// Outputs for one event, in request order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DigestResult {
    entries: Vec<(String, String)>,
}

impl DigestResult {
    /// Renders every configured output for one canonical form.
    pub fn from_form(
        form: &CanonicalForm,
        outputs: &[HashOutput],
        join: &str,
        version: CbvVersion,
    ) -> Self {
        let mut result = Self::default();
        for output in outputs {
            result.insert(output.key(), output.render(form, join, version));
        }
        result
    }

    /// Adds or replaces an entry, keeping first-insertion order.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Value for an output name.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Entries in request order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no output was rendered.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Consumes the result, returning its first value.
    pub fn into_first(self) -> Option<String> {
        self.entries.into_iter().next().map(|(_, v)| v)
    }
}

impl Serialize for DigestResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}
