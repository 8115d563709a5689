//! Engine configuration via `mnemos.toml`
//!
//! One `[knowledge]` block describes the primary collection, an optional
//! `[reflection]` block the secondary one, and `[normalization]` the text
//! preprocessing policy. Every field has a default, so a file only needs
//! the values it changes.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{VectorError, VectorResult};

/// Config file name placed in the data directory.
pub const CONFIG_FILE_NAME: &str = "mnemos.toml";

/// Default collection name for primary memory.
pub const DEFAULT_KNOWLEDGE_COLLECTION: &str = "knowledge";
/// Default collection name for reflection memory.
pub const DEFAULT_REFLECTION_COLLECTION: &str = "reflection";

const DEFAULT_DIMENSION: usize = 384;
const DEFAULT_MAX_VECTORS: usize = 100_000;
const DEFAULT_MIN_DATASET_SIZE: usize = 1_000;
const DEFAULT_PERSISTENCE_PATH: &str = "data/vectors";

/// Storage backend variant
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Equality filters only
    Basic,
    /// Equality, range and set-membership filters plus ANN statistics
    #[default]
    Enhanced,
}

impl BackendKind {
    /// Name as written in config files
    pub fn name(&self) -> &'static str {
        match self {
            BackendKind::Basic => "basic",
            BackendKind::Enhanced => "enhanced",
        }
    }
}

/// Nearest-neighbour algorithm requested for a collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Algorithm {
    /// Exhaustive exact search
    #[default]
    #[serde(rename = "brute-force")]
    BruteForce,
    /// Accelerated flat index, used once the collection is large enough
    #[serde(rename = "flat")]
    Flat,
}

impl Algorithm {
    /// Name as written in config files and metadata
    pub fn name(&self) -> &'static str {
        match self {
            Algorithm::BruteForce => "brute-force",
            Algorithm::Flat => "flat",
        }
    }

    /// Parse from string (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "brute-force" | "brute_force" | "bruteforce" => Some(Algorithm::BruteForce),
            "flat" => Some(Algorithm::Flat),
            _ => None,
        }
    }
}

/// Configuration of one collection and the backend serving it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Backend variant
    #[serde(rename = "type", default)]
    pub backend: BackendKind,
    /// Collection name
    #[serde(default = "default_collection_name")]
    pub collection_name: String,
    /// Embedding dimension, must be > 0
    #[serde(default = "default_dimension")]
    pub dimension: usize,
    /// Hard capacity limit, must be > 0
    #[serde(default = "default_max_vectors")]
    pub max_vectors: usize,
    /// Requested ANN algorithm
    #[serde(default)]
    pub algorithm: Algorithm,
    /// Below this many vectors the index always uses brute force
    #[serde(default = "default_min_dataset_size")]
    pub min_dataset_size_for_acceleration: usize,
    /// Persist vectors and payloads to disk
    #[serde(default)]
    pub persist_index: bool,
    /// Parent directory; each collection gets its own subdirectory
    #[serde(default = "default_persistence_path")]
    pub persistence_path: PathBuf,
}

fn default_collection_name() -> String {
    DEFAULT_KNOWLEDGE_COLLECTION.to_string()
}

fn default_dimension() -> usize {
    DEFAULT_DIMENSION
}

fn default_max_vectors() -> usize {
    DEFAULT_MAX_VECTORS
}

fn default_min_dataset_size() -> usize {
    DEFAULT_MIN_DATASET_SIZE
}

fn default_persistence_path() -> PathBuf {
    PathBuf::from(DEFAULT_PERSISTENCE_PATH)
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::default(),
            collection_name: default_collection_name(),
            dimension: default_dimension(),
            max_vectors: default_max_vectors(),
            algorithm: Algorithm::default(),
            min_dataset_size_for_acceleration: default_min_dataset_size(),
            persist_index: false,
            persistence_path: default_persistence_path(),
        }
    }
}

impl StorageConfig {
    /// In-memory collection with the given name and dimension
    pub fn new(collection_name: impl Into<String>, dimension: usize) -> Self {
        Self {
            collection_name: collection_name.into(),
            dimension,
            ..Self::default()
        }
    }

    /// Set the backend variant
    pub fn with_backend(mut self, backend: BackendKind) -> Self {
        self.backend = backend;
        self
    }

    /// Set the capacity limit
    pub fn with_max_vectors(mut self, max_vectors: usize) -> Self {
        self.max_vectors = max_vectors;
        self
    }

    /// Set the ANN algorithm and its acceleration threshold
    pub fn with_algorithm(mut self, algorithm: Algorithm, min_dataset_size: usize) -> Self {
        self.algorithm = algorithm;
        self.min_dataset_size_for_acceleration = min_dataset_size;
        self
    }

    /// Enable persistence under `path`
    pub fn with_persistence(mut self, path: impl Into<PathBuf>) -> Self {
        self.persist_index = true;
        self.persistence_path = path.into();
        self
    }

    /// Directory holding this collection's files
    pub fn collection_dir(&self) -> PathBuf {
        self.persistence_path.join(&self.collection_name)
    }

    /// Check the numeric invariants
    ///
    /// # Errors
    ///
    /// `InvalidConfiguration` if `dimension` or `max_vectors` is zero.
    pub fn validate(&self) -> VectorResult<()> {
        if self.dimension == 0 {
            return Err(VectorError::InvalidConfiguration(format!(
                "collection '{}': dimension must be > 0",
                self.collection_name
            )));
        }
        if self.max_vectors == 0 {
            return Err(VectorError::InvalidConfiguration(format!(
                "collection '{}': max_vectors must be > 0",
                self.collection_name
            )));
        }
        Ok(())
    }
}

/// Language used by stopword removal, stemming and lemmatization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// English
    #[default]
    English,
    /// Spanish
    Spanish,
    /// French
    French,
    /// German
    German,
}

impl Language {
    /// Name as written in config files
    pub fn name(&self) -> &'static str {
        match self {
            Language::English => "english",
            Language::Spanish => "spanish",
            Language::French => "french",
            Language::German => "german",
        }
    }
}

/// Text normalization policy applied before embedding
///
/// Each toggle is independent. If both `stem` and `lemmatize` are set,
/// only lemmatization runs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NormalizationConfig {
    /// Fold case
    pub to_lowercase: bool,
    /// Strip punctuation characters
    pub remove_punctuation: bool,
    /// Collapse runs of whitespace and trim
    pub collapse_whitespace: bool,
    /// Drop stopwords for `language`
    pub remove_stopwords: bool,
    /// Reduce words to stems
    pub stem: bool,
    /// Reduce words to dictionary forms
    pub lemmatize: bool,
    /// Language for stopwords/stemming/lemmatization
    pub language: Language,
}

impl Default for NormalizationConfig {
    fn default() -> Self {
        Self {
            to_lowercase: true,
            remove_punctuation: true,
            collapse_whitespace: true,
            remove_stopwords: false,
            stem: false,
            lemmatize: false,
            language: Language::English,
        }
    }
}

/// Top-level configuration loaded from `mnemos.toml`.
///
/// # Example
///
/// ```toml
/// reflection_enabled = true
///
/// [knowledge]
/// collection_name = "knowledge"
/// dimension = 384
/// algorithm = "flat"
///
/// [reflection]
/// collection_name = "reflection"
/// dimension = 384
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MnemosConfig {
    /// Feature flag for the reflection collection
    #[serde(default = "default_reflection_enabled")]
    pub reflection_enabled: bool,
    /// Primary collection
    #[serde(default)]
    pub knowledge: StorageConfig,
    /// Secondary collection, absent when not configured
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reflection: Option<StorageConfig>,
    /// Text normalization policy
    #[serde(default)]
    pub normalization: NormalizationConfig,
}

fn default_reflection_enabled() -> bool {
    true
}

impl Default for MnemosConfig {
    fn default() -> Self {
        Self {
            reflection_enabled: default_reflection_enabled(),
            knowledge: StorageConfig::default(),
            reflection: None,
            normalization: NormalizationConfig::default(),
        }
    }
}

impl MnemosConfig {
    /// Returns the default config file content with comments.
    pub fn default_toml() -> &'static str {
        r#"# Mnemos vector memory configuration

# Enable the secondary "reflection" collection (needs a [reflection] block).
reflection_enabled = true

[knowledge]
# Backend variant: "basic" (equality filters) or "enhanced" (range/any filters + ANN stats)
type = "enhanced"
collection_name = "knowledge"
dimension = 384
max_vectors = 100000
# "brute-force" or "flat"
algorithm = "brute-force"
# Below this many vectors searches always use brute force
min_dataset_size_for_acceleration = 1000
persist_index = false
persistence_path = "data/vectors"

# [reflection]
# collection_name = "reflection"
# dimension = 384
# max_vectors = 10000

[normalization]
to_lowercase = true
remove_punctuation = true
collapse_whitespace = true
remove_stopwords = false
stem = false
lemmatize = false
language = "english"
"#
    }

    /// Parse config from a TOML string and validate it.
    ///
    /// # Errors
    ///
    /// `InvalidConfiguration` for syntax errors, unknown enum values, or
    /// invalid numeric fields.
    pub fn from_toml_str(content: &str) -> VectorResult<Self> {
        let config: MnemosConfig = toml::from_str(content)
            .map_err(|e| VectorError::InvalidConfiguration(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse config from a file path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> VectorResult<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| VectorError::persistence(path, e))?;
        Self::from_toml_str(&content).map_err(|e| match e {
            VectorError::InvalidConfiguration(msg) => VectorError::InvalidConfiguration(format!(
                "Failed to parse config file '{}': {}",
                path.display(),
                msg
            )),
            other => other,
        })
    }

    /// Write the default config file if it does not already exist.
    pub fn write_default_if_missing(path: &Path) -> VectorResult<()> {
        if !path.exists() {
            std::fs::write(path, Self::default_toml())
                .map_err(|e| VectorError::persistence(path, e))?;
        }
        Ok(())
    }

    /// Serialize this config to TOML and write it to the given path.
    pub fn write_to_file(&self, path: &Path) -> VectorResult<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| VectorError::Serialization(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| VectorError::persistence(path, e))
    }

    /// Validate both collection blocks
    pub fn validate(&self) -> VectorResult<()> {
        self.knowledge.validate()?;
        self.validate_reflection()
    }

    /// Validate the reflection block against the knowledge block
    ///
    /// Passes when no reflection block is configured.
    pub fn validate_reflection(&self) -> VectorResult<()> {
        let Some(reflection) = &self.reflection else {
            return Ok(());
        };
        reflection.validate()?;
        if reflection.dimension != self.knowledge.dimension {
            return Err(VectorError::InvalidConfiguration(format!(
                "reflection dimension {} differs from knowledge dimension {}",
                reflection.dimension, self.knowledge.dimension
            )));
        }
        if reflection.collection_name == self.knowledge.collection_name {
            return Err(VectorError::InvalidConfiguration(format!(
                "reflection and knowledge share the collection name '{}'",
                reflection.collection_name
            )));
        }
        Ok(())
    }
}
