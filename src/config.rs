//! YAML Configuration File Support for simrec
//!
//! This module loads a whole similarity pipeline configuration (signature,
//! LSH banding, neighbor search and recommendation) from a single YAML file.
//!
//! ## Example YAML Configuration
//!
//! ```yaml
//! # simrec Pipeline Configuration
//! version: "1.0"
//! name: "movielens-small"
//!
//! signature:
//!   version: 1
//!   num_hashes: 100
//!   hash_family: "simple"
//!   modulus: 9999991
//!   fit_modulus_to_items: false
//!   seed: 42
//!   use_parallel: true
//!   empty_set_policy: "reject"
//!
//! lsh:
//!   bands: 20
//!   rows_per_band: 5
//!   num_buckets: 1000
//!   band_hasher:
//!     kind: "char_sum"
//!   use_parallel: false
//!
//! search:
//!   top_n: 2
//!   max_retries: 16
//!   timeout_ms: 500
//!
//! recommend:
//!   top_k: 5
//! ```

use std::fs;
use std::path::Path;

use index::{BandHasher, IndexConfig, LshParameters};
use matcher::SearchConfig;
use recommend::RecommendConfig;
use serde::{Deserialize, Serialize};
use signature::{DEFAULT_MODULUS, EmptySetPolicy, HashFamily, SignatureConfig};
use thiserror::Error;

/// Errors that can occur when loading YAML configuration files
#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("unsupported config version: {0}")]
    UnsupportedVersion(String),
}

/// Top-level YAML configuration for a simrec pipeline.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct SimrecConfig {
    /// Configuration format version
    pub version: String,

    /// Optional configuration name/description
    #[serde(default)]
    pub name: Option<String>,

    /// MinHash signature configuration
    #[serde(default)]
    pub signature: SignatureYamlConfig,

    /// LSH banding configuration
    #[serde(default)]
    pub lsh: LshYamlConfig,

    /// Neighbor search configuration
    #[serde(default)]
    pub search: SearchConfig,

    /// Recommendation configuration
    #[serde(default)]
    pub recommend: RecommendConfig,
}

impl SimrecConfig {
    /// Load a YAML configuration file from the given path
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigLoadError> {
        let content = fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse YAML configuration from a string
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        let config: SimrecConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize back to YAML.
    pub fn to_yaml(&self) -> Result<String, ConfigLoadError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigLoadError> {
        match self.version.as_str() {
            "1.0" | "1" => Ok(()),
            v => Err(ConfigLoadError::UnsupportedVersion(v.to_string())),
        }?;

        self.signature.validate()?;
        self.lsh.validate()?;

        let expected = self.lsh.bands.saturating_mul(self.lsh.rows_per_band);
        if expected != self.signature.num_hashes {
            return Err(ConfigLoadError::Validation(format!(
                "lsh.bands * lsh.rows_per_band ({} * {} = {expected}) must equal signature.num_hashes ({})",
                self.lsh.bands, self.lsh.rows_per_band, self.signature.num_hashes
            )));
        }

        self.search
            .validate()
            .map_err(|e| ConfigLoadError::Validation(format!("search: {e}")))?;
        self.recommend
            .validate()
            .map_err(|e| ConfigLoadError::Validation(format!("recommend: {e}")))?;
        Ok(())
    }

    /// Config with a given signature length and `bands` bands of equal size.
    ///
    /// Fails when `bands` does not divide `num_hashes`.
    pub fn with_banding(num_hashes: usize, bands: usize) -> Result<Self, ConfigLoadError> {
        let mut config = Self::default();
        config.signature.num_hashes = num_hashes;
        if bands == 0 || num_hashes % bands != 0 {
            return Err(ConfigLoadError::Validation(format!(
                "{bands} bands do not divide a signature of {num_hashes} hashes"
            )));
        }
        config.lsh.bands = bands;
        config.lsh.rows_per_band = num_hashes / bands;
        Ok(config)
    }

    pub fn signature_config(&self) -> SignatureConfig {
        self.signature.to_signature_config()
    }

    pub fn lsh_parameters(&self) -> LshParameters {
        self.lsh.to_parameters()
    }

    pub fn index_config(&self) -> IndexConfig {
        self.lsh.to_index_config()
    }
}

impl Default for SimrecConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            name: None,
            signature: SignatureYamlConfig::default(),
            lsh: LshYamlConfig::default(),
            search: SearchConfig::default(),
            recommend: RecommendConfig::default(),
        }
    }
}

/// MinHash signature YAML configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SignatureYamlConfig {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default = "default_num_hashes")]
    pub num_hashes: usize,

    #[serde(default)]
    pub hash_family: HashFamily,

    #[serde(default = "default_modulus")]
    pub modulus: u64,

    /// Replace `modulus` with the smallest prime at or above the number of
    /// distinct items in the input.
    #[serde(default)]
    pub fit_modulus_to_items: bool,

    #[serde(default = "default_seed")]
    pub seed: u64,

    #[serde(default)]
    pub use_parallel: bool,

    #[serde(default)]
    pub empty_set_policy: EmptySetPolicy,
}

impl SignatureYamlConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        self.to_signature_config()
            .validate()
            .map_err(|e| ConfigLoadError::Validation(format!("signature: {e}")))
    }

    pub fn to_signature_config(&self) -> SignatureConfig {
        SignatureConfig {
            version: self.version,
            num_hashes: self.num_hashes,
            hash_family: self.hash_family,
            modulus: self.modulus,
            seed: self.seed,
            use_parallel: self.use_parallel,
            empty_set_policy: self.empty_set_policy,
        }
    }
}

impl Default for SignatureYamlConfig {
    fn default() -> Self {
        Self {
            version: 1,
            num_hashes: default_num_hashes(),
            hash_family: HashFamily::Simple,
            modulus: DEFAULT_MODULUS,
            fit_modulus_to_items: false,
            seed: default_seed(),
            use_parallel: false,
            empty_set_policy: EmptySetPolicy::Reject,
        }
    }
}

/// LSH banding YAML configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LshYamlConfig {
    #[serde(default = "default_bands")]
    pub bands: usize,

    #[serde(default = "default_rows_per_band")]
    pub rows_per_band: usize,

    #[serde(default = "default_num_buckets")]
    pub num_buckets: u64,

    #[serde(default)]
    pub band_hasher: BandHasher,

    #[serde(default)]
    pub use_parallel: bool,
}

impl LshYamlConfig {
    fn validate(&self) -> Result<(), ConfigLoadError> {
        if self.bands == 0 {
            return Err(ConfigLoadError::Validation(
                "lsh.bands must be >= 1".to_string(),
            ));
        }
        if self.rows_per_band == 0 {
            return Err(ConfigLoadError::Validation(
                "lsh.rows_per_band must be >= 1".to_string(),
            ));
        }
        if self.num_buckets == 0 {
            return Err(ConfigLoadError::Validation(
                "lsh.num_buckets must be >= 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn to_parameters(&self) -> LshParameters {
        LshParameters::new(self.bands, self.rows_per_band, self.num_buckets)
    }

    pub fn to_index_config(&self) -> IndexConfig {
        IndexConfig::new()
            .with_band_hasher(self.band_hasher)
            .with_parallel(self.use_parallel)
    }
}

impl Default for LshYamlConfig {
    fn default() -> Self {
        Self {
            bands: default_bands(),
            rows_per_band: default_rows_per_band(),
            num_buckets: default_num_buckets(),
            band_hasher: BandHasher::CharSum,
            use_parallel: false,
        }
    }
}

fn default_version() -> u32 {
    1
}
fn default_num_hashes() -> usize {
    100
}
fn default_modulus() -> u64 {
    DEFAULT_MODULUS
}
fn default_seed() -> u64 {
    0xF00D_BAAD_F00D_BAAD
}
fn default_bands() -> usize {
    20
}
fn default_rows_per_band() -> usize {
    5
}
fn default_num_buckets() -> u64 {
    1_000
}
