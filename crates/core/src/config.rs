//! Configuration management
//!
//! Settings arrive from three layers: command-line flags and environment
//! variables (already merged by the CLI), an optional TOML file stored at
//! ~/.config/blobcopy/config.toml, and built-in defaults. They are resolved
//! once into an immutable `RunConfig` before any network activity.

use std::fmt;
use std::num::NonZeroUsize;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Current configuration schema version
pub const SCHEMA_VERSION: u32 = 1;

/// Objects transferred concurrently per batch
pub const DEFAULT_BATCH_SIZE: usize = 10;

/// Key prefix copied when none is configured
pub const DEFAULT_KEY_PREFIX: &str = "production/";

/// Objects requested per listing page
pub const DEFAULT_PAGE_SIZE: usize = 1000;

/// Listing API used when none is configured
pub const DEFAULT_SOURCE_URL: &str = "https://blob.vercel-storage.com";

/// On-disk configuration file
///
/// Every field is optional; flags and environment variables take precedence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileConfig {
    /// Schema version for migration support
    pub schema_version: u32,

    #[serde(default)]
    pub run: RunSection,

    #[serde(default)]
    pub source: SourceSection,

    #[serde(default)]
    pub destination: DestinationSection,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub batch_size: Option<usize>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_prefix: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<usize>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SourceSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DestinationSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bucket: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_key_id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_access_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub force_path_style: Option<bool>,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            run: RunSection::default(),
            source: SourceSection::default(),
            destination: DestinationSection::default(),
        }
    }
}

/// Loads the optional configuration file
#[derive(Debug)]
pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    /// Create a new ConfigManager with the default config path
    pub fn new() -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| Error::Config("Could not determine config directory".into()))?;
        let config_path = config_dir.join("blobcopy").join("config.toml");
        Ok(Self { config_path })
    }

    /// Create a ConfigManager with a custom path
    pub fn with_path(path: PathBuf) -> Self {
        Self { config_path: path }
    }

    /// Get the configuration file path
    pub fn config_path(&self) -> &PathBuf {
        &self.config_path
    }

    /// Load configuration from disk
    ///
    /// A missing file yields an empty configuration.
    pub fn load(&self) -> Result<FileConfig> {
        if !self.config_path.exists() {
            tracing::debug!(path = %self.config_path.display(), "no config file");
            return Ok(FileConfig::default());
        }

        let content = std::fs::read_to_string(&self.config_path)?;
        let config: FileConfig = toml::from_str(&content)?;

        if config.schema_version > SCHEMA_VERSION {
            return Err(Error::Config(format!(
                "Configuration file version {} is newer than supported version {}. Please upgrade blobcopy.",
                config.schema_version, SCHEMA_VERSION
            )));
        }

        Ok(config)
    }
}

/// Values supplied on the command line or through the environment
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub batch_size: Option<usize>,
    pub key_prefix: Option<String>,
    pub page_size: Option<usize>,
    pub region: Option<String>,
    pub bucket: Option<String>,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub endpoint: Option<String>,
    pub force_path_style: Option<bool>,
    pub source_url: Option<String>,
    pub source_token: Option<String>,
    pub dry_run: bool,
}

/// Connection settings for the blob listing API
#[derive(Clone)]
pub struct SourceConfig {
    pub api_url: String,
    pub token: String,
}

impl fmt::Debug for SourceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceConfig")
            .field("api_url", &self.api_url)
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Connection settings for the destination bucket
#[derive(Clone)]
pub struct DestinationConfig {
    pub region: String,
    pub bucket: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub endpoint: Option<String>,
    pub force_path_style: bool,
}

impl fmt::Debug for DestinationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DestinationConfig")
            .field("region", &self.region)
            .field("bucket", &self.bucket)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("endpoint", &self.endpoint)
            .field("force_path_style", &self.force_path_style)
            .finish()
    }
}

/// Immutable settings for one run
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub batch_size: NonZeroUsize,
    pub key_prefix: String,
    pub page_size: NonZeroUsize,
    pub dry_run: bool,
    pub source: SourceConfig,
    pub destination: DestinationConfig,
}

impl RunConfig {
    /// Merge overrides on top of the file configuration and validate the result
    ///
    /// All missing required parameters are reported together.
    pub fn resolve(overrides: ConfigOverrides, file: FileConfig) -> Result<Self> {
        let FileConfig {
            run,
            source,
            destination,
            ..
        } = file;

        let region = overrides.region.or(destination.region);
        let bucket = overrides.bucket.or(destination.bucket);
        let access_key_id = overrides.access_key_id.or(destination.access_key_id);
        let secret_access_key = overrides.secret_access_key.or(destination.secret_access_key);
        let token = overrides.source_token.or(source.token);

        let mut missing = Vec::new();
        for (name, value) in [
            ("region", &region),
            ("bucket", &bucket),
            ("access_key_id", &access_key_id),
            ("secret_access_key", &secret_access_key),
            ("source_token", &token),
        ] {
            if value.as_deref().is_none_or(|v| v.trim().is_empty()) {
                missing.push(name);
            }
        }
        if !missing.is_empty() {
            return Err(Error::MissingParameters(
                missing.into_iter().map(String::from).collect(),
            ));
        }

        let batch_size = positive(
            "batch size",
            overrides
                .batch_size
                .or(run.batch_size)
                .unwrap_or(DEFAULT_BATCH_SIZE),
        )?;
        let page_size = positive(
            "page size",
            overrides
                .page_size
                .or(run.page_size)
                .unwrap_or(DEFAULT_PAGE_SIZE),
        )?;

        let api_url = overrides
            .source_url
            .or(source.api_url)
            .unwrap_or_else(|| DEFAULT_SOURCE_URL.to_string());
        url::Url::parse(&api_url)?;

        let endpoint = overrides.endpoint.or(destination.endpoint);
        if let Some(endpoint) = &endpoint {
            url::Url::parse(endpoint)?;
        }

        Ok(Self {
            batch_size,
            key_prefix: overrides
                .key_prefix
                .or(run.key_prefix)
                .unwrap_or_else(|| DEFAULT_KEY_PREFIX.to_string()),
            page_size,
            dry_run: overrides.dry_run,
            source: SourceConfig {
                api_url,
                token: token.unwrap_or_default(),
            },
            destination: DestinationConfig {
                region: region.unwrap_or_default(),
                bucket: bucket.unwrap_or_default(),
                access_key_id: access_key_id.unwrap_or_default(),
                secret_access_key: secret_access_key.unwrap_or_default(),
                endpoint,
                force_path_style: overrides
                    .force_path_style
                    .or(destination.force_path_style)
                    .unwrap_or(false),
            },
        })
    }
}

fn positive(name: &str, value: usize) -> Result<NonZeroUsize> {
    NonZeroUsize::new(value)
        .ok_or_else(|| Error::Config(format!("{name} must be a positive integer, got {value}")))
}
