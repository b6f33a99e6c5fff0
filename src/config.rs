use serde::{Deserialize, Serialize};

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Cache backend configuration
    #[serde(default)]
    pub cache: CacheConfig,

    /// Search and suggestion configuration
    #[serde(default)]
    pub search: SearchConfig,

    /// CSV ingestion configuration
    #[serde(default)]
    pub ingest: IngestConfig,
}

impl Config {
    /// Load configuration from file and environment
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_path =
            std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config/default.toml".to_string());

        config::Config::builder()
            // Start with default values
            .add_source(config::File::from_str(
                include_str!("../config/default.toml"),
                config::FileFormat::Toml,
            ))
            // Override with config file if it exists
            .add_source(config::File::with_name(&config_path).required(false))
            // Override with environment variables (prefix: CATALOG_)
            .add_source(
                config::Environment::with_prefix("CATALOG")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache: CacheConfig::default(),
            search: SearchConfig::default(),
            ingest: IngestConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Redis connection string
    #[serde(default = "default_cache_url")]
    pub url: String,

    /// Default TTL for arbitrary dataset entries (seconds)
    #[serde(default = "default_dataset_ttl")]
    pub default_ttl_secs: u64,

    /// Default key prefix for arbitrary dataset entries
    #[serde(default = "default_dataset_prefix")]
    pub default_prefix: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            url: default_cache_url(),
            default_ttl_secs: default_dataset_ttl(),
            default_prefix: default_dataset_prefix(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// TTL for cached search responses (seconds)
    #[serde(default = "default_result_ttl")]
    pub result_ttl_secs: u64,

    /// TTL for cached suggestion lists (seconds)
    #[serde(default = "default_suggestion_ttl")]
    pub suggestion_ttl_secs: u64,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            result_ttl_secs: default_result_ttl(),
            suggestion_ttl_secs: default_suggestion_ttl(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Number of upsert operations accumulated before a bulk write
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    /// Maximum number of concurrently outstanding bulk writes
    #[serde(default = "default_max_inflight")]
    pub max_inflight_writes: usize,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            batch_size: default_batch_size(),
            max_inflight_writes: default_max_inflight(),
        }
    }
}

fn default_cache_url() -> String {
    "redis://127.0.0.1:6379".to_string()
}

fn default_dataset_ttl() -> u64 {
    3600
}

fn default_dataset_prefix() -> String {
    "dataset".to_string()
}

fn default_result_ttl() -> u64 {
    60
}

fn default_suggestion_ttl() -> u64 {
    30
}

fn default_batch_size() -> usize {
    20_000
}

fn default_max_inflight() -> usize {
    10
}
