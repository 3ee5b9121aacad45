use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use crate::models::{
    ClusteringParams, NeighborIndexKind, DEFAULT_EPSILON_DEGREES, DEFAULT_MIN_POINTS,
    DEFAULT_TOP_TAGS,
};

/// Application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub server: ServerSettings,
    #[serde(default)]
    pub store: StoreSettings,
    #[serde(default)]
    pub cache: CacheSettings,
    #[serde(default)]
    pub clustering: ClusteringSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    pub workers: Option<usize>,
    pub max_payload_bytes: Option<usize>,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            workers: None,
            max_payload_bytes: None,
        }
    }
}

fn default_host() -> String { "0.0.0.0".to_string() }
fn default_port() -> u16 { 8080 }

/// Document store holding image metadata
#[derive(Debug, Clone, Deserialize)]
pub struct StoreSettings {
    #[serde(default = "default_store_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub project_id: String,
    #[serde(default = "default_database_id")]
    pub database_id: String,
    #[serde(default = "default_images_collection")]
    pub images_collection: String,
    pub page_size: Option<u32>,
    pub timeout_secs: Option<u64>,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            endpoint: default_store_endpoint(),
            api_key: String::new(),
            project_id: String::new(),
            database_id: default_database_id(),
            images_collection: default_images_collection(),
            page_size: None,
            timeout_secs: None,
        }
    }
}

fn default_store_endpoint() -> String { "http://localhost/v1".to_string() }
fn default_database_id() -> String { "photomap".to_string() }
fn default_images_collection() -> String { "images".to_string() }

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CacheSettings {
    /// Redis is optional; without it only the in-process cache is used
    pub redis_url: Option<String>,
    pub ttl_secs: Option<u64>,
    pub connection_timeout_secs: Option<u64>,
    pub l1_cache_size: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClusteringSettings {
    #[serde(default = "default_epsilon")]
    pub epsilon: f64,
    #[serde(default = "default_min_points")]
    pub min_points: usize,
    #[serde(default = "default_top_tags")]
    pub top_tags: usize,
    #[serde(default)]
    pub neighbor_index: NeighborIndexKind,
}

impl Default for ClusteringSettings {
    fn default() -> Self {
        Self {
            epsilon: default_epsilon(),
            min_points: default_min_points(),
            top_tags: default_top_tags(),
            neighbor_index: NeighborIndexKind::default(),
        }
    }
}

impl From<&ClusteringSettings> for ClusteringParams {
    fn from(settings: &ClusteringSettings) -> Self {
        Self {
            epsilon: settings.epsilon,
            min_points: settings.min_points,
            top_tags: settings.top_tags,
            neighbor_index: settings.neighbor_index,
        }
    }
}

fn default_epsilon() -> f64 { DEFAULT_EPSILON_DEGREES }
fn default_min_points() -> usize { DEFAULT_MIN_POINTS }
fn default_top_tags() -> usize { DEFAULT_TOP_TAGS }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with PHOTOMAP_)
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., PHOTOMAP__CLUSTERING__EPSILON -> clustering.epsilon
            .add_source(environment())
            .build()?;

        apply_well_known_env(settings, |key| std::env::var(key).ok())?.try_deserialize()
    }

    /// Load configuration from a custom path, with the same environment
    /// overrides as `load`
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(environment())
            .build()?;

        apply_well_known_env(settings, |key| std::env::var(key).ok())?.try_deserialize()
    }
}

fn environment() -> Environment {
    Environment::with_prefix("PHOTOMAP")
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

/// Apply unprefixed variables that deployment platforms set directly
fn apply_well_known_env<F>(settings: Config, lookup: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut builder = Config::builder().add_source(settings);

    if let Some(redis_url) = lookup("REDIS_URL") {
        builder = builder.set_override("cache.redis_url", redis_url)?;
    }
    if let Some(api_key) = lookup("STORE_API_KEY") {
        builder = builder.set_override("store.api_key", api_key)?;
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_clustering() {
        let clustering = ClusteringSettings::default();
        assert_eq!(clustering.epsilon, 0.5);
        assert_eq!(clustering.min_points, 1);
        assert_eq!(clustering.top_tags, 3);
        assert_eq!(clustering.neighbor_index, NeighborIndexKind::Linear);

        let params = ClusteringParams::from(&clustering);
        assert_eq!(params, ClusteringParams::default());
    }

    #[test]
    fn test_default_logging() {
        let level = default_log_level();
        let format = default_log_format();
        assert_eq!(level, "info");
        assert_eq!(format, "json");
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let settings: Settings = Config::builder()
            .add_source(File::from_str(
                "[clustering]\nepsilon = 2.0\nneighbor_index = \"grid\"\n\n[server]\nport = 9000\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(settings.server.port, 9000);
        assert_eq!(settings.server.host, "0.0.0.0");
        assert_eq!(settings.clustering.epsilon, 2.0);
        assert_eq!(settings.clustering.min_points, 1);
        assert_eq!(settings.clustering.neighbor_index, NeighborIndexKind::Grid);
        assert_eq!(settings.store.images_collection, "images");
        assert!(settings.cache.redis_url.is_none());
    }

    #[test]
    fn test_well_known_env_overrides_file_values() {
        let file = Config::builder()
            .add_source(File::from_str(
                "[cache]\nredis_url = \"redis://from-file:6379\"\n\n[store]\napi_key = \"file-key\"\n",
                config::FileFormat::Toml,
            ))
            .build()
            .unwrap();

        let settings: Settings = apply_well_known_env(file, |key| match key {
            "REDIS_URL" => Some("redis://from-env:6379".to_string()),
            "STORE_API_KEY" => Some("env-key".to_string()),
            _ => None,
        })
        .unwrap()
        .try_deserialize()
        .unwrap();

        assert_eq!(settings.cache.redis_url.as_deref(), Some("redis://from-env:6379"));
        assert_eq!(settings.store.api_key, "env-key");
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("photomap-{}.toml", uuid::Uuid::new_v4()));
        std::fs::write(&path, "[clustering]\nmin_points = 2\n\n[store]\npage_size = 50\n").unwrap();

        let settings = Settings::load_from(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(settings.clustering.min_points, 2);
        assert_eq!(settings.store.page_size, Some(50));
        assert_eq!(settings.clustering.epsilon, 0.5);
    }
}
