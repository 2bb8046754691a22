use anyhow::{Context, Result};
use serde::Deserialize;

use crate::error::RouteError;

/// Which distance source backs the service.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Haversine,
    #[serde(alias = "ors")]
    OpenRouteService,
    Google,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Haversine => "haversine",
            ProviderKind::OpenRouteService => "openrouteservice",
            ProviderKind::Google => "google",
        }
    }
}

/// How sanitized points are split into independently solved groups.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PartitionStrategy {
    /// Everything is solved as a single group.
    None,
    /// Consecutive runs of at most `cluster_size` points.
    Chunk,
    /// Seeded k-means over raw coordinates.
    Kmeans,
}

impl PartitionStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            PartitionStrategy::None => "none",
            PartitionStrategy::Chunk => "chunk",
            PartitionStrategy::Kmeans => "kmeans",
        }
    }
}

/// Shape of every per-group route.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RouteMode {
    /// Returns to the start; the start index is repeated at the end.
    #[serde(alias = "closed-tour")]
    Closed,
    /// Ends at whichever stop is visited last.
    #[serde(alias = "open-path")]
    Open,
}

/// Treatment of original indices that appear more than once in the stitched route.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DedupPolicy {
    /// Keep only the first occurrence of each original index.
    First,
    /// Keep every index exactly as the solver returned it.
    Verbatim,
}

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default = "default_distance_provider")]
    pub distance_provider: ProviderKind,
    #[serde(default)]
    pub ors_api_key: Option<String>,
    #[serde(default = "default_ors_base_url")]
    pub ors_base_url: String,
    #[serde(default = "default_ors_profile")]
    pub ors_profile: String,
    #[serde(default)]
    pub google_maps_api_key: Option<String>,
    #[serde(default = "default_google_base_url")]
    pub google_base_url: String,
    #[serde(default = "default_provider_timeout_secs")]
    pub provider_timeout_secs: u64,

    #[serde(default = "default_partition_strategy")]
    pub partition_strategy: PartitionStrategy,
    #[serde(default = "default_cluster_size")]
    pub cluster_size: usize,
    #[serde(default = "default_kmeans_k")]
    pub kmeans_k: usize,
    #[serde(default = "default_kmeans_seed")]
    pub kmeans_seed: u64,
    #[serde(default = "default_true")]
    pub order_by_centroid: bool,

    #[serde(default = "default_route_mode")]
    pub route_mode: RouteMode,
    #[serde(default = "default_dedup_policy")]
    pub dedup_policy: DedupPolicy,
    #[serde(default)]
    pub parallel_groups: bool,
    #[serde(default = "default_solver_max_time_secs")]
    pub solver_max_time_secs: usize,
    #[serde(default = "default_solver_max_generations")]
    pub solver_max_generations: usize,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_distance_provider() -> ProviderKind {
    ProviderKind::Haversine
}

fn default_ors_base_url() -> String {
    "https://api.openrouteservice.org".to_string()
}

fn default_ors_profile() -> String {
    "driving-car".to_string()
}

fn default_google_base_url() -> String {
    "https://maps.googleapis.com".to_string()
}

fn default_provider_timeout_secs() -> u64 {
    30
}

fn default_partition_strategy() -> PartitionStrategy {
    PartitionStrategy::None
}

fn default_cluster_size() -> usize {
    50
}

fn default_kmeans_k() -> usize {
    4
}

fn default_kmeans_seed() -> u64 {
    42
}

fn default_true() -> bool {
    true
}

fn default_route_mode() -> RouteMode {
    RouteMode::Closed
}

fn default_dedup_policy() -> DedupPolicy {
    DedupPolicy::First
}

fn default_solver_max_time_secs() -> usize {
    5
}

fn default_solver_max_generations() -> usize {
    200
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            log_level: default_log_level(),
            distance_provider: default_distance_provider(),
            ors_api_key: None,
            ors_base_url: default_ors_base_url(),
            ors_profile: default_ors_profile(),
            google_maps_api_key: None,
            google_base_url: default_google_base_url(),
            provider_timeout_secs: default_provider_timeout_secs(),
            partition_strategy: default_partition_strategy(),
            cluster_size: default_cluster_size(),
            kmeans_k: default_kmeans_k(),
            kmeans_seed: default_kmeans_seed(),
            order_by_centroid: true,
            route_mode: default_route_mode(),
            dedup_policy: default_dedup_policy(),
            parallel_groups: false,
            solver_max_time_secs: default_solver_max_time_secs(),
            solver_max_generations: default_solver_max_generations(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();
        // Parse environment variables into the Config struct
        let config: Config = envy::from_env().context("Failed to load config from environment")?;
        config.validate()?;
        Ok(config)
    }

    /// Same as [`Config::from_env`] but reads from an explicit list of `(NAME, value)` pairs.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let pairs = pairs.into_iter().map(|(k, v)| (k.into(), v.into()));
        let config: Config = envy::from_iter(pairs).context("Failed to parse config")?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects settings that would only fail later, per request.
    pub fn validate(&self) -> std::result::Result<(), RouteError> {
        if self.cluster_size == 0 {
            return Err(RouteError::config("CLUSTER_SIZE must be at least 1"));
        }
        if self.kmeans_k == 0 {
            return Err(RouteError::config("KMEANS_K must be at least 1"));
        }
        if self.solver_max_time_secs == 0 {
            return Err(RouteError::config("SOLVER_MAX_TIME_SECS must be at least 1"));
        }
        match self.distance_provider {
            ProviderKind::OpenRouteService if is_blank(&self.ors_api_key) => {
                Err(RouteError::config("ORS_API_KEY is required for the openrouteservice provider"))
            }
            ProviderKind::Google if is_blank(&self.google_maps_api_key) => {
                Err(RouteError::config("GOOGLE_MAPS_API_KEY is required for the google provider"))
            }
            _ => Ok(()),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, |v| v.trim().is_empty())
}
