use serde::Deserialize;

/// Value shipped in the sample `.env`; treated the same as an absent key.
const PLACEHOLDER_API_KEY: &str = "YOUR_TMDB_API_KEY_HERE";

/// Application configuration loaded from environment variables
#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    /// TMDB API read access token (sent as a bearer token)
    #[serde(default)]
    pub tmdb_api_key: Option<String>,

    /// TMDB API base URL
    #[serde(default = "default_tmdb_api_url")]
    pub tmdb_api_url: String,

    /// Redis connection URL. Without one the cache lives in process memory.
    #[serde(default)]
    pub redis_url: Option<String>,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// How long a resolved watch-provider result stays fresh
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,

    /// How long a pass-through TMDB response stays fresh
    #[serde(default = "default_proxy_cache_ttl_secs")]
    pub proxy_cache_ttl_secs: u64,

    /// Per-request timeout for calls to TMDB
    #[serde(default = "default_upstream_timeout_secs")]
    pub upstream_timeout_secs: u64,

    /// Request header carrying the geo-IP country of the caller
    #[serde(default = "default_region_header")]
    pub region_header: String,
}

fn default_tmdb_api_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_cache_ttl_secs() -> u64 {
    86_400 // 24 hours
}

fn default_proxy_cache_ttl_secs() -> u64 {
    3_600 // 1 hour
}

fn default_upstream_timeout_secs() -> u64 {
    5
}

fn default_region_header() -> String {
    "x-vercel-ip-country".to_string()
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        envy::from_env::<Config>().map_err(|e| anyhow::anyhow!("Failed to load config: {}", e))
    }

    /// The TMDB key, if one is actually configured
    pub fn tmdb_api_key(&self) -> Option<&str> {
        self.tmdb_api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty() && *key != PLACEHOLDER_API_KEY)
    }

    pub fn cache_ttl(&self) -> anyhow::Result<chrono::Duration> {
        chrono::Duration::from_std(std::time::Duration::from_secs(self.cache_ttl_secs))
            .map_err(|e| anyhow::anyhow!("CACHE_TTL_SECS is out of range: {}", e))
    }

    pub fn proxy_cache_ttl(&self) -> anyhow::Result<chrono::Duration> {
        chrono::Duration::from_std(std::time::Duration::from_secs(self.proxy_cache_ttl_secs))
            .map_err(|e| anyhow::anyhow!("PROXY_CACHE_TTL_SECS is out of range: {}", e))
    }

    pub fn upstream_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.upstream_timeout_secs)
    }
}
