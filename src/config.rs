use clap::Parser;
use std::time::Duration;

/// Live/historical match reconciliation service for registered scene teams
#[derive(Parser, Debug, Clone)]
#[command(name = "scene-match-sync", version, about)]
pub struct Config {
    /// SQLite database path (teams and players)
    #[arg(long, env = "DATABASE_PATH", default_value = "scene.db")]
    pub database_path: String,

    /// JSON roster loaded into an empty database at startup
    #[arg(long, env = "ROSTER_SEED")]
    pub roster_seed: Option<String>,

    /// FACEIT Data API base URL
    #[arg(
        long,
        env = "FACEIT_API_URL",
        default_value = "https://open.faceit.com/data/v4"
    )]
    pub faceit_api_url: String,

    /// FACEIT Data API key. Without it, aggregate match views are synthetic.
    #[arg(long, env = "FACEIT_API_KEY")]
    pub faceit_api_key: Option<String>,

    /// Redis URL for the shared cache tier. Without it, only the local tier is used.
    #[arg(long, env = "REDIS_URL")]
    pub redis_url: Option<String>,

    /// TTL for cached payloads in seconds
    #[arg(long, env = "CACHE_TTL_SECS", default_value = "300")]
    pub cache_ttl_secs: u64,

    /// Timeout for each provider call in milliseconds
    #[arg(long, env = "PROVIDER_TIMEOUT_MS", default_value = "10000")]
    pub provider_timeout_ms: u64,

    /// Default number of history entries fetched per player
    #[arg(long, env = "HISTORY_LIMIT", default_value = "10")]
    pub history_limit: u32,

    /// History entries inspected when detecting live matches
    #[arg(long, env = "LIVE_LOOKBACK", default_value = "10")]
    pub live_lookback: u32,

    /// Maximum provider lookups in flight during one reconcile
    #[arg(long, env = "MAX_CONCURRENT_LOOKUPS", default_value = "4")]
    pub max_concurrent_lookups: usize,

    /// Overall deadline for one aggregate reconcile in seconds
    #[arg(long, env = "BATCH_TIMEOUT_SECS", default_value = "120")]
    pub batch_timeout_secs: u64,

    /// Cleanup job period in seconds
    #[arg(long, env = "CLEANUP_INTERVAL_SECS", default_value = "3600")]
    pub cleanup_interval_secs: u64,

    /// Read API listen address
    #[arg(long, env = "API_ADDR", default_value = "0.0.0.0:8080")]
    pub api_addr: String,
}

pub const MAX_HISTORY_LIMIT: u32 = 20;
pub const MAX_LIVE_LOOKBACK: u32 = 10;

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.cache_ttl_secs == 0 {
            anyhow::bail!("cache_ttl_secs must be positive");
        }
        if self.provider_timeout_ms == 0 {
            anyhow::bail!("provider_timeout_ms must be positive");
        }
        if !(1..=MAX_HISTORY_LIMIT).contains(&self.history_limit) {
            anyhow::bail!("history_limit must be between 1 and {}", MAX_HISTORY_LIMIT);
        }
        if !(1..=MAX_LIVE_LOOKBACK).contains(&self.live_lookback) {
            anyhow::bail!("live_lookback must be between 1 and {}", MAX_LIVE_LOOKBACK);
        }
        if self.max_concurrent_lookups == 0 {
            anyhow::bail!("max_concurrent_lookups must be at least 1");
        }
        if self.batch_timeout_secs == 0 {
            anyhow::bail!("batch_timeout_secs must be positive");
        }
        if self.lookup_timeout() > self.batch_timeout() {
            anyhow::bail!(
                "one player lookup may take {:?} (provider timeout x (live_lookback + 1)), \
                 longer than batch_timeout_secs ({:?})",
                self.lookup_timeout(),
                self.batch_timeout()
            );
        }
        if self.cleanup_interval_secs == 0 {
            anyhow::bail!("cleanup_interval_secs must be positive");
        }
        Ok(())
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    pub fn provider_timeout(&self) -> Duration {
        Duration::from_millis(self.provider_timeout_ms)
    }

    /// Deadline for one player lookup. A live lookup is one history page
    /// plus a detail request per ongoing entry.
    pub fn lookup_timeout(&self) -> Duration {
        self.provider_timeout() * (self.live_lookback + 1)
    }

    pub fn batch_timeout(&self) -> Duration {
        Duration::from_secs(self.batch_timeout_secs)
    }

    /// The API key with blank values treated as absent.
    pub fn faceit_credential(&self) -> Option<String> {
        self.faceit_api_key
            .as_deref()
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
    }
}
