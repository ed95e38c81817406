use anyhow::Result;
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

mod api;
mod cache;
mod config;
mod db;
mod error;
mod faceit;
mod jobs;
mod matches;
mod roster;

use api::AppState;
use cache::{Cache, DistributedCache, FallbackCache, LocalCache};
use config::Config;
use db::seed::RosterSeed;
use db::Database;
use faceit::{FaceitClient, MatchProvider};
use jobs::{CleanupJob, ExpiredCacheEntries};
use matches::{MatchReconciler, ReconcileSettings};
use roster::RosterResolver;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise tracing / logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    config.validate()?;

    // Open database
    let db = Database::open(&config.database_path)?;
    info!("Database opened: {}", config.database_path);

    // Seed the roster if the database is still empty
    if let Some(path) = &config.roster_seed {
        let seeded = db.seed_roster(&RosterSeed::from_file(path)?)?;
        if seeded > 0 {
            info!("Roster seeded with {} team(s) from {}", seeded, path);
        }
    }
    let roster = RosterResolver::new(db.clone());

    // Build FACEIT client
    let faceit = FaceitClient::new(
        &config.faceit_api_url,
        config.faceit_credential(),
        config.provider_timeout(),
    )?
    .with_live_lookback(config.live_lookback);

    let provider: Option<Arc<dyn MatchProvider>> = if faceit.is_configured() {
        info!("FACEIT provider configured: {}", config.faceit_api_url);
        Some(Arc::new(faceit.clone()))
    } else {
        warn!("FACEIT_API_KEY not set, live and history views will be synthetic");
        None
    };

    let settings = ReconcileSettings {
        max_concurrent_lookups: config.max_concurrent_lookups,
        lookup_timeout: config.lookup_timeout(),
        batch_timeout: config.batch_timeout(),
        default_history_limit: config.history_limit,
    };
    let reconciler = MatchReconciler::new(roster.clone(), provider, settings);

    // Cache tiers
    let cache = match &config.redis_url {
        Some(url) => match DistributedCache::connect(url).await {
            Ok(redis) => {
                let primary: Arc<dyn Cache> = Arc::new(redis);
                FallbackCache::new(Some(primary), LocalCache::new(), config.cache_ttl())
            }
            Err(e) => {
                warn!("Redis unavailable ({}), using local cache only", e);
                FallbackCache::local_only(config.cache_ttl())
            }
        },
        None => FallbackCache::local_only(config.cache_ttl()),
    };

    // Periodic cleanup
    let mut cleanup = CleanupJob::new();
    cleanup.register(Arc::new(ExpiredCacheEntries::new(cache.local().clone())));
    info!(
        "Cleanup job scheduled every {}s with {} policy(ies)",
        config.cleanup_interval_secs,
        cleanup.policy_count()
    );
    cleanup.spawn(Duration::from_secs(config.cleanup_interval_secs));

    // Start the read API
    let app = api::router(AppState {
        roster,
        reconciler,
        cache,
        faceit,
    });
    let addr: SocketAddr = config.api_addr.parse()?;
    info!("API listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app).await?;

    Ok(())
}
