/// MatchHub Live — Match Hub
///
/// Co dělá:
///   1. Stahuje fotbalové zápasy z DaddyLive (primár) a TotalSportek (fallback)
///   2. Filtruje na cílové kluby, při výpadku servíruje poslední známá data
///   3. Vystavuje výsledek přes HTTP s request cache (stale-while-revalidate)
///   4. Katalog 24/7 kanálů z DaddyLive (/api/channels)
///   5. Audit každého pokusu do logs/*.jsonl
///
/// Spuštění:
///   MATCH_STRATEGY=multi cargo run --bin match-hub

use anyhow::{Context, Result};
use dotenv::dotenv;
use logger::{now_iso, EventLogger, HubHeartbeatEvent};
use match_sources::{ChannelCatalog, DaddyLiveSource, MatchSource, TotalSportekSource};
use matchhub_live::api_cache::MatchesCache;
use matchhub_live::config::HubConfig;
use matchhub_live::http::{serve, HubState};
use source_manager::SourceManager;
use std::env;
use std::fs::File;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::time::{sleep, Duration};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .init();

    let config = HubConfig::from_env()?;

    info!("=== MatchHub Live — match hub ===");
    info!("Strategy: {}", config.strategy.as_str());
    info!("Logs: {}", config.log_dir.display());

    // Single instance lock
    let lock_file_path = env::temp_dir().join("matchhub_live.lock");
    let lock_file = match File::create(&lock_file_path) {
        Ok(f) => f,
        Err(e) => {
            warn!("Failed to create lock file at {:?}: {}", lock_file_path, e);
            return Ok(());
        }
    };

    let mut lock = fd_lock::RwLock::new(lock_file);
    let _write_guard = match lock.try_write() {
        Ok(guard) => {
            info!("Acquired single-instance lock.");
            guard
        }
        Err(_) => {
            warn!("Another instance of match-hub is already running! Exiting.");
            return Ok(());
        }
    };

    // DaddyLive je primár i katalog kanálů, sdílí resolved doménu
    let daddylive = Arc::new(DaddyLiveSource::new(config.daddylive())?);
    let primary: Arc<dyn MatchSource> = daddylive.clone();
    let catalog: Arc<dyn ChannelCatalog> = daddylive;
    let fallback: Arc<dyn MatchSource> =
        Arc::new(TotalSportekSource::new(config.totalsportek_base_url.clone(), config.http_timeout)?);

    let filter = config.team_filter();
    info!(
        "Target clubs: {}",
        filter.clubs().iter().map(|c| c.name.as_str()).collect::<Vec<_>>().join(", ")
    );

    let events = EventLogger::new(&config.log_dir);
    let manager = Arc::new(
        SourceManager::new(primary, fallback, filter)
            .with_cache_ttl(config.source_cache_ttl)
            .with_event_logger(events.clone()),
    );
    info!("Sources: {} (primary) → {} (fallback)", manager.primary_name(), manager.fallback_name());

    let cache = Arc::new(MatchesCache::new(Arc::clone(&manager), config.strategy, config.api_cache_ttl));
    let state = Arc::new(HubState::new(manager, cache).with_channels(catalog));

    // Heartbeat summary
    {
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            loop {
                sleep(HEARTBEAT_INTERVAL).await;

                let manager = state.manager.cache_status().await;
                let api = state.cache.status().await;
                let hb = HubHeartbeatEvent {
                    ts: now_iso(),
                    event: "HUB_HEARTBEAT",
                    requests: state.requests(),
                    cached_matches: manager.count.unwrap_or(0),
                    cache_age_secs: manager.age_ms.map(|ms| (ms / 1000) as u64),
                    refreshing: api.refreshing,
                };
                let _ = events.log(&hb);
                info!(
                    "HB: requests={}, cached={}, age={:?}s, refreshing={} (see {}/*.jsonl)",
                    hb.requests,
                    hb.cached_matches,
                    hb.cache_age_secs,
                    hb.refreshing,
                    events.log_dir().display()
                );
            }
        });
    }

    let listener = TcpListener::bind(config.bind)
        .await
        .with_context(|| format!("bind {} failed", config.bind))?;
    serve(listener, state).await
}
