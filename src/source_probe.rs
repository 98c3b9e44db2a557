//! Ruční sonda zdrojů: každý adapter jednou, katalog kanálů, pak obě strategie Source Manageru.
//! Spustit: cargo run --bin source-probe

use anyhow::Result;
use dotenv::dotenv;
use match_sources::{ChannelCatalog, DaddyLiveSource, Match, MatchSource, TotalSportekSource};
use matchhub_live::config::HubConfig;
use source_manager::{FetchStrategy, SourceManager};
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

const SHOW_FIRST: usize = 5;

fn describe(m: &Match) -> String {
    format!(
        "{} {} vs {} [{}] links={} id={}",
        m.time.display(),
        m.home_team,
        m.away_team,
        m.competition,
        m.links.len(),
        m.id
    )
}

async fn probe(source: &dyn MatchSource) {
    let started = Instant::now();
    match source.fetch_matches().await {
        Ok(matches) => {
            info!("✓ {}: {} matches in {}ms", source.name(), matches.len(), started.elapsed().as_millis());
            for m in matches.iter().take(SHOW_FIRST) {
                info!("  {}", describe(m));
            }
        }
        Err(e) => warn!("✗ {} failed after {}ms: {:#}", source.name(), started.elapsed().as_millis(), e),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();

    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = HubConfig::from_env()?;

    let daddylive = Arc::new(DaddyLiveSource::new(config.daddylive())?);
    let primary: Arc<dyn MatchSource> = daddylive.clone();
    let fallback: Arc<dyn MatchSource> =
        Arc::new(TotalSportekSource::new(config.totalsportek_base_url.clone(), config.http_timeout)?);

    // 1) Adaptery samostatně, bez filtru
    info!("🩺 Probing adapters...");
    probe(primary.as_ref()).await;
    probe(fallback.as_ref()).await;

    let started = Instant::now();
    match daddylive.fetch_channels().await {
        Ok(channels) => {
            info!("✓ channels: {} in {}ms", channels.len(), started.elapsed().as_millis());
            for c in channels.iter().take(SHOW_FIRST) {
                info!("  #{} {} [{}]", c.id, c.name, c.category);
            }
        }
        Err(e) => warn!("✗ channels failed: {:#}", e),
    }

    // 2) Obě strategie; adaptery mají vlastní krátkou cache, takže tohle už jde rychle
    let manager = SourceManager::new(primary, fallback, config.team_filter())
        .with_cache_ttl(config.source_cache_ttl);

    for strategy in [FetchStrategy::Sequential, FetchStrategy::Multi] {
        let started = Instant::now();
        let result = manager.fetch(strategy).await;
        info!(
            "{}: source={} provider={} matches={} error={} ({}ms)",
            strategy.as_str(),
            result.source,
            result.provider.as_deref().unwrap_or("-"),
            result.matches.len(),
            result.error.as_deref().unwrap_or("-"),
            started.elapsed().as_millis()
        );
        for m in result.matches.iter().take(SHOW_FIRST) {
            info!("  {}", describe(m));
        }
    }

    info!("Probe completed.");
    Ok(())
}
