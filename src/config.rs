//! Konfigurace hubu z env proměnných (`.env` načítá `dotenv` v main).

use anyhow::{Context, Result};
use match_sources::daddylive::{DEFAULT_FALLBACK_DOMAIN, DEFAULT_SEED_URL};
use match_sources::totalsportek::DEFAULT_BASE_URL;
use match_sources::{DaddyLiveConfig, TeamFilter};
use source_manager::{FetchStrategy, DEFAULT_CACHE_TTL};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

pub const DEFAULT_BIND: &str = "0.0.0.0:8090";
pub const DEFAULT_LOG_DIR: &str = "logs";
pub const DEFAULT_API_CACHE_TTL: Duration = Duration::from_secs(60);
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(15);

#[derive(Debug, Clone)]
pub struct HubConfig {
    pub bind: SocketAddr,
    pub log_dir: PathBuf,
    pub strategy: FetchStrategy,
    pub source_cache_ttl: Duration,
    pub api_cache_ttl: Duration,
    /// Prázdné = vestavěný seznam klubů.
    pub target_clubs: Vec<String>,
    pub daddylive_seed_url: String,
    pub daddylive_fallback_domain: String,
    pub totalsportek_base_url: String,
    pub http_timeout: Duration,
}

impl HubConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let secs = |key: &str, default: Duration| {
            var(key)
                .and_then(|v| v.parse::<u64>().ok())
                .map(Duration::from_secs)
                .unwrap_or(default)
        };

        let bind_raw = var("MATCH_HUB_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind: SocketAddr = bind_raw
            .parse()
            .with_context(|| format!("Invalid MATCH_HUB_BIND {bind_raw:?}"))?;

        let strategy = match var("MATCH_STRATEGY") {
            None => FetchStrategy::Sequential,
            Some(raw) => raw.parse().unwrap_or_else(|e| {
                warn!("{e:#}, using sequential");
                FetchStrategy::Sequential
            }),
        };

        let target_clubs = var("TARGET_CLUBS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        Ok(Self {
            bind,
            log_dir: PathBuf::from(var("MATCH_HUB_LOG_DIR").unwrap_or_else(|| DEFAULT_LOG_DIR.to_string())),
            strategy,
            source_cache_ttl: secs("SOURCE_CACHE_TTL_SECS", DEFAULT_CACHE_TTL),
            api_cache_ttl: secs("API_CACHE_TTL_SECS", DEFAULT_API_CACHE_TTL),
            target_clubs,
            daddylive_seed_url: var("DADDYLIVE_SEED_URL").unwrap_or_else(|| DEFAULT_SEED_URL.to_string()),
            daddylive_fallback_domain: var("DADDYLIVE_FALLBACK_DOMAIN")
                .unwrap_or_else(|| DEFAULT_FALLBACK_DOMAIN.to_string()),
            totalsportek_base_url: var("TOTALSPORTEK_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            http_timeout: secs("SOURCE_HTTP_TIMEOUT_SECS", DEFAULT_HTTP_TIMEOUT),
        })
    }

    pub fn team_filter(&self) -> TeamFilter {
        if self.target_clubs.is_empty() {
            TeamFilter::default()
        } else {
            TeamFilter::from_names(&self.target_clubs)
        }
    }

    pub fn daddylive(&self) -> DaddyLiveConfig {
        DaddyLiveConfig {
            seed_url: self.daddylive_seed_url.clone(),
            fallback_domain: self.daddylive_fallback_domain.clone(),
            timeout: self.http_timeout,
            ..DaddyLiveConfig::default()
        }
    }
}
