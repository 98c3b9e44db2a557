/// MatchHub Live — Source Manager
///
/// Spojuje primární a fallback zdroj do jednoho seznamu zápasů:
///   1. primární zdroj (rychlý, spolehlivý)
///   2. fallback zdroj, jen když primární nic nedal
///   3. poslední úspěšný výsledek z cache (libovolně starý)
///   4. prázdný výsledek s chybou
///
/// Chyby adapterů se nikdy nepropagují ven, vše je zakódováno v `SourceResult`.

use chrono::{DateTime, Utc};
use logger::{now_iso, EventLogger, FetchResultEvent, SourceAttemptEvent};
use match_sources::{FilteredMatch, MatchSource, TeamFilter};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

pub mod dedup;

pub use dedup::{are_similar, deduplicate};

pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(300);
pub const CACHE_FALLBACK_ERROR: &str = "All sources unavailable, using cached data";
pub const NO_SOURCES_ERROR: &str = "All match sources are currently unavailable";

/// Which rung of the failover ladder produced a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceLabel {
    Primary,
    Fallback,
    Cache,
    None,
}

impl SourceLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceLabel::Primary => "primary",
            SourceLabel::Fallback => "fallback",
            SourceLabel::Cache => "cache",
            SourceLabel::None => "none",
        }
    }
}

impl fmt::Display for SourceLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FetchStrategy {
    /// Primary, then fallback, then cache.
    Sequential,
    /// Both sources at once, merged and deduplicated.
    Multi,
}

impl FetchStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            FetchStrategy::Sequential => "sequential",
            FetchStrategy::Multi => "multi",
        }
    }
}

impl FromStr for FetchStrategy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "sequential" | "failover" => Ok(FetchStrategy::Sequential),
            "multi" | "multi-source" | "multisource" => Ok(FetchStrategy::Multi),
            other => anyhow::bail!("unknown fetch strategy {other:?} (expected sequential|multi)"),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceResult {
    pub matches: Vec<FilteredMatch>,
    pub source: SourceLabel,
    /// Adapter name(s) behind a primary/fallback result.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    /// Unix millis.
    pub timestamp: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SourceResult {
    fn live(matches: Vec<FilteredMatch>, source: SourceLabel, provider: String) -> Self {
        Self {
            matches,
            source,
            provider: Some(provider),
            timestamp: Utc::now().timestamp_millis(),
            error: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStatus {
    pub cached: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age_ms: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    /// Informational only, stale entries are still served as last resort.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fresh: Option<bool>,
}

struct CacheEntry {
    matches: Vec<FilteredMatch>,
    stored_at: DateTime<Utc>,
}

pub struct SourceManager {
    primary: Arc<dyn MatchSource>,
    fallback: Arc<dyn MatchSource>,
    filter: TeamFilter,
    cache_ttl: Duration,
    cache: RwLock<Option<CacheEntry>>,
    events: Option<EventLogger>,
}

impl SourceManager {
    pub fn new(primary: Arc<dyn MatchSource>, fallback: Arc<dyn MatchSource>, filter: TeamFilter) -> Self {
        Self {
            primary,
            fallback,
            filter,
            cache_ttl: DEFAULT_CACHE_TTL,
            cache: RwLock::new(None),
            events: None,
        }
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    pub fn with_event_logger(mut self, events: EventLogger) -> Self {
        self.events = Some(events);
        self
    }

    pub fn primary_name(&self) -> &str {
        self.primary.name()
    }

    pub fn fallback_name(&self) -> &str {
        self.fallback.name()
    }

    pub async fn fetch(&self, strategy: FetchStrategy) -> SourceResult {
        match strategy {
            FetchStrategy::Sequential => self.fetch_matches().await,
            FetchStrategy::Multi => self.fetch_matches_multi_source().await,
        }
    }

    /// Sequential failover: primary, fallback, cache, nothing.
    pub async fn fetch_matches(&self) -> SourceResult {
        const STRATEGY: &str = "sequential";

        for (label, source) in [(SourceLabel::Primary, &self.primary), (SourceLabel::Fallback, &self.fallback)] {
            info!("Attempting {} ({} source)...", source.name(), label);
            if let Some(matches) = self.try_source(source.as_ref(), STRATEGY).await {
                info!("✓ {}: {} matches", source.name(), matches.len());
                self.update_cache(matches.clone()).await;
                let result = SourceResult::live(matches, label, source.name().to_string());
                self.log_result(STRATEGY, &result);
                return result;
            }
        }

        let result = self.cached_or_none().await;
        self.log_result(STRATEGY, &result);
        result
    }

    /// Both sources concurrently; union deduplicated. Falls back to
    /// `fetch_matches()` when neither contributes anything.
    pub async fn fetch_matches_multi_source(&self) -> SourceResult {
        const STRATEGY: &str = "multi";

        let (from_primary, from_fallback) = tokio::join!(
            self.collect_filtered(self.primary.as_ref(), STRATEGY),
            self.collect_filtered(self.fallback.as_ref(), STRATEGY),
        );

        let mut providers = Vec::new();
        let mut all = Vec::with_capacity(from_primary.len() + from_fallback.len());
        if !from_primary.is_empty() {
            providers.push(self.primary.name());
            all.extend(from_primary);
        }
        let primary_contributed = !providers.is_empty();
        if !from_fallback.is_empty() {
            providers.push(self.fallback.name());
            all.extend(from_fallback);
        }

        if all.is_empty() {
            info!("Multi-source: nothing from either source, using sequential failover");
            return self.fetch_matches().await;
        }

        let total = all.len();
        let unique = deduplicate(all);
        info!(
            "Multi-source: {} unique matches ({} before dedup) from {}",
            unique.len(),
            total,
            providers.join(", ")
        );

        self.update_cache(unique.clone()).await;
        let label = if primary_contributed { SourceLabel::Primary } else { SourceLabel::Fallback };
        let result = SourceResult::live(unique, label, providers.join("+"));
        self.log_result(STRATEGY, &result);
        result
    }

    pub async fn clear_cache(&self) {
        *self.cache.write().await = None;
        info!("Source manager cache cleared");
    }

    pub async fn cache_status(&self) -> CacheStatus {
        match self.cache.read().await.as_ref() {
            None => CacheStatus { cached: false, age_ms: None, count: None, fresh: None },
            Some(entry) => {
                let age_ms = age_ms(entry.stored_at);
                CacheStatus {
                    cached: true,
                    age_ms: Some(age_ms),
                    count: Some(entry.matches.len()),
                    fresh: Some(self.is_fresh(age_ms)),
                }
            }
        }
    }

    /// `Some` only when the source returned at least one raw match.
    async fn try_source(&self, source: &dyn MatchSource, strategy: &'static str) -> Option<Vec<FilteredMatch>> {
        match source.fetch_matches().await {
            Ok(raw) if !raw.is_empty() => {
                let filtered = self.filter.filter(raw);
                self.log_attempt(source.name(), strategy, true, filtered.len(), "ok");
                Some(filtered)
            }
            Ok(_) => {
                warn!("{} returned no matches", source.name());
                self.log_attempt(source.name(), strategy, true, 0, "empty");
                None
            }
            Err(e) => {
                warn!("{} failed: {:#}", source.name(), e);
                self.log_attempt(source.name(), strategy, false, 0, &format!("{e:#}"));
                None
            }
        }
    }

    async fn collect_filtered(&self, source: &dyn MatchSource, strategy: &'static str) -> Vec<FilteredMatch> {
        self.try_source(source, strategy).await.unwrap_or_default()
    }

    async fn cached_or_none(&self) -> SourceResult {
        if let Some(entry) = self.cache.read().await.as_ref() {
            let age_ms = age_ms(entry.stored_at);
            if self.is_fresh(age_ms) {
                warn!("All sources failed, using cached data (age: {}s)", age_ms / 1000);
            } else {
                warn!("All sources failed, using STALE cached data (age: {}s)", age_ms / 1000);
            }
            return SourceResult {
                matches: entry.matches.clone(),
                source: SourceLabel::Cache,
                provider: None,
                timestamp: entry.stored_at.timestamp_millis(),
                error: Some(CACHE_FALLBACK_ERROR.to_string()),
            };
        }

        error!("All sources failed and no cache available");
        SourceResult {
            matches: vec![],
            source: SourceLabel::None,
            provider: None,
            timestamp: Utc::now().timestamp_millis(),
            error: Some(NO_SOURCES_ERROR.to_string()),
        }
    }

    async fn update_cache(&self, matches: Vec<FilteredMatch>) {
        *self.cache.write().await = Some(CacheEntry { matches, stored_at: Utc::now() });
    }

    fn is_fresh(&self, age_ms: i64) -> bool {
        age_ms < self.cache_ttl.as_millis() as i64
    }

    fn log_attempt(&self, source: &str, strategy: &'static str, ok: bool, matches: usize, message: &str) {
        let Some(events) = &self.events else { return };
        let _ = events.log(&SourceAttemptEvent {
            ts: now_iso(),
            event: "SOURCE_ATTEMPT",
            source: source.to_string(),
            strategy,
            ok,
            matches,
            message: message.to_string(),
        });
    }

    fn log_result(&self, strategy: &'static str, result: &SourceResult) {
        let Some(events) = &self.events else { return };
        let _ = events.log(&FetchResultEvent {
            ts: now_iso(),
            event: "FETCH_RESULT",
            strategy,
            label: result.source.to_string(),
            provider: result.provider.clone(),
            matches: result.matches.len(),
            error: result.error.clone(),
        });
    }
}

fn age_ms(stored_at: DateTime<Utc>) -> i64 {
    Utc::now().signed_duration_since(stored_at).num_milliseconds().max(0)
}
