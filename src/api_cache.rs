//! Request cache před Source Managerem (stale-while-revalidate).
//!
//! Čerstvý záznam se vrací hned. Starý se vrací taky, ale na pozadí se
//! spustí nejvýš jeden refresh. Bez záznamu se čeká na refresh; souběžní
//! volající sdílí jeden fetch přes `refresh_gate`.

use serde::Serialize;
use source_manager::{FetchStrategy, SourceLabel, SourceManager, SourceResult};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info};

struct CachedResult {
    result: SourceResult,
    stored_at: Instant,
}

impl CachedResult {
    /// `none` se ukládá jen pro čekající volající, nikdy se z cache neservíruje.
    fn servable(&self) -> bool {
        self.result.source != SourceLabel::None
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiCacheStatus {
    pub cached: bool,
    pub strategy: FetchStrategy,
    pub ttl_secs: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceLabel>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fresh: Option<bool>,
    pub refreshing: bool,
    pub refreshes: u64,
}

pub struct MatchesCache {
    manager: Arc<SourceManager>,
    strategy: FetchStrategy,
    ttl: Duration,
    entry: RwLock<Option<CachedResult>>,
    refresh_gate: Arc<Mutex<()>>,
    /// Počet dokončených refreshů.
    refreshes: AtomicU64,
}

impl MatchesCache {
    pub fn new(manager: Arc<SourceManager>, strategy: FetchStrategy, ttl: Duration) -> Self {
        Self {
            manager,
            strategy,
            ttl,
            entry: RwLock::new(None),
            refresh_gate: Arc::new(Mutex::new(())),
            refreshes: AtomicU64::new(0),
        }
    }

    pub fn strategy(&self) -> FetchStrategy {
        self.strategy
    }

    pub async fn get(self: &Arc<Self>) -> SourceResult {
        let seen = self.refreshes.load(Ordering::SeqCst);

        let cached = self
            .entry
            .read()
            .await
            .as_ref()
            .filter(|c| c.servable())
            .map(|c| (c.result.clone(), c.stored_at.elapsed() < self.ttl));

        if let Some((result, fresh)) = cached {
            if !fresh {
                debug!("API cache stale, serving old result and revalidating");
                self.spawn_refresh();
            }
            return result;
        }

        let _gate = self.refresh_gate.lock().await;
        // Mezitím doběhl refresh někoho jiného → použij jeho výsledek
        if self.refreshes.load(Ordering::SeqCst) != seen {
            if let Some(c) = self.entry.read().await.as_ref() {
                return c.result.clone();
            }
        }
        self.refresh_locked().await
    }

    pub async fn clear(&self) {
        *self.entry.write().await = None;
        info!("API cache cleared");
    }

    pub async fn status(&self) -> ApiCacheStatus {
        let entry = self.entry.read().await;
        let servable = entry.as_ref().filter(|c| c.servable());
        ApiCacheStatus {
            cached: servable.is_some(),
            strategy: self.strategy,
            ttl_secs: self.ttl.as_secs(),
            age_ms: servable.map(|c| c.stored_at.elapsed().as_millis() as u64),
            count: servable.map(|c| c.result.matches.len()),
            source: servable.map(|c| c.result.source),
            fresh: servable.map(|c| c.stored_at.elapsed() < self.ttl),
            refreshing: self.refresh_gate.try_lock().is_err(),
            refreshes: self.refreshes.load(Ordering::SeqCst),
        }
    }

    /// Fire-and-forget; no-op když už refresh běží.
    fn spawn_refresh(self: &Arc<Self>) {
        let Ok(gate) = Arc::clone(&self.refresh_gate).try_lock_owned() else {
            debug!("API cache refresh already in flight");
            return;
        };
        let this = Arc::clone(self);
        tokio::spawn(async move {
            let _gate = gate;
            this.refresh_locked().await;
        });
    }

    /// Volat jen s drženým `refresh_gate`.
    async fn refresh_locked(&self) -> SourceResult {
        let started = Instant::now();
        let result = self.manager.fetch(self.strategy).await;
        info!(
            "API cache refreshed: {} matches from {} in {}ms",
            result.matches.len(),
            result.source,
            started.elapsed().as_millis()
        );

        *self.entry.write().await = Some(CachedResult { result: result.clone(), stored_at: Instant::now() });
        self.refreshes.fetch_add(1, Ordering::SeqCst);
        result
    }
}
