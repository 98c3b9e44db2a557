//! Minimální HTTP/1.1 server nad `TcpListener`.
//!
//!   GET  /health           → "ok"
//!   GET  /api/matches      → SourceResult (503 když nic nemáme)
//!   GET  /api/cache        → stav obou cache
//!   POST /api/cache/clear  → vyprázdní obě cache
//!   GET  /api/channels     → 24/7 kanály, `?search=` nebo `?category=`

use anyhow::{Context, Result};
use chrono::Utc;
use match_sources::channels::{channels_in_category, search_channels};
use match_sources::{prune_and_sort, ChannelCatalog};
use serde::Serialize;
use source_manager::{CacheStatus, SourceLabel, SourceManager};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, info, warn};

use crate::api_cache::{ApiCacheStatus, MatchesCache};

pub const MATCHES_CACHE_CONTROL: &str = "s-maxage=60, stale-while-revalidate=300";
pub const CHANNELS_CACHE_CONTROL: &str = "public, s-maxage=3600, stale-while-revalidate=7200";

const KNOWN_PATHS: &[(&str, &str)] = &[
    ("/health", "GET"),
    ("/api/matches", "GET"),
    ("/api/cache", "GET"),
    ("/api/cache/clear", "POST"),
    ("/api/channels", "GET"),
];

pub struct HubState {
    pub manager: Arc<SourceManager>,
    pub cache: Arc<MatchesCache>,
    channels: Option<Arc<dyn ChannelCatalog>>,
    requests: AtomicU64,
}

impl HubState {
    pub fn new(manager: Arc<SourceManager>, cache: Arc<MatchesCache>) -> Self {
        Self { manager, cache, channels: None, requests: AtomicU64::new(0) }
    }

    pub fn with_channels(mut self, catalog: Arc<dyn ChannelCatalog>) -> Self {
        self.channels = Some(catalog);
        self
    }

    pub fn requests(&self) -> u64 {
        self.requests.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub headers: Vec<(&'static str, String)>,
    pub body: String,
}

impl HttpResponse {
    fn text(status: u16, body: &str) -> Self {
        Self {
            status,
            content_type: "text/plain; charset=utf-8",
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    fn json<T: Serialize>(status: u16, value: &T) -> Self {
        Self {
            status,
            content_type: "application/json; charset=utf-8",
            headers: Vec::new(),
            body: serde_json::to_string(value).unwrap_or_else(|_| "{}".to_string()),
        }
    }

    fn with_header(mut self, name: &'static str, value: impl Into<String>) -> Self {
        self.headers.push((name, value.into()));
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    fn reason(&self) -> &'static str {
        match self.status {
            200 => "OK",
            404 => "Not Found",
            405 => "Method Not Allowed",
            500 => "Internal Server Error",
            503 => "Service Unavailable",
            _ => "Unknown",
        }
    }

    pub fn to_wire(&self) -> String {
        let mut head = format!(
            "HTTP/1.1 {} {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n",
            self.status,
            self.reason(),
            self.content_type,
            self.body.len()
        );
        for (name, value) in &self.headers {
            head.push_str(&format!("{name}: {value}\r\n"));
        }
        head.push_str("\r\n");
        head + &self.body
    }
}

#[derive(Debug, Serialize)]
struct CacheReport {
    manager: CacheStatus,
    api: ApiCacheStatus,
}

/// `search` má přednost před `category`; prázdné hodnoty se ignorují.
fn channel_query(target: &str) -> (Option<String>, Option<String>) {
    let Ok(url) = reqwest::Url::parse(&format!("http://localhost{target}")) else {
        return (None, None);
    };
    let mut search = None;
    let mut category = None;
    for (key, value) in url.query_pairs() {
        let value = value.trim().to_string();
        if value.is_empty() {
            continue;
        }
        match key.as_ref() {
            "search" => search = Some(value),
            "category" => category = Some(value),
            _ => {}
        }
    }
    (search, category)
}

async fn channels_response(state: &HubState, target: &str) -> HttpResponse {
    let Some(catalog) = &state.channels else {
        return HttpResponse::json(503, &serde_json::json!({ "error": "Channel catalog not configured" }));
    };
    let channels = match catalog.fetch_channels().await {
        Ok(channels) => channels,
        Err(e) => {
            warn!("channels fetch failed: {:#}", e);
            return HttpResponse::json(500, &serde_json::json!({ "error": "Failed to fetch channels" }));
        }
    };

    let channels = match channel_query(target) {
        (Some(query), _) => search_channels(&channels, &query),
        (None, Some(category)) => channels_in_category(&channels, &category),
        (None, None) => channels,
    };
    HttpResponse::json(200, &channels)
        .with_header("Cache-Control", CHANNELS_CACHE_CONTROL)
        .with_header("X-Channel-Count", channels.len().to_string())
}

pub async fn route(state: &HubState, method: &str, target: &str) -> HttpResponse {
    let path = target.split('?').next().unwrap_or_default();

    match (method, path) {
        ("GET", "/health") => HttpResponse::text(200, "ok"),
        ("GET", "/api/matches") => {
            let mut result = state.cache.get().await;
            result.matches = prune_and_sort(result.matches, Utc::now());
            let status = if result.source == SourceLabel::None { 503 } else { 200 };
            let (source, count) = (result.source, result.matches.len());
            HttpResponse::json(status, &result)
                .with_header("Cache-Control", MATCHES_CACHE_CONTROL)
                .with_header("X-Match-Source", source.as_str())
                .with_header("X-Match-Count", count.to_string())
        }
        ("GET", "/api/cache") => {
            let report = CacheReport {
                manager: state.manager.cache_status().await,
                api: state.cache.status().await,
            };
            HttpResponse::json(200, &report)
        }
        ("POST", "/api/cache/clear") => {
            state.manager.clear_cache().await;
            state.cache.clear().await;
            HttpResponse::json(200, &serde_json::json!({ "ok": true, "cleared": ["manager", "api"] }))
        }
        ("GET", "/api/channels") => channels_response(state, target).await,
        (_, p) => match KNOWN_PATHS.iter().find(|(known, _)| *known == p) {
            Some((_, allowed)) => {
                HttpResponse::json(405, &serde_json::json!({ "error": "Method not allowed" }))
                    .with_header("Allow", *allowed)
            }
            None => HttpResponse::text(404, "not found"),
        },
    }
}

pub async fn handle_http_connection(mut stream: TcpStream, state: Arc<HubState>) -> Result<()> {
    let mut buf = vec![0u8; 8192];
    let n = stream.read(&mut buf).await.context("http read")?;
    if n == 0 {
        return Ok(());
    }

    let req = String::from_utf8_lossy(&buf[..n]);
    let first_line = req.lines().next().unwrap_or_default();
    let mut parts = first_line.split_whitespace();
    let method = parts.next().unwrap_or("");
    let target = parts.next().unwrap_or("");

    state.requests.fetch_add(1, Ordering::Relaxed);
    let resp = route(&state, method, target).await;
    debug!("{} {} -> {}", method, target, resp.status);

    stream.write_all(resp.to_wire().as_bytes()).await.context("http write")?;
    Ok(())
}

pub async fn serve(listener: TcpListener, state: Arc<HubState>) -> Result<()> {
    let addr = listener.local_addr().context("http local addr")?;
    info!(
        "match-hub http listening on http://{} (GET /health, /api/matches, /api/cache, /api/channels; POST /api/cache/clear)",
        addr
    );

    loop {
        let (stream, peer) = listener.accept().await.context("http accept")?;
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            if let Err(e) = handle_http_connection(stream, state).await {
                debug!("http handler err {}: {}", peer, e);
            }
        });
    }
}
