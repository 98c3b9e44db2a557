//! DaddyLive — JSON schedule API (primární zdroj)
//!
//! Doména se často mění, proto se aktivní doména zjišťuje přes redirect ze
//! seed URL a drží se 5 minut. Schedule:
//!   GET https://<domain>/schedule/schedule-generated.json
//!
//! Tvar:
//! { "Saturday 01st Nov 2025 - Schedule Time UK GMT": {
//!     "Soccer</span>": [ { "time": "15:00", "event": "England - Premier League : Arsenal vs Chelsea",
//!                          "channels": [ { "channel_name": "Sky Sports Main Event", "channel_id": "35" } ],
//!                          "channels2": [] } ] } }

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::channels::{parse_channels, Channel, ChannelCatalog};
use crate::kickoff::KickOff;
use crate::model::{Match, StreamLink};
use crate::text::{clean_text, slugify, split_fixture};
use crate::{MatchSource, USER_AGENTS};

pub const SOURCE_NAME: &str = "daddylive";
pub const DEFAULT_SEED_URL: &str = "https://daddylive.sx/";
pub const DEFAULT_FALLBACK_DOMAIN: &str = "https://daddyhd.com/";

const SCHEDULE_PATH: &str = "schedule/schedule-generated.json";
const CHANNELS_PATH: &str = "24-7-channels.php";

pub const DEFAULT_SCHEDULE_TTL: Duration = Duration::from_secs(60);
pub const DEFAULT_DOMAIN_TTL: Duration = Duration::from_secs(300);
/// Kanály se mění zřídka.
pub const DEFAULT_CHANNELS_TTL: Duration = Duration::from_secs(3600);

#[derive(Debug, Clone)]
pub struct DaddyLiveConfig {
    pub seed_url: String,
    pub fallback_domain: String,
    pub timeout: Duration,
    pub schedule_ttl: Duration,
    pub domain_ttl: Duration,
    pub channels_ttl: Duration,
}

impl Default for DaddyLiveConfig {
    fn default() -> Self {
        Self {
            seed_url: DEFAULT_SEED_URL.to_string(),
            fallback_domain: DEFAULT_FALLBACK_DOMAIN.to_string(),
            timeout: Duration::from_secs(15),
            schedule_ttl: DEFAULT_SCHEDULE_TTL,
            domain_ttl: DEFAULT_DOMAIN_TTL,
            channels_ttl: DEFAULT_CHANNELS_TTL,
        }
    }
}

pub struct DaddyLiveSource {
    client: reqwest::Client,
    config: DaddyLiveConfig,
    domain: Mutex<Option<(String, Instant)>>,
    schedule: Mutex<Option<(Vec<Match>, Instant)>>,
    channels: Mutex<Option<(Vec<Channel>, Instant)>>,
}

impl DaddyLiveSource {
    pub fn new(config: DaddyLiveConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENTS[0])
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()
            .context("Failed to build DaddyLive HTTP client")?;

        Ok(Self {
            client,
            config,
            domain: Mutex::new(None),
            schedule: Mutex::new(None),
            channels: Mutex::new(None),
        })
    }

    /// Follows redirects from the seed URL; falls back to the known domain.
    async fn resolve_domain(&self) -> String {
        let mut slot = self.domain.lock().await;
        if let Some((domain, at)) = slot.as_ref() {
            if at.elapsed() < self.config.domain_ttl {
                return domain.clone();
            }
        }

        let resolved = match self.client.get(&self.config.seed_url).send().await {
            Ok(resp) => {
                let url = resp.url();
                match (url.host_str(), url.port()) {
                    (Some(host), Some(port)) => format!("{}://{}:{}/", url.scheme(), host, port),
                    (Some(host), None) => format!("{}://{}/", url.scheme(), host),
                    (None, _) => self.config.fallback_domain.clone(),
                }
            }
            Err(e) => {
                warn!("DaddyLive domain resolution failed: {}", e);
                self.config.fallback_domain.clone()
            }
        };

        info!("DaddyLive active domain: {}", resolved);
        *slot = Some((resolved.clone(), Instant::now()));
        resolved
    }

    async fn fetch_schedule(&self) -> Result<Vec<Match>> {
        let domain = self.resolve_domain().await;
        let url = format!("{domain}{SCHEDULE_PATH}");
        debug!("Fetching DaddyLive schedule from {}", url);

        let resp = self
            .client
            .get(&url)
            .header("Referer", &domain)
            .header("Accept", "application/json, text/plain, */*")
            .header("Accept-Language", "en-US,en;q=0.5")
            .send()
            .await
            .context("DaddyLive schedule request failed")?;

        let status = resp.status();
        if !status.is_success() {
            bail!("DaddyLive HTTP {}", status);
        }

        let raw = resp.text().await?;
        let parsed: Value = serde_json::from_str(&raw).context("DaddyLive schedule is not JSON")?;
        Ok(parse_schedule(&parsed, Utc::now()))
    }

    async fn fetch_channel_page(&self) -> Result<Vec<Channel>> {
        let domain = self.resolve_domain().await;
        let url = format!("{domain}{CHANNELS_PATH}");
        debug!("Fetching DaddyLive 24/7 channels from {}", url);

        let resp = self
            .client
            .get(&url)
            .header("Referer", &domain)
            .header("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8")
            .header("Accept-Language", "en-US,en;q=0.5")
            .send()
            .await
            .context("DaddyLive channels request failed")?;

        let status = resp.status();
        if !status.is_success() {
            bail!("DaddyLive channels HTTP {}", status);
        }

        parse_channels(&resp.text().await?)
    }
}

#[async_trait]
impl ChannelCatalog for DaddyLiveSource {
    async fn fetch_channels(&self) -> Result<Vec<Channel>> {
        if let Some((channels, at)) = self.channels.lock().await.as_ref() {
            if at.elapsed() < self.config.channels_ttl {
                debug!("DaddyLive: returning {} cached channels", channels.len());
                return Ok(channels.clone());
            }
        }

        match self.fetch_channel_page().await {
            Ok(channels) => {
                info!("DaddyLive: {} 24/7 channels", channels.len());
                *self.channels.lock().await = Some((channels.clone(), Instant::now()));
                Ok(channels)
            }
            Err(e) => match self.channels.lock().await.as_ref() {
                Some((stale, _)) => {
                    warn!("DaddyLive channels failed ({}), serving {} stale", e, stale.len());
                    Ok(stale.clone())
                }
                None => Err(e),
            },
        }
    }
}

#[async_trait]
impl MatchSource for DaddyLiveSource {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    async fn fetch_matches(&self) -> Result<Vec<Match>> {
        if let Some((matches, at)) = self.schedule.lock().await.as_ref() {
            if at.elapsed() < self.config.schedule_ttl {
                debug!("DaddyLive: returning {} cached matches", matches.len());
                return Ok(matches.clone());
            }
        }

        match self.fetch_schedule().await {
            Ok(matches) => {
                info!("DaddyLive: {} soccer matches", matches.len());
                *self.schedule.lock().await = Some((matches.clone(), Instant::now()));
                Ok(matches)
            }
            Err(e) => match self.schedule.lock().await.as_ref() {
                Some((stale, _)) => {
                    warn!("DaddyLive fetch failed ({}), serving {} stale matches", e, stale.len());
                    Ok(stale.clone())
                }
                None => Err(e),
            },
        }
    }
}

fn team_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            r"(?i)^(.+?)\s+vs\.?\s+(.+?)$",
            r"(?i)^(.+?)\s+v\s+(.+?)$",
            r"(?i)^(.+?)\s+@\s+(.+?)$",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("static team pattern"))
        .collect()
    })
}

/// "League - Cup : Home vs Away" -> (competition, home, away). Last " : " splits.
fn parse_event_title(title: &str) -> Option<(String, String, String)> {
    let (competition, fixture) = match title.rfind(" : ") {
        Some(idx) => (title[..idx].trim(), title[idx + 3..].trim()),
        None => ("Football", title.trim()),
    };
    let (home, away) = split_fixture(fixture, team_patterns())?;
    let competition = if competition.is_empty() { "Football" } else { competition };
    Some((clean_text(competition), home, away))
}

/// `channels` comes either as an array or as an object keyed by channel id.
fn channel_links(raw: Option<&Value>) -> Vec<StreamLink> {
    let entries: Vec<&Value> = match raw {
        Some(Value::Array(items)) => items.iter().collect(),
        Some(Value::Object(map)) => map.values().collect(),
        _ => return vec![],
    };

    entries
        .into_iter()
        .filter_map(|ch| {
            let id = match ch.get("channel_id")? {
                Value::String(s) => s.trim().to_string(),
                Value::Number(n) => n.to_string(),
                _ => return None,
            };
            if id.is_empty() {
                return None;
            }
            let name = ch
                .get("channel_name")
                .and_then(Value::as_str)
                .map(clean_text)
                .unwrap_or_else(|| "Unknown".to_string());
            Some(StreamLink::hd_stream(id, name))
        })
        .collect()
}

/// "Soccer</span>", "Football" yes; "Am. Football</span>", "American Football" no.
fn is_soccer_category(category: &str) -> bool {
    let lower = category.to_lowercase();
    if lower.contains("soccer") {
        return true;
    }
    lower.contains("football") && !lower.contains("am.") && !lower.contains("american")
}

/// Pure parser over the schedule document, `now` anchors clock times.
pub fn parse_schedule(schedule: &Value, now: DateTime<Utc>) -> Vec<Match> {
    let Some(days) = schedule.as_object() else {
        warn!("DaddyLive schedule root is not an object");
        return vec![];
    };

    let mut matches = Vec::new();
    for (day, categories) in days {
        let Some(categories) = categories.as_object() else { continue };

        for (category, events) in categories {
            if !is_soccer_category(category) {
                continue;
            }
            let Some(events) = events.as_array() else { continue };
            debug!("DaddyLive: {} events in {} / {}", events.len(), day, category);

            for event in events {
                let title = event.get("event").and_then(Value::as_str).unwrap_or("").trim();
                if title.is_empty() || title.contains("Simulcast") {
                    continue;
                }

                let mut links = channel_links(event.get("channels"));
                links.extend(channel_links(event.get("channels2")));
                if links.is_empty() {
                    continue;
                }

                let Some((competition, home_team, away_team)) = parse_event_title(title) else {
                    debug!("DaddyLive: cannot parse teams from {:?}", title);
                    continue;
                };

                let raw_time = event.get("time").and_then(Value::as_str).unwrap_or("TBD").trim();
                let time = KickOff::parse(raw_time, now);

                matches.push(Match {
                    id: format!("{SOURCE_NAME}-{}-{}", slugify(title), slugify(raw_time)),
                    home_team,
                    away_team,
                    time,
                    date: time.scheduled_at(),
                    competition,
                    links,
                    source: SOURCE_NAME.to_string(),
                });
            }
        }
    }
    matches
}
