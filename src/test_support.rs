//! Mock adaptery pro testy cache a HTTP vrstvy.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{Duration as ChronoDuration, Utc};
use match_sources::{Channel, ChannelCatalog, KickOff, Match, MatchSource, StreamLink, TeamFilter};
use source_manager::SourceManager;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub struct CountingSource {
    name: &'static str,
    matches: Mutex<Option<Vec<Match>>>,
    delay: Duration,
    calls: AtomicUsize,
}

impl CountingSource {
    /// `None` = adapter hází chybu.
    pub fn new(name: &'static str, matches: Option<Vec<Match>>) -> Arc<Self> {
        Self::slow(name, matches, Duration::ZERO)
    }

    pub fn slow(name: &'static str, matches: Option<Vec<Match>>, delay: Duration) -> Arc<Self> {
        Arc::new(Self { name, matches: Mutex::new(matches), delay, calls: AtomicUsize::new(0) })
    }

    pub fn set(&self, matches: Option<Vec<Match>>) {
        *self.matches.lock().unwrap() = matches;
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MatchSource for CountingSource {
    fn name(&self) -> &str {
        self.name
    }

    async fn fetch_matches(&self) -> Result<Vec<Match>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.matches.lock().unwrap().clone().ok_or_else(|| anyhow!("upstream down"))
    }
}

/// Pevný katalog kanálů; `None` = fetch selže.
pub struct StaticCatalog {
    channels: Option<Vec<Channel>>,
    calls: AtomicUsize,
}

impl StaticCatalog {
    pub fn new(channels: Option<Vec<(&str, &str, &str)>>) -> Arc<Self> {
        let channels = channels.map(|list| {
            list.into_iter()
                .map(|(id, name, category)| Channel {
                    id: id.to_string(),
                    name: name.to_string(),
                    url: format!("/watch.php?id={id}"),
                    category: category.to_string(),
                })
                .collect()
        });
        Arc::new(Self { channels, calls: AtomicUsize::new(0) })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChannelCatalog for StaticCatalog {
    async fn fetch_channels(&self) -> Result<Vec<Channel>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.channels.clone().ok_or_else(|| anyhow!("channels page down"))
    }
}

/// Zápas za hodinu, aby ho `prune_and_sort` nezahodil.
pub fn upcoming(home: &str, away: &str, source: &str) -> Match {
    let kickoff = Utc::now() + ChronoDuration::hours(1);
    Match {
        id: format!("{source}-{home}-{away}").to_lowercase(),
        home_team: home.to_string(),
        away_team: away.to_string(),
        time: KickOff::Scheduled(kickoff),
        date: Some(kickoff),
        competition: "Premier League".to_string(),
        links: vec![StreamLink::hd_stream(format!("https://{source}.test/{home}"), source)],
        source: source.to_string(),
    }
}

pub fn manager(primary: &Arc<CountingSource>, fallback: &Arc<CountingSource>) -> Arc<SourceManager> {
    Arc::new(SourceManager::new(
        primary.clone(),
        fallback.clone(),
        TeamFilter::from_names(&["Arsenal", "Liverpool"]),
    ))
}
