//! TotalSportek — HTML scraping (fallback zdroj)
//!
//! Stránka /soccerstreams: nadpisy lig (h2/h3) a pod nimi <ul> se zápasy.
//! Text položky: "Soccer Koln VS Hamburger SV Starts in 12hr:16min"
//! Scraping je drahý, vlastní cache 3 minuty.

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::kickoff::KickOff;
use crate::model::{Match, StreamLink};
use crate::text::{collapse_whitespace, slugify, split_fixture};
use crate::{MatchSource, USER_AGENTS};

pub const SOURCE_NAME: &str = "totalsportek";
pub const DEFAULT_BASE_URL: &str = "https://totalsportek7.com";

pub const DEFAULT_SCHEDULE_TTL: Duration = Duration::from_secs(180);

const KNOWN_LEAGUES: [&str; 13] = [
    "premier league",
    "la liga",
    "serie a",
    "bundesliga",
    "ligue 1",
    "champions league",
    "europa league",
    "championship",
    "eredivisie",
    "liga mx",
    "mls",
    "world cup",
    "euros",
];

pub struct TotalSportekSource {
    client: reqwest::Client,
    base_url: String,
    request_count: AtomicUsize,
    schedule_ttl: Duration,
    schedule: Mutex<Option<(Vec<Match>, Instant)>>,
}

impl TotalSportekSource {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert("Accept", "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8".parse()?);
        headers.insert("Accept-Language", "en-US,en;q=0.9".parse()?);
        headers.insert("Connection", "keep-alive".parse()?);
        headers.insert("Upgrade-Insecure-Requests", "1".parse()?);
        headers.insert("Cache-Control", "max-age=0".parse()?);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .gzip(true)
            .build()
            .context("Failed to build TotalSportek HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            request_count: AtomicUsize::new(0),
            schedule_ttl: DEFAULT_SCHEDULE_TTL,
            schedule: Mutex::new(None),
        })
    }

    pub fn with_schedule_ttl(mut self, ttl: Duration) -> Self {
        self.schedule_ttl = ttl;
        self
    }

    fn next_user_agent(&self) -> &'static str {
        let n = self.request_count.fetch_add(1, Ordering::Relaxed);
        USER_AGENTS[n % USER_AGENTS.len()]
    }

    async fn fetch_page(&self) -> Result<Vec<Match>> {
        let url = format!("{}/soccerstreams", self.base_url);
        let resp = self
            .client
            .get(&url)
            .header("User-Agent", self.next_user_agent())
            .send()
            .await
            .context("TotalSportek request failed")?;

        let status = resp.status();
        if !status.is_success() {
            bail!("TotalSportek HTTP {}", status);
        }

        let html = resp.text().await?;
        parse_soccerstreams(&html, &self.base_url, Utc::now())
    }
}

#[async_trait]
impl MatchSource for TotalSportekSource {
    fn name(&self) -> &str {
        SOURCE_NAME
    }

    async fn fetch_matches(&self) -> Result<Vec<Match>> {
        if let Some((matches, at)) = self.schedule.lock().await.as_ref() {
            if at.elapsed() < self.schedule_ttl {
                debug!("TotalSportek: returning {} cached matches", matches.len());
                return Ok(matches.clone());
            }
        }

        match self.fetch_page().await {
            Ok(matches) => {
                info!("TotalSportek: {} matches", matches.len());
                *self.schedule.lock().await = Some((matches.clone(), Instant::now()));
                Ok(matches)
            }
            Err(e) => match self.schedule.lock().await.as_ref() {
                Some((stale, _)) => {
                    warn!("TotalSportek fetch failed ({}), serving {} stale matches", e, stale.len());
                    Ok(stale.clone())
                }
                None => Err(e),
            },
        }
    }
}

struct Patterns {
    soccer_prefix: Regex,
    starts_in: Regex,
    hours: Regex,
    minutes: Regex,
    teams: Vec<Regex>,
}

fn patterns() -> &'static Patterns {
    static PATTERNS: OnceLock<Patterns> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        let re = |p: &str| Regex::new(p).expect("static scrape pattern");
        Patterns {
            soccer_prefix: re(r"(?i)^soccer\s+"),
            starts_in: re(r"(?i)\s*starts in\s+(.+)$"),
            hours: re(r"(\d+)\s*hr"),
            minutes: re(r"(\d+)\s*min"),
            teams: vec![
                re(r"(?i)^(.+?)\s+vs\s+(.+?)$"),
                re(r"(?i)^(.+?)\s+v\s+(.+?)$"),
                re(r"^(.+?)\s+-\s+(.+?)$"),
            ],
        }
    })
}

fn selector(css: &'static str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("invalid selector {css}: {e:?}"))
}

fn is_known_league(name: &str) -> bool {
    let lower = name.to_lowercase();
    KNOWN_LEAGUES.iter().any(|l| lower.contains(l))
}

fn is_header(el: &ElementRef) -> bool {
    matches!(el.value().name(), "h2" | "h3")
}

/// "12hr:16min" -> 12h16m. `None` when neither unit is present.
fn parse_relative(s: &str) -> Option<ChronoDuration> {
    let p = patterns();
    let grab = |re: &Regex| re.captures(s).and_then(|c| c[1].parse::<i64>().ok());
    let (hours, minutes) = (grab(&p.hours), grab(&p.minutes));
    if hours.is_none() && minutes.is_none() {
        return None;
    }
    Some(ChronoDuration::minutes(hours.unwrap_or(0) * 60 + minutes.unwrap_or(0)))
}

fn parse_item(text: &str, href: &str, league: &str, base_url: &str, now: DateTime<Utc>) -> Option<Match> {
    let p = patterns();
    let text = p.soccer_prefix.replace(text.trim(), "");

    // Bez "Starts in" už zápas běží nebo začíná hned
    let (teams_part, time) = match p.starts_in.captures(&text) {
        Some(caps) => {
            let offset = parse_relative(&caps[1]);
            let time = match offset {
                Some(offset) => KickOff::Scheduled(now + offset),
                None => KickOff::Unknown,
            };
            (p.starts_in.replace(&text, "").trim().to_string(), time)
        }
        None => (text.trim().to_string(), KickOff::Scheduled(now)),
    };

    let (home_team, away_team) = split_fixture(&teams_part, &p.teams)?;

    let trimmed = href.trim_end_matches('/');
    let match_id = match trimmed.rsplit('/').next() {
        Some(seg) if !seg.is_empty() && seg != trimmed => seg.to_string(),
        _ => slugify(&teams_part),
    };
    let url = if href.starts_with('/') { format!("{base_url}{href}") } else { href.to_string() };

    Some(Match {
        id: format!("{SOURCE_NAME}-{match_id}"),
        home_team,
        away_team,
        time,
        date: time.scheduled_at(),
        competition: league.to_string(),
        links: vec![StreamLink::hd_stream(url, "TotalSportek")],
        source: SOURCE_NAME.to_string(),
    })
}

/// Pure parser over the /soccerstreams page.
pub fn parse_soccerstreams(html: &str, base_url: &str, now: DateTime<Utc>) -> Result<Vec<Match>> {
    let document = Html::parse_document(html);
    let header_sel = selector("h2, h3")?;
    let item_sel = selector("li")?;
    let link_sel = selector("a[href]")?;

    let mut matches = Vec::new();
    for header in document.select(&header_sel) {
        let league = collapse_whitespace(&header.text().collect::<Vec<_>>().join(" "));
        if !is_known_league(&league) {
            continue;
        }

        // první <ul> za nadpisem, ale ne přes další ligu
        let list = header
            .next_siblings()
            .filter_map(ElementRef::wrap)
            .take_while(|el| !is_header(el))
            .find(|el| el.value().name() == "ul");
        let Some(list) = list else {
            debug!("TotalSportek: no match list under {:?}", league);
            continue;
        };

        for item in list.select(&item_sel) {
            let text = collapse_whitespace(&item.text().collect::<Vec<_>>().join(" "));
            let Some(href) = item.select(&link_sel).next().and_then(|a| a.value().attr("href")) else {
                continue;
            };
            if text.is_empty() {
                continue;
            }

            match parse_item(&text, href, &league, base_url, now) {
                Some(m) => matches.push(m),
                None => debug!("TotalSportek: cannot parse {:?}", text),
            }
        }
    }
    Ok(matches)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_server::TestServer;
    use chrono::TimeZone;

    const PAGE: &str = r#"
        <html><body>
          <h2>Trending Now</h2>
          <ul><li><a href="/promo/1">Soccer Fake VS Match Starts in 1hr</a></li></ul>

          <h2>English Premier League</h2>
          <ul>
            <li><a href="/Arsenal-vs-Chelsea/101">Soccer <b>Arsenal</b> VS <b>Chelsea</b> Starts in 2hr:30min</a></li>
            <li><a href="/Fulham-vs-Spurs/102">Soccer Fulham vs Spurs</a></li>
            <li>Soccer No Link VS Here Starts in 1hr</li>
          </ul>

          <h3>Bundesliga</h3>
          <p>ads</p>
          <ul>
            <li><a href="https://totalsportek7.com/Koln-vs-Hamburger-SV/">Soccer Koln VS Hamburger SV Starts in 45min</a></li>
            <li><a href="/x/103">Soccer Highlights of the week</a></li>
          </ul>

          <h3>Serie A</h3>
          <h3>Something Else</h3>
          <ul><li><a href="/y/104">Soccer Roma VS Lazio Starts in 1hr</a></li></ul>
        </body></html>
    "#;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 11, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn parses_relative_start_times() {
        assert_eq!(parse_relative("12hr:16min"), Some(ChronoDuration::minutes(12 * 60 + 16)));
        assert_eq!(parse_relative("45min"), Some(ChronoDuration::minutes(45)));
        assert_eq!(parse_relative("2hr"), Some(ChronoDuration::minutes(120)));
        assert_eq!(parse_relative("soon"), None);
    }

    #[test]
    fn parses_league_sections() {
        let matches = parse_soccerstreams(PAGE, DEFAULT_BASE_URL, now()).unwrap();
        let names: Vec<(&str, &str)> = matches
            .iter()
            .map(|m| (m.home_team.as_str(), m.away_team.as_str()))
            .collect();
        assert_eq!(names, vec![("Arsenal", "Chelsea"), ("Fulham", "Spurs"), ("Koln", "Hamburger SV")]);

        let arsenal = &matches[0];
        assert_eq!(arsenal.id, "totalsportek-101");
        assert_eq!(arsenal.competition, "English Premier League");
        assert_eq!(arsenal.time, KickOff::Scheduled(now() + ChronoDuration::minutes(150)));
        assert_eq!(arsenal.date, arsenal.time.scheduled_at());
        assert_eq!(arsenal.links[0].url, "https://totalsportek7.com/Arsenal-vs-Chelsea/101");
        assert_eq!(arsenal.links[0].channel_name.as_deref(), Some("TotalSportek"));

        // bez "Starts in" = právě teď
        assert_eq!(matches[1].time, KickOff::Scheduled(now()));

        let koln = &matches[2];
        assert_eq!(koln.id, "totalsportek-Koln-vs-Hamburger-SV");
        assert_eq!(koln.competition, "Bundesliga");
        assert_eq!(koln.links[0].url, "https://totalsportek7.com/Koln-vs-Hamburger-SV/");
    }

    #[test]
    fn empty_page_has_no_matches() {
        let matches = parse_soccerstreams("<html><body><p>maintenance</p></body></html>", DEFAULT_BASE_URL, now()).unwrap();
        assert!(matches.is_empty());
    }

    fn page_then_errors() -> impl Fn(&str, usize) -> (u16, String) + Send + Sync + 'static {
        |path, nth| match (path, nth) {
            ("/soccerstreams", 0) => (200, PAGE.to_string()),
            _ => (503, "maintenance".to_string()),
        }
    }

    fn source(server: &TestServer, ttl: Duration) -> TotalSportekSource {
        TotalSportekSource::new(server.base_url.clone(), Duration::from_secs(5))
            .unwrap()
            .with_schedule_ttl(ttl)
    }

    #[tokio::test]
    async fn second_fetch_within_ttl_is_served_from_cache() {
        let server = TestServer::start(page_then_errors()).await;
        let ts = source(&server, DEFAULT_SCHEDULE_TTL);

        let first = ts.fetch_matches().await.unwrap();
        let second = ts.fetch_matches().await.unwrap();

        assert_eq!(first.len(), 3);
        assert_eq!(second, first);
        assert_eq!(server.hits("/soccerstreams"), 1);
    }

    #[tokio::test]
    async fn expired_cache_is_served_stale_when_upstream_fails() {
        let server = TestServer::start(page_then_errors()).await;
        let ts = source(&server, Duration::ZERO);

        let first = ts.fetch_matches().await.unwrap();
        let stale = ts.fetch_matches().await.unwrap();

        assert_eq!(server.hits("/soccerstreams"), 2);
        assert_eq!(stale, first);
    }

    #[tokio::test]
    async fn failure_without_cache_is_an_error() {
        let server = TestServer::start(|_, _| (503, "maintenance".to_string())).await;
        let ts = source(&server, DEFAULT_SCHEDULE_TTL);

        let err = ts.fetch_matches().await.unwrap_err();
        assert!(format!("{err:#}").contains("503"));
    }
}
