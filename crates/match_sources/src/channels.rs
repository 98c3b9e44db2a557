//! 24/7 channel catalog
//!
//! DaddyLive lists always-on channels on `24-7-channels.php` as
//! `<a class="card" href="watch.php?id=51" data-title="..."><div class="card__title">..</div></a>`.
//! Older layouts only have bare `watch.php?id=` links.

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::OnceLock;

use crate::text::collapse_whitespace;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Channel {
    pub id: String,
    pub name: String,
    pub url: String,
    pub category: String,
}

/// Anything that can list 24/7 channels.
#[async_trait]
pub trait ChannelCatalog: Send + Sync {
    async fn fetch_channels(&self) -> Result<Vec<Channel>>;
}

/// Name patterns checked in order; first hit wins.
const CATEGORIES: &[(&[&str], &str)] = &[
    (&["sky sports"], "Sky Sports"),
    (&["bt sport", "tnt sports"], "TNT/BT Sports"),
    (&["espn"], "ESPN"),
    (&["bein"], "beIN Sports"),
    (&["dazn"], "DAZN"),
    (&["supersport"], "SuperSport"),
    (&["canal+", "canal plus"], "Canal+"),
    (&["movistar"], "Movistar"),
    (&["arena"], "Arena Sport"),
    (&["astro"], "Astro"),
    (&["fox sport"], "Fox Sports"),
    (&["eurosport"], "Eurosport"),
    (&["nba"], "NBA"),
    (&["nfl"], "NFL"),
    (&["mlb"], "MLB"),
    (&["premier sports"], "Premier Sports"),
    (&["sport"], "Sports"),
    (&["news", "cnn"], "News"),
    (&["movie", "film", "cinema"], "Movies"),
    (&["hbo", "showtime", "starz"], "Premium"),
    (&["ppv", "pay per view"], "PPV"),
];

pub fn categorize_channel(name: &str) -> &'static str {
    let lower = name.to_lowercase();
    CATEGORIES
        .iter()
        .find(|(needles, _)| needles.iter().any(|n| lower.contains(n)))
        .map(|(_, category)| *category)
        .unwrap_or("General")
}

fn channel_id_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[?&]id=(\d+)").expect("static channel id pattern"))
}

fn leading_number_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d+([A-Za-z])").expect("static channel name pattern"))
}

/// "  51Sky  Sports (UK) " -> "Sky Sports UK"
pub fn clean_channel_name(raw: &str) -> String {
    let collapsed = collapse_whitespace(raw);
    let stripped = leading_number_pattern().replace(&collapsed, "$1");
    stripped.replace(|c: char| c == '(' || c == ')', "").trim().to_string()
}

fn selector(css: &'static str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("invalid selector {css}: {e:?}"))
}

fn to_channel(href: &str, raw_name: &str) -> Option<Channel> {
    let id = channel_id_pattern().captures(href)?.get(1)?.as_str().to_string();
    let name = clean_channel_name(raw_name);
    if name.is_empty() || name.contains("18+") {
        return None;
    }
    Some(Channel {
        id,
        category: categorize_channel(&name).to_string(),
        name,
        url: href.to_string(),
    })
}

fn element_text(el: &ElementRef) -> String {
    el.text().collect::<Vec<_>>().join(" ")
}

/// Unique by id (last occurrence wins), sorted by name.
pub fn parse_channels(html: &str) -> Result<Vec<Channel>> {
    let document = Html::parse_document(html);
    let card_sel = selector("a.card")?;
    let title_sel = selector(".card__title")?;
    let link_sel = selector(r#"a[href*="watch.php?id="]"#)?;

    let mut found: Vec<Channel> = document
        .select(&card_sel)
        .filter_map(|card| {
            let href = card.value().attr("href").unwrap_or_default();
            let from_dom = card.select(&title_sel).next().map(|t| element_text(&t)).unwrap_or_default();
            let name = if from_dom.trim().is_empty() {
                card.value().attr("data-title").unwrap_or_default().to_string()
            } else {
                from_dom
            };
            to_channel(href, &name)
        })
        .collect();

    if found.is_empty() {
        found = document
            .select(&link_sel)
            .filter_map(|link| {
                let attrs = link.value();
                let name = attrs
                    .attr("data-title")
                    .or_else(|| attrs.attr("title"))
                    .map(str::to_string)
                    .unwrap_or_else(|| element_text(&link));
                to_channel(attrs.attr("href").unwrap_or_default(), &name)
            })
            .collect();
    }

    let mut by_id: HashMap<String, Channel> = HashMap::new();
    for channel in found {
        by_id.insert(channel.id.clone(), channel);
    }
    let mut channels: Vec<Channel> = by_id.into_values().collect();
    channels.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()).then_with(|| a.id.cmp(&b.id)));
    Ok(channels)
}

/// Case-insensitive substring over name and category.
pub fn search_channels(channels: &[Channel], query: &str) -> Vec<Channel> {
    let query = query.to_lowercase();
    channels
        .iter()
        .filter(|c| c.name.to_lowercase().contains(&query) || c.category.to_lowercase().contains(&query))
        .cloned()
        .collect()
}

/// Exact category match.
pub fn channels_in_category(channels: &[Channel], category: &str) -> Vec<Channel> {
    channels.iter().filter(|c| c.category == category).cloned().collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
        <html><body>
          <div class="grid">
            <a class="card" href="/watch.php?id=35" data-title="sky sports main event">
              <div class="card__title">Sky Sports Main Event</div>
            </a>
            <a class="card" href="/watch.php?id=51" data-title="51ESPN (US)"></a>
            <a class="card" href="/watch.php?id=99"><div class="card__title">Adult 18+</div></a>
            <a class="card" href="/about.php"><div class="card__title">About</div></a>
            <a class="card" href="/watch.php?id=35"><div class="card__title">Sky Sports Main Event</div></a>
            <a class="card" href="/watch.php?id=7"><div class="card__title">BBC  News</div></a>
          </div>
        </body></html>
    "#;

    #[test]
    fn parses_cards_skipping_adult_and_duplicates() {
        let channels = parse_channels(PAGE).unwrap();
        let ids: Vec<&str> = channels.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["7", "51", "35"]);

        assert_eq!(channels[0].name, "BBC News");
        assert_eq!(channels[0].category, "News");
        assert_eq!(channels[1].name, "ESPN US");
        assert_eq!(channels[1].category, "ESPN");
        assert_eq!(channels[2].category, "Sky Sports");
        assert_eq!(channels[2].url, "/watch.php?id=35");
    }

    #[test]
    fn falls_back_to_plain_watch_links() {
        let html = r#"<ul>
            <li><a href="watch.php?id=12" title="DAZN 1">x</a></li>
            <li><a href="watch.php?id=13">Canal+ Foot</a></li>
        </ul>"#;
        let channels = parse_channels(html).unwrap();
        assert_eq!(channels.len(), 2);
        assert_eq!(channels[0].name, "Canal+ Foot");
        assert_eq!(channels[0].category, "Canal+");
        assert_eq!(channels[1].name, "DAZN 1");
    }

    #[test]
    fn categories_follow_first_matching_rule() {
        assert_eq!(categorize_channel("TNT Sports 1"), "TNT/BT Sports");
        assert_eq!(categorize_channel("Sport TV"), "Sports");
        assert_eq!(categorize_channel("HBO 2"), "Premium");
        assert_eq!(categorize_channel("Channel 4"), "General");
    }

    #[test]
    fn search_and_category_filters() {
        let channels = parse_channels(PAGE).unwrap();
        let hits = search_channels(&channels, "SKY");
        assert_eq!(hits.len(), 1);
        assert_eq!(search_channels(&channels, "news").len(), 1);
        assert_eq!(channels_in_category(&channels, "ESPN").len(), 1);
        assert!(channels_in_category(&channels, "espn").is_empty());
    }
}
