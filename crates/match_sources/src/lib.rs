//! MatchHub Live — Match Sources
//!
//! Zdroje zápasů a stream linků pro fotbal:
//! - DaddyLive: JSON schedule API (primární, rychlé)
//! - TotalSportek: HTML scraping /soccerstreams (fallback, pomalé)
//! - DaddyLive 24/7 katalog kanálů (`ChannelCatalog`)
//!
//! Každý adapter si drží vlastní krátkou cache a při výpadku upstreamu vrací
//! poslední známá data. Tvrdé chyby propaguje jako `Err`, "nic tam není" jako
//! prázdný seznam.

use anyhow::Result;
use async_trait::async_trait;

pub mod channels;
pub mod daddylive;
pub mod filter;
pub mod kickoff;
pub mod model;
pub mod totalsportek;
mod text;

#[cfg(test)]
mod test_server;

pub use channels::{Channel, ChannelCatalog};
pub use daddylive::{DaddyLiveConfig, DaddyLiveSource};
pub use filter::{normalize_team_name, TargetClub, TeamFilter};
pub use kickoff::{prune_and_sort, KickOff};
pub use model::{FilteredMatch, LinkType, Match, StreamLink};
pub use totalsportek::TotalSportekSource;

/// Browser-like UA pool; scraped sites block the default reqwest agent.
pub(crate) const USER_AGENTS: [&str; 3] = [
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
];

/// One upstream site that can list today's matches.
#[async_trait]
pub trait MatchSource: Send + Sync {
    /// Short stable tag, also written into `Match::source`.
    fn name(&self) -> &str;

    /// `Err` on hard failure (network, parse), `Ok(vec![])` when the site has nothing.
    async fn fetch_matches(&self) -> Result<Vec<Match>>;
}
