use chrono::{DateTime, Utc};
use serde::Serialize;
use std::ops::{Deref, DerefMut};

use crate::kickoff::KickOff;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkType {
    Stream,
    Acestream,
    Sopcast,
    Hls,
}

/// One watchable link: a URL or an opaque channel reference.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamLink {
    pub url: String,
    pub quality: String,
    #[serde(rename = "type")]
    pub link_type: LinkType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub channel_name: Option<String>,
}

impl StreamLink {
    /// Plain English HD stream, which is what both scraped sites list.
    pub fn hd_stream(url: impl Into<String>, channel_name: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            quality: "HD".to_string(),
            link_type: LinkType::Stream,
            language: Some("English".to_string()),
            channel_name: Some(channel_name.into()),
        }
    }
}

/// Raw fixture as one source reported it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    pub id: String,
    pub home_team: String,
    pub away_team: String,
    pub time: KickOff,
    /// Best known instant of the fixture; `None` when the source gave nothing usable.
    pub date: Option<DateTime<Utc>>,
    pub competition: String,
    pub links: Vec<StreamLink>,
    pub source: String,
}

/// A `Match` that passed the team filter.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilteredMatch {
    #[serde(flatten)]
    pub fixture: Match,
    pub is_target_match: bool,
}

impl Deref for FilteredMatch {
    type Target = Match;

    fn deref(&self) -> &Match {
        &self.fixture
    }
}

impl DerefMut for FilteredMatch {
    fn deref_mut(&mut self) -> &mut Match {
        &mut self.fixture
    }
}

impl AsRef<Match> for Match {
    fn as_ref(&self) -> &Match {
        self
    }
}

impl AsRef<Match> for FilteredMatch {
    fn as_ref(&self) -> &Match {
        &self.fixture
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn serializes_with_frontend_field_names() {
        let kickoff = Utc.with_ymd_and_hms(2024, 1, 15, 15, 0, 0).unwrap();
        let m = FilteredMatch {
            fixture: Match {
                id: "daddylive-arsenal-chelsea-15-00".to_string(),
                home_team: "Arsenal".to_string(),
                away_team: "Chelsea".to_string(),
                time: KickOff::Scheduled(kickoff),
                date: Some(kickoff),
                competition: "England - Premier League".to_string(),
                links: vec![StreamLink::hd_stream("35", "Sky Sports Main Event")],
                source: "daddylive".to_string(),
            },
            is_target_match: true,
        };

        let json = serde_json::to_value(&m).unwrap();
        assert_eq!(json["homeTeam"], "Arsenal");
        assert_eq!(json["awayTeam"], "Chelsea");
        assert_eq!(json["time"], "15:00");
        assert_eq!(json["isTargetMatch"], true);
        assert_eq!(json["links"][0]["type"], "stream");
        assert_eq!(json["links"][0]["channelName"], "Sky Sports Main Event");
        assert!(json["date"].as_str().unwrap().starts_with("2024-01-15T15:00:00"));
    }
}
