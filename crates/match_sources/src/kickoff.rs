//! Kickoff typing
//!
//! Sources give free-form times ("14:30", "LIVE", "TBD", "Starts in 2hr:05min").
//! Adapters turn them into a `KickOff` once, so nothing downstream re-parses
//! strings. Clock times are GMT/UTC.

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Serialize, Serializer};
use std::cmp::Ordering;

use crate::model::Match;

/// 90 min + half time + stoppage / delays.
pub const MATCH_DURATION_MINUTES: i64 = 120;
/// How long a finished match stays listed.
pub const EXPIRATION_GRACE_HOURS: i64 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KickOff {
    Scheduled(DateTime<Utc>),
    Live,
    Unknown,
}

impl KickOff {
    /// Parses a schedule clock value relative to `now`.
    ///
    /// A bare `HH:MM` lands on today's date; if that is more than 12 hours in
    /// the past the fixture is assumed to be tomorrow.
    pub fn parse(raw: &str, now: DateTime<Utc>) -> Self {
        let lower = raw.trim().to_lowercase();
        match lower.as_str() {
            "live" => return KickOff::Live,
            "" | "tbd" | "to be determined" => return KickOff::Unknown,
            _ => {}
        }

        let Some((hours, minutes)) = parse_clock(&lower) else {
            return KickOff::Unknown;
        };
        let Some(naive) = now.date_naive().and_hms_opt(hours, minutes, 0) else {
            return KickOff::Unknown;
        };

        let mut at = Utc.from_utc_datetime(&naive);
        if now.signed_duration_since(at) > Duration::hours(12) {
            at += Duration::days(1);
        }
        KickOff::Scheduled(at)
    }

    pub fn scheduled_at(&self) -> Option<DateTime<Utc>> {
        match self {
            KickOff::Scheduled(at) => Some(*at),
            _ => None,
        }
    }

    pub fn is_live(&self) -> bool {
        matches!(self, KickOff::Live)
    }

    /// Live and unknown kickoffs never expire.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        let KickOff::Scheduled(at) = self else {
            return false;
        };
        let ended_at = *at + Duration::minutes(MATCH_DURATION_MINUTES);
        now.signed_duration_since(ended_at) > Duration::hours(EXPIRATION_GRACE_HOURS)
    }

    pub fn display(&self) -> String {
        match self {
            KickOff::Scheduled(at) => at.format("%H:%M").to_string(),
            KickOff::Live => "LIVE".to_string(),
            KickOff::Unknown => "TBD".to_string(),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            KickOff::Live => 0,
            KickOff::Scheduled(_) => 1,
            KickOff::Unknown => 2,
        }
    }
}

impl Serialize for KickOff {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.display())
    }
}

fn parse_clock(s: &str) -> Option<(u32, u32)> {
    let (h, rest) = s.split_once(':')?;
    let m = rest.get(..2)?;
    if h.is_empty() || h.len() > 2 || !h.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if !m.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let hours: u32 = h.parse().ok()?;
    let minutes: u32 = m.parse().ok()?;
    (hours <= 23 && minutes <= 59).then_some((hours, minutes))
}

/// Drops finished fixtures and orders the rest: live, then by kickoff, TBD last.
pub fn prune_and_sort<T: AsRef<Match>>(items: Vec<T>, now: DateTime<Utc>) -> Vec<T> {
    let mut kept: Vec<T> = items
        .into_iter()
        .filter(|m| !m.as_ref().time.is_expired(now))
        .collect();

    kept.sort_by(|a, b| {
        let (a, b) = (&a.as_ref().time, &b.as_ref().time);
        match a.rank().cmp(&b.rank()) {
            Ordering::Equal => a.scheduled_at().cmp(&b.scheduled_at()),
            other => other,
        }
    });
    kept
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(h: u32, m: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 11, 1, h, m, 0).unwrap()
    }

    fn fixture(id: &str, time: KickOff) -> Match {
        Match {
            id: id.to_string(),
            home_team: "Arsenal".to_string(),
            away_team: "Chelsea".to_string(),
            time,
            date: time.scheduled_at(),
            competition: "Premier League".to_string(),
            links: vec![],
            source: "test".to_string(),
        }
    }

    #[test]
    fn parses_live_and_tbd_markers() {
        let now = at(12, 0);
        assert_eq!(KickOff::parse("LIVE", now), KickOff::Live);
        assert_eq!(KickOff::parse(" live ", now), KickOff::Live);
        assert_eq!(KickOff::parse("TBD", now), KickOff::Unknown);
        assert_eq!(KickOff::parse("To Be Determined", now), KickOff::Unknown);
        assert_eq!(KickOff::parse("", now), KickOff::Unknown);
        assert_eq!(KickOff::parse("soon", now), KickOff::Unknown);
    }

    #[test]
    fn parses_clock_time_on_same_day() {
        assert_eq!(KickOff::parse("14:30", at(12, 0)), KickOff::Scheduled(at(14, 30)));
        assert_eq!(KickOff::parse("9:05 GMT", at(8, 0)), KickOff::Scheduled(at(9, 5)));
    }

    #[test]
    fn far_past_clock_time_rolls_to_tomorrow() {
        let now = at(23, 0);
        let expected = at(8, 0) + Duration::days(1);
        assert_eq!(KickOff::parse("08:00", now), KickOff::Scheduled(expected));
    }

    #[test]
    fn rejects_out_of_range_clock() {
        let now = at(12, 0);
        assert_eq!(KickOff::parse("24:00", now), KickOff::Unknown);
        assert_eq!(KickOff::parse("12:60", now), KickOff::Unknown);
        assert_eq!(KickOff::parse("123:00", now), KickOff::Unknown);
    }

    #[test]
    fn expires_two_hours_after_full_time() {
        let kickoff = KickOff::Scheduled(at(12, 0));
        // full time 14:00, hidden after 16:00
        assert!(!kickoff.is_expired(at(15, 59)));
        assert!(!kickoff.is_expired(at(16, 0)));
        assert!(kickoff.is_expired(at(16, 1)));
        assert!(!KickOff::Live.is_expired(at(23, 59)));
        assert!(!KickOff::Unknown.is_expired(at(23, 59)));
    }

    #[test]
    fn prune_and_sort_orders_live_scheduled_unknown() {
        let now = at(18, 0);
        let items = vec![
            fixture("tbd", KickOff::Unknown),
            fixture("late", KickOff::Scheduled(at(20, 0))),
            fixture("finished", KickOff::Scheduled(at(13, 0))),
            fixture("live", KickOff::Live),
            fixture("early", KickOff::Scheduled(at(17, 30))),
        ];

        let ids: Vec<String> = prune_and_sort(items, now).into_iter().map(|m| m.id).collect();
        assert_eq!(ids, vec!["live", "early", "late", "tbd"]);
    }
}
