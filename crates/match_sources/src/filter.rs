//! Team filter: keeps only fixtures with one of the configured target clubs.
//!
//! Aliases are matched as whole words on normalised names, so "Man Utd" hits
//! "Man Utd Women" but "Inter" does not hit "Internacional".

use tracing::info;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

use crate::model::{FilteredMatch, Match};

/// Known clubs and the names sources use for them.
const BUILTIN_ALIASES: &[(&str, &[&str])] = &[
    ("Arsenal", &["Arsenal", "Arsenal FC", "Gunners"]),
    ("Chelsea", &["Chelsea", "Chelsea FC"]),
    ("Manchester City", &["Manchester City", "Man City", "Man City FC"]),
    ("Manchester United", &["Manchester United", "Man United", "Man Utd", "Man United FC"]),
    ("Newcastle United", &["Newcastle United", "Newcastle", "Newcastle FC", "Magpies"]),
    ("Liverpool", &["Liverpool", "Liverpool FC"]),
    ("Barcelona", &["Barcelona", "Barcelona FC", "Barca", "FC Barcelona"]),
    ("Real Madrid", &["Real Madrid", "Real Madrid CF", "Los Blancos"]),
    ("AC Milan", &["AC Milan", "ACM"]),
    ("Inter Milan", &["Inter Milan", "Inter", "Inter FC", "Internazionale"]),
    ("Juventus", &["Juventus", "Juventus FC", "Juve"]),
    ("Napoli", &["Napoli", "SSC Napoli", "Napoli FC"]),
    ("PSG", &["PSG", "Paris Saint-Germain", "Paris SG"]),
    ("Bayern Munich", &["Bayern Munich", "Bayern", "FC Bayern", "FC Bayern Munich", "Bayern München"]),
];

#[derive(Debug, Clone, PartialEq)]
pub struct TargetClub {
    pub name: String,
    pub aliases: Vec<String>,
}

impl TargetClub {
    /// Built-in aliases when the club is known, otherwise just its own name.
    pub fn named(name: &str) -> Self {
        let wanted = normalize_team_name(name);
        let aliases = BUILTIN_ALIASES
            .iter()
            .find(|(club, _)| normalize_team_name(club) == wanted)
            .map(|(_, aliases)| aliases.iter().map(|a| a.to_string()).collect())
            .unwrap_or_else(|| vec![name.trim().to_string()]);

        Self { name: name.trim().to_string(), aliases }
    }
}

#[derive(Debug, Clone)]
pub struct TeamFilter {
    clubs: Vec<TargetClub>,
    /// Normalised aliases of all clubs, flattened.
    needles: Vec<String>,
}

impl TeamFilter {
    pub fn new(clubs: Vec<TargetClub>) -> Self {
        let needles = clubs
            .iter()
            .flat_map(|c| c.aliases.iter())
            .map(|a| normalize_team_name(a))
            .filter(|a| !a.is_empty())
            .collect();
        Self { clubs, needles }
    }

    pub fn from_names<S: AsRef<str>>(names: &[S]) -> Self {
        Self::new(
            names
                .iter()
                .map(|n| n.as_ref())
                .filter(|n| !n.trim().is_empty())
                .map(TargetClub::named)
                .collect(),
        )
    }

    pub fn default_clubs() -> Vec<String> {
        BUILTIN_ALIASES.iter().map(|(club, _)| club.to_string()).collect()
    }

    pub fn clubs(&self) -> &[TargetClub] {
        &self.clubs
    }

    pub fn is_target_match(&self, home_team: &str, away_team: &str) -> bool {
        let home = padded(&normalize_team_name(home_team));
        let away = padded(&normalize_team_name(away_team));
        self.needles.iter().any(|needle| {
            let needle = padded(needle);
            home.contains(&needle) || away.contains(&needle)
        })
    }

    pub fn filter(&self, matches: Vec<Match>) -> Vec<FilteredMatch> {
        let total = matches.len();
        let kept: Vec<FilteredMatch> = matches
            .into_iter()
            .filter(|m| self.is_target_match(&m.home_team, &m.away_team))
            .map(|fixture| FilteredMatch { fixture, is_target_match: true })
            .collect();

        info!("Filter: {} -> {} matches involving target clubs", total, kept.len());
        kept
    }
}

impl Default for TeamFilter {
    fn default() -> Self {
        Self::from_names(&Self::default_clubs())
    }
}

/// Lowercase, accents stripped, punctuation to spaces, whitespace collapsed.
pub fn normalize_team_name(name: &str) -> String {
    name.nfkd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn padded(s: &str) -> String {
    format!(" {s} ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kickoff::KickOff;

    fn fixture(home: &str, away: &str) -> Match {
        Match {
            id: format!("{home}-{away}"),
            home_team: home.to_string(),
            away_team: away.to_string(),
            time: KickOff::Unknown,
            date: None,
            competition: "Test".to_string(),
            links: vec![],
            source: "test".to_string(),
        }
    }

    #[test]
    fn normalizes_accents_case_and_punctuation() {
        assert_eq!(normalize_team_name("  Bayern München "), "bayern munchen");
        assert_eq!(normalize_team_name("Paris Saint-Germain"), "paris saint germain");
        assert_eq!(normalize_team_name("Atlético   Madrid"), "atletico madrid");
    }

    #[test]
    fn known_club_gets_builtin_aliases() {
        let club = TargetClub::named("arsenal");
        assert!(club.aliases.contains(&"Gunners".to_string()));

        let unknown = TargetClub::named(" Brentford ");
        assert_eq!(unknown.name, "Brentford");
        assert_eq!(unknown.aliases, vec!["Brentford".to_string()]);
    }

    #[test]
    fn matches_aliases_on_either_side() {
        let filter = TeamFilter::from_names(&["Arsenal", "Manchester United", "PSG"]);
        assert!(filter.is_target_match("Arsenal FC", "Wolves"));
        assert!(filter.is_target_match("Fulham", "Man Utd"));
        assert!(filter.is_target_match("Paris Saint Germain", "Lyon"));
        assert!(!filter.is_target_match("Tottenham", "Everton"));
    }

    #[test]
    fn aliases_match_whole_words_only() {
        let filter = TeamFilter::from_names(&["Inter Milan"]);
        assert!(filter.is_target_match("Inter", "Roma"));
        assert!(!filter.is_target_match("Internacional", "Gremio"));
    }

    #[test]
    fn filter_keeps_targets_and_flags_them() {
        let filter = TeamFilter::from_names(&["Arsenal"]);
        let out = filter.filter(vec![
            fixture("Arsenal", "Chelsea"),
            fixture("Leeds", "Burnley"),
            fixture("Brighton", "Arsenal"),
        ]);

        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|m| m.is_target_match));
        assert_eq!(out[0].home_team, "Arsenal");
        assert_eq!(out[1].away_team, "Arsenal");
    }

    #[test]
    fn default_filter_covers_builtin_clubs() {
        let filter = TeamFilter::default();
        assert_eq!(filter.clubs().len(), BUILTIN_ALIASES.len());
        assert!(filter.is_target_match("Juve", "Torino"));
    }
}
