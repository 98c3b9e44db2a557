//! Cross-source deduplication
//!
//! Two entries are the same fixture when the team names agree (case-insensitive,
//! home/away in either order) and their dates are less than 15 minutes apart.
//! The first entry seen keeps its metadata, later duplicates only donate links.

use match_sources::{FilteredMatch, Match};

pub const SIMILARITY_WINDOW_MS: i64 = 15 * 60 * 1000;

pub fn are_similar(a: &Match, b: &Match) -> bool {
    let norm = |s: &str| s.trim().to_lowercase();
    let (home1, away1) = (norm(&a.home_team), norm(&a.away_team));
    let (home2, away2) = (norm(&b.home_team), norm(&b.away_team));

    let same_teams = (home1 == home2 && away1 == away2) || (home1 == away2 && away1 == home2);
    if !same_teams {
        return false;
    }

    // Bez datumu nikdy nemergujeme
    match (a.date, b.date) {
        (Some(t1), Some(t2)) => t1.signed_duration_since(t2).num_milliseconds().abs() < SIMILARITY_WINDOW_MS,
        _ => false,
    }
}

pub fn deduplicate(matches: Vec<FilteredMatch>) -> Vec<FilteredMatch> {
    let mut unique: Vec<FilteredMatch> = Vec::with_capacity(matches.len());

    for candidate in matches {
        match unique.iter_mut().find(|existing| are_similar(existing, &candidate)) {
            Some(existing) => existing.fixture.links.extend(candidate.fixture.links),
            None => unique.push(candidate),
        }
    }
    unique
}
