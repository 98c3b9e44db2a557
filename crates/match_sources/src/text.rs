// Sdílené textové helpery pro parsování titulků zápasů

use regex::Regex;

pub(crate) fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Decodes the handful of entities the schedule feeds emit, collapses whitespace.
pub(crate) fn clean_text(s: &str) -> String {
    let decoded = s
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'");
    collapse_whitespace(&decoded)
}

/// Lowercase ASCII slug for ids: "Arsenal vs Chelsea" -> "arsenal-vs-chelsea".
pub(crate) fn slugify(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut dash = false;
    for c in s.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_alphanumeric() {
            out.push(c);
            dash = false;
        } else if !dash && !out.is_empty() {
            out.push('-');
            dash = true;
        }
    }
    while out.ends_with('-') {
        out.pop();
    }
    out
}

/// First pattern with two capture groups wins; both sides must be non-empty.
pub(crate) fn split_fixture(text: &str, patterns: &[Regex]) -> Option<(String, String)> {
    patterns.iter().find_map(|re| {
        let caps = re.captures(text)?;
        let home = clean_text(caps.get(1)?.as_str());
        let away = clean_text(caps.get(2)?.as_str());
        (!home.is_empty() && !away.is_empty()).then_some((home, away))
    })
}
