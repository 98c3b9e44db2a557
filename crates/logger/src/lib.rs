/// MatchHub Live — Logger
/// JSONL audit stream pro source pokusy a fetch výsledky

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct EventLogger {
    log_dir: PathBuf,
}

impl EventLogger {
    pub fn new(log_dir: impl Into<PathBuf>) -> Self {
        let dir = log_dir.into();
        if let Err(e) = fs::create_dir_all(&dir) {
            tracing::warn!("Cannot create log dir {:?}: {}", dir, e);
        }
        Self { log_dir: dir }
    }

    pub fn log_dir(&self) -> &Path {
        &self.log_dir
    }

    pub fn log<T: Serialize>(&self, event: &T) -> Result<()> {
        let date  = Utc::now().format("%Y-%m-%d").to_string();
        let path  = self.log_dir.join(format!("{date}.jsonl"));
        let line  = serde_json::to_string(event)?;
        let mut f = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .with_context(|| format!("open {}", path.display()))?;
        writeln!(f, "{line}")?;
        Ok(())
    }
}

pub fn now_iso() -> String {
    Utc::now().to_rfc3339()
}

// ── Event typy ────────────────────────────────────────────────────────────────

#[derive(Serialize, Debug)]
pub struct SourceAttemptEvent {
    pub ts:       String,
    pub event:    &'static str,   // "SOURCE_ATTEMPT"
    pub source:   String,         // "daddylive" | "totalsportek"
    pub strategy: &'static str,   // "sequential" | "multi"
    pub ok:       bool,
    pub matches:  usize,          // po filtru
    pub message:  String,
}

#[derive(Serialize, Debug)]
pub struct FetchResultEvent {
    pub ts:       String,
    pub event:    &'static str,   // "FETCH_RESULT"
    pub strategy: &'static str,
    pub label:    String,         // "primary" | "fallback" | "cache" | "none"
    pub provider: Option<String>,
    pub matches:  usize,
    pub error:    Option<String>,
}

#[derive(Serialize, Debug)]
pub struct HubHeartbeatEvent {
    pub ts:             String,
    pub event:          &'static str,   // "HUB_HEARTBEAT"
    pub requests:       u64,
    pub cached_matches: usize,
    pub cache_age_secs: Option<u64>,
    pub refreshing:     bool,
}
