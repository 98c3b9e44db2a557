//! MatchHub Live — HTTP hub nad Source Managerem
//!
//! Sdílené části binárek `match-hub` a `source-probe`.

pub mod api_cache;
pub mod config;
pub mod http;

#[cfg(test)]
mod test_support;
