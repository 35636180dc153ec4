//! Collaborator seams: the metadata, financial and rating sources the
//! pipeline pulls from, plus the HTTP providers that implement them.

pub mod boxofficemojo;
pub mod omdb;
pub mod tmdb;

use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;

use crate::model::{FinancialFigures, RatingScores, RawFilm, SearchPage};

/// Inclusive release-date window for discovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReleaseWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl ReleaseWindow {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if end < start {
            anyhow::bail!("release window ends ({end}) before it starts ({start})");
        }
        Ok(Self { start, end })
    }
}

/// Primary source: paginated discovery plus per-film detail with credits.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    fn name(&self) -> &'static str;

    /// One page (1-based) of the discovery search.
    async fn search_page(&self, window: &ReleaseWindow, page: u32) -> Result<SearchPage>;

    async fn detail(&self, id: u64) -> Result<RawFilm>;
}

/// Secondary source for budget and revenue, keyed by IMDb id.
#[async_trait]
pub trait FinancialSource: Send + Sync {
    fn name(&self) -> &'static str;

    async fn lookup(&self, imdb_id: &str) -> Result<FinancialFigures>;
}

/// Critic and audience scores, keyed by IMDb id.
#[async_trait]
pub trait RatingSource: Send + Sync {
    fn name(&self) -> &'static str;

    async fn lookup(&self, imdb_id: &str) -> Result<RatingScores>;
}

/// Shorten response bodies before they land in error messages.
pub(crate) fn truncate_for_log(mut s: String, max_len: usize) -> String {
    if s.len() > max_len {
        let mut cut = max_len;
        while !s.is_char_boundary(cut) {
            cut -= 1;
        }
        s.truncate(cut);
        s.push('…');
    }
    s
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_must_be_ordered() {
        let a = NaiveDate::from_ymd_opt(2000, 1, 1).unwrap();
        let b = NaiveDate::from_ymd_opt(2009, 12, 31).unwrap();
        assert!(ReleaseWindow::new(a, b).is_ok());
        assert!(ReleaseWindow::new(a, a).is_ok());
        assert!(ReleaseWindow::new(b, a).is_err());
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_for_log("short".into(), 10), "short");
        assert_eq!(truncate_for_log("abcdef".into(), 3), "abc…");
        assert_eq!(truncate_for_log("ééé".into(), 3), "é…");
    }
}
