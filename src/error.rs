//! Error types for the reconciliation and ranking pipeline.
//!
//! Provider and CLI plumbing reports failures through `anyhow`; the variants
//! here are the ones pipeline callers match on to pick a degrade policy.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PipelineError {
    /// A collaborator fetch failed (network, status or parse error).
    #[error("source {source_name} unavailable for {key}: {reason}")]
    SourceUnavailable {
        source_name: &'static str,
        key: String,
        reason: String,
    },

    /// The record has no key for the source that would enrich it.
    #[error("film {film_id} has no imdb id")]
    MissingJoinKey { film_id: u64 },

    /// Leaderboards exist for directors and actors only.
    #[error("unsupported ranking role: {0}")]
    InvalidRole(String),

    /// The inflation index has no entry for the year.
    #[error("inflation index has no entry for {year}")]
    IndexGap { year: i32 },

    #[error("configuration error: {0}")]
    Config(String),
}

impl PipelineError {
    pub fn source_unavailable(
        source_name: &'static str,
        key: impl Into<String>,
        err: &anyhow::Error,
    ) -> Self {
        Self::SourceUnavailable {
            source_name,
            key: key.into(),
            reason: format!("{err:#}"),
        }
    }
}

pub type Result<T> = std::result::Result<T, PipelineError>;
