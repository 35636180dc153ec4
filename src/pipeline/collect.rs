//! Discovery and detail fetching against the metadata source.

use std::collections::HashSet;

use tracing::{info, warn};

use crate::error::PipelineError;
use crate::model::{FilmSummary, RawFilm};
use crate::sources::{MetadataSource, ReleaseWindow};

pub const DEFAULT_DETAIL_CHUNK_SIZE: usize = 250;

/// Walk every discovery page for `window`. Page 1 tells how many pages there
/// are; a failing page after that is logged and skipped. Ids repeated across
/// pages are kept once.
pub async fn search_all(
    source: &dyn MetadataSource,
    window: &ReleaseWindow,
) -> anyhow::Result<Vec<FilmSummary>> {
    let first = source.search_page(window, 1).await.map_err(|e| {
        let err = PipelineError::source_unavailable(source.name(), "page=1", &e);
        anyhow::Error::new(err).context("discovery could not start")
    })?;
    let total_pages = first.total_pages.max(1);
    info!(
        target = "collect",
        source = source.name(),
        start = %window.start,
        end = %window.end,
        total_pages,
        "discovery started"
    );

    let mut seen = HashSet::new();
    let mut summaries = Vec::new();
    let mut skipped_pages = 0u32;
    let mut push_page = |results: Vec<FilmSummary>, summaries: &mut Vec<FilmSummary>| {
        summaries.extend(results.into_iter().filter(|s| seen.insert(s.id)));
    };
    push_page(first.results, &mut summaries);

    for page in 2..=total_pages {
        match source.search_page(window, page).await {
            Ok(p) => push_page(p.results, &mut summaries),
            Err(e) => {
                skipped_pages += 1;
                let err = PipelineError::source_unavailable(source.name(), format!("page={page}"), &e);
                warn!(target = "collect", page, error = %err, "discovery page skipped");
            }
        }
    }

    info!(
        target = "collect",
        films = summaries.len(),
        skipped_pages,
        "discovery finished"
    );
    Ok(summaries)
}

/// Fetch details (with credits) for each summary, in chunks. Failed details
/// are logged and left out.
pub async fn fetch_details(
    source: &dyn MetadataSource,
    summaries: &[FilmSummary],
    chunk_size: usize,
) -> Vec<RawFilm> {
    let chunk_size = chunk_size.max(1);
    let chunks = summaries.len().div_ceil(chunk_size);
    let mut films = Vec::with_capacity(summaries.len());
    let mut failed = 0usize;

    for (idx, chunk) in summaries.chunks(chunk_size).enumerate() {
        for summary in chunk {
            match source.detail(summary.id).await {
                Ok(film) => films.push(film),
                Err(e) => {
                    failed += 1;
                    let err =
                        PipelineError::source_unavailable(source.name(), summary.id.to_string(), &e);
                    warn!(
                        target = "collect",
                        film_id = summary.id,
                        title = %summary.title,
                        error = %err,
                        "detail lookup failed; film skipped"
                    );
                }
            }
        }
        info!(
            target = "collect",
            chunk = idx + 1,
            chunks,
            fetched = films.len(),
            failed,
            "detail chunk done"
        );
    }
    films
}

/// Discovery followed by detail fetching.
pub async fn collect(
    source: &dyn MetadataSource,
    window: &ReleaseWindow,
    chunk_size: usize,
) -> anyhow::Result<Vec<RawFilm>> {
    let summaries = search_all(source, window).await?;
    Ok(fetch_details(source, &summaries, chunk_size).await)
}
