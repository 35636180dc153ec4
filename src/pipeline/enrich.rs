//! Turns raw films into the enriched table: secondary-source fallback for
//! missing financials, time columns, inflation adjustment, profit, budget
//! bins and ratings.

use std::collections::BTreeSet;
use std::future::Future;

use chrono::{Datelike, NaiveDate};
use futures::{stream, StreamExt};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::PipelineError;
use crate::model::{decade_of, FilmRecord, LookupStatus, RatingScores, RawFilm};
use crate::normalization::{BudgetBin, InflationAdjuster, InflationIndex};
use crate::pipeline::reconcile::{reconcile, Financials, Reconciled};
use crate::sources::{FinancialSource, RatingSource};

#[derive(Debug, Clone)]
pub struct EnrichOptions {
    /// Lookups per chunk; progress is logged per chunk.
    pub lookup_chunk_size: usize,
    /// Lookups in flight at once. `1` is strictly sequential.
    pub lookup_concurrency: usize,
    pub attach_ratings: bool,
}

impl Default for EnrichOptions {
    fn default() -> Self {
        Self {
            lookup_chunk_size: 100,
            lookup_concurrency: 1,
            attach_ratings: true,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EnrichSummary {
    pub input: usize,
    pub undated: usize,
    pub complete: usize,
    pub incomplete: usize,
    pub financial_fetched: usize,
    pub financial_failed: usize,
    pub missing_join_key: usize,
    pub index_gaps: usize,
    pub ratings_fetched: usize,
    pub ratings_failed: usize,
}

#[derive(Debug, Clone)]
pub struct Enriched {
    pub records: Vec<FilmRecord>,
    pub summary: EnrichSummary,
}

pub struct RecordEnricher<'a> {
    financial: &'a dyn FinancialSource,
    ratings: Option<&'a dyn RatingSource>,
    adjuster: InflationAdjuster<'a>,
    options: EnrichOptions,
}

impl<'a> RecordEnricher<'a> {
    pub fn new(financial: &'a dyn FinancialSource, index: &'a dyn InflationIndex) -> Self {
        Self {
            financial,
            ratings: None,
            adjuster: InflationAdjuster::new(index),
            options: EnrichOptions::default(),
        }
    }

    pub fn with_ratings(mut self, ratings: &'a dyn RatingSource) -> Self {
        self.ratings = Some(ratings);
        self
    }

    pub fn with_options(mut self, options: EnrichOptions) -> Self {
        self.options = options;
        self
    }

    /// Enrich `films`, preserving input order. Lookup failures and index
    /// gaps degrade individual fields; they never fail the batch.
    pub async fn enrich(&self, films: &[RawFilm]) -> Enriched {
        let mut summary = EnrichSummary {
            input: films.len(),
            ..EnrichSummary::default()
        };

        let dated: Vec<&RawFilm> = films
            .iter()
            .filter(|f| {
                if f.release_date.is_none() {
                    warn!(target = "enrich", film_id = f.id, title = %f.title, "no release date; dropping");
                    false
                } else {
                    true
                }
            })
            .collect();
        summary.undated = films.len() - dated.len();

        // Partition before any fan-out: only incomplete films with a join key
        // are sent to the secondary source.
        let mut secondary_keys: Vec<&str> = Vec::new();
        for film in &dated {
            if film.has_complete_financials() {
                summary.complete += 1;
                continue;
            }
            summary.incomplete += 1;
            match film.imdb_id.as_deref() {
                Some(id) => secondary_keys.push(id),
                None => {
                    summary.missing_join_key += 1;
                    let err = PipelineError::MissingJoinKey { film_id: film.id };
                    debug!(target = "enrich", error = %err, "financial fallback skipped");
                }
            }
        }

        let financial = self.financial;
        let secondary = self
            .lookup_chunked(financial.name(), &secondary_keys, |id| financial.lookup(id))
            .await;

        let rating_keys: Vec<&str> = match (self.ratings, self.options.attach_ratings) {
            (Some(_), true) => dated.iter().filter_map(|f| f.imdb_id.as_deref()).collect(),
            _ => Vec::new(),
        };
        let ratings = match self.ratings {
            Some(source) if !rating_keys.is_empty() => {
                self.lookup_chunked(source.name(), &rating_keys, |id| source.lookup(id))
                    .await
            }
            _ => Vec::new(),
        };

        let mut secondary = secondary.into_iter();
        let mut ratings = ratings.into_iter();
        let ratings_requested = self.ratings.is_some() && self.options.attach_ratings;
        let mut gap_years = BTreeSet::new();
        let mut records = Vec::with_capacity(dated.len());

        for &film in &dated {
            let Some(release_date) = film.release_date else {
                continue;
            };
            let primary = Financials::new(film.budget, film.revenue);
            let (reconciled, financial_lookup) = if primary.is_complete() {
                (Reconciled::primary_only(primary), LookupStatus::Skipped)
            } else if film.imdb_id.is_none() {
                (Reconciled::primary_only(primary), LookupStatus::MissingJoinKey)
            } else {
                match secondary.next().flatten() {
                    Some(figures) => {
                        summary.financial_fetched += 1;
                        (reconcile(primary, figures.into()), LookupStatus::Fetched)
                    }
                    None => {
                        summary.financial_failed += 1;
                        (Reconciled::primary_only(primary), LookupStatus::Failed)
                    }
                }
            };

            let (scores, rating_lookup) = if !ratings_requested {
                (RatingScores::default(), LookupStatus::Skipped)
            } else if film.imdb_id.is_none() {
                (RatingScores::default(), LookupStatus::MissingJoinKey)
            } else {
                match ratings.next().flatten() {
                    Some(scores) => {
                        summary.ratings_fetched += 1;
                        (scores, LookupStatus::Fetched)
                    }
                    None => {
                        summary.ratings_failed += 1;
                        (RatingScores::default(), LookupStatus::Failed)
                    }
                }
            };

            let record = self.derive(
                film,
                release_date,
                reconciled,
                financial_lookup,
                scores,
                rating_lookup,
            );
            if record.budget_adj.is_none() {
                summary.index_gaps += 1;
                gap_years.insert(record.year);
            }
            records.push(record);
        }

        if !gap_years.is_empty() {
            warn!(
                target = "enrich",
                years = ?gap_years,
                records = summary.index_gaps,
                reference_year = self.adjuster.reference_year(),
                "inflation index has no data; adjusted fields left empty"
            );
        }
        info!(target = "enrich", summary = ?summary, "enrichment complete");

        Enriched { records, summary }
    }

    fn derive(
        &self,
        film: &RawFilm,
        release_date: NaiveDate,
        reconciled: Reconciled,
        financial_lookup: LookupStatus,
        ratings: RatingScores,
        rating_lookup: LookupStatus,
    ) -> FilmRecord {
        let year = release_date.year();

        let adjust = |amount: u64| match self.adjuster.adjust(amount, year) {
            Ok(v) => Some(v),
            Err(err) => {
                debug!(target = "enrich", film_id = film.id, error = %err, "inflation adjustment skipped");
                None
            }
        };
        let budget_adj = adjust(reconciled.budget);
        let revenue_adj = adjust(reconciled.revenue);
        let profit_adj = match (revenue_adj, budget_adj) {
            (Some(r), Some(b)) => Some(r - b),
            _ => None,
        };

        FilmRecord {
            id: film.id,
            imdb_id: film.imdb_id.clone(),
            title: film.title.clone(),
            release_date,
            genres: film.genres.clone(),
            runtime: film.runtime,
            vote_average: film.vote_average,
            vote_count: film.vote_count,
            popularity: film.popularity,
            budget: film.budget,
            revenue: film.revenue,
            budget_final: reconciled.budget,
            revenue_final: reconciled.revenue,
            budget_origin: reconciled.budget_origin,
            revenue_origin: reconciled.revenue_origin,
            financial_lookup,
            budget_adj,
            revenue_adj,
            profit: reconciled.profit(),
            profit_adj,
            year,
            decade: decade_of(year),
            budget_bin: BudgetBin::classify(reconciled.budget as f64),
            budget_adj_bin: budget_adj.and_then(BudgetBin::classify),
            ratings,
            rating_lookup,
            credits: film.credits.clone(),
        }
    }

    /// Run `fetch` for every key in chunks, keeping key order. A failed
    /// lookup yields `None` and is logged; it does not affect other keys or
    /// chunks.
    async fn lookup_chunked<'k, T, Fut>(
        &self,
        source_name: &'static str,
        keys: &[&'k str],
        fetch: impl Fn(&'k str) -> Fut,
    ) -> Vec<Option<T>>
    where
        Fut: Future<Output = anyhow::Result<T>>,
    {
        let chunk_size = self.options.lookup_chunk_size.max(1);
        let concurrency = self.options.lookup_concurrency.max(1);
        let chunks = keys.len().div_ceil(chunk_size);
        let mut out = Vec::with_capacity(keys.len());

        for (idx, chunk) in keys.chunks(chunk_size).enumerate() {
            let results: Vec<anyhow::Result<T>> = stream::iter(chunk.iter().map(|k| fetch(*k)))
                .buffered(concurrency)
                .collect()
                .await;
            let mut failed = 0usize;
            for (key, result) in chunk.iter().zip(results) {
                match result {
                    Ok(value) => out.push(Some(value)),
                    Err(e) => {
                        failed += 1;
                        let err = PipelineError::source_unavailable(source_name, *key, &e);
                        warn!(target = "enrich", error = %err, "lookup degraded to unknown");
                        out.push(None);
                    }
                }
            }
            info!(
                target = "enrich",
                source = source_name,
                chunk = idx + 1,
                chunks,
                size = chunk.len(),
                failed,
                "lookup chunk done"
            );
        }
        out
    }
}
