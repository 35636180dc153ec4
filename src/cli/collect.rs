use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDate;
use tracing::info;

use crate::config::{Settings, LOGGED_KEYS};
use crate::model::FilmRecord;
use crate::normalization::InflationIndex;
use crate::pipeline::{self, Enriched, RecordEnricher};
use crate::sources::{FinancialSource, MetadataSource, RatingSource, ReleaseWindow};
use crate::util::env as env_util;

#[derive(Debug, Clone)]
pub struct CollectConfig {
    pub start: NaiveDate,
    pub end: NaiveDate,
    /// Write the enriched table here instead of stdout.
    pub out: Option<PathBuf>,
    pub no_ratings: bool,
}

pub async fn run(cfg: CollectConfig) -> Result<()> {
    let mut settings = Settings::from_env();
    if cfg.no_ratings {
        settings.attach_ratings = false;
    }
    env_util::preflight_check("collect", &["TMDB_API_KEY"], LOGGED_KEYS)?;

    let window = ReleaseWindow::new(cfg.start, cfg.end)?;
    let tmdb = settings.tmdb()?;
    let mojo = settings.box_office_mojo()?;
    let omdb = settings.omdb()?;
    let cpi = settings.cpi_table()?;
    let mut years = cpi.years();
    let first_year = years.next();
    info!(
        target = "collect",
        first_year,
        last_year = years.last().or(first_year),
        reference_year = cpi.reference_year(),
        "inflation index loaded"
    );

    let ratings = omdb.as_ref().map(|o| o as &dyn RatingSource);
    let enriched = collect_and_enrich(&tmdb, &mojo, ratings, &cpi, &window, &settings).await?;

    match cfg.out.as_deref() {
        Some(path) => {
            write_records_to(path, &enriched.records)?;
            info!(target = "collect", path = %path.display(), records = enriched.records.len(), "wrote enriched table");
        }
        None => {
            let stdout = std::io::stdout();
            write_records(stdout.lock(), &enriched.records)?;
        }
    }
    Ok(())
}

/// Discovery, detail fetch and enrichment against the given sources.
pub async fn collect_and_enrich(
    metadata: &dyn MetadataSource,
    financial: &dyn FinancialSource,
    ratings: Option<&dyn RatingSource>,
    index: &dyn InflationIndex,
    window: &ReleaseWindow,
    settings: &Settings,
) -> Result<Enriched> {
    let raw = pipeline::collect(metadata, window, settings.detail_chunk_size).await?;

    let mut enricher = RecordEnricher::new(financial, index).with_options(settings.enrich_options());
    if let Some(source) = ratings {
        enricher = enricher.with_ratings(source);
    }
    let enriched = enricher.enrich(&raw).await;
    info!(target = "collect", summary = ?enriched.summary, "enrichment finished");
    Ok(enriched)
}

pub fn write_records<W: Write>(writer: W, records: &[FilmRecord]) -> Result<()> {
    let mut writer = BufWriter::new(writer);
    serde_json::to_writer_pretty(&mut writer, records).context("serialize enriched table")?;
    writeln!(writer)?;
    writer.flush()?;
    Ok(())
}

fn write_records_to(path: &Path, records: &[FilmRecord]) -> Result<()> {
    let file = File::create(path).with_context(|| format!("create {}", path.display()))?;
    write_records(file, records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Credit, CreditRole, Gender, LookupStatus, Origin, RawFilm};
    use crate::normalization::CpiTable;
    use crate::sources::fakes::{FakeFinancials, FakeMetadata};

    fn raw(id: u64, budget: u64, revenue: u64) -> RawFilm {
        RawFilm {
            id,
            imdb_id: Some(format!("tt{id:07}")),
            title: format!("Film {id}"),
            release_date: NaiveDate::from_ymd_opt(2019, 5, 1),
            genres: Default::default(),
            budget,
            revenue,
            runtime: Some(100),
            vote_average: Some(7.0),
            vote_count: Some(1_000),
            popularity: None,
            credits: vec![Credit::new("Dee", CreditRole::Director, Some(Gender::Female))],
        }
    }

    #[tokio::test]
    async fn collects_enriches_and_writes_json() {
        let metadata = FakeMetadata {
            pages: vec![vec![1], vec![2]],
            films: [(1, raw(1, 0, 1_000_000)), (2, raw(2, 2_000_000, 5_000_000))]
                .into_iter()
                .collect(),
            ..Default::default()
        };
        let financial = FakeFinancials::default().with("tt0000001", Some(500_000), None);
        let cpi = CpiTable::builtin();
        let window = ReleaseWindow::new(
            NaiveDate::from_ymd_opt(2019, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2019, 12, 31).unwrap(),
        )
        .unwrap();

        let enriched = collect_and_enrich(
            &metadata,
            &financial,
            None,
            &cpi,
            &window,
            &Settings::default(),
        )
        .await
        .unwrap();

        assert_eq!(financial.calls(), vec!["tt0000001".to_string()]);
        let first = &enriched.records[0];
        assert_eq!(first.budget_final, 500_000);
        assert_eq!(first.budget_origin, Origin::Secondary);
        assert_eq!(first.financial_lookup, LookupStatus::Fetched);
        assert_eq!(first.rating_lookup, LookupStatus::Skipped);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("films.json");
        write_records_to(&path, &enriched.records).unwrap();
        let loaded: Vec<FilmRecord> =
            serde_json::from_reader(File::open(&path).unwrap()).unwrap();
        assert_eq!(loaded, enriched.records);
    }
}
