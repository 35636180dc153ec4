//! Runtime settings resolved from the environment (after `.env`), plus the
//! provider wiring that depends on them.

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::error::PipelineError;
use crate::normalization::CpiTable;
use crate::pipeline::{EnrichOptions, DEFAULT_DETAIL_CHUNK_SIZE};
use crate::sources::boxofficemojo::BoxOfficeMojoProvider;
use crate::sources::omdb::OmdbProvider;
use crate::sources::tmdb::TmdbProvider;
use crate::util::env as env_util;

/// Keys logged by the preflight snapshot. Secrets are redacted.
pub const LOGGED_KEYS: &[&str] = &[
    "TMDB_API_KEY",
    "OMDB_API_KEY",
    "TMDB_BASE_URL",
    "BOXOFFICE_BASE_URL",
    "OMDB_BASE_URL",
    "HTTP_TIMEOUT_SECS",
    "DETAIL_CHUNK_SIZE",
    "LOOKUP_CHUNK_SIZE",
    "LOOKUP_CONCURRENCY",
    "REFERENCE_YEAR",
    "CPI_TABLE_PATH",
    "ATTACH_RATINGS",
];

#[derive(Debug, Clone)]
pub struct Settings {
    pub tmdb_api_key: Option<String>,
    /// Ratings are skipped when absent.
    pub omdb_api_key: Option<String>,
    pub tmdb_base_url: Option<String>,
    pub boxoffice_base_url: Option<String>,
    pub omdb_base_url: Option<String>,
    pub http_timeout_secs: u64,
    pub detail_chunk_size: usize,
    pub lookup_chunk_size: usize,
    pub lookup_concurrency: usize,
    pub reference_year: Option<i32>,
    pub cpi_table_path: Option<PathBuf>,
    pub attach_ratings: bool,
}

impl Default for Settings {
    fn default() -> Self {
        let enrich = EnrichOptions::default();
        Self {
            tmdb_api_key: None,
            omdb_api_key: None,
            tmdb_base_url: None,
            boxoffice_base_url: None,
            omdb_base_url: None,
            http_timeout_secs: 15,
            detail_chunk_size: DEFAULT_DETAIL_CHUNK_SIZE,
            lookup_chunk_size: enrich.lookup_chunk_size,
            lookup_concurrency: enrich.lookup_concurrency,
            reference_year: None,
            cpi_table_path: None,
            attach_ratings: enrich.attach_ratings,
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        env_util::init_env();
        let defaults = Self::default();
        Self {
            tmdb_api_key: env_util::env_opt("TMDB_API_KEY"),
            omdb_api_key: env_util::env_opt("OMDB_API_KEY"),
            tmdb_base_url: env_util::env_opt("TMDB_BASE_URL"),
            boxoffice_base_url: env_util::env_opt("BOXOFFICE_BASE_URL"),
            omdb_base_url: env_util::env_opt("OMDB_BASE_URL"),
            http_timeout_secs: env_util::env_parse("HTTP_TIMEOUT_SECS", defaults.http_timeout_secs),
            detail_chunk_size: env_util::env_parse("DETAIL_CHUNK_SIZE", defaults.detail_chunk_size),
            lookup_chunk_size: env_util::env_parse("LOOKUP_CHUNK_SIZE", defaults.lookup_chunk_size),
            lookup_concurrency: env_util::env_parse(
                "LOOKUP_CONCURRENCY",
                defaults.lookup_concurrency,
            ),
            reference_year: env_util::env_parse_opt("REFERENCE_YEAR"),
            cpi_table_path: env_util::env_opt("CPI_TABLE_PATH").map(PathBuf::from),
            attach_ratings: env_util::env_flag("ATTACH_RATINGS", defaults.attach_ratings),
        }
    }

    pub fn enrich_options(&self) -> EnrichOptions {
        EnrichOptions {
            lookup_chunk_size: self.lookup_chunk_size.max(1),
            lookup_concurrency: self.lookup_concurrency.max(1),
            attach_ratings: self.attach_ratings && self.omdb_api_key.is_some(),
        }
    }

    /// The built-in table unless `CPI_TABLE_PATH` points at a CSV, then
    /// re-anchored on `REFERENCE_YEAR` when set.
    pub fn cpi_table(&self) -> Result<CpiTable> {
        let table = match &self.cpi_table_path {
            Some(path) => CpiTable::from_csv_path(path)
                .with_context(|| format!("CPI_TABLE_PATH={}", path.display()))?,
            None => CpiTable::builtin(),
        };
        match self.reference_year {
            Some(year) => table.with_reference_year(year).map_err(|e| {
                PipelineError::Config(format!("REFERENCE_YEAR={year}: {e}")).into()
            }),
            None => Ok(table),
        }
    }

    pub fn tmdb(&self) -> Result<TmdbProvider> {
        let key = self
            .tmdb_api_key
            .as_deref()
            .ok_or_else(|| PipelineError::Config("TMDB_API_KEY is required for collect".into()))?;
        TmdbProvider::new(key, self.tmdb_base_url.as_deref(), Some(self.http_timeout_secs))
    }

    pub fn box_office_mojo(&self) -> Result<BoxOfficeMojoProvider> {
        BoxOfficeMojoProvider::new(self.boxoffice_base_url.as_deref(), Some(self.http_timeout_secs))
    }

    /// `None` when ratings are disabled or no OMDb key is configured.
    pub fn omdb(&self) -> Result<Option<OmdbProvider>> {
        match (&self.omdb_api_key, self.attach_ratings) {
            (Some(key), true) => Ok(Some(OmdbProvider::new(
                key.as_str(),
                self.omdb_base_url.as_deref(),
                Some(self.http_timeout_secs),
            )?)),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::normalization::InflationIndex;
    use std::io::Write;

    #[test]
    fn defaults_match_documented_values() {
        let s = Settings::default();
        assert_eq!(s.http_timeout_secs, 15);
        assert_eq!(s.detail_chunk_size, 250);
        assert_eq!(s.lookup_chunk_size, 100);
        assert_eq!(s.lookup_concurrency, 1);
        assert!(s.attach_ratings);
    }

    #[test]
    fn ratings_need_a_key_and_the_flag() {
        let mut s = Settings::default();
        assert!(!s.enrich_options().attach_ratings);
        assert!(s.omdb().unwrap().is_none());

        s.omdb_api_key = Some("k".into());
        assert!(s.enrich_options().attach_ratings);
        assert!(s.omdb().unwrap().is_some());

        s.attach_ratings = false;
        assert!(!s.enrich_options().attach_ratings);
        assert!(s.omdb().unwrap().is_none());
    }

    #[test]
    fn tmdb_requires_a_key() {
        let err = Settings::default().tmdb().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::Config(_))
        ));
    }

    #[test]
    fn cpi_table_from_csv_and_reference_year() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "year,cpi\n2000,100\n2010,150\n2020,200").unwrap();

        let mut s = Settings {
            cpi_table_path: Some(file.path().to_path_buf()),
            ..Settings::default()
        };
        assert_eq!(s.cpi_table().unwrap().reference_year(), 2020);

        s.reference_year = Some(2010);
        assert_eq!(s.cpi_table().unwrap().reference_year(), 2010);

        s.reference_year = Some(1999);
        let err = s.cpi_table().unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::Config(_))
        ));
    }

    #[test]
    fn builtin_table_by_default() {
        let table = Settings::default().cpi_table().unwrap();
        assert_eq!(table.reference_year(), 2019);
    }
}
