use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::BTreeSet;
use std::time::Duration;
use tracing::debug;

use crate::model::{Credit, CreditRole, FilmSummary, Gender, RawFilm, SearchPage};
use crate::sources::{truncate_for_log, MetadataSource, ReleaseWindow};

pub const DEFAULT_BASE_URL: &str = "https://api.themoviedb.org/3";

/// Genre ids excluded from discovery: Documentary, TV Movie.
const EXCLUDED_GENRES: &str = "99|10770";

/// TMDb (The Movie Database) metadata provider.
///
/// Endpoints:
/// - GET /discover/movie - paged discovery over a release window
/// - GET /movie/{id}?append_to_response=credits - detail with cast and crew
///
/// Discovery is limited to US theatrical releases with at least 50 votes,
/// excluding adult titles, documentaries and TV movies.
#[derive(Debug, Clone)]
pub struct TmdbProvider {
    base_url: String,
    http: Client,
    api_key: String,
}

#[derive(Debug, Deserialize)]
struct DiscoverResponse {
    #[serde(default)]
    page: u32,
    #[serde(default)]
    total_pages: u32,
    #[serde(default)]
    results: Vec<DiscoverItem>,
}

#[derive(Debug, Deserialize)]
struct DiscoverItem {
    id: u64,
    title: Option<String>,
    release_date: Option<String>,
}

#[derive(Debug, Deserialize)]
struct MovieDetail {
    id: u64,
    imdb_id: Option<String>,
    title: Option<String>,
    release_date: Option<String>,
    #[serde(default)]
    genres: Vec<GenreRef>,
    budget: Option<u64>,
    revenue: Option<u64>,
    runtime: Option<u32>,
    vote_average: Option<f64>,
    vote_count: Option<u64>,
    popularity: Option<f64>,
    credits: Option<MovieCredits>,
}

#[derive(Debug, Deserialize)]
struct GenreRef {
    id: u32,
}

#[derive(Debug, Default, Deserialize)]
struct MovieCredits {
    #[serde(default)]
    cast: Vec<CastMember>,
    #[serde(default)]
    crew: Vec<CrewMember>,
}

#[derive(Debug, Deserialize)]
struct CastMember {
    name: String,
    gender: Option<i64>,
    order: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct CrewMember {
    name: String,
    gender: Option<i64>,
    job: Option<String>,
}

fn parse_date(raw: Option<&str>) -> Option<NaiveDate> {
    let raw = raw?.trim();
    if raw.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

impl MovieDetail {
    fn into_raw_film(self) -> RawFilm {
        let credits = self.credits.unwrap_or_default();
        let gender = |code: Option<i64>| code.and_then(Gender::from_tmdb);

        let mut out = Vec::with_capacity(credits.cast.len() + credits.crew.len());
        let (directors, others): (Vec<_>, Vec<_>) = credits
            .crew
            .into_iter()
            .partition(|c| c.job.as_deref() == Some("Director"));
        for d in directors {
            out.push(Credit::new(d.name, CreditRole::Director, gender(d.gender)));
        }
        let mut cast = credits.cast;
        // Stable sort keeps source order for entries without a billing slot.
        cast.sort_by_key(|c| c.order.unwrap_or(u32::MAX));
        for c in cast {
            out.push(Credit::new(c.name, CreditRole::Actor, gender(c.gender)));
        }
        for c in others {
            let job = c.job.unwrap_or_else(|| "Crew".to_string());
            out.push(Credit::new(c.name, CreditRole::Other(job), gender(c.gender)));
        }

        RawFilm {
            id: self.id,
            imdb_id: self
                .imdb_id
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            title: self.title.unwrap_or_default(),
            release_date: parse_date(self.release_date.as_deref()),
            genres: self.genres.into_iter().map(|g| g.id).collect::<BTreeSet<_>>(),
            budget: self.budget.unwrap_or(0),
            revenue: self.revenue.unwrap_or(0),
            runtime: self.runtime.filter(|r| *r > 0),
            vote_average: self.vote_average,
            vote_count: self.vote_count,
            popularity: self.popularity,
            credits: out,
        }
    }
}

impl TmdbProvider {
    pub fn new(
        api_key: impl Into<String>,
        base_url: Option<&str>,
        timeout_secs: Option<u64>,
    ) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(anyhow!("TMDb api key is empty"));
        }
        let base_url = base_url
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
            .to_string();
        let http = Client::builder()
            .user_agent("boxoffice/0.1")
            .timeout(Duration::from_secs(timeout_secs.unwrap_or(15)))
            .build()?;
        Ok(Self {
            base_url,
            http,
            api_key,
        })
    }

    fn discover_query(window: &ReleaseWindow, page: u32) -> Vec<(&'static str, String)> {
        vec![
            ("primary_release_date.gte", window.start.format("%Y-%m-%d").to_string()),
            ("primary_release_date.lte", window.end.format("%Y-%m-%d").to_string()),
            ("include_adult", "false".into()),
            ("with_release_type", "3".into()),
            ("region", "US".into()),
            ("sort_by", "vote_average.desc".into()),
            ("vote_count.gte", "50".into()),
            ("without_genres", EXCLUDED_GENRES.into()),
            ("page", page.to_string()),
        ]
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self
            .http
            .get(&url)
            .header("Accept", "application/json")
            .query(&[("api_key", self.api_key.as_str())])
            .query(query)
            .send()
            .await
            .with_context(|| format!("TMDb request failed: {url}"))?;
        let status = resp.status();
        if !status.is_success() {
            let body = truncate_for_log(resp.text().await.unwrap_or_default(), 500);
            return Err(anyhow!("TMDb {path} failed: {status} body={body}"));
        }
        resp.json::<T>()
            .await
            .with_context(|| format!("TMDb {path} returned an unexpected shape"))
    }
}

#[async_trait]
impl MetadataSource for TmdbProvider {
    fn name(&self) -> &'static str {
        "tmdb"
    }

    async fn search_page(&self, window: &ReleaseWindow, page: u32) -> Result<SearchPage> {
        let body: DiscoverResponse = self
            .get_json("/discover/movie", &Self::discover_query(window, page))
            .await?;
        debug!(
            target = "tmdb",
            page = body.page,
            total_pages = body.total_pages,
            results = body.results.len(),
            "discover page"
        );
        Ok(SearchPage {
            page: body.page,
            total_pages: body.total_pages,
            results: body
                .results
                .into_iter()
                .map(|item| FilmSummary {
                    id: item.id,
                    title: item.title.unwrap_or_default(),
                    release_date: parse_date(item.release_date.as_deref()),
                })
                .collect(),
        })
    }

    async fn detail(&self, id: u64) -> Result<RawFilm> {
        let detail: MovieDetail = self
            .get_json(
                &format!("/movie/{id}"),
                &[
                    ("language", "en-US".to_string()),
                    ("append_to_response", "credits".to_string()),
                ],
            )
            .await?;
        Ok(detail.into_raw_film())
    }
}
