use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::model::RatingScores;
use crate::normalization::RatingMapper;
use crate::sources::{truncate_for_log, RatingSource};

pub const DEFAULT_BASE_URL: &str = "https://www.omdbapi.com";

/// OMDb ratings provider.
///
/// GET /?i={imdb_id}&apikey=... returns a `Ratings` array of
/// `{Source, Value}` pairs plus a top-level `imdbRating`. Values are strings
/// ("88%", "73/100", "8.7/10", "N/A") and go through [`RatingMapper`].
#[derive(Debug, Clone)]
pub struct OmdbProvider {
    base_url: String,
    http: Client,
    api_key: String,
    mapper: RatingMapper,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OmdbTitle {
    response: Option<String>,
    error: Option<String>,
    #[serde(default)]
    ratings: Option<Vec<OmdbRating>>,
    #[serde(rename = "imdbRating")]
    imdb_rating: Option<Value>,
}

/// Entries are kept loose so one malformed value only loses its own score.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OmdbRating {
    source: Option<String>,
    value: Option<Value>,
}

impl OmdbProvider {
    pub fn new(
        api_key: impl Into<String>,
        base_url: Option<&str>,
        timeout_secs: Option<u64>,
    ) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(anyhow!("OMDb api key is empty"));
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
            mapper: RatingMapper::with_defaults(),
        })
    }

    fn scores(&self, title: &OmdbTitle) -> RatingScores {
        let pairs = title
            .ratings
            .iter()
            .flatten()
            .filter_map(|r| Some((r.source.as_deref()?, r.value.as_ref()?.as_str()?)))
            .chain(
                title
                    .imdb_rating
                    .as_ref()
                    .and_then(Value::as_str)
                    .map(|v| ("imdbRating", v)),
            );
        self.mapper.collect(pairs)
    }
}

#[async_trait]
impl RatingSource for OmdbProvider {
    fn name(&self) -> &'static str {
        "omdb"
    }

    async fn lookup(&self, imdb_id: &str) -> Result<RatingScores> {
        let url = format!("{}/", self.base_url);
        let resp = self
            .http
            .get(&url)
            .header("Accept", "application/json")
            .query(&[("i", imdb_id), ("apikey", self.api_key.as_str())])
            .send()
            .await
            .with_context(|| format!("OMDb request failed for {imdb_id}"))?;
        let status = resp.status();
        if !status.is_success() {
            let body = truncate_for_log(resp.text().await.unwrap_or_default(), 300);
            return Err(anyhow!("OMDb lookup failed: {status} imdb_id={imdb_id} body={body}"));
        }
        let title: OmdbTitle = resp
            .json()
            .await
            .with_context(|| format!("OMDb returned an unexpected shape for {imdb_id}"))?;

        if title.response.as_deref() == Some("False") {
            let reason = title.error.unwrap_or_default();
            if reason.to_ascii_lowercase().contains("not found")
                || reason.to_ascii_lowercase().contains("incorrect imdb id")
            {
                debug!(target = "omdb", imdb_id, reason = %reason, "title not found");
                return Ok(RatingScores::default());
            }
            return Err(anyhow!("OMDb rejected {imdb_id}: {reason}"));
        }

        Ok(self.scores(&title))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn provider_for(server: &MockServer) -> OmdbProvider {
        OmdbProvider::new("k", Some(&server.uri()), Some(5)).unwrap()
    }

    #[tokio::test]
    async fn maps_all_three_scores() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .and(query_param("i", "tt0133093"))
            .and(query_param("apikey", "k"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "Title": "The Matrix",
                "imdbRating": "8.7",
                "Ratings": [
                    {"Source": "Internet Movie Database", "Value": "8.7/10"},
                    {"Source": "Rotten Tomatoes", "Value": "88%"},
                    {"Source": "Metacritic", "Value": "73/100"}
                ],
                "Response": "True"
            })))
            .mount(&server)
            .await;

        let scores = provider_for(&server).await.lookup("tt0133093").await.unwrap();
        assert_eq!(
            scores,
            RatingScores {
                rt_score: Some(88.0),
                metacritic_score: Some(73.0),
                imdb_score: Some(8.7),
            }
        );
    }

    #[tokio::test]
    async fn partial_and_na_values_stay_missing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "imdbRating": "N/A",
                "Ratings": [{"Source": "Metacritic", "Value": "N/A"},
                            {"Source": "Rotten Tomatoes", "Value": "64%"}],
                "Response": "True"
            })))
            .mount(&server)
            .await;

        let scores = provider_for(&server).await.lookup("tt1").await.unwrap();
        assert_eq!(scores.rt_score, Some(64.0));
        assert_eq!(scores.metacritic_score, None);
        assert_eq!(scores.imdb_score, None);
    }

    #[tokio::test]
    async fn malformed_entry_only_loses_its_own_score() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "imdbRating": "7.9",
                "Ratings": [
                    {"Source": "Rotten Tomatoes", "Value": "88%"},
                    {"Source": "Metacritic", "Value": null},
                    {"Source": "Internet Movie Database", "Value": 7.9},
                    {"Value": "50/100"}
                ],
                "Response": "True"
            })))
            .mount(&server)
            .await;

        let scores = provider_for(&server).await.lookup("tt1").await.unwrap();
        assert_eq!(
            scores,
            RatingScores {
                rt_score: Some(88.0),
                metacritic_score: None,
                imdb_score: Some(7.9),
            }
        );
    }

    #[tokio::test]
    async fn non_string_imdb_rating_is_missing() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "imdbRating": 8.1,
                "Ratings": null,
                "Response": "True"
            })))
            .mount(&server)
            .await;

        let scores = provider_for(&server).await.lookup("tt2").await.unwrap();
        assert_eq!(scores, RatingScores::default());
    }

    #[tokio::test]
    async fn unknown_title_is_empty_but_bad_key_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("i", "tt404"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "Response": "False", "Error": "Incorrect IMDb ID."
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(query_param("i", "tt401"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "Response": "False", "Error": "Invalid API key!"
            })))
            .mount(&server)
            .await;

        let provider = provider_for(&server).await;
        assert_eq!(
            provider.lookup("tt404").await.unwrap(),
            RatingScores::default()
        );
        let err = provider.lookup("tt401").await.unwrap_err().to_string();
        assert!(err.contains("401"), "{err}");
    }
}
