use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use regex::Regex;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use tracing::debug;

use crate::model::FinancialFigures;
use crate::sources::{truncate_for_log, FinancialSource};

pub const DEFAULT_BASE_URL: &str = "https://www.boxofficemojo.com";

/// Box Office Mojo title pages, scraped for budget and worldwide gross.
///
/// GET /title/{imdb_id}/ renders a summary table where each figure sits in a
/// label span followed by a `money` span. Only the two figures are read;
/// everything else on the page is ignored.
#[derive(Debug, Clone)]
pub struct BoxOfficeMojoProvider {
    base_url: String,
    http: Client,
    budget_re: Regex,
    worldwide_re: Regex,
}

impl BoxOfficeMojoProvider {
    pub fn new(base_url: Option<&str>, timeout_secs: Option<u64>) -> Result<Self> {
        let base_url = base_url
            .unwrap_or(DEFAULT_BASE_URL)
            .trim_end_matches('/')
            .to_string();
        let http = Client::builder()
            .user_agent("Mozilla/5.0 (compatible; boxoffice/0.1)")
            .timeout(Duration::from_secs(timeout_secs.unwrap_or(15)))
            .build()?;
        // The figure must follow its label closely; a dash placeholder means
        // unknown and must not pick up a later figure.
        let budget_re = Regex::new(r">\s*Budget\s*</span>[^$–]{0,200}\$([0-9][0-9,]*)")?;
        let worldwide_re = Regex::new(r">\s*Worldwide\s*</span>[^$–]{0,200}\$([0-9][0-9,]*)")?;
        Ok(Self {
            base_url,
            http,
            budget_re,
            worldwide_re,
        })
    }

    /// Extract budget and worldwide gross from a title page.
    pub fn parse_figures(&self, html: &str) -> FinancialFigures {
        FinancialFigures {
            budget: capture_dollars(&self.budget_re, html),
            revenue: capture_dollars(&self.worldwide_re, html),
        }
    }
}

fn capture_dollars(re: &Regex, html: &str) -> Option<u64> {
    let caps = re.captures(html)?;
    let digits: String = caps
        .get(1)?
        .as_str()
        .chars()
        .filter(|c| c.is_ascii_digit())
        .collect();
    digits.parse::<u64>().ok().filter(|v| *v > 0)
}

fn valid_imdb_id(id: &str) -> bool {
    id.len() > 2 && id.starts_with("tt") && id[2..].chars().all(|c| c.is_ascii_digit())
}

#[async_trait]
impl FinancialSource for BoxOfficeMojoProvider {
    fn name(&self) -> &'static str {
        "boxofficemojo"
    }

    async fn lookup(&self, imdb_id: &str) -> Result<FinancialFigures> {
        if !valid_imdb_id(imdb_id) {
            return Err(anyhow!("not an IMDb title id: {imdb_id:?}"));
        }
        let url = format!("{}/title/{}/", self.base_url, imdb_id);
        let resp = self
            .http
            .get(&url)
            .header("Accept", "text/html")
            .send()
            .await
            .with_context(|| format!("Box Office Mojo request failed: {url}"))?;
        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            debug!(target = "boxofficemojo", imdb_id, "no title page");
            return Ok(FinancialFigures::default());
        }
        if !status.is_success() {
            let body = truncate_for_log(resp.text().await.unwrap_or_default(), 300);
            return Err(anyhow!(
                "Box Office Mojo title fetch failed: {status} url={url} body={body}"
            ));
        }
        let html = resp.text().await?;
        let figures = self.parse_figures(&html);
        debug!(
            target = "boxofficemojo",
            imdb_id,
            budget = ?figures.budget,
            revenue = ?figures.revenue,
            "title page parsed"
        );
        Ok(figures)
    }
}
