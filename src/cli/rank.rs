use std::fs::File;
use std::io::{BufReader, Write};
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use tracing::info;

use crate::error::PipelineError;
use crate::model::{Dimension, FilmRecord, RankingRow};
use crate::pipeline::{rank_by_name, top_n};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Csv,
    Json,
}

impl FromStr for OutputFormat {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(OutputFormat::Csv),
            "json" => Ok(OutputFormat::Json),
            other => Err(PipelineError::Config(format!("unknown output format {other:?}"))),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RankConfig {
    /// Enriched table written by `collect`.
    pub films: PathBuf,
    pub role: String,
    pub by: Dimension,
    /// Rows kept per partition.
    pub top: Option<usize>,
    pub format: OutputFormat,
}

pub async fn run(cfg: RankConfig) -> Result<()> {
    let records = load_records(&cfg.films)?;
    let rows = leaderboard(&records, &cfg)?;
    info!(
        target = "rank",
        films = records.len(),
        rows = rows.len(),
        role = %cfg.role,
        by = ?cfg.by,
        "leaderboard ready"
    );
    let stdout = std::io::stdout();
    render(stdout.lock(), &rows, cfg.format)
}

pub fn load_records(path: &std::path::Path) -> Result<Vec<FilmRecord>> {
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .with_context(|| format!("{} is not an enriched film table", path.display()))
}

pub fn leaderboard(records: &[FilmRecord], cfg: &RankConfig) -> Result<Vec<RankingRow>> {
    let rows = rank_by_name(records, &cfg.role, cfg.by)?;
    Ok(match cfg.top {
        Some(n) => top_n(&rows, n),
        None => rows,
    })
}

pub fn render<W: Write>(mut writer: W, rows: &[RankingRow], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Csv => {
            let mut csv = csv::Writer::from_writer(writer);
            for row in rows {
                csv.serialize(row)?;
            }
            csv.flush()?;
        }
        OutputFormat::Json => {
            serde_json::to_writer_pretty(&mut writer, rows)?;
            writeln!(writer)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Gender;

    fn row(name: &str, decade: Option<i32>, films: usize) -> RankingRow {
        RankingRow {
            person_name: name.to_string(),
            year: None,
            decade,
            films,
            total_profit_adj: 10.0,
            total_budget_adj: 4.0,
            average_profit_adj: 10.0 / films as f64,
            profit_rank: 1,
            budget_rank: 1,
            average_profit_rank: 1,
            gender: Some(Gender::Female),
        }
    }

    #[test]
    fn csv_has_header_and_one_line_per_row() {
        let mut out = Vec::new();
        render(&mut out, &[row("Ava", Some(1990), 2), row("Ben", None, 1)], OutputFormat::Csv).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("person_name,year,decade,films,"));
        assert!(lines[1].starts_with("Ava,,1990,2,"));
        assert!(lines[1].ends_with(",female"));
    }

    #[test]
    fn json_is_an_array() {
        let mut out = Vec::new();
        render(&mut out, &[row("Ava", None, 1)], OutputFormat::Json).unwrap();
        let parsed: Vec<RankingRow> = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed[0].person_name, "Ava");
    }

    #[test]
    fn unknown_role_fails_before_output() {
        let cfg = RankConfig {
            films: PathBuf::from("unused.json"),
            role: "writer".into(),
            by: Dimension::None,
            top: None,
            format: OutputFormat::Csv,
        };
        let err = leaderboard(&[], &cfg).unwrap_err();
        assert_eq!(
            err.downcast_ref::<PipelineError>(),
            Some(&PipelineError::InvalidRole("writer".into()))
        );
    }

    #[test]
    fn format_parses_case_insensitively() {
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!("xml".parse::<OutputFormat>().is_err());
    }

    #[tokio::test]
    async fn run_reads_a_table_written_to_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("films.json");
        std::fs::write(&path, "[]").unwrap();
        let cfg = RankConfig {
            films: path.clone(),
            role: "actor".into(),
            by: Dimension::Decade,
            top: Some(5),
            format: OutputFormat::Json,
        };
        assert!(load_records(&path).unwrap().is_empty());
        run(cfg).await.unwrap();
    }
}
