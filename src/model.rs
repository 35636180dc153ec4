//! Film, credit and leaderboard records shared by every pipeline stage.

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::PipelineError;
use crate::normalization::BudgetBin;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gender {
    Unknown,
    Female,
    Male,
    NonBinary,
}

impl Gender {
    /// TMDb encodes gender as 0 (not set), 1, 2, 3.
    pub fn from_tmdb(code: i64) -> Option<Self> {
        match code {
            0 => Some(Gender::Unknown),
            1 => Some(Gender::Female),
            2 => Some(Gender::Male),
            3 => Some(Gender::NonBinary),
            _ => None,
        }
    }
}

/// Role a person holds on one film.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CreditRole {
    Director,
    Actor,
    /// Any other crew job, by its source label ("Screenplay", "Producer", ...).
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Credit {
    pub person_name: String,
    pub role: CreditRole,
    pub gender: Option<Gender>,
}

impl Credit {
    pub fn new(person_name: impl Into<String>, role: CreditRole, gender: Option<Gender>) -> Self {
        Self {
            person_name: person_name.into(),
            role,
            gender,
        }
    }
}

/// Roles that have leaderboards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LeaderboardRole {
    Director,
    Actor,
}

impl LeaderboardRole {
    pub fn matches(self, role: &CreditRole) -> bool {
        matches!(
            (self, role),
            (LeaderboardRole::Director, CreditRole::Director)
                | (LeaderboardRole::Actor, CreditRole::Actor)
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LeaderboardRole::Director => "director",
            LeaderboardRole::Actor => "actor",
        }
    }
}

impl fmt::Display for LeaderboardRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LeaderboardRole {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "director" | "directors" => Ok(LeaderboardRole::Director),
            "actor" | "actors" | "cast" => Ok(LeaderboardRole::Actor),
            _ => Err(PipelineError::InvalidRole(s.to_string())),
        }
    }
}

impl TryFrom<&CreditRole> for LeaderboardRole {
    type Error = PipelineError;

    fn try_from(role: &CreditRole) -> Result<Self, Self::Error> {
        match role {
            CreditRole::Director => Ok(LeaderboardRole::Director),
            CreditRole::Actor => Ok(LeaderboardRole::Actor),
            CreditRole::Other(job) => Err(PipelineError::InvalidRole(job.clone())),
        }
    }
}

/// Time partition for leaderboards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    #[default]
    None,
    Year,
    Decade,
}

impl FromStr for Dimension {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "" | "none" | "all" => Ok(Dimension::None),
            "year" | "years" => Ok(Dimension::Year),
            "decade" | "decades" => Ok(Dimension::Decade),
            other => Err(PipelineError::Config(format!(
                "unknown ranking dimension {other:?} (expected none, year or decade)"
            ))),
        }
    }
}

/// `floor(year / 10) * 10`, flooring toward negative infinity.
pub fn decade_of(year: i32) -> i32 {
    year.div_euclid(10) * 10
}

/// One page of discovery results from the metadata source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SearchPage {
    pub page: u32,
    pub total_pages: u32,
    pub results: Vec<FilmSummary>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilmSummary {
    pub id: u64,
    pub title: String,
    pub release_date: Option<NaiveDate>,
}

/// Film as reported by the metadata source, before reconciliation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawFilm {
    pub id: u64,
    pub imdb_id: Option<String>,
    pub title: String,
    pub release_date: Option<NaiveDate>,
    pub genres: BTreeSet<u32>,
    /// `0` means unknown.
    pub budget: u64,
    /// `0` means unknown.
    pub revenue: u64,
    pub runtime: Option<u32>,
    pub vote_average: Option<f64>,
    pub vote_count: Option<u64>,
    pub popularity: Option<f64>,
    pub credits: Vec<Credit>,
}

impl RawFilm {
    pub fn has_complete_financials(&self) -> bool {
        self.budget != 0 && self.revenue != 0
    }
}

/// Budget/revenue pair from a financial source. `None` is unknown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialFigures {
    pub budget: Option<u64>,
    pub revenue: Option<u64>,
}

/// Scores from the rating source, each on its native scale:
/// Rotten Tomatoes and Metacritic 0-100, IMDb 0-10.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RatingScores {
    pub rt_score: Option<f64>,
    pub metacritic_score: Option<f64>,
    pub imdb_score: Option<f64>,
}

/// Which source a reconciled value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    Primary,
    Secondary,
    /// Neither source knew; the value is the `0` sentinel.
    Unknown,
}

/// Outcome of a per-record lookup against a secondary or rating source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupStatus {
    /// No lookup was needed or requested.
    Skipped,
    MissingJoinKey,
    Fetched,
    Failed,
}

/// Fully enriched film record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilmRecord {
    pub id: u64,
    pub imdb_id: Option<String>,
    pub title: String,
    pub release_date: NaiveDate,
    pub genres: BTreeSet<u32>,
    pub runtime: Option<u32>,
    pub vote_average: Option<f64>,
    pub vote_count: Option<u64>,
    pub popularity: Option<f64>,

    pub budget: u64,
    pub revenue: u64,
    pub budget_final: u64,
    pub revenue_final: u64,
    pub budget_origin: Origin,
    pub revenue_origin: Origin,
    pub financial_lookup: LookupStatus,

    pub budget_adj: Option<f64>,
    pub revenue_adj: Option<f64>,
    pub profit: i64,
    pub profit_adj: Option<f64>,

    pub year: i32,
    pub decade: i32,
    pub budget_bin: Option<BudgetBin>,
    pub budget_adj_bin: Option<BudgetBin>,

    #[serde(flatten)]
    pub ratings: RatingScores,
    pub rating_lookup: LookupStatus,

    pub credits: Vec<Credit>,
}

impl FilmRecord {
    /// Value of the partition key for a dimension.
    pub fn period(&self, dimension: Dimension) -> Option<i32> {
        match dimension {
            Dimension::None => None,
            Dimension::Year => Some(self.year),
            Dimension::Decade => Some(self.decade),
        }
    }
}

/// One leaderboard entry for a person, optionally within a year or decade.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingRow {
    pub person_name: String,
    pub year: Option<i32>,
    pub decade: Option<i32>,
    pub films: usize,
    pub total_profit_adj: f64,
    pub total_budget_adj: f64,
    pub average_profit_adj: f64,
    pub profit_rank: usize,
    pub budget_rank: usize,
    pub average_profit_rank: usize,
    pub gender: Option<Gender>,
}

impl RankingRow {
    pub fn period(&self) -> Option<i32> {
        self.year.or(self.decade)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decade_floors() {
        assert_eq!(decade_of(1999), 1990);
        assert_eq!(decade_of(2000), 2000);
        assert_eq!(decade_of(2019), 2010);
        assert_eq!(decade_of(0), 0);
        assert_eq!(decade_of(-1), -10);
        assert_eq!(decade_of(-10), -10);
        assert_eq!(decade_of(-11), -20);
    }

    #[test]
    fn decade_is_always_a_multiple_of_ten() {
        for year in -35..2100 {
            let decade = decade_of(year);
            assert_eq!(decade % 10, 0);
            assert!(decade <= year && year - decade < 10);
        }
    }

    #[test]
    fn leaderboard_role_parsing_is_strict() {
        assert_eq!("Director".parse::<LeaderboardRole>(), Ok(LeaderboardRole::Director));
        assert_eq!(" actor ".parse::<LeaderboardRole>(), Ok(LeaderboardRole::Actor));
        assert_eq!(
            "producer".parse::<LeaderboardRole>(),
            Err(PipelineError::InvalidRole("producer".into()))
        );
        assert_eq!(
            LeaderboardRole::try_from(&CreditRole::Other("Screenplay".into())),
            Err(PipelineError::InvalidRole("Screenplay".into()))
        );
        assert_eq!(
            LeaderboardRole::try_from(&CreditRole::Actor),
            Ok(LeaderboardRole::Actor)
        );
    }

    #[test]
    fn role_matching() {
        assert!(LeaderboardRole::Director.matches(&CreditRole::Director));
        assert!(!LeaderboardRole::Director.matches(&CreditRole::Actor));
        assert!(!LeaderboardRole::Actor.matches(&CreditRole::Other("Actor".into())));
    }

    #[test]
    fn dimension_parsing() {
        assert_eq!("decade".parse::<Dimension>(), Ok(Dimension::Decade));
        assert_eq!("YEAR".parse::<Dimension>(), Ok(Dimension::Year));
        assert_eq!("none".parse::<Dimension>(), Ok(Dimension::None));
        assert!("century".parse::<Dimension>().is_err());
    }

    #[test]
    fn tmdb_gender_codes() {
        assert_eq!(Gender::from_tmdb(1), Some(Gender::Female));
        assert_eq!(Gender::from_tmdb(3), Some(Gender::NonBinary));
        assert_eq!(Gender::from_tmdb(9), None);
    }
}
