use std::collections::HashMap;

use crate::model::RatingScores;

/// How a rating string is written by the rating source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RatingStrategy {
    /// "91%" on a 0-100 scale.
    Percent,
    /// "74/100".
    OutOfHundred,
    /// "8.1" or "8.1/10" on a 0-10 scale.
    OutOfTen,
}

impl RatingStrategy {
    fn max(self) -> f64 {
        match self {
            RatingStrategy::Percent | RatingStrategy::OutOfHundred => 100.0,
            RatingStrategy::OutOfTen => 10.0,
        }
    }
}

/// Which score column a rating feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScoreField {
    RottenTomatoes,
    Metacritic,
    Imdb,
}

#[derive(Debug, Clone)]
pub struct RatingAlias {
    pub field: ScoreField,
    pub strategy: RatingStrategy,
}

impl RatingAlias {
    pub const fn new(field: ScoreField, strategy: RatingStrategy) -> Self {
        Self { field, strategy }
    }
}

/// Maps rating-source labels ("Rotten Tomatoes", "Metacritic", ...) and their
/// raw strings onto typed score columns on their native scale.
#[derive(Debug, Default, Clone)]
pub struct RatingMapper {
    aliases: HashMap<String, RatingAlias>,
}

impl RatingMapper {
    /// Mapper seeded with the labels OMDb reports.
    pub fn with_defaults() -> Self {
        Self::default()
            .register(
                "Rotten Tomatoes",
                RatingAlias::new(ScoreField::RottenTomatoes, RatingStrategy::Percent),
            )
            .register(
                "Metacritic",
                RatingAlias::new(ScoreField::Metacritic, RatingStrategy::OutOfHundred),
            )
            .register(
                "Internet Movie Database",
                RatingAlias::new(ScoreField::Imdb, RatingStrategy::OutOfTen),
            )
            .register(
                "imdbRating",
                RatingAlias::new(ScoreField::Imdb, RatingStrategy::OutOfTen),
            )
    }

    /// Register or override an alias for a source label.
    pub fn register(mut self, label: impl Into<String>, alias: RatingAlias) -> Self {
        self.aliases.insert(label.into().to_ascii_lowercase(), alias);
        self
    }

    /// Parse `raw` for the labelled source. Unknown labels, "N/A", garbage and
    /// out-of-range values all yield `None`.
    pub fn map(&self, label: &str, raw: &str) -> Option<(ScoreField, f64)> {
        let alias = self.aliases.get(&label.trim().to_ascii_lowercase())?;
        let value = parse_score(raw, alias.strategy)?;
        if (0.0..=alias.strategy.max()).contains(&value) {
            Some((alias.field, value))
        } else {
            None
        }
    }

    /// Map a batch of `(label, raw)` pairs into one score set. The first valid
    /// value per column wins.
    pub fn collect<'a, I>(&self, pairs: I) -> RatingScores
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut scores = RatingScores::default();
        for (label, raw) in pairs {
            let Some((field, value)) = self.map(label, raw) else {
                continue;
            };
            let slot = match field {
                ScoreField::RottenTomatoes => &mut scores.rt_score,
                ScoreField::Metacritic => &mut scores.metacritic_score,
                ScoreField::Imdb => &mut scores.imdb_score,
            };
            slot.get_or_insert(value);
        }
        scores
    }
}

fn parse_score(input: &str, strategy: RatingStrategy) -> Option<f64> {
    let trimmed = input.trim();
    let number = match strategy {
        RatingStrategy::Percent => trimmed.strip_suffix('%')?,
        RatingStrategy::OutOfHundred => trimmed
            .strip_suffix("/100")
            .unwrap_or(trimmed),
        RatingStrategy::OutOfTen => trimmed.strip_suffix("/10").unwrap_or(trimmed),
    };
    let number = number.trim();
    if number.is_empty() || !number.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return None;
    }
    number.parse::<f64>().ok()
}
