//! Leaderboards of directors and actors by film count, total adjusted profit,
//! total adjusted budget and average adjusted profit, optionally sliced by
//! release year or decade.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap, HashSet};

use tracing::{debug, warn};

use crate::error::{PipelineError, Result};
use crate::model::{Dimension, FilmRecord, Gender, LeaderboardRole, RankingRow};

#[derive(Debug, Default)]
struct Aggregate {
    films: usize,
    total_profit_adj: f64,
    total_budget_adj: f64,
}

/// Descending competition ranks where ties take the largest rank of their
/// group: each value's rank is the number of values greater than or equal
/// to it. `[100, 100, 80]` ranks as `[2, 2, 3]`.
pub fn competition_ranks(values: &[f64]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[b].total_cmp(&values[a]));

    let mut ranks = vec![0; values.len()];
    let mut greater = 0;
    let mut start = 0;
    while start < order.len() {
        let value = values[order[start]];
        let end = order[start..]
            .iter()
            .position(|&i| values[i].total_cmp(&value) != Ordering::Equal)
            .map_or(order.len(), |offset| start + offset);
        let rank = greater + (end - start);
        for &i in &order[start..end] {
            ranks[i] = rank;
        }
        greater = rank;
        start = end;
    }
    ranks
}

/// Build the leaderboard for `role`, ranked within each `dimension`
/// partition. Every credit counts, so a film with two directors counts once
/// for each of them. Rows are ordered by film count (descending), then
/// person name, then period.
pub fn rank(records: &[FilmRecord], role: LeaderboardRole, dimension: Dimension) -> Vec<RankingRow> {
    let mut groups: BTreeMap<(&str, Option<i32>), Aggregate> = BTreeMap::new();
    let mut genders: HashMap<&str, Option<Gender>> = HashMap::new();
    let mut conflicted: HashSet<&str> = HashSet::new();

    for record in records {
        let period = record.period(dimension);
        for credit in record.credits.iter().filter(|c| role.matches(&c.role)) {
            let name = credit.person_name.as_str();

            let agg = groups.entry((name, period)).or_default();
            agg.films += 1;
            agg.total_profit_adj += record.profit_adj.unwrap_or(0.0);
            agg.total_budget_adj += record.budget_adj.unwrap_or(0.0);

            let first = *genders.entry(name).or_insert(credit.gender);
            if let (Some(kept), Some(seen)) = (first, credit.gender) {
                let known = |g: Gender| g != Gender::Unknown;
                if kept != seen && known(kept) && known(seen) && conflicted.insert(name) {
                    warn!(
                        target = "ranking",
                        person = name,
                        kept = ?kept,
                        seen = ?seen,
                        film_id = record.id,
                        "conflicting gender across credits; keeping first seen"
                    );
                }
            }
        }
    }

    let mut rows: Vec<RankingRow> = groups
        .into_iter()
        .map(|((name, period), agg)| {
            let (year, decade) = match dimension {
                Dimension::None => (None, None),
                Dimension::Year => (period, None),
                Dimension::Decade => (None, period),
            };
            RankingRow {
                person_name: name.to_string(),
                year,
                decade,
                films: agg.films,
                total_profit_adj: agg.total_profit_adj,
                total_budget_adj: agg.total_budget_adj,
                average_profit_adj: agg.total_profit_adj / agg.films as f64,
                profit_rank: 0,
                budget_rank: 0,
                average_profit_rank: 0,
                gender: genders.get(name).copied().flatten(),
            }
        })
        .collect();

    let mut partitions: BTreeMap<Option<i32>, Vec<usize>> = BTreeMap::new();
    for (idx, row) in rows.iter().enumerate() {
        partitions.entry(row.period()).or_default().push(idx);
    }
    for members in partitions.values() {
        let metric = |f: fn(&RankingRow) -> f64| -> Vec<f64> {
            members.iter().map(|&i| f(&rows[i])).collect()
        };
        let profit = competition_ranks(&metric(|r| r.total_profit_adj));
        let budget = competition_ranks(&metric(|r| r.total_budget_adj));
        let average = competition_ranks(&metric(|r| r.average_profit_adj));
        for (pos, &i) in members.iter().enumerate() {
            rows[i].profit_rank = profit[pos];
            rows[i].budget_rank = budget[pos];
            rows[i].average_profit_rank = average[pos];
        }
    }

    rows.sort_by(|a, b| {
        b.films
            .cmp(&a.films)
            .then_with(|| a.person_name.cmp(&b.person_name))
            .then_with(|| a.period().cmp(&b.period()))
    });

    debug!(
        target = "ranking",
        role = %role,
        dimension = ?dimension,
        rows = rows.len(),
        partitions = partitions.len(),
        "leaderboard built"
    );
    rows
}

/// [`rank`] for a role given as text. Anything but director/actor is rejected
/// before any work is done.
pub fn rank_by_name(
    records: &[FilmRecord],
    role: &str,
    dimension: Dimension,
) -> Result<Vec<RankingRow>> {
    let role: LeaderboardRole = role.parse()?;
    Ok(rank(records, role, dimension))
}

/// Keep the first `n` rows of each partition, preserving row order.
pub fn top_n(rows: &[RankingRow], n: usize) -> Vec<RankingRow> {
    let mut seen: HashMap<Option<i32>, usize> = HashMap::new();
    rows.iter()
        .filter(|row| {
            let count = seen.entry(row.period()).or_insert(0);
            *count += 1;
            *count <= n
        })
        .cloned()
        .collect()
}
