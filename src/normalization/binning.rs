//! Budget buckets for nominal and inflation-adjusted budgets.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Budget bucket. Each bucket is closed on its upper bound and open on its
/// lower bound; together they cover `(0, 600M]` with no gaps.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BudgetBin {
    #[serde(rename = "<2M")]
    Under2M,
    #[serde(rename = "2-5M")]
    From2To5M,
    #[serde(rename = "5-10M")]
    From5To10M,
    #[serde(rename = "10-30M")]
    From10To30M,
    #[serde(rename = "30-50M")]
    From30To50M,
    #[serde(rename = "50-100M")]
    From50To100M,
    #[serde(rename = "100-150M")]
    From100To150M,
    #[serde(rename = "150-250M")]
    From150To250M,
    #[serde(rename = "250-300M")]
    From250To300M,
    #[serde(rename = ">300M")]
    Over300M,
}

/// Upper bounds (inclusive), ascending, paired with the bucket they close.
const BOUNDARIES: [(f64, BudgetBin); 10] = [
    (2_000_000.0, BudgetBin::Under2M),
    (5_000_000.0, BudgetBin::From2To5M),
    (10_000_000.0, BudgetBin::From5To10M),
    (30_000_000.0, BudgetBin::From10To30M),
    (50_000_000.0, BudgetBin::From30To50M),
    (100_000_000.0, BudgetBin::From50To100M),
    (150_000_000.0, BudgetBin::From100To150M),
    (250_000_000.0, BudgetBin::From150To250M),
    (300_000_000.0, BudgetBin::From250To300M),
    (600_000_000.0, BudgetBin::Over300M),
];

impl BudgetBin {
    /// Classify an amount. `None` means unbinned: zero (the unknown
    /// sentinel), negative, NaN, or above the top boundary. No clamping.
    pub fn classify(amount: f64) -> Option<Self> {
        if amount.is_nan() || amount <= 0.0 {
            return None;
        }
        BOUNDARIES
            .iter()
            .find(|(upper, _)| amount <= *upper)
            .map(|(_, bin)| *bin)
    }

    pub fn label(self) -> &'static str {
        match self {
            BudgetBin::Under2M => "<2M",
            BudgetBin::From2To5M => "2-5M",
            BudgetBin::From5To10M => "5-10M",
            BudgetBin::From10To30M => "10-30M",
            BudgetBin::From30To50M => "30-50M",
            BudgetBin::From50To100M => "50-100M",
            BudgetBin::From100To150M => "100-150M",
            BudgetBin::From150To250M => "150-250M",
            BudgetBin::From250To300M => "250-300M",
            BudgetBin::Over300M => ">300M",
        }
    }
}

impl fmt::Display for BudgetBin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
