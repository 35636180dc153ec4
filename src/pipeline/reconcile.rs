//! First-available fallback between the primary and secondary financial
//! sources. `0` is the unknown sentinel on both sides.

use crate::model::{FinancialFigures, Origin};

/// Budget/revenue in sentinel form: `0` means unknown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Financials {
    pub budget: u64,
    pub revenue: u64,
}

impl Financials {
    pub fn new(budget: u64, revenue: u64) -> Self {
        Self { budget, revenue }
    }

    pub fn is_complete(&self) -> bool {
        self.budget != 0 && self.revenue != 0
    }
}

impl From<FinancialFigures> for Financials {
    fn from(f: FinancialFigures) -> Self {
        Self {
            budget: f.budget.unwrap_or(0),
            revenue: f.revenue.unwrap_or(0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reconciled {
    pub budget: u64,
    pub revenue: u64,
    pub budget_origin: Origin,
    pub revenue_origin: Origin,
}

impl Reconciled {
    /// Primary values kept as-is, with no secondary consulted.
    pub fn primary_only(primary: Financials) -> Self {
        reconcile(primary, Financials::default())
    }

    /// Profit on the reconciled figures. Unknown sides count as zero.
    pub fn profit(&self) -> i64 {
        self.revenue as i64 - self.budget as i64
    }
}

/// Pick one field: primary when known, otherwise secondary (which may itself
/// be unknown).
pub fn pick(primary: u64, secondary: u64) -> (u64, Origin) {
    if primary != 0 {
        (primary, Origin::Primary)
    } else if secondary != 0 {
        (secondary, Origin::Secondary)
    } else {
        (0, Origin::Unknown)
    }
}

/// Reconcile budget and revenue independently.
pub fn reconcile(primary: Financials, secondary: Financials) -> Reconciled {
    let (budget, budget_origin) = pick(primary.budget, secondary.budget);
    let (revenue, revenue_origin) = pick(primary.revenue, secondary.revenue);
    Reconciled {
        budget,
        revenue,
        budget_origin,
        revenue_origin,
    }
}
