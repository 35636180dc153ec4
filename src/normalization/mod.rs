pub mod binning;
pub mod inflation;
pub mod rating;

pub use binning::BudgetBin;
pub use inflation::{CpiTable, InflationAdjuster, InflationIndex};
pub use rating::RatingMapper;
