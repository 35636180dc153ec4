//! Film dataset pipeline: collect films from a metadata source, fill missing
//! budget and revenue from a secondary source, adjust for inflation, bin
//! budgets, attach ratings, and rank directors and actors.

pub mod cli;
pub mod config;
pub mod error;
pub mod model;
pub mod normalization;
pub mod pipeline;
pub mod sources;
pub mod tracing;

pub mod util {
    pub mod env;
}

pub use error::PipelineError;
