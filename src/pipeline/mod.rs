//! Collection, enrichment and ranking stages.

pub mod collect;
pub mod enrich;
pub mod ranking;
pub mod reconcile;

pub use collect::{collect, fetch_details, search_all, DEFAULT_DETAIL_CHUNK_SIZE};
pub use enrich::{EnrichOptions, EnrichSummary, Enriched, RecordEnricher};
pub use ranking::{competition_ranks, rank, rank_by_name, top_n};
pub use reconcile::{reconcile, Financials, Reconciled};
