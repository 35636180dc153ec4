pub mod collect;
pub mod rank;
