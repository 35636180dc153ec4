pub mod provider;

pub use provider::TmdbProvider;
