pub mod provider;

pub use provider::OmdbProvider;
