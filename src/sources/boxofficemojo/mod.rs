pub mod provider;

pub use provider::BoxOfficeMojoProvider;
