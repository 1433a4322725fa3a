#[cfg(feature = "cli")]
pub mod cli;
pub mod countries;
pub mod toml_config;

#[cfg(feature = "cli")]
pub use cli::{CliConfig, OutputFormat};
pub use countries::{BundledCountries, DirectoryCountries};
pub use toml_config::ResolverSettings;
