pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::ReqwestHttpClient;
pub use config::{BundledCountries, DirectoryCountries, ResolverSettings};
pub use core::resolver::{ResolutionStage, ResolverOptions, ServiceTarget, ZipResolver};
pub use domain::model::{Country, ResultFormat, ServiceResult, WebServiceConfig, ZipValue};
pub use domain::ports::{CountryRepository, HttpClient};
pub use utils::error::{Result, ZipCodeError};
