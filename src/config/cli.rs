use crate::utils::error::{Result, ZipCodeError};
use crate::utils::validation::Validate;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Csv,
}

#[derive(Debug, Clone, Parser)]
#[command(name = "zipcode")]
#[command(about = "Resolve a postal code into address data using public web services")]
pub struct CliConfig {
    /// Zip code to resolve, with or without separators
    pub zip: Option<String>,

    /// Country id, e.g. BR, US, CA
    #[arg(long, short)]
    pub country: Option<String>,

    /// Query this web service instead of the country's first one
    #[arg(long, short)]
    pub service: Option<String>,

    /// Resolver settings file (TOML)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Directory with countries/ and services/ TOML files
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    #[arg(long)]
    pub user_agent: Option<String>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Try the next web service when one fails or returns nothing
    #[arg(long)]
    pub fallback: bool,

    #[arg(long, help = "List the country's web services and exit")]
    pub list_services: bool,

    #[arg(long, help = "Ping every web service of the country and exit")]
    pub check_services: bool,

    #[arg(long, short, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub log_json: bool,
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        if self.zip.is_none() && !self.list_services && !self.check_services {
            return Err(ZipCodeError::MissingConfig {
                field: "zip".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_arguments() {
        let config = CliConfig::parse_from([
            "zipcode", "10006", "--country", "US", "--service", "Zippopotamus", "--format", "json",
        ]);

        assert_eq!(config.zip.as_deref(), Some("10006"));
        assert_eq!(config.country.as_deref(), Some("US"));
        assert_eq!(config.service.as_deref(), Some("Zippopotamus"));
        assert_eq!(config.format, OutputFormat::Json);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zip_required_for_lookups() {
        let config = CliConfig::parse_from(["zipcode"]);
        assert!(config.validate().is_err());

        let listing = CliConfig::parse_from(["zipcode", "--list-services"]);
        assert!(listing.validate().is_ok());
    }
}
