use crate::core::resolver::{ResolverOptions, DEFAULT_COUNTRY};
use crate::utils::error::{Result, ZipCodeError};
use crate::utils::validation::{self, Validate};
use indexmap::IndexMap;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;
use std::time::Duration;

static ENV_VAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^}]+)\}").expect("env var pattern is valid"));

const LOG_FORMATS: [&str; 2] = ["compact", "json"];

/// Resolver settings file.
///
/// ```toml
/// [resolver]
/// default_country = "US"
/// user_agent = "acme-checkout/2.1"
/// timeout_seconds = 5
/// advance_on_failure = true
/// data_dir = "./data"
///
/// [query_parameters]
/// username = "${GEONAMES_USERNAME}"
///
/// [logging]
/// level = "debug"
/// format = "json"
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResolverSettings {
    #[serde(default)]
    pub resolver: ResolverSection,
    #[serde(default)]
    pub query_parameters: IndexMap<String, String>,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResolverSection {
    pub default_country: Option<String>,
    pub user_agent: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub advance_on_failure: Option<bool>,
    pub data_dir: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub level: Option<String>,
    pub format: Option<String>,
}

impl ResolverSettings {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ZipCodeError::Io)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| ZipCodeError::ConfigValidation {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replace `${VAR}` with the environment value; unknown variables stay as written.
    fn substitute_env_vars(content: &str) -> String {
        ENV_VAR
            .replace_all(content, |caps: &Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .into_owned()
    }

    pub fn default_country(&self) -> &str {
        self.resolver
            .default_country
            .as_deref()
            .unwrap_or(DEFAULT_COUNTRY)
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.resolver.timeout_seconds.map(Duration::from_secs)
    }

    pub fn data_dir(&self) -> Option<&str> {
        self.resolver.data_dir.as_deref()
    }

    pub fn user_agent(&self) -> Option<&str> {
        self.resolver.user_agent.as_deref()
    }

    pub fn log_level(&self) -> Option<&str> {
        self.logging.as_ref().and_then(|l| l.level.as_deref())
    }

    pub fn json_logs(&self) -> bool {
        self.logging
            .as_ref()
            .and_then(|l| l.format.as_deref())
            .map(|format| format == "json")
            .unwrap_or(false)
    }

    pub fn resolver_options(&self) -> ResolverOptions {
        ResolverOptions {
            advance_on_failure: self.resolver.advance_on_failure.unwrap_or(false),
            query_parameters: self.query_parameters.clone(),
        }
    }
}

impl Validate for ResolverSettings {
    fn validate(&self) -> Result<()> {
        validation::validate_non_empty_string("resolver.default_country", self.default_country())?;

        if let Some(user_agent) = self.user_agent() {
            validation::validate_non_empty_string("resolver.user_agent", user_agent)?;
        }

        if let Some(timeout) = self.resolver.timeout_seconds {
            validation::validate_positive_number("resolver.timeout_seconds", timeout as usize, 1)?;
        }

        if let Some(format) = self.logging.as_ref().and_then(|l| l.format.as_deref()) {
            if !LOG_FORMATS.contains(&format) {
                return Err(ZipCodeError::InvalidConfigValue {
                    field: "logging.format".to_string(),
                    value: format.to_string(),
                    reason: format!("Valid formats: {}", LOG_FORMATS.join(", ")),
                });
            }
        }

        Ok(())
    }
}
