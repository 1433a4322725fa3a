use thiserror::Error;

#[derive(Error, Debug)]
pub enum ZipCodeError {
    #[error("Invalid zip code '{zip}': {reason}")]
    InvalidZipCode { zip: String, reason: String },

    #[error("Web services not found: {what}")]
    WebServicesNotFound { what: String },

    #[error("Zip '{zip}' is too short for mask '{mask}'")]
    FormatMismatch { zip: String, mask: String },

    #[error("API request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Web service '{service}' answered with status {status}")]
    TransportStatus { service: String, status: u16 },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("XML parsing error: {message}")]
    Xml { message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV output error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValue {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfig { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Input,
    Configuration,
    Transport,
}

impl ZipCodeError {
    pub fn invalid_zip(zip: &str, reason: impl Into<String>) -> Self {
        Self::InvalidZipCode {
            zip: zip.to_string(),
            reason: reason.into(),
        }
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::WebServicesNotFound { what: what.into() }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidZipCode { .. } | Self::FormatMismatch { .. } => ErrorCategory::Input,
            Self::WebServicesNotFound { .. }
            | Self::ConfigValidation { .. }
            | Self::InvalidConfigValue { .. }
            | Self::MissingConfig { .. }
            | Self::Io(_)
            | Self::Csv(_) => ErrorCategory::Configuration,
            // Payload parsing happens inside the transport.
            Self::Transport(_)
            | Self::TransportStatus { .. }
            | Self::Serialization(_)
            | Self::Xml { .. } => ErrorCategory::Transport,
        }
    }

    /// Transport failures are the only kind the opt-in fallback may skip over.
    pub fn is_transport(&self) -> bool {
        self.category() == ErrorCategory::Transport
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Input => "Check the zip code against the country's example format",
            ErrorCategory::Configuration => {
                "Check the country id, service name and configuration files"
            }
            ErrorCategory::Transport => "Check network connectivity or try another web service",
        }
    }
}

pub type Result<T> = std::result::Result<T, ZipCodeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories() {
        assert_eq!(
            ZipCodeError::invalid_zip("2", "too short").category(),
            ErrorCategory::Input
        );
        assert_eq!(
            ZipCodeError::not_found("country 'ZZ'").category(),
            ErrorCategory::Configuration
        );
        let status = ZipCodeError::TransportStatus {
            service: "ViaCep".to_string(),
            status: 500,
        };
        assert!(status.is_transport());
        assert!(!ZipCodeError::not_found("x").is_transport());
    }

    #[test]
    fn test_messages() {
        let err = ZipCodeError::invalid_zip("2", "expected 8 characters, got 1");
        assert_eq!(
            err.to_string(),
            "Invalid zip code '2': expected 8 characters, got 1"
        );
    }
}
