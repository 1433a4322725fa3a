use crate::utils::error::{Result, ZipCodeError};
use std::collections::HashSet;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(ZipCodeError::InvalidConfigValue {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(ZipCodeError::InvalidConfigValue {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(ZipCodeError::InvalidConfigValue {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_positive_number(field_name: &str, value: usize, min_value: usize) -> Result<()> {
    if value < min_value {
        return Err(ZipCodeError::InvalidConfigValue {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ZipCodeError::InvalidConfigValue {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_unique<'a, I>(field_name: &str, values: I) -> Result<()>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut seen = HashSet::new();
    for value in values {
        if !seen.insert(value) {
            return Err(ZipCodeError::InvalidConfigValue {
                field: field_name.to_string(),
                value: value.to_string(),
                reason: "Duplicate entry".to_string(),
            });
        }
    }
    Ok(())
}

pub fn validate_required_field<'a, T>(field_name: &str, value: &'a Option<T>) -> Result<&'a T> {
    value.as_ref().ok_or_else(|| ZipCodeError::MissingConfig {
        field: field_name.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("url", "https://viacep.com.br/ws/").is_ok());
        assert!(validate_url("url", "http://api.zippopotam.us/").is_ok());
        assert!(validate_url("url", "").is_err());
        assert!(validate_url("url", "testwebService").is_err());
        assert!(validate_url("url", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_positive_number() {
        assert!(validate_positive_number("zip_length", 8, 1).is_ok());
        assert!(validate_positive_number("zip_length", 0, 1).is_err());
    }

    #[test]
    fn test_validate_unique() {
        assert!(validate_unique("web_services", ["Geonames", "Zippopotamus"]).is_ok());
        assert!(validate_unique("web_services", ["Geonames", "Geonames"]).is_err());
    }

    #[test]
    fn test_validate_required_field() {
        let present = Some("x".to_string());
        let absent: Option<String> = None;
        assert_eq!(validate_required_field("url", &present).unwrap(), "x");
        assert!(matches!(
            validate_required_field("url", &absent),
            Err(ZipCodeError::MissingConfig { .. })
        ));
    }
}
