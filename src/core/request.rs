use crate::core::zip_code;
use crate::domain::model::{WebServiceConfig, ZipValue};
use crate::utils::error::{Result, ZipCodeError};
use indexmap::IndexMap;
use regex::{Captures, Regex};
use std::collections::HashSet;
use std::sync::LazyLock;
use url::Url;

pub const ZIP_PLACEHOLDER: &str = "zip_code";

static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"%([A-Za-z0-9_]+)%").expect("placeholder pattern is valid"));

/// The zip as the service expects to receive it.
pub fn service_zip(service: &WebServiceConfig, zip: &ZipValue) -> Result<String> {
    if service.zip_format.is_empty() {
        Ok(zip.to_string())
    } else {
        zip_code::format(zip, &service.zip_format)
    }
}

/// `url` + `query` with `%zip_code%` and `%parameter%` placeholders substituted.
/// Parameters not consumed by a placeholder are appended as query pairs.
pub fn build_request_url(service: &WebServiceConfig, zip: &ZipValue) -> Result<Url> {
    let formatted_zip = service_zip(service, zip)?;
    let template = format!("{}{}", service.url, service.query);

    let mut consumed = HashSet::new();
    let mut unresolved = Vec::new();
    let substituted = PLACEHOLDER.replace_all(&template, |caps: &Captures| {
        let name = &caps[1];
        if name == ZIP_PLACEHOLDER {
            return formatted_zip.clone();
        }
        match service.query_parameters.get(name) {
            Some(value) => {
                consumed.insert(name.to_string());
                value.clone()
            }
            None => {
                unresolved.push(name.to_string());
                caps[0].to_string()
            }
        }
    });

    if !unresolved.is_empty() {
        return Err(ZipCodeError::ConfigValidation {
            field: format!("web_services.{}.query", service.name),
            message: format!("Unresolved placeholders: {}", unresolved.join(", ")),
        });
    }

    let mut url = Url::parse(&substituted).map_err(|e| ZipCodeError::InvalidConfigValue {
        field: format!("web_services.{}.url", service.name),
        value: substituted.to_string(),
        reason: e.to_string(),
    })?;

    let remaining: Vec<(&String, &String)> = service
        .query_parameters
        .iter()
        .filter(|(key, _)| !consumed.contains(key.as_str()))
        .collect();
    if !remaining.is_empty() {
        let mut pairs = url.query_pairs_mut();
        for (key, value) in remaining {
            pairs.append_pair(key, value);
        }
    }

    tracing::debug!("📡 {}: Request URL {}", service.name, url);
    Ok(url)
}

/// A copy of `service` with `overrides` merged over its query parameters.
pub fn with_parameters(
    service: &WebServiceConfig,
    overrides: &IndexMap<String, String>,
) -> WebServiceConfig {
    let mut merged = service.clone();
    for (key, value) in overrides {
        merged.query_parameters.insert(key.clone(), value.clone());
    }
    merged
}
