use crate::utils::error::{Result, ZipCodeError};
use crate::utils::validation::{self, Validate};
use indexmap::IndexMap;
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::ops::Deref;

/// Arbitrary nested structure returned by a web service.
pub type RawResponse = serde_json::Value;

/// A zip code reduced to letters and digits, checked against a country's length.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ZipValue(String);

impl ZipValue {
    pub(crate) fn new(value: String) -> Self {
        Self(value)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl Deref for ZipValue {
    type Target = str;

    fn deref(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ZipValue {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ZipValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl PartialEq<str> for ZipValue {
    fn eq(&self, other: &str) -> bool {
        self.0 == other
    }
}

impl PartialEq<&str> for ZipValue {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResultFormat {
    #[default]
    Json,
    Xml,
}

/// One configured lookup service. Plain data; every behavior lives in the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebServiceConfig {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub query: String,
    #[serde(default, rename = "result_type")]
    pub result_format: ResultFormat,
    #[serde(default)]
    pub zip_format: String,
    #[serde(default)]
    pub query_parameters: IndexMap<String, String>,
    /// Output field name to response path. `None` means "not extracted".
    #[serde(default, deserialize_with = "deserialize_field_mappings")]
    pub fields: IndexMap<String, Option<String>>,
    #[serde(default)]
    pub mandatory_fields: Vec<String>,
    #[serde(default)]
    pub iterate_on: Option<String>,
}

impl WebServiceConfig {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            query: String::new(),
            result_format: ResultFormat::Json,
            zip_format: String::new(),
            query_parameters: IndexMap::new(),
            fields: IndexMap::new(),
            mandatory_fields: Vec::new(),
            iterate_on: None,
        }
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }

    pub fn with_result_format(mut self, format: ResultFormat) -> Self {
        self.result_format = format;
        self
    }

    pub fn with_zip_format(mut self, mask: impl Into<String>) -> Self {
        self.zip_format = mask.into();
        self
    }

    pub fn with_query_parameter(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query_parameters.insert(key.into(), value.into());
        self
    }

    pub fn with_field(mut self, output: impl Into<String>, path: impl Into<String>) -> Self {
        self.fields.insert(output.into(), Some(path.into()));
        self
    }

    pub fn with_null_field(mut self, output: impl Into<String>) -> Self {
        self.fields.insert(output.into(), None);
        self
    }

    pub fn with_mandatory_field(mut self, output: impl Into<String>) -> Self {
        self.mandatory_fields.push(output.into());
        self
    }

    pub fn with_iterate_on(mut self, path: impl Into<String>) -> Self {
        self.iterate_on = Some(path.into());
        self
    }
}

impl Validate for WebServiceConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_non_empty_string("web_services.name", &self.name)?;
        validation::validate_url(&format!("web_services.{}.url", self.name), &self.url)?;

        for mandatory in &self.mandatory_fields {
            if !self.fields.contains_key(mandatory) {
                return Err(ZipCodeError::InvalidConfigValue {
                    field: format!("web_services.{}.mandatory_fields", self.name),
                    value: mandatory.clone(),
                    reason: "Mandatory field is not declared in fields".to_string(),
                });
            }
        }

        Ok(())
    }
}

/// TOML has no null, so an empty path declares a field that is never extracted.
fn deserialize_field_mappings<'de, D>(
    deserializer: D,
) -> std::result::Result<IndexMap<String, Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = IndexMap::<String, Option<String>>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|(field, path)| (field, path.filter(|p| !p.is_empty())))
        .collect())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Country {
    pub id: String,
    pub name: String,
    pub zip_length: usize,
    #[serde(default)]
    pub example: String,
    /// Configured order is fallback priority.
    #[serde(default)]
    pub web_services: Vec<WebServiceConfig>,
}

impl Country {
    pub fn new(id: impl Into<String>, name: impl Into<String>, zip_length: usize) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            zip_length,
            example: String::new(),
            web_services: Vec::new(),
        }
    }

    pub fn with_example(mut self, example: impl Into<String>) -> Self {
        self.example = example.into();
        self
    }

    pub fn with_web_service(mut self, service: WebServiceConfig) -> Self {
        self.web_services.push(service);
        self
    }
}

impl Validate for Country {
    fn validate(&self) -> Result<()> {
        validation::validate_non_empty_string("id", &self.id)?;
        validation::validate_positive_number("zip_length", self.zip_length, 1)?;
        validation::validate_unique(
            "web_services",
            self.web_services.iter().map(|s| s.name.as_str()),
        )?;

        for service in &self.web_services {
            service.validate()?;
        }

        Ok(())
    }
}

/// Uniform outcome of one lookup.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ServiceResult {
    fields: IndexMap<String, serde_json::Value>,
    errors: Vec<String>,
    source_service_name: Option<String>,
    #[serde(skip)]
    mandatory_fields: Vec<String>,
    /// Fields whose response path did not resolve, even if context filled them.
    #[serde(skip)]
    unresolved: Vec<String>,
}

impl ServiceResult {
    pub fn new(
        fields: IndexMap<String, serde_json::Value>,
        errors: Vec<String>,
        source_service_name: impl Into<String>,
        mandatory_fields: Vec<String>,
    ) -> Self {
        Self {
            fields,
            errors,
            source_service_name: Some(source_service_name.into()),
            mandatory_fields,
            unresolved: Vec::new(),
        }
    }

    /// Record the fields whose response path failed to resolve.
    pub fn with_unresolved(mut self, unresolved: Vec<String>) -> Self {
        self.unresolved = unresolved;
        self
    }

    /// The result of a lookup that had no service to ask.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn fields(&self) -> &IndexMap<String, serde_json::Value> {
        &self.fields
    }

    pub fn get(&self, field: &str) -> Option<&serde_json::Value> {
        self.fields.get(field)
    }

    pub fn get_str(&self, field: &str) -> Option<&str> {
        self.fields.get(field).and_then(|v| v.as_str())
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    pub fn source_service_name(&self) -> Option<&str> {
        self.source_service_name.as_deref()
    }

    /// Mandatory fields that are absent or whose response path failed.
    pub fn missing_mandatory_fields(&self) -> Vec<&str> {
        self.mandatory_fields
            .iter()
            .filter(|field| {
                !self.fields.contains_key(field.as_str()) || self.unresolved.contains(*field)
            })
            .map(String::as_str)
            .collect()
    }

    /// True when a mandatory field is missing.
    ///
    /// Also true when the result holds no fields at all, which covers
    /// `ServiceResult::empty()` and services declaring no mandatory fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty() || !self.missing_mandatory_fields().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn test_service() -> WebServiceConfig {
        WebServiceConfig::new("ViaCep", "https://viacep.com.br/ws/")
            .with_query("%zip_code%/json/")
            .with_zip_format("99999999")
            .with_field("zip", "cep")
            .with_field("state_id", "uf")
            .with_null_field("state_name")
            .with_mandatory_field("state_id")
    }

    #[test]
    fn test_service_validation() {
        assert!(test_service().validate().is_ok());

        let undeclared = test_service().with_mandatory_field("city");
        assert!(matches!(
            undeclared.validate(),
            Err(ZipCodeError::InvalidConfigValue { .. })
        ));
    }

    #[test]
    fn test_country_validation() {
        let country = Country::new("BR", "Brazil", 8).with_web_service(test_service());
        assert!(country.validate().is_ok());

        let zero_length = Country::new("BR", "Brazil", 0);
        assert!(zero_length.validate().is_err());

        let duplicated = Country::new("BR", "Brazil", 8)
            .with_web_service(test_service())
            .with_web_service(test_service());
        assert!(duplicated.validate().is_err());

        // A country without services is degraded, not invalid.
        assert!(Country::new("BR", "Brazil", 8).validate().is_ok());
    }

    #[test]
    fn test_empty_path_means_null_mapping() {
        let service: WebServiceConfig = toml::from_str(
            r#"
name = "Zippopotamus"
url = "http://api.zippopotam.us/"
result_type = "json"

[fields]
zip = "post code"
state_name = ""
"#,
        )
        .unwrap();

        assert_eq!(service.fields.get("zip"), Some(&Some("post code".to_string())));
        assert_eq!(service.fields.get("state_name"), Some(&None));
        assert_eq!(service.result_format, ResultFormat::Json);
        let order: Vec<&str> = service.fields.keys().map(String::as_str).collect();
        assert_eq!(order, vec!["zip", "state_name"]);
    }

    #[test]
    fn test_result_emptiness() {
        let mut fields = IndexMap::new();
        fields.insert("zip".to_string(), json!("20250030"));

        let missing = ServiceResult::new(
            fields.clone(),
            vec![],
            "ViaCep",
            vec!["state_id".to_string()],
        );
        assert!(missing.is_empty());
        assert_eq!(missing.missing_mandatory_fields(), vec!["state_id"]);

        fields.insert("state_id".to_string(), json!("RJ"));
        let complete = ServiceResult::new(fields, vec![], "ViaCep", vec!["state_id".to_string()]);
        assert!(!complete.is_empty());
        assert_eq!(complete.source_service_name(), Some("ViaCep"));
        assert_eq!(complete.get_str("state_id"), Some("RJ"));

        // A mandatory path miss stays a miss even when context fills the field.
        let mut filled = IndexMap::new();
        filled.insert("zip".to_string(), json!("20250030"));
        let context_filled = ServiceResult::new(
            filled,
            vec!["Result field 'zip' was not found.".to_string()],
            "ViaCep",
            vec!["zip".to_string()],
        )
        .with_unresolved(vec!["zip".to_string()]);
        assert!(context_filled.is_empty());
        assert_eq!(context_filled.missing_mandatory_fields(), vec!["zip"]);

        let nothing = ServiceResult::empty();
        assert!(nothing.is_empty());
        assert!(nothing.errors().is_empty());
        assert_eq!(nothing.source_service_name(), None);
    }

    #[test]
    fn test_zip_value_comparisons() {
        let zip = ZipValue::new("20250030".to_string());
        assert_eq!(zip, "20250030");
        assert_eq!(zip.len(), 8);
        assert_eq!(zip.to_string(), "20250030");
    }
}
