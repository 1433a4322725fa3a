//! Per-country TOML data and the reusable per-service templates it refers to.
//!
//! A country file lists its web services in priority order. Each entry names
//! a service; the template `services/<name>.toml` supplies everything the
//! entry leaves out. Entry values win, and `query_parameters` / `fields` are
//! merged key by key.

use crate::domain::model::{Country, ResultFormat, WebServiceConfig};
use crate::domain::ports::CountryRepository;
use crate::utils::error::{Result, ZipCodeError};
use crate::utils::validation::validate_required_field;
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::{Path, PathBuf};

const BUNDLED_COUNTRIES: &[(&str, &str)] = &[
    ("BR", include_str!("../../data/countries/BR.toml")),
    ("CA", include_str!("../../data/countries/CA.toml")),
    ("DE", include_str!("../../data/countries/DE.toml")),
    ("FR", include_str!("../../data/countries/FR.toml")),
    ("PT", include_str!("../../data/countries/PT.toml")),
    ("US", include_str!("../../data/countries/US.toml")),
];

const BUNDLED_SERVICES: &[(&str, &str)] = &[
    ("geonames", include_str!("../../data/services/geonames.toml")),
    ("opendatasoft", include_str!("../../data/services/opendatasoft.toml")),
    ("postmon", include_str!("../../data/services/postmon.toml")),
    ("republicavirtual", include_str!("../../data/services/republicavirtual.toml")),
    ("viacep", include_str!("../../data/services/viacep.toml")),
    ("zippopotamus", include_str!("../../data/services/zippopotamus.toml")),
];

#[derive(Debug, Deserialize)]
struct CountryFile {
    id: String,
    name: String,
    zip_length: usize,
    #[serde(default)]
    example: String,
    #[serde(default)]
    web_services: Vec<ServiceEntry>,
}

/// A service as listed by a country, or a whole template file (without name).
#[derive(Debug, Default, Deserialize)]
struct ServiceEntry {
    #[serde(default)]
    name: String,
    /// Template to merge; defaults to the lowercased service name.
    template: Option<String>,
    url: Option<String>,
    query: Option<String>,
    result_type: Option<ResultFormat>,
    zip_format: Option<String>,
    #[serde(default)]
    query_parameters: IndexMap<String, String>,
    #[serde(default)]
    fields: IndexMap<String, String>,
    mandatory_fields: Option<Vec<String>>,
    iterate_on: Option<String>,
}

impl ServiceEntry {
    fn template_name(&self) -> String {
        self.template
            .clone()
            .unwrap_or_else(|| self.name.to_lowercase())
    }

    fn merge(self, template: ServiceEntry) -> Result<WebServiceConfig> {
        let url = self.url.or(template.url);
        let url = validate_required_field(&format!("web_services.{}.url", self.name), &url)?;

        let mut query_parameters = template.query_parameters;
        query_parameters.extend(self.query_parameters);

        let mut fields = template.fields;
        fields.extend(self.fields);

        Ok(WebServiceConfig {
            url: url.clone(),
            query: self.query.or(template.query).unwrap_or_default(),
            result_format: self.result_type.or(template.result_type).unwrap_or_default(),
            zip_format: self.zip_format.or(template.zip_format).unwrap_or_default(),
            query_parameters,
            fields: fields
                .into_iter()
                .map(|(field, path)| (field, Some(path).filter(|p| !p.is_empty())))
                .collect(),
            mandatory_fields: self
                .mandatory_fields
                .or(template.mandatory_fields)
                .unwrap_or_default(),
            iterate_on: self.iterate_on.or(template.iterate_on),
            name: self.name,
        })
    }
}

fn parse_toml<T: for<'de> Deserialize<'de>>(source: &str, content: &str) -> Result<T> {
    toml::from_str(content).map_err(|e| ZipCodeError::ConfigValidation {
        field: source.to_string(),
        message: format!("TOML parsing error: {}", e),
    })
}

/// Parse a country file, resolving each service's template through `templates`.
pub fn parse_country<F>(source: &str, content: &str, templates: F) -> Result<Country>
where
    F: Fn(&str) -> Result<Option<String>>,
{
    let file: CountryFile = parse_toml(source, content)?;

    let mut web_services = Vec::with_capacity(file.web_services.len());
    for entry in file.web_services {
        let template_name = entry.template_name();
        let template = match templates(&template_name)? {
            Some(text) => parse_toml(&format!("services/{}.toml", template_name), &text)?,
            None => ServiceEntry::default(),
        };
        web_services.push(entry.merge(template)?);
    }

    Ok(Country {
        id: file.id,
        name: file.name,
        zip_length: file.zip_length,
        example: file.example,
        web_services,
    })
}

fn bundled_template(name: &str) -> Option<String> {
    BUNDLED_SERVICES
        .iter()
        .find(|(key, _)| *key == name)
        .map(|(_, text)| text.to_string())
}

/// Country data compiled into the binary.
#[derive(Debug, Clone, Copy, Default)]
pub struct BundledCountries;

impl CountryRepository for BundledCountries {
    fn load_country(&self, id: &str) -> Result<Option<Country>> {
        let id = id.to_uppercase();
        let Some((_, content)) = BUNDLED_COUNTRIES.iter().find(|(key, _)| *key == id) else {
            return Ok(None);
        };

        parse_country(&format!("countries/{}.toml", id), content, |name| {
            Ok(bundled_template(name))
        })
        .map(Some)
    }

    fn country_ids(&self) -> Vec<String> {
        BUNDLED_COUNTRIES.iter().map(|(id, _)| id.to_string()).collect()
    }
}

/// Country data read at run time from `<root>/countries/<ID>.toml`, with
/// templates from `<root>/services/`, falling back to the bundled ones.
#[derive(Debug, Clone)]
pub struct DirectoryCountries {
    root: PathBuf,
}

impl DirectoryCountries {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn read_optional(path: &Path) -> Result<Option<String>> {
        if !path.is_file() {
            return Ok(None);
        }
        Ok(Some(std::fs::read_to_string(path)?))
    }
}

impl CountryRepository for DirectoryCountries {
    fn load_country(&self, id: &str) -> Result<Option<Country>> {
        let id = id.to_uppercase();
        let path = self.root.join("countries").join(format!("{}.toml", id));
        let Some(content) = Self::read_optional(&path)? else {
            tracing::debug!("📂 No country file at {}", path.display());
            return Ok(None);
        };

        let services = self.root.join("services");
        parse_country(&path.display().to_string(), &content, |name| {
            let template = Self::read_optional(&services.join(format!("{}.toml", name)))?;
            Ok(template.or_else(|| bundled_template(name)))
        })
        .map(Some)
    }

    fn country_ids(&self) -> Vec<String> {
        let Ok(entries) = std::fs::read_dir(self.root.join("countries")) else {
            return Vec::new();
        };

        let mut ids: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().and_then(|e| e.to_str()) == Some("toml"))
            .filter_map(|path| {
                path.file_stem()
                    .and_then(|stem| stem.to_str())
                    .map(str::to_uppercase)
            })
            .collect();
        ids.sort();
        ids
    }
}
