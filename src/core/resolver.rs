use crate::core::mapper::FieldMapper;
use crate::core::registry::CountryContext;
use crate::core::{request, zip_code};
use crate::domain::model::{Country, RawResponse, ServiceResult, WebServiceConfig, ZipValue};
use crate::domain::ports::{CountryRepository, HttpClient};
use crate::utils::error::{Result, ZipCodeError};
use crate::utils::validation::Validate;
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::fmt;

pub const DEFAULT_COUNTRY: &str = "BR";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResolutionStage {
    #[default]
    Idle,
    Validating,
    Selecting,
    Querying,
    Mapping,
    Done,
}

impl fmt::Display for ResolutionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Validating => "validating",
            Self::Selecting => "selecting",
            Self::Querying => "querying",
            Self::Mapping => "mapping",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Default)]
pub struct ResolverOptions {
    /// Try the next configured service after a transport failure or an empty
    /// result. Off by default: a lookup asks exactly one service.
    pub advance_on_failure: bool,
    /// Merged over every service's own query parameters.
    pub query_parameters: IndexMap<String, String>,
}

/// Which service a lookup should ask.
#[derive(Debug, Clone, PartialEq)]
pub enum ServiceTarget {
    Named(String),
    Service(WebServiceConfig),
}

impl From<&str> for ServiceTarget {
    fn from(name: &str) -> Self {
        Self::Named(name.to_string())
    }
}

impl From<String> for ServiceTarget {
    fn from(name: String) -> Self {
        Self::Named(name)
    }
}

impl From<WebServiceConfig> for ServiceTarget {
    fn from(service: WebServiceConfig) -> Self {
        Self::Service(service)
    }
}

impl From<&WebServiceConfig> for ServiceTarget {
    fn from(service: &WebServiceConfig) -> Self {
        Self::Service(service.clone())
    }
}

/// Resolves zip codes against the active country's web services.
///
/// Holds the active country plus the zip and result of the latest lookup.
/// Mutating operations take `&mut self`; share an instance behind a lock if
/// several tasks need it.
pub struct ZipResolver<H: HttpClient, R: CountryRepository> {
    http: H,
    repository: R,
    country: CountryContext,
    options: ResolverOptions,
    zip: Option<ZipValue>,
    result: ServiceResult,
    stage: ResolutionStage,
}

impl<H: HttpClient, R: CountryRepository> ZipResolver<H, R> {
    /// Start with the default country (Brazil).
    pub fn new(http: H, repository: R) -> Result<Self> {
        Self::with_country(http, repository, DEFAULT_COUNTRY)
    }

    pub fn with_country(http: H, repository: R, country_id: &str) -> Result<Self> {
        let country = Self::load_country(&repository, country_id)?;
        Ok(Self {
            http,
            repository,
            country: CountryContext::new(country),
            options: ResolverOptions::default(),
            zip: None,
            result: ServiceResult::empty(),
            stage: ResolutionStage::Idle,
        })
    }

    pub fn with_options(mut self, options: ResolverOptions) -> Self {
        self.options = options;
        self
    }

    fn load_country(repository: &R, country_id: &str) -> Result<Country> {
        let country = repository
            .load_country(country_id)?
            .ok_or_else(|| ZipCodeError::not_found(format!("country '{}'", country_id)))?;
        country.validate()?;
        Ok(country)
    }

    fn reset(&mut self) {
        self.zip = None;
        self.result = ServiceResult::empty();
        self.stage = ResolutionStage::Idle;
    }

    fn enter(&mut self, stage: ResolutionStage) {
        tracing::debug!("🔁 {} -> {}", self.stage, stage);
        self.stage = stage;
    }

    pub fn set_country(&mut self, country_id: &str) -> Result<()> {
        let country = Self::load_country(&self.repository, country_id)?;
        tracing::info!("🌎 Switching to country {} ({})", country.id, country.name);
        self.country.set_country_data(country);
        self.reset();
        Ok(())
    }

    /// Install a pre-built country, bypassing the repository.
    pub fn set_country_data(&mut self, country: Country) {
        self.country.set_country_data(country);
        self.reset();
    }

    pub fn country(&self) -> &CountryContext {
        &self.country
    }

    pub fn country_mut(&mut self) -> &mut CountryContext {
        &mut self.country
    }

    pub fn available_countries(&self) -> Vec<String> {
        self.repository.country_ids()
    }

    pub fn validate_zip(&self, zip: &str) -> Result<ZipValue> {
        zip_code::validate(zip, self.country.zip_length())
    }

    pub fn clear_zip(zip: &str) -> String {
        zip_code::clear(zip)
    }

    pub fn format_zip(zip: &str, mask: &str) -> Result<String> {
        zip_code::format(zip, mask)
    }

    pub fn set_zip(&mut self, zip: &str) -> Result<&ZipValue> {
        let zip = self.validate_zip(zip)?;
        let stored = self.zip.insert(zip);
        Ok(&*stored)
    }

    pub fn zip(&self) -> Option<&ZipValue> {
        self.zip.as_ref()
    }

    pub fn web_services(&self) -> &[WebServiceConfig] {
        self.country.web_services()
    }

    pub fn clear_web_services_list(&mut self) {
        self.country.clear_web_services();
    }

    pub fn web_service_by_name(&self, name: &str) -> Result<&WebServiceConfig> {
        self.country.web_service_by_name(name)
    }

    pub fn set_query_parameter(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.options.query_parameters.insert(key.into(), value.into());
    }

    pub fn query_parameters(&self) -> &IndexMap<String, String> {
        &self.options.query_parameters
    }

    pub fn set_user_agent(&self, value: &str) {
        self.http.set_user_agent(value);
    }

    pub fn user_agent(&self) -> String {
        self.http.user_agent()
    }

    pub fn result(&self) -> &ServiceResult {
        &self.result
    }

    pub fn errors(&self) -> &[String] {
        self.result.errors()
    }

    pub fn stage(&self) -> ResolutionStage {
        self.stage
    }

    /// True only if every configured service answers a ping.
    pub async fn check_web_services(&self) -> bool {
        let services = self.web_services();
        if services.is_empty() {
            tracing::warn!("⚠️ No web services configured for {}", self.country.id());
            return false;
        }

        for service in services {
            if !self.http.ping(service).await {
                tracing::warn!("⚠️ {}: ping failed", service.name);
                return false;
            }
            tracing::debug!("✅ {}: reachable", service.name);
        }

        true
    }

    /// Look `zip` up on the first configured service.
    pub async fn find(&mut self, zip: &str) -> Result<ServiceResult> {
        self.resolve(zip, None).await
    }

    /// Look `zip` up on a service given by name or as a resolved configuration.
    pub async fn find_on(
        &mut self,
        zip: &str,
        target: impl Into<ServiceTarget>,
    ) -> Result<ServiceResult> {
        self.resolve(zip, Some(target.into())).await
    }

    /// Query and map one given service, without selection and without touching
    /// the resolver's last zip or result.
    pub async fn gather_information_from_zip(
        &self,
        zip: &str,
        service: &WebServiceConfig,
    ) -> Result<ServiceResult> {
        let zip = self.validate_zip(zip)?;
        let service = request::with_parameters(service, &self.options.query_parameters);
        let raw = self.query(&zip, &service).await?;
        Ok(self.map(&raw, &zip, &service))
    }

    /// A failed lookup leaves no zip, no result and the `Idle` stage behind.
    async fn resolve(&mut self, raw_zip: &str, target: Option<ServiceTarget>) -> Result<ServiceResult> {
        let outcome = self.run_lookup(raw_zip, target).await;
        if outcome.is_err() {
            self.reset();
        }
        outcome
    }

    async fn run_lookup(
        &mut self,
        raw_zip: &str,
        target: Option<ServiceTarget>,
    ) -> Result<ServiceResult> {
        self.result = ServiceResult::empty();

        self.enter(ResolutionStage::Validating);
        let zip = self.validate_zip(raw_zip)?;
        self.zip = Some(zip.clone());

        self.enter(ResolutionStage::Selecting);
        let candidates: Vec<WebServiceConfig> = match target {
            Some(ServiceTarget::Named(name)) => vec![self.web_service_by_name(&name)?.clone()],
            Some(ServiceTarget::Service(service)) => vec![service],
            None if self.options.advance_on_failure => self.web_services().to_vec(),
            None => self.web_services().iter().take(1).cloned().collect(),
        };

        if candidates.is_empty() {
            tracing::warn!(
                "⚠️ No web services configured for {}, returning an empty result",
                self.country.id()
            );
            self.enter(ResolutionStage::Done);
            return Ok(self.result.clone());
        }

        let mut outcome: Option<ServiceResult> = None;
        let mut last_error: Option<ZipCodeError> = None;

        for candidate in &candidates {
            let service = request::with_parameters(candidate, &self.options.query_parameters);

            self.enter(ResolutionStage::Querying);
            tracing::info!("🔍 Looking up {} on {}", zip, service.name);
            let raw = match self.query(&zip, &service).await {
                Ok(raw) => raw,
                Err(e) if self.options.advance_on_failure && e.is_transport() => {
                    tracing::warn!("⚠️ {}: {}, trying next web service", service.name, e);
                    last_error = Some(e);
                    continue;
                }
                Err(e) => {
                    tracing::error!("❌ {}: {}", service.name, e);
                    return Err(e);
                }
            };

            self.enter(ResolutionStage::Mapping);
            let result = self.map(&raw, &zip, &service);
            let empty = result.is_empty();
            outcome = Some(result);

            if !empty {
                break;
            }
            if self.options.advance_on_failure {
                tracing::info!("🔶 {}: empty result, trying next web service", service.name);
            }
        }

        self.enter(ResolutionStage::Done);
        match (outcome, last_error) {
            (Some(result), _) => {
                tracing::info!(
                    "📊 {}: {} fields, {} errors{}",
                    result.source_service_name().unwrap_or_default(),
                    result.fields().len(),
                    result.errors().len(),
                    if result.is_empty() { " (empty)" } else { "" }
                );
                self.result = result.clone();
                Ok(result)
            }
            (None, Some(e)) => Err(e),
            (None, None) => Ok(self.result.clone()),
        }
    }

    async fn query(&self, zip: &ZipValue, service: &WebServiceConfig) -> Result<RawResponse> {
        self.http.consume(service, zip).await
    }

    fn map(&self, raw: &RawResponse, zip: &ZipValue, service: &WebServiceConfig) -> ServiceResult {
        let mut context = Map::new();
        context.insert("zip".to_string(), Value::String(zip.to_string()));
        context.insert(
            "country_id".to_string(),
            Value::String(self.country.id().to_string()),
        );
        context.insert(
            "country_name".to_string(),
            Value::String(self.country.name().to_string()),
        );
        context.insert("web_service".to_string(), Value::String(service.name.clone()));

        let extraction = FieldMapper::new(&service.fields)
            .iterate_on(service.iterate_on.as_deref())
            .extract(raw, &context);

        ServiceResult::new(
            extraction.fields,
            extraction.errors,
            service.name.clone(),
            service.mandatory_fields.clone(),
        )
        .with_unresolved(extraction.unresolved)
    }
}
