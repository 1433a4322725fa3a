use crate::adapters::xml;
use crate::core::request::build_request_url;
use crate::domain::model::{RawResponse, ResultFormat, WebServiceConfig, ZipValue};
use crate::domain::ports::HttpClient;
use crate::utils::error::{Result, ZipCodeError};
use async_trait::async_trait;
use reqwest::header::USER_AGENT;
use reqwest::{Client, StatusCode};
use serde_json::{Map, Value};
use std::sync::RwLock;
use std::time::Duration;
use url::Url;

pub const DEFAULT_USER_AGENT: &str = concat!("zipcode-resolver/", env!("CARGO_PKG_VERSION"));
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 10;

/// `HttpClient` backed by reqwest.
pub struct ReqwestHttpClient {
    client: Client,
    user_agent: RwLock<String>,
    timeout: Duration,
}

impl ReqwestHttpClient {
    pub fn new() -> Self {
        Self::with_timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECONDS))
    }

    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            client: Client::new(),
            user_agent: RwLock::new(DEFAULT_USER_AGENT.to_string()),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn parse_body(service: &WebServiceConfig, body: &str) -> Result<RawResponse> {
        if body.trim().is_empty() {
            return Ok(Value::Object(Map::new()));
        }
        match service.result_format {
            ResultFormat::Json => Ok(serde_json::from_str(body)?),
            ResultFormat::Xml => xml::parse_document(body),
        }
    }
}

impl Default for ReqwestHttpClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HttpClient for ReqwestHttpClient {
    async fn consume(&self, service: &WebServiceConfig, zip: &ZipValue) -> Result<RawResponse> {
        let url = build_request_url(service, zip)?;

        tracing::debug!("📡 {}: Making API request to: {}", service.name, url);
        let response = self
            .client
            .get(url)
            .header(USER_AGENT, self.user_agent())
            .timeout(self.timeout)
            .send()
            .await?;

        let status = response.status();
        tracing::debug!("📡 {}: API response status: {}", service.name, status);

        // Several services answer an unknown zip with 404.
        if status == StatusCode::NOT_FOUND {
            tracing::info!("🔶 {}: zip {} not found", service.name, zip);
            return Ok(Value::Object(Map::new()));
        }

        if !status.is_success() {
            return Err(ZipCodeError::TransportStatus {
                service: service.name.clone(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        Self::parse_body(service, &body)
    }

    async fn ping(&self, service: &WebServiceConfig) -> bool {
        let Ok(url) = Url::parse(&service.url) else {
            return false;
        };

        match self
            .client
            .get(url)
            .header(USER_AGENT, self.user_agent())
            .timeout(self.timeout)
            .send()
            .await
        {
            Ok(response) => !response.status().is_server_error(),
            Err(e) => {
                tracing::debug!("📡 {}: ping failed: {}", service.name, e);
                false
            }
        }
    }

    fn set_user_agent(&self, value: &str) {
        match self.user_agent.write() {
            Ok(mut user_agent) => *user_agent = value.to_string(),
            Err(poisoned) => *poisoned.into_inner() = value.to_string(),
        }
    }

    fn user_agent(&self) -> String {
        match self.user_agent.read() {
            Ok(user_agent) => user_agent.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}
