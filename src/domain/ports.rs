use crate::domain::model::{Country, RawResponse, WebServiceConfig, ZipValue};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Transport used to query web services.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// Build the request for `service` and `zip`, perform it and parse the
    /// body according to the service's result format.
    async fn consume(&self, service: &WebServiceConfig, zip: &ZipValue) -> Result<RawResponse>;

    async fn ping(&self, service: &WebServiceConfig) -> bool;

    fn set_user_agent(&self, value: &str);

    fn user_agent(&self) -> String;
}

#[async_trait]
impl<T: HttpClient + ?Sized> HttpClient for Arc<T> {
    async fn consume(&self, service: &WebServiceConfig, zip: &ZipValue) -> Result<RawResponse> {
        (**self).consume(service, zip).await
    }

    async fn ping(&self, service: &WebServiceConfig) -> bool {
        (**self).ping(service).await
    }

    fn set_user_agent(&self, value: &str) {
        (**self).set_user_agent(value)
    }

    fn user_agent(&self) -> String {
        (**self).user_agent()
    }
}

/// Source of static per-country configuration.
pub trait CountryRepository: Send + Sync {
    /// `Ok(None)` when the id is unknown.
    fn load_country(&self, id: &str) -> Result<Option<Country>>;

    fn country_ids(&self) -> Vec<String>;
}
