use crate::domain::model::{Country, WebServiceConfig};
use crate::utils::error::{Result, ZipCodeError};

/// The active country and its ordered web service list.
#[derive(Debug, Clone, PartialEq)]
pub struct CountryContext {
    country: Country,
}

impl CountryContext {
    pub fn new(country: Country) -> Self {
        Self { country }
    }

    /// Replace the active country wholesale.
    pub fn set_country_data(&mut self, country: Country) {
        tracing::debug!(
            "🌎 Active country is now {} with {} web services",
            country.id,
            country.web_services.len()
        );
        self.country = country;
    }

    pub fn country(&self) -> &Country {
        &self.country
    }

    pub fn id(&self) -> &str {
        &self.country.id
    }

    pub fn name(&self) -> &str {
        &self.country.name
    }

    pub fn zip_length(&self) -> usize {
        self.country.zip_length
    }

    pub fn example(&self) -> &str {
        &self.country.example
    }

    /// Services in configured (fallback priority) order.
    pub fn web_services(&self) -> &[WebServiceConfig] {
        &self.country.web_services
    }

    pub fn web_service_by_name(&self, name: &str) -> Result<&WebServiceConfig> {
        self.country
            .web_services
            .iter()
            .find(|service| service.name == name)
            .ok_or_else(|| {
                ZipCodeError::not_found(format!(
                    "service '{}' is not configured for country '{}'",
                    name, self.country.id
                ))
            })
    }

    pub fn clear_web_services(&mut self) {
        self.country.web_services.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> CountryContext {
        CountryContext::new(
            Country::new("US", "United States", 5)
                .with_example("10006")
                .with_web_service(WebServiceConfig::new("Geonames", "http://api.geonames.org/"))
                .with_web_service(WebServiceConfig::new(
                    "Zippopotamus",
                    "http://api.zippopotam.us/",
                )),
        )
    }

    #[test]
    fn test_services_keep_configured_order() {
        let ctx = context();
        let names: Vec<&str> = ctx.web_services().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Geonames", "Zippopotamus"]);
        assert_eq!(ctx.example(), "10006");
    }

    #[test]
    fn test_lookup_by_name() {
        let ctx = context();
        assert_eq!(ctx.web_service_by_name("Zippopotamus").unwrap().name, "Zippopotamus");
        assert!(matches!(
            ctx.web_service_by_name("ZZ"),
            Err(ZipCodeError::WebServicesNotFound { .. })
        ));
    }

    #[test]
    fn test_clear_and_replace() {
        let mut ctx = context();
        ctx.clear_web_services();
        assert!(ctx.web_services().is_empty());
        assert_eq!(ctx.id(), "US");

        ctx.set_country_data(Country::new("CA", "Canada", 6));
        assert_eq!(ctx.id(), "CA");
        assert_eq!(ctx.name(), "Canada");
        assert_eq!(ctx.zip_length(), 6);
    }
}
