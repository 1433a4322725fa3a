use anyhow::Result;
use httpmock::prelude::*;
use serde_json::json;
use std::fs;
use std::path::Path;
use tempfile::TempDir;
use zipcode_resolver::utils::validation::Validate;
use zipcode_resolver::{
    CountryRepository, DirectoryCountries, ReqwestHttpClient, ResolverSettings, ZipResolver,
};

fn write(root: &Path, relative: &str, content: &str) -> Result<()> {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, content)?;
    Ok(())
}

#[test]
fn test_directory_countries_merge_local_and_bundled_templates() -> Result<()> {
    let temp_dir = TempDir::new()?;
    write(
        temp_dir.path(),
        "countries/NL.toml",
        r#"
id = "NL"
name = "Netherlands"
zip_length = 6
example = "1012JS"

[[web_services]]
name = "PostcodeApi"

[[web_services]]
name = "Zippopotamus"
zip_format = "9999 99"

[web_services.query_parameters]
country = "NL"
"#,
    )?;
    write(
        temp_dir.path(),
        "services/postcodeapi.toml",
        r#"
url = "https://postcode.example/v1/"
query = "%zip_code%"
mandatory_fields = ["city"]

[fields]
zip = "postcode"
city = "town"
state_name = ""
"#,
    )?;

    let repository = DirectoryCountries::new(temp_dir.path());
    assert_eq!(repository.country_ids(), vec!["NL"]);

    let country = repository
        .load_country("nl")?
        .expect("NL should be loaded from disk");
    assert_eq!(country.name, "Netherlands");
    assert_eq!(country.web_services.len(), 2);

    let local = &country.web_services[0];
    assert_eq!(local.name, "PostcodeApi");
    assert_eq!(local.url, "https://postcode.example/v1/");
    assert_eq!(local.fields.get("city"), Some(&Some("town".to_string())));
    assert_eq!(local.fields.get("state_name"), Some(&None));

    let bundled = &country.web_services[1];
    assert_eq!(bundled.url, "http://api.zippopotam.us/");
    assert_eq!(bundled.zip_format, "9999 99");
    assert_eq!(
        bundled.query_parameters.get("country").map(String::as_str),
        Some("NL")
    );

    assert!(repository.load_country("BE")?.is_none());
    Ok(())
}

#[test]
fn test_directory_country_without_template_or_url() -> Result<()> {
    let temp_dir = TempDir::new()?;
    write(
        temp_dir.path(),
        "countries/XX.toml",
        r#"
id = "XX"
name = "Nowhere"
zip_length = 4

[[web_services]]
name = "Unknown"
"#,
    )?;

    let repository = DirectoryCountries::new(temp_dir.path());

    assert!(repository.load_country("XX").is_err());
    Ok(())
}

#[tokio::test]
async fn test_lookup_with_country_from_disk() -> Result<()> {
    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(GET).path("/lookup/1012JS");
        then.status(200).json_body(json!({
            "postcode": "1012 JS",
            "town": "Amsterdam",
            "province": { "code": "NH", "name": "Noord-Holland" }
        }));
    });

    let temp_dir = TempDir::new()?;
    write(
        temp_dir.path(),
        "countries/NL.toml",
        &format!(
            r#"
id = "NL"
name = "Netherlands"
zip_length = 6
example = "1012JS"

[[web_services]]
name = "PostcodeApi"
url = "{}"
query = "%zip_code%"
mandatory_fields = ["city"]

[web_services.fields]
zip = "postcode"
city = "town"
state_id = "province.code"
state_name = "province[name]"
neighborhood = "wijk"
country_id = ""
"#,
            server.url("/lookup/")
        ),
    )?;

    let mut resolver = ZipResolver::with_country(
        ReqwestHttpClient::new(),
        DirectoryCountries::new(temp_dir.path()),
        "NL",
    )?;

    let result = resolver.find("1012 JS").await?;

    api_mock.assert();
    assert_eq!(result.get_str("city"), Some("Amsterdam"));
    assert_eq!(result.get_str("state_id"), Some("NH"));
    assert_eq!(result.get_str("state_name"), Some("Noord-Holland"));
    assert_eq!(result.get_str("country_id"), Some("NL"));
    assert_eq!(
        result.errors(),
        ["Result field 'neighborhood' was not found.".to_string()]
    );
    assert!(!result.is_empty());
    Ok(())
}

#[test]
fn test_settings_file() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("zipcode.toml");
    fs::write(
        &path,
        r#"
[resolver]
default_country = "US"
user_agent = "acme-checkout/2.1"
timeout_seconds = 5
advance_on_failure = true

[query_parameters]
username = "acme"

[logging]
level = "debug"
format = "json"
"#,
    )?;

    let settings = ResolverSettings::from_file(&path)?;
    settings.validate()?;

    assert_eq!(settings.default_country(), "US");
    assert_eq!(settings.user_agent(), Some("acme-checkout/2.1"));
    assert_eq!(settings.timeout(), Some(std::time::Duration::from_secs(5)));
    assert!(settings.json_logs());

    let options = settings.resolver_options();
    assert!(options.advance_on_failure);
    assert_eq!(
        options.query_parameters.get("username").map(String::as_str),
        Some("acme")
    );

    assert!(ResolverSettings::from_file(temp_dir.path().join("missing.toml")).is_err());
    Ok(())
}
