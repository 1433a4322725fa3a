use clap::Parser;
use std::path::PathBuf;
use zipcode_resolver::config::OutputFormat;
use zipcode_resolver::utils::error::ErrorCategory;
use zipcode_resolver::utils::validation::{validate_required_field, Validate};
use zipcode_resolver::utils::{logger, render};
use zipcode_resolver::{
    BundledCountries, CliConfig, CountryRepository, DirectoryCountries, ReqwestHttpClient,
    ResolverSettings, Result, ZipCodeError, ZipResolver,
};

#[tokio::main]
async fn main() {
    let config = CliConfig::parse();

    let settings = match load_settings(&config) {
        Ok(settings) => settings,
        Err(e) => exit_with(&e),
    };

    if config.log_json || settings.json_logs() {
        logger::init_json_logger(config.verbose, settings.log_level());
    } else {
        logger::init_cli_logger(config.verbose, settings.log_level());
    }

    tracing::info!("Starting zipcode resolver");
    tracing::debug!("CLI config: {:?}", config);

    let data_dir = config
        .data_dir
        .clone()
        .or_else(|| settings.data_dir().map(PathBuf::from));

    let outcome = match data_dir {
        Some(dir) => {
            tracing::debug!("📂 Loading countries from {}", dir.display());
            run(&config, &settings, DirectoryCountries::new(dir)).await
        }
        None => run(&config, &settings, BundledCountries).await,
    };

    match outcome {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => exit_with(&e),
    }
}

fn load_settings(config: &CliConfig) -> Result<ResolverSettings> {
    config.validate()?;

    let settings = match &config.config {
        Some(path) => ResolverSettings::from_file(path)?,
        None => ResolverSettings::default(),
    };
    settings.validate()?;

    Ok(settings)
}

fn exit_with(e: &ZipCodeError) -> ! {
    tracing::error!("❌ {} (Category: {:?})", e, e.category());
    eprintln!("❌ {}", e);
    eprintln!("💡 {}", e.recovery_suggestion());

    let exit_code = match e.category() {
        ErrorCategory::Input => 2,
        ErrorCategory::Configuration => 3,
        ErrorCategory::Transport => 4,
    };
    std::process::exit(exit_code)
}

/// Returns whether the run produced a usable answer.
async fn run<R: CountryRepository>(
    config: &CliConfig,
    settings: &ResolverSettings,
    repository: R,
) -> Result<bool> {
    let http = match settings.timeout() {
        Some(timeout) => ReqwestHttpClient::with_timeout(timeout),
        None => ReqwestHttpClient::new(),
    };

    let country = config
        .country
        .as_deref()
        .unwrap_or_else(|| settings.default_country());

    let mut options = settings.resolver_options();
    options.advance_on_failure |= config.fallback;

    let mut resolver = ZipResolver::with_country(http, repository, country)?.with_options(options);

    if let Some(user_agent) = config.user_agent.as_deref().or(settings.user_agent()) {
        resolver.set_user_agent(user_agent);
    }

    if config.list_services {
        let ctx = resolver.country();
        println!("{} ({}), zip example {}", ctx.name(), ctx.id(), ctx.example());
        for (index, service) in resolver.web_services().iter().enumerate() {
            println!("{}. {} {}", index + 1, service.name, service.url);
        }
        return Ok(true);
    }

    if config.check_services {
        let reachable = resolver.check_web_services().await;
        if reachable {
            println!("✅ All web services of {} are reachable", resolver.country().id());
        } else {
            println!("❌ Some web services of {} are unreachable", resolver.country().id());
        }
        return Ok(reachable);
    }

    let zip = validate_required_field("zip", &config.zip)?;
    let result = match &config.service {
        Some(name) => resolver.find_on(zip, name.as_str()).await?,
        None => resolver.find(zip).await?,
    };

    match config.format {
        OutputFormat::Text => println!("{}", render::render_text(&result)),
        OutputFormat::Json => println!("{}", render::render_json(&result)?),
        OutputFormat::Csv => print!("{}", render::render_csv(&result)?),
    }

    Ok(!result.is_empty())
}
