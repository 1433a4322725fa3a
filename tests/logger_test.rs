use zipcode_resolver::utils::logger;

// A global subscriber can be installed once per process, so this file holds a
// single test.
#[test]
fn test_json_logger_installs_subscriber() {
    logger::init_json_logger(false, Some("debug"));

    tracing::info!("🔍 Looking up {} on {}", "20250030", "ViaCep");
    assert!(tracing::enabled!(tracing::Level::INFO));
}
