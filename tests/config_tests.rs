//! Unit tests for configuration loading and validation

use proposal_instructions::config::Config;

#[path = "mod.rs"]
mod test_helpers;
use test_helpers::build_test_config;

/// Test that the default configuration passes validation
/// Why: The development defaults must always be a working starting point
#[test]
fn test_default_config_validates() {
    let config = Config::default();
    assert!(config.validate().is_ok());
}

/// Test that a malformed program id fails validation
/// Why: A bad base58 id would otherwise only surface deep inside the
/// controller at first use
#[test]
fn test_invalid_program_id_rejected() {
    let mut config = build_test_config("http://127.0.0.1:8899");
    config.chain.program_id = "not-a-base58-key".to_string();

    let error = config.validate().unwrap_err();
    assert!(error.to_string().contains("program_id"));
}

/// Test that a malformed realm id fails validation
#[test]
fn test_invalid_realm_id_rejected() {
    let mut config = build_test_config("http://127.0.0.1:8899");
    config.chain.realm_id = "0OIl".to_string();

    let error = config.validate().unwrap_err();
    assert!(error.to_string().contains("realm_id"));
}

/// Test that an empty RPC URL fails validation
#[test]
fn test_empty_rpc_url_rejected() {
    let mut config = build_test_config("");
    let error = config.validate().unwrap_err();
    assert!(error.to_string().contains("rpc_url"));
}

/// Test that zero timing intervals fail validation
/// Why: A zero debounce window or poll interval would spin
#[test]
fn test_zero_intervals_rejected() {
    let mut config = build_test_config("http://127.0.0.1:8899");
    config.builder.debounce_ms = 0;
    assert!(config.validate().is_err());

    let mut config = build_test_config("http://127.0.0.1:8899");
    config.executor.slot_poll_interval_ms = 0;
    assert!(config.validate().is_err());
}

/// Test that a full TOML document parses into a valid configuration
/// Why: The on-disk format must stay in sync with the structures
#[test]
fn test_toml_parses_into_config() {
    let toml_content = r#"
[chain]
name = "Devnet"
rpc_url = "https://api.devnet.solana.com"
program_id = "GovER5Lthms3bLBqWub97yVrMmEogzX7xNjdXpPPCVZw"
realm_id = "11111111111111111111111111111111"

[builder]
debounce_ms = 500
validation_timeout_ms = 30000

[executor]
slot_poll_interval_ms = 5000
"#;

    let config: Config = toml::from_str(toml_content).expect("TOML parses");
    assert!(config.validate().is_ok());
    assert_eq!(config.chain.name, "Devnet");
    assert_eq!(config.builder.debounce_ms, 500);
    assert_eq!(config.executor.slot_poll_interval_ms, 5000);
}

/// Test the load path end to end: a missing file asks for the template,
/// a present file loads and validates
/// Why: Both branches share the env-overridable path; exercising them in
/// one test keeps the env var single-writer
#[test]
fn test_load_from_env_overridable_path() {
    let path = std::env::temp_dir().join(format!(
        "instructions-config-{}.toml",
        std::process::id()
    ));
    std::env::set_var(
        "PROPOSAL_INSTRUCTIONS_CONFIG_PATH",
        path.to_str().expect("utf8 temp path"),
    );

    let missing = Config::load().unwrap_err();
    assert!(missing.to_string().contains("instructions.template.toml"));

    let config = Config::default();
    let serialized = toml::to_string(&config).expect("config serializes");
    std::fs::write(&path, serialized).expect("config file writes");

    let loaded = Config::load().expect("config loads");
    assert_eq!(loaded.chain.rpc_url, config.chain.rpc_url);

    std::fs::remove_file(&path).ok();
    std::env::remove_var("PROPOSAL_INSTRUCTIONS_CONFIG_PATH");
}
