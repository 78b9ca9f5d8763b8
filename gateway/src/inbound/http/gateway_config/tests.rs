//! Unit tests for gateway configuration parsing.

use super::*;
use mockable::MockEnv;
use rstest::rstest;
use std::collections::HashMap;

fn mock_env(vars: &[(&str, &str)]) -> MockEnv {
    let vars: HashMap<String, String> = vars
        .iter()
        .map(|(key, value)| ((*key).to_owned(), (*value).to_owned()))
        .collect();
    let mut env = MockEnv::new();
    env.expect_string()
        .times(0..)
        .returning(move |key| vars.get(key).cloned());
    env
}

const RELEASE_DEFAULTS: [(&str, &str); 3] = [
    (API_URL_ENV, "https://api.example.test"),
    (SECRET_KEY_ENV, "release-secret"),
    (APP_ENV_ENV, "production"),
];

fn expect_error(
    result: Result<GatewaySettings, GatewayConfigError>,
    label: &str,
) -> GatewayConfigError {
    match result {
        Ok(_) => panic!("{label}"),
        Err(error) => error,
    }
}

#[rstest]
fn debug_defaults_fill_every_gap() {
    let settings = settings_from_env(&mock_env(&[]), BuildMode::Debug).expect("debug settings");
    assert_eq!(settings.api_url.as_str(), "http://localhost:8000/");
    assert_eq!(settings.secret_key.as_str(), DEVELOPMENT_SECRET);
    assert_eq!(settings.environment, Environment::Development);
    assert_eq!(settings.strategy, GateStrategyKind::TokenVerification);
    assert_eq!(settings.backend_timeout, Duration::from_secs(10));
    assert_eq!(settings.bind_addr.to_string(), DEFAULT_BIND_ADDR);
}

#[rstest]
fn release_settings_parse() {
    let settings =
        settings_from_env(&mock_env(&RELEASE_DEFAULTS), BuildMode::Release).expect("settings");
    assert_eq!(settings.environment, Environment::Production);
    assert_eq!(settings.secret_key.as_str(), "release-secret");
}

#[rstest]
#[case(API_URL_ENV)]
#[case(SECRET_KEY_ENV)]
#[case(APP_ENV_ENV)]
fn release_requires_core_variables(#[case] missing: &'static str) {
    let vars: Vec<(&str, &str)> = RELEASE_DEFAULTS
        .iter()
        .copied()
        .filter(|(key, _)| *key != missing)
        .collect();
    let err = expect_error(
        settings_from_env(&mock_env(&vars), BuildMode::Release),
        "expected missing variable to fail",
    );
    assert!(matches!(err, GatewayConfigError::MissingEnv { name } if name == missing));
}

#[rstest]
fn public_api_url_is_a_fallback() {
    let env = mock_env(&[(PUBLIC_API_URL_ENV, "https://public.example.test/v1/")]);
    let settings = settings_from_env(&env, BuildMode::Debug).expect("settings");
    assert_eq!(settings.api_url.as_str(), "https://public.example.test/v1/");
}

#[rstest]
fn malformed_url_is_rejected_in_any_mode() {
    let env = mock_env(&[(API_URL_ENV, "not a url")]);
    let err = expect_error(
        settings_from_env(&env, BuildMode::Debug),
        "expected malformed URL to fail",
    );
    assert!(matches!(err, GatewayConfigError::InvalidUrl { .. }));
}

#[rstest]
#[case("probe", GateStrategyKind::IdentityProbe)]
#[case("VERIFY", GateStrategyKind::TokenVerification)]
fn strategy_is_case_insensitive(#[case] raw: &str, #[case] expected: GateStrategyKind) {
    let mut vars = RELEASE_DEFAULTS.to_vec();
    vars.push((GATE_STRATEGY_ENV, raw));
    let settings =
        settings_from_env(&mock_env(&vars), BuildMode::Release).expect("strategy settings");
    assert_eq!(settings.strategy, expected);
}

#[rstest]
#[case(GATE_STRATEGY_ENV, "sometimes")]
#[case(APP_ENV_ENV, "staging")]
#[case(TIMEOUT_ENV, "0")]
#[case(TIMEOUT_ENV, "soon")]
fn release_rejects_invalid_values(#[case] name: &'static str, #[case] value: &str) {
    let mut vars: Vec<(&str, &str)> = RELEASE_DEFAULTS
        .iter()
        .copied()
        .filter(|(key, _)| *key != name)
        .collect();
    vars.push((name, value));
    let err = expect_error(
        settings_from_env(&mock_env(&vars), BuildMode::Release),
        "expected invalid value to fail",
    );
    assert!(matches!(err, GatewayConfigError::InvalidEnv { name: got, .. } if got == name));
}

#[rstest]
#[case(GATE_STRATEGY_ENV, "sometimes")]
#[case(APP_ENV_ENV, "staging")]
#[case(TIMEOUT_ENV, "soon")]
fn debug_tolerates_invalid_values(#[case] name: &str, #[case] value: &str) {
    let settings = settings_from_env(&mock_env(&[(name, value)]), BuildMode::Debug);
    assert!(settings.is_ok());
}

#[rstest]
fn invalid_bind_addr_is_rejected() {
    let env = mock_env(&[(BIND_ADDR_ENV, "localhost")]);
    let err = expect_error(
        settings_from_env(&env, BuildMode::Debug),
        "expected bind address to fail",
    );
    assert!(matches!(err, GatewayConfigError::InvalidEnv { name: BIND_ADDR_ENV, .. }));
}

#[rstest]
fn debug_output_redacts_secret() {
    let settings =
        settings_from_env(&mock_env(&RELEASE_DEFAULTS), BuildMode::Release).expect("settings");
    let rendered = format!("{settings:?}");
    assert!(!rendered.contains("release-secret"));
    assert!(matches!(
        settings.gate_strategy(),
        GateStrategy::TokenVerification(_)
    ));
}
