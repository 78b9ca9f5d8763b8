//! Behaviour tests for environment-driven gateway configuration.
//
// rstest-bdd generates guard variables with double underscores, which trips
// the non_snake_case lint under -D warnings.
#![allow(non_snake_case)]

use std::cell::RefCell;
use std::collections::HashMap;

use gateway::domain::cookies::Environment;
use gateway::inbound::http::gateway_config::{
    BuildMode, GatewayConfigError, GatewaySettings, settings_from_env,
};
use mockable::MockEnv;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};

struct ConfigWorld {
    vars: RefCell<HashMap<String, String>>,
    mode: RefCell<BuildMode>,
    outcome: RefCell<Option<Result<GatewaySettings, GatewayConfigError>>>,
}

impl ConfigWorld {
    fn new() -> Self {
        Self {
            vars: RefCell::new(HashMap::new()),
            mode: RefCell::new(BuildMode::Release),
            outcome: RefCell::new(None),
        }
    }

    fn set_env_var(&self, name: &str, value: &str) {
        self.vars
            .borrow_mut()
            .insert(name.to_owned(), value.to_owned());
    }

    fn evaluate(&self) {
        let vars = self.vars.borrow().clone();
        let mut env = MockEnv::new();
        env.expect_string()
            .times(0..)
            .returning(move |key| vars.get(key).cloned());
        let mode = *self.mode.borrow();
        *self.outcome.borrow_mut() = Some(settings_from_env(&env, mode));
    }

    fn with_settings<F>(&self, f: F)
    where
        F: FnOnce(&GatewaySettings),
    {
        let outcome = self.outcome.borrow();
        let settings = outcome
            .as_ref()
            .expect("evaluation result")
            .as_ref()
            .expect("expected settings to succeed");
        f(settings);
    }

    fn with_error<F>(&self, f: F)
    where
        F: FnOnce(&GatewayConfigError),
    {
        let outcome = self.outcome.borrow();
        let error = match outcome.as_ref().expect("evaluation result") {
            Ok(_) => panic!("expected settings to fail"),
            Err(error) => error,
        };
        f(error);
    }
}

#[fixture]
fn world() -> ConfigWorld {
    ConfigWorld::new()
}

#[given("a release build configuration")]
fn a_release_build_configuration(world: &ConfigWorld) {
    *world.mode.borrow_mut() = BuildMode::Release;
}

#[given("a debug build configuration")]
fn a_debug_build_configuration(world: &ConfigWorld) {
    *world.mode.borrow_mut() = BuildMode::Debug;
}

#[given("API_URL is set to {value}")]
fn api_url_is_set(world: &ConfigWorld, value: String) {
    world.set_env_var("API_URL", &value);
}

#[given("SECRET_KEY is set to {value}")]
fn secret_key_is_set(world: &ConfigWorld, value: String) {
    world.set_env_var("SECRET_KEY", &value);
}

#[given("APP_ENV is set to {value}")]
fn app_env_is_set(world: &ConfigWorld, value: String) {
    world.set_env_var("APP_ENV", &value);
}

#[given("AUTH_GATE_STRATEGY is set to {value}")]
fn gate_strategy_is_set(world: &ConfigWorld, value: String) {
    world.set_env_var("AUTH_GATE_STRATEGY", &value);
}

#[when("the gateway configuration is loaded")]
fn the_gateway_configuration_is_loaded(world: &ConfigWorld) {
    world.evaluate();
}

#[then("the configuration load succeeds")]
fn the_configuration_load_succeeds(world: &ConfigWorld) {
    world.with_settings(|_| {});
}

#[then("session cookies are marked secure")]
fn session_cookies_are_marked_secure(world: &ConfigWorld) {
    world.with_settings(|settings| {
        assert_eq!(settings.environment, Environment::Production);
        let cookie = settings.cookie_policy().access_cookie("acc", false);
        assert_eq!(cookie.secure(), Some(true));
    });
}

#[then("the backend URL is {url}")]
fn the_backend_url_is(world: &ConfigWorld, url: String) {
    world.with_settings(|settings| assert_eq!(settings.api_url.as_str(), url));
}

#[then("the configuration load fails because APP_ENV is missing")]
fn configuration_fails_missing_app_env(world: &ConfigWorld) {
    world.with_error(|error| {
        assert!(matches!(
            error,
            GatewayConfigError::MissingEnv { name } if *name == "APP_ENV"
        ));
    });
}

#[then("the configuration load fails because AUTH_GATE_STRATEGY is invalid")]
fn configuration_fails_invalid_strategy(world: &ConfigWorld) {
    world.with_error(|error| {
        assert!(matches!(
            error,
            GatewayConfigError::InvalidEnv { name, value, .. }
                if *name == "AUTH_GATE_STRATEGY" && value == "cookies"
        ));
    });
}

#[scenario(path = "tests/features/gateway_config.feature", index = 0)]
fn release_accepts_complete_configuration(world: ConfigWorld) {
    drop(world);
}

#[scenario(path = "tests/features/gateway_config.feature", index = 1)]
fn release_requires_environment(world: ConfigWorld) {
    drop(world);
}

#[scenario(path = "tests/features/gateway_config.feature", index = 2)]
fn unknown_strategies_are_rejected(world: ConfigWorld) {
    drop(world);
}

#[scenario(path = "tests/features/gateway_config.feature", index = 3)]
fn debug_falls_back_to_local_backend(world: ConfigWorld) {
    drop(world);
}
