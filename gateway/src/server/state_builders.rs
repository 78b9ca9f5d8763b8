//! Builders for the backend client and the ports layered on it.

use std::sync::Arc;

use actix_web::web;
use tracing::info;

use gateway::domain::ports::{BackendApi, IdentityService};
use gateway::inbound::http::state::HttpState;
use gateway::outbound::backend_http::{HttpIdentityService, ReqwestBackendApi};

use super::ServerConfig;

/// Ports shared by the auth gate and the HTTP handlers.
#[derive(Clone)]
pub(crate) struct Ports {
    pub(crate) backend: Arc<dyn BackendApi>,
    pub(crate) identity: Arc<dyn IdentityService>,
}

/// Build the reqwest client for the configured backend and wrap it in the
/// identity adapter.
///
/// # Errors
/// Returns [`std::io::Error`] when the HTTP client cannot be constructed.
pub(crate) fn build_ports(config: &ServerConfig) -> std::io::Result<Ports> {
    let settings = &config.settings;
    let client = ReqwestBackendApi::new(settings.api_url.clone(), settings.backend_timeout)
        .map_err(|e| std::io::Error::other(format!("backend client construction failed: {e}")))?;
    info!(
        api_url = %client.base_url(),
        timeout_secs = settings.backend_timeout.as_secs(),
        "backend client configured"
    );
    let backend: Arc<dyn BackendApi> = Arc::new(client);
    let identity: Arc<dyn IdentityService> =
        Arc::new(HttpIdentityService::new(Arc::clone(&backend)));
    Ok(Ports { backend, identity })
}

/// Wrap the ports into handler state.
pub(crate) fn build_http_state(config: &ServerConfig, ports: &Ports) -> web::Data<HttpState> {
    web::Data::new(HttpState::new(
        Arc::clone(&ports.identity),
        Arc::clone(&ports.backend),
        config.settings.cookie_policy(),
    ))
}
