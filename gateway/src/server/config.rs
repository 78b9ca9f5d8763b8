//! HTTP server configuration object and helpers.

use std::net::SocketAddr;

use gateway::inbound::http::gateway_config::GatewaySettings;

#[cfg(feature = "metrics")]
use actix_web_prom::PrometheusMetrics;

/// Everything `create_server` needs beyond the health state.
pub struct ServerConfig {
    pub(crate) settings: GatewaySettings,
    pub(crate) bind_addr: SocketAddr,
    #[cfg(feature = "metrics")]
    pub(crate) prometheus: Option<PrometheusMetrics>,
}

impl ServerConfig {
    /// Construct a server configuration from validated settings.
    #[must_use]
    pub fn new(settings: GatewaySettings) -> Self {
        let bind_addr = settings.bind_addr;
        Self {
            settings,
            bind_addr,
            #[cfg(feature = "metrics")]
            prometheus: None,
        }
    }

    /// Override the listen address, for example from the command line.
    #[must_use]
    pub fn with_bind_addr(mut self, bind_addr: SocketAddr) -> Self {
        self.bind_addr = bind_addr;
        self
    }

    /// Return the socket address the server will bind to.
    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }

    #[cfg(feature = "metrics")]
    /// Attach Prometheus middleware to the configuration.
    #[must_use]
    pub fn with_metrics(mut self, prometheus: Option<PrometheusMetrics>) -> Self {
        self.prometheus = prometheus;
        self
    }
}
