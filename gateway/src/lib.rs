//! Practice gateway library modules.
//!
//! The gateway sits between browsers and the homeopathy practice backend:
//! it gates routes on the session cookies, proxies organisation-scoped
//! resources, and drives the catalogue forms.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use middleware::Trace;
