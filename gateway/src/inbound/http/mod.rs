//! HTTP inbound adapter exposing the gateway's JSON endpoints.

pub mod auth;
pub mod error;
pub mod forms;
pub mod gateway_config;
pub mod health;
pub mod resources;
pub mod schemas;
pub mod state;
#[cfg(test)]
pub mod test_utils;

use actix_web::web;

pub use error::ApiResult;

/// Register every `/api/v1` endpoint on `cfg`.
///
/// # Examples
/// ```no_run
/// use actix_web::{App, web};
/// use gateway::inbound::http::configure_api;
///
/// let app = App::new().service(web::scope("/api/v1").configure(configure_api));
/// ```
pub fn configure_api(cfg: &mut web::ServiceConfig) {
    cfg.service(auth::login)
        .service(auth::logout)
        .service(auth::me)
        .service(auth::phone_verification)
        .service(auth::forgot_password)
        .service(resources::list_organizations)
        .service(resources::list_resources)
        .service(resources::get_resource)
        .service(forms::describe_form)
        .service(forms::create_record)
        .service(forms::update_record);
}
