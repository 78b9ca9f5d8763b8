//! Practice backend adapters.

mod client;
mod identity;

pub use client::ReqwestBackendApi;
pub use identity::HttpIdentityService;
