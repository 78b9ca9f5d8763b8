//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **backend_http**: the practice backend REST API over `reqwest`, plus the
//!   identity service built on top of it.
//!
//! Adapters are thin translators between domain types and wire shapes. They
//! contain no business logic.

pub mod backend_http;
