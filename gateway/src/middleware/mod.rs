//! Request middleware.
//!
//! Purpose: request lifecycle concerns wrapped around every route: trace
//! correlation and the authentication gate.

pub mod auth_gate;
pub mod trace;

pub use auth_gate::{AuthGate, AuthenticatedUser, GateStrategy};
pub use trace::Trace;
