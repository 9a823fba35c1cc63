//! Inbound webhook handling
//!
//! ## Modules
//!
//! - [`security`] - HMAC-SHA256 signature verification
//! - [`schemas`] - Wire payload and its validation
//! - [`routes`] - `POST /webhook` receiver

pub mod routes;
pub mod schemas;
pub mod security;
