//! # API Module
//!
//! Business logic behind the HTTP endpoints. Handlers in
//! [`crate::endpoints`] and [`crate::webhook::routes`] only translate HTTP
//! into calls to these functions.
//!
//! ## Modules
//!
//! - [`message`] - Listing stored messages with filters and pagination
//! - [`stats`] - Aggregates over the message store
//! - [`webhook`] - Verified, idempotent webhook ingestion

pub mod message;
pub mod stats;
pub mod webhook;
