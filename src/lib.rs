#![deny(missing_docs)]

//! Core library for the textgate query gateway.

/// HTTP routing and REST handlers.
pub mod api;
/// Environment-driven configuration management.
pub mod config;
/// Fixed document set, upload lifecycle, and startup registry.
pub mod documents;
/// Structured logging and tracing setup.
pub mod logging;
/// Per-mode query counters.
pub mod metrics;
/// Remote model provider abstraction and the Gemini client.
pub mod provider;
/// Query modes, dispatch, and the service behind the handlers.
pub mod query;
