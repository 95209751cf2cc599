//! REST API layer for HTTP request/response handling.
//!
//! Translates HTTP requests into service calls and formats responses.
//!
//! # Modules
//!
//! - [`dto`] - Request/response bodies
//! - [`handlers`] - HTTP request handlers
//! - [`middleware`] - Rate limiting and tracing
//! - [`routes`] - Route configuration

pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod routes;
