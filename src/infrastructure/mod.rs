//! Infrastructure layer for external integrations.
//!
//! This layer implements interfaces defined by the domain layer, providing
//! concrete implementations for data persistence and caching.
//!
//! # Modules
//!
//! - [`cache`] - Link cache (Redis, moka and no-op implementations)
//! - [`persistence`] - PostgreSQL and in-memory repository implementations

pub mod cache;
pub mod persistence;
