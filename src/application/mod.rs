//! Application layer services implementing business logic.
//!
//! This layer orchestrates domain operations by coordinating repository calls,
//! cache access and business rules. Services consume repository traits and
//! provide a clean API for HTTP handlers and the admin CLI.
//!
//! # Available Services
//!
//! - [`services::ShortenerService`] - Link creation and soft-deletion
//! - [`services::ResolverService`] - Cache-first code resolution
//! - [`services::StatisticsService`] - Grouped visit counts
//! - [`services::ExpirySweepService`] - Removal of expired links
//! - [`services::VisitRecorder`] - Visit persistence with user-agent parsing
//!
//! Background tasks driving the recorder and the sweep live in [`workers`].

pub mod services;
pub mod workers;
