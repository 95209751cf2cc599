//! Domain layer containing business entities and rules.
//!
//! Nothing in here depends on the database, the cache backend or HTTP.
//!
//! # Architecture
//!
//! - [`value_objects`] - Self-validating `ShortCode` and `Url`
//! - [`entities`] - Link and visit records
//! - [`repositories`] - Storage port definitions
//! - [`errors`] - Engine and storage error taxonomy
//! - [`visit_event`] - The "visited" signal sent to the visit worker
//! - [`user_agent`] - Device/browser/OS classification
//!
//! # Visit Flow
//!
//! 1. Redirect handler resolves a code
//! 2. [`visit_event::VisitEvent`] is pushed onto a bounded channel
//! 3. [`crate::application::workers::run_visit_worker`] drains it with retries
//! 4. The visit is persisted via [`repositories::VisitRepository`]

pub mod entities;
pub mod errors;
pub mod repositories;
pub mod user_agent;
pub mod value_objects;
pub mod visit_event;

pub use errors::{LinkError, StoreError};
