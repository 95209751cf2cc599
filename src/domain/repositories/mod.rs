//! Repository trait definitions for the domain layer.
//!
//! The traits are the storage ports the engines depend on. Implementations
//! live in `crate::infrastructure::persistence`; mocks are generated with
//! `mockall` for unit tests.
//!
//! # Available Repositories
//!
//! - [`LinkRepository`] - Short link persistence, expiry queries, existence checks
//! - [`VisitRepository`] - Visit recording and grouped counts

pub mod link_repository;
pub mod visit_repository;

pub use link_repository::LinkRepository;
pub use visit_repository::{DailyVisits, GroupCount, VisitDimension, VisitRepository};

#[cfg(test)]
pub use link_repository::MockLinkRepository;
#[cfg(test)]
pub use visit_repository::MockVisitRepository;
