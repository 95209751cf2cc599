//! Core domain entities.
//!
//! Entities are plain data structures; the only behaviour they carry is the
//! lifecycle predicates on [`Link`].
//!
//! # Entity Types
//!
//! - [`Link`] - A short code mapped to its destination URL
//! - [`Visit`] - One recorded redirect through a link
//!
//! Creation inputs live in separate structs ([`NewLink`], [`NewVisit`]) and
//! partial updates in [`LinkPatch`].

pub mod link;
pub mod visit;

pub use link::{Link, LinkPatch, NewLink};
pub use visit::{NewVisit, Visit};
