//! `stocktrail-core` — identifiers, domain errors, and shared value objects.
//!
//! This crate is intentionally free of storage and transport concerns.

pub mod error;
pub mod id;
pub mod price;

pub use error::{DomainError, DomainResult};
pub use id::{CategoryId, ChangeLogId, ItemId, UserId};
pub use price::Price;
