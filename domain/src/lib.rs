//! This module re-exports various items from the `entity_api` crate.
//!
//! The purpose of this re-export is to ensure that consumers of the `domain` crate do not need to
//! directly depend on the `entity_api` crate. By re-exporting these items, we provide a clear and
//! consistent interface for working with query filters within the domain layer, while encapsulating
//! the underlying implementation details remain in the `entity_api` crate.
pub use entity_api::query::{IntoQueryFilterMap, QueryFilterMap, QuerySort};

// Re-exports from `entity` crate via `entity_api`
pub use entity_api::{
    mentorship_requests, mentorship_reviews, mentorship_status, messages, profiles, roles, users,
    Id,
};

pub mod conversation;
pub mod emails;
pub mod error;
pub mod jwt;
pub mod mentorship_request;
pub mod notifications;
pub mod profile;
pub mod review;

pub mod gateway;
