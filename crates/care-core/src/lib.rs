//! Core types and trait definitions for pastoral care tracking.
//!
//! No HTTP or database dependencies live here. Persistence sits behind
//! [`store::CareStore`], capability checks behind [`auth::Authorizer`] and
//! merge-field resolution behind [`workflow::MergeFields`].

// Store implementations use native `async fn` for the trait's methods.
#![allow(async_fn_in_trait)]

pub mod attribute;
pub mod auth;
pub mod care_item;
pub mod care_type;
pub mod datetime;
pub mod error;
pub mod field_type;
pub mod listing;
pub mod person;
pub mod preferences;
pub mod store;
pub mod workflow;

pub use error::{Error, Result};
