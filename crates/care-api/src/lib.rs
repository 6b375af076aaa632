//! JSON REST API for pastoral care tracking.
//!
//! Exposes an axum [`Router`] backed by any [`care_core::store::CareStore`].
//! The viewer is identified by the `x-viewer-id` header; authentication and
//! TLS are the caller's responsibility.

pub mod care_items;
pub mod care_types;
pub mod error;
pub mod listing;
pub mod viewer;
pub mod workflow;

use std::{collections::HashSet, path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{get, post},
};
use care_core::{
  auth::{Authorizer, Capability, StaticGrants, Viewer},
  preferences::PreferenceBook,
  store::CareStore,
};
use serde::Deserialize;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;
use uuid::Uuid;

pub use error::ApiError;

// ─── Configuration ────────────────────────────────────────────────────────────

/// One viewer's capability level, applied to every care type and field.
#[derive(Debug, Deserialize, Clone)]
pub struct GrantConfig {
  pub person_id:  Uuid,
  pub capability: Capability,
}

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
  pub host:                     String,
  pub port:                     u16,
  pub store_path:               PathBuf,
  /// Show only active cases on a viewer's first listing.
  #[serde(default)]
  pub hide_inactive_by_default: bool,
  /// Capability of requests without an `x-viewer-id` header.
  #[serde(default)]
  pub anonymous:                Option<Capability>,
  #[serde(default)]
  pub grants:                   Vec<GrantConfig>,
}

impl ServerConfig {
  pub fn authorizer(&self) -> StaticGrants {
    StaticGrants {
      grants:    self.grants.iter().map(|g| (g.person_id, g.capability)).collect(),
      anonymous: self.anonymous,
    }
  }
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
#[derive(Clone)]
pub struct AppState<S: CareStore> {
  pub store:       Arc<S>,
  pub config:      Arc<ServerConfig>,
  pub authorizer:  Arc<dyn Authorizer>,
  /// Stored listing criteria per (viewer, view).
  pub preferences: Arc<Mutex<PreferenceBook>>,
  /// Viewers who have already opened a listing since the server started.
  pub seen:        Arc<Mutex<HashSet<Viewer>>>,
}

impl<S: CareStore> AppState<S> {
  pub fn new(store: S, config: ServerConfig) -> Self {
    Self {
      store:       Arc::new(store),
      authorizer:  Arc::new(config.authorizer()),
      config:      Arc::new(config),
      preferences: Arc::default(),
      seen:        Arc::default(),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build the API router for `state`.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: CareStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  Router::new()
    // Care types
    .route("/care-types", get(care_types::list::<S>).post(care_types::create::<S>))
    .route("/care-types/summary", get(care_types::summary::<S>))
    .route("/care-types/{id}/items", get(listing::handler::<S>))
    // Cases
    .route("/care-items/{id}", get(care_items::get_one::<S>).delete(care_items::delete_one::<S>))
    .route("/care-items/{id}/active", post(care_items::set_active::<S>))
    // Workflow actions
    .route("/workflow/create-care-item", post(workflow::create_care_item::<S>))
    .route("/workflow/add-care-contact", post(workflow::add_care_contact::<S>))
    .route("/workflow/add-care-item-attribute", post(workflow::add_care_item_attribute::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────
