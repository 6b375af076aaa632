//! Handlers for `/care-types` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/care-types` | Optional `?include_inactive=true` |
//! | `POST` | `/care-types` | Body: `{"name":"Hospital","is_active":true}` |
//! | `GET`  | `/care-types/summary` | Care types the viewer may see, plus the stored selection |

use axum::{
  Json,
  extract::{Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use care_core::{
  auth::{Capability, Resource},
  care_type::{CareType, NewCareType},
  listing::{CareTypeSummary, selected_care_type, summarize_care_types},
  store::CareStore,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppState, error::ApiError, listing::LISTING_VIEW, viewer::ViewerId};

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  #[serde(default)]
  pub include_inactive: bool,
}

/// `GET /care-types[?include_inactive=true]`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<CareType>>, ApiError>
where
  S: CareStore + Clone,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let care_types = state
    .store
    .list_care_types(params.include_inactive)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(care_types))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// `POST /care-types`
///
/// Requires administrate on the care type collection (the nil id).
pub async fn create<S>(
  State(state): State<AppState<S>>,
  ViewerId(viewer): ViewerId,
  Json(body): Json<NewCareType>,
) -> Result<impl IntoResponse, ApiError>
where
  S: CareStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  if body.name.trim().is_empty() {
    return Err(ApiError::BadRequest("care type name is required".into()));
  }
  let collection = Resource::CareType(Uuid::nil());
  if !state.authorizer.is_authorized(viewer, Capability::Administrate, collection) {
    return Err(ApiError::Forbidden("cannot create care types".into()));
  }
  let care_type = state.store.add_care_type(body).await.map_err(ApiError::store)?;
  tracing::info!(care_type = %care_type.care_type_id, name = %care_type.name, "care type created");
  Ok((StatusCode::CREATED, Json(care_type)))
}

// ─── Summary ──────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
  pub care_types: Vec<CareTypeSummary>,
  /// The viewer's last selected care type, if still visible to them.
  pub selected:   Option<Uuid>,
}

/// `GET /care-types/summary`
pub async fn summary<S>(
  State(state): State<AppState<S>>,
  ViewerId(viewer): ViewerId,
) -> Result<Json<SummaryResponse>, ApiError>
where
  S: CareStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let care_types = summarize_care_types(state.store.as_ref(), state.authorizer.as_ref(), viewer)
    .await
    .map_err(ApiError::store)?;
  let prefs = state.preferences.lock().await.checkout(viewer, LISTING_VIEW);
  let selected = selected_care_type(&prefs, &care_types);
  Ok(Json(SummaryResponse { care_types, selected }))
}
