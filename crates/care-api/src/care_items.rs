//! Handlers for `/care-items` endpoints.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/care-items/{id}` | The case and the field definitions it inherits |
//! | `DELETE` | `/care-items/{id}` | Hard delete; requires edit on one of its care types |
//! | `POST`   | `/care-items/{id}/active` | Body: `{"is_active":false}` |

use axum::{
  Json,
  extract::{Path, State},
  http::StatusCode,
};
use care_core::{
  attribute::{AttributeDefinition, inherited_attributes},
  auth::{Resource, Viewer},
  care_item::CareItem,
  store::CareStore,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppState, error::ApiError, viewer::ViewerId};

async fn require_item<S>(state: &AppState<S>, id: Uuid) -> Result<CareItem, ApiError>
where
  S: CareStore,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  state
    .store
    .get_care_item(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("care item {id} not found")))
}

/// Edit on any linked care type grants edit on the case. An unlinked case is
/// editable by anyone.
fn check_edit<S: CareStore>(
  state: &AppState<S>,
  viewer: Viewer,
  item: &CareItem,
) -> Result<(), ApiError> {
  let ids = item.care_type_ids();
  let allowed = ids.is_empty()
    || ids
      .iter()
      .any(|id| state.authorizer.can_edit(viewer, Resource::CareType(*id)));
  if allowed {
    Ok(())
  } else {
    Err(ApiError::Forbidden(format!("cannot edit care item {}", item.care_item_id)))
  }
}

// ─── Get one ──────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct CareItemResponse {
  pub item:       CareItem,
  pub attributes: Vec<AttributeDefinition>,
}

/// `GET /care-items/{id}`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<CareItemResponse>, ApiError>
where
  S: CareStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let item = require_item(&state, id).await?;
  let attributes = inherited_attributes(state.store.as_ref(), &item)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(CareItemResponse { item, attributes }))
}

// ─── Delete ───────────────────────────────────────────────────────────────────

/// `DELETE /care-items/{id}`
pub async fn delete_one<S>(
  State(state): State<AppState<S>>,
  ViewerId(viewer): ViewerId,
  Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError>
where
  S: CareStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let item = require_item(&state, id).await?;
  check_edit(&state, viewer, &item)?;
  state.store.delete_care_item(id).await.map_err(ApiError::store)?;
  tracing::info!(care_item = %id, "care item deleted");
  Ok(StatusCode::NO_CONTENT)
}

// ─── Active flag ──────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ActiveBody {
  pub is_active: bool,
}

/// `POST /care-items/{id}/active`
pub async fn set_active<S>(
  State(state): State<AppState<S>>,
  ViewerId(viewer): ViewerId,
  Path(id): Path<Uuid>,
  Json(body): Json<ActiveBody>,
) -> Result<StatusCode, ApiError>
where
  S: CareStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let item = require_item(&state, id).await?;
  check_edit(&state, viewer, &item)?;
  state
    .store
    .set_care_item_active(id, body.is_active)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(care_item = %id, is_active = body.is_active, "care item status changed");
  Ok(StatusCode::NO_CONTENT)
}
