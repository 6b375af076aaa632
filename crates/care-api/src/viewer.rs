//! Viewer identification extractor.

use axum::{extract::FromRequestParts, http::request::Parts};
use care_core::{auth::Viewer, store::CareStore};
use uuid::Uuid;

use crate::{AppState, error::ApiError};

/// Header carrying the viewing person's id. Absent means anonymous.
pub const VIEWER_HEADER: &str = "x-viewer-id";

/// The viewer a request is made on behalf of.
#[derive(Debug, Clone, Copy)]
pub struct ViewerId(pub Viewer);

/// Read the viewer from request headers.
pub fn viewer_from_parts(parts: &Parts) -> Result<Viewer, ApiError> {
  let Some(value) = parts.headers.get(VIEWER_HEADER) else {
    return Ok(Viewer(None));
  };
  let id = value
    .to_str()
    .ok()
    .and_then(|s| Uuid::parse_str(s.trim()).ok())
    .ok_or_else(|| ApiError::BadRequest(format!("malformed {VIEWER_HEADER} header")))?;
  Ok(Viewer(Some(id)))
}

impl<S> FromRequestParts<AppState<S>> for ViewerId
where
  S: CareStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    _state: &AppState<S>,
  ) -> Result<Self, Self::Rejection> {
    viewer_from_parts(parts).map(ViewerId)
  }
}
