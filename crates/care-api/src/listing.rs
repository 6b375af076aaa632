//! Handler for `GET /care-types/{id}/items`.
//!
//! Any filter parameter replaces the viewer's stored criteria; a request with
//! none of them reuses what was stored last time.
//!
//! | Parameter | Format |
//! |-----------|--------|
//! | `status` | `all`, `active` or `inactive` |
//! | `date_range`, `last_contact_range` | `start\|end`, either side may be empty |
//! | `person_id`, `contactor_id` | UUID |
//! | `attributes` | JSON object of field key to value list |
//! | `context_person` | UUID of the person the view is bound to |
//! | `sort`, `direction` | column name, `ascending` or `descending` |

use std::collections::BTreeMap;

use axum::{
  Json,
  extract::{Path, Query, State},
};
use care_core::{
  field_type::FieldTypeRegistry,
  listing::{
    DateRange, Listing, ListingFilter, ListingOptions, ListingRequest, SortColumn, SortDirection,
    SortProperty, StatusFilter, build_listing, describe_filters,
  },
  store::CareStore,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{AppState, error::ApiError, viewer::ViewerId};

/// Preference scope shared by the listing and the care type summary.
pub const LISTING_VIEW: &str = "care-item-list";

#[derive(Debug, Default, Deserialize)]
pub struct ListingParams {
  pub status:             Option<String>,
  pub date_range:         Option<String>,
  pub last_contact_range: Option<String>,
  pub person_id:          Option<Uuid>,
  pub contactor_id:       Option<Uuid>,
  pub attributes:         Option<String>,
  pub context_person:     Option<Uuid>,
  pub sort:               Option<SortColumn>,
  pub direction:          Option<SortDirection>,
}

impl ListingParams {
  /// The criteria carried by the query string, or `None` if it has none.
  fn filter(&self) -> Result<Option<ListingFilter>, ApiError> {
    let any = self.status.is_some()
      || self.date_range.is_some()
      || self.last_contact_range.is_some()
      || self.person_id.is_some()
      || self.contactor_id.is_some()
      || self.attributes.is_some();
    if !any {
      return Ok(None);
    }

    let status = match &self.status {
      Some(s) => s
        .parse::<StatusFilter>()
        .map_err(|_| ApiError::BadRequest(format!("unknown status: {s:?}")))?,
      None => StatusFilter::default(),
    };
    let range = |raw: &Option<String>| match raw {
      Some(s) => DateRange::from_delimited(s).map_err(|e| ApiError::BadRequest(e.to_string())),
      None => Ok(DateRange::default()),
    };
    let attribute_filters: BTreeMap<String, Vec<String>> = match &self.attributes {
      Some(json) => serde_json::from_str(json)
        .map_err(|e| ApiError::BadRequest(format!("attributes: {e}")))?,
      None => BTreeMap::new(),
    };

    Ok(Some(ListingFilter {
      status,
      date_range: range(&self.date_range)?,
      last_contact_range: range(&self.last_contact_range)?,
      person_id: self.person_id,
      contactor_id: self.contactor_id,
      attribute_filters,
    }))
  }

  fn sort(&self) -> Option<SortProperty> {
    self.sort.map(|column| SortProperty { column, direction: self.direction.unwrap_or_default() })
  }
}

#[derive(Debug, Serialize)]
pub struct FilterLabel {
  pub label: String,
  pub value: String,
}

#[derive(Debug, Serialize)]
pub struct ListingResponse {
  #[serde(flatten)]
  pub listing: Listing,
  /// The applied criteria, formatted for display.
  pub filters: Vec<FilterLabel>,
}

/// `GET /care-types/{id}/items`
///
/// 404 when the care type is missing or the viewer may not see it.
pub async fn handler<S>(
  State(state): State<AppState<S>>,
  ViewerId(viewer): ViewerId,
  Path(care_type_id): Path<Uuid>,
  Query(params): Query<ListingParams>,
) -> Result<Json<ListingResponse>, ApiError>
where
  S: CareStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let filter = params.filter()?;
  let first_view = !state.seen.lock().await.contains(&viewer);

  let care_types = state.store.list_care_types(true).await.map_err(ApiError::store)?;
  let registry = FieldTypeRegistry::with_builtins(care_types);

  let request = ListingRequest {
    care_type_id,
    viewer,
    context_person: params.context_person,
    filter,
    sort: params.sort(),
    options: ListingOptions {
      hide_inactive_by_default: state.config.hide_inactive_by_default,
      first_view,
    },
  };

  let mut prefs = state.preferences.lock().await.checkout(viewer, LISTING_VIEW);
  let listing = build_listing(
    state.store.as_ref(),
    state.authorizer.as_ref(),
    &mut prefs,
    &registry,
    request,
  )
  .await
  .map_err(ApiError::store)?;

  // A listing that was not shown does not use up the first view.
  let listing =
    listing.ok_or_else(|| ApiError::NotFound(format!("care type {care_type_id} not found")))?;
  state.preferences.lock().await.store(viewer, LISTING_VIEW, prefs);
  state.seen.lock().await.insert(viewer);

  let filters = describe_filters(state.store.as_ref(), &listing.filter, &listing.attributes, &registry)
    .await
    .map_err(ApiError::store)?
    .into_iter()
    .map(|(label, value)| FilterLabel { label, value })
    .collect();

  Ok(Json(ListingResponse { listing, filters }))
}
