//! Handlers for `/workflow` endpoints.
//!
//! Each endpoint runs one workflow action against the attributes sent with
//! the request and answers with the log and the (possibly updated)
//! attributes. A failed action answers `422` with its errors and log.
//!
//! Body: `{"action": {...}, "attributes": {...}, "merge_fields": {...}}`

use std::collections::BTreeMap;

use axum::{
  Json,
  extract::State,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use care_core::{
  store::CareStore,
  workflow::{
    ActionContext, ActionResult, AddCareContact, AddCareItemAttribute, CreateCareItem, LogEntry,
    TemplateMergeFields, WorkflowAttributes,
  },
};
use serde::{Deserialize, Serialize};

use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct Invocation<A> {
  pub action:       A,
  #[serde(default)]
  pub attributes:   WorkflowAttributes,
  /// Extra merge fields, on top of one per attribute name.
  #[serde(default)]
  pub merge_fields: BTreeMap<String, String>,
}

impl<A> Invocation<A> {
  fn merge_fields(&self) -> TemplateMergeFields {
    self
      .merge_fields
      .iter()
      .fold(TemplateMergeFields::from_attributes(&self.attributes), |fields, (k, v)| {
        fields.with(k.clone(), v.clone())
      })
  }
}

#[derive(Debug, Serialize)]
pub struct Completed {
  pub log:        Vec<LogEntry>,
  pub attributes: WorkflowAttributes,
}

#[derive(Debug, Serialize)]
pub struct Failed {
  pub errors: Vec<String>,
  pub log:    Vec<LogEntry>,
}

fn respond(result: ActionResult, attributes: WorkflowAttributes) -> Response {
  match result {
    Ok(log) => Json(Completed { log, attributes }).into_response(),
    Err(failure) => {
      let errors = failure.errors.iter().map(ToString::to_string).collect();
      (StatusCode::UNPROCESSABLE_ENTITY, Json(Failed { errors, log: failure.log })).into_response()
    }
  }
}

/// `POST /workflow/create-care-item`
pub async fn create_care_item<S>(
  State(state): State<AppState<S>>,
  Json(mut body): Json<Invocation<CreateCareItem>>,
) -> Response
where
  S: CareStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let merge_fields = body.merge_fields();
  let result = {
    let mut ctx = ActionContext::new(&mut body.attributes, &merge_fields);
    body.action.execute(state.store.as_ref(), &mut ctx).await
  };
  respond(result, body.attributes)
}

/// `POST /workflow/add-care-contact`
pub async fn add_care_contact<S>(
  State(state): State<AppState<S>>,
  Json(mut body): Json<Invocation<AddCareContact>>,
) -> Response
where
  S: CareStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let merge_fields = body.merge_fields();
  let result = {
    let mut ctx = ActionContext::new(&mut body.attributes, &merge_fields);
    body.action.execute(state.store.as_ref(), &mut ctx).await
  };
  respond(result, body.attributes)
}

/// `POST /workflow/add-care-item-attribute`
pub async fn add_care_item_attribute<S>(
  State(state): State<AppState<S>>,
  Json(mut body): Json<Invocation<AddCareItemAttribute>>,
) -> Response
where
  S: CareStore + Clone + Send + Sync + 'static,
  S::Error: std::error::Error + Send + Sync + 'static,
{
  let merge_fields = body.merge_fields();
  let result = {
    let mut ctx = ActionContext::new(&mut body.attributes, &merge_fields);
    body.action.execute(state.store.as_ref(), &mut ctx).await
  };
  respond(result, body.attributes)
}

#[cfg(test)]
mod tests {
  use super::*;
  use care_core::workflow::MergeFields as _;
  use uuid::Uuid;

  #[test]
  fn extra_merge_fields_override_attribute_names() {
    let id = Uuid::new_v4();
    let mut attributes = WorkflowAttributes::default();
    attributes.insert(id, "Room", "4");
    let invocation = Invocation {
      action: (),
      attributes,
      merge_fields: BTreeMap::from([
        ("Room".to_string(), "12".to_string()),
        ("Hospital".to_string(), "Mercy".to_string()),
      ]),
    };
    assert_eq!(invocation.merge_fields().resolve("{{Hospital}} {{Room}}"), "Mercy 12");
  }
}
