//! Actions pluggable into an external workflow engine.
//!
//! Each action reads its parameters through an [`ActionContext`], mutates the
//! store, and returns either the log it produced or an [`ActionFailure`]
//! carrying every problem it hit. The engine itself (scheduling, activity
//! state, persistence of workflow attributes) belongs to the host.

pub mod add_care_contact;
pub mod add_care_item_attribute;
pub mod create_care_item;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

pub use self::{
  add_care_contact::AddCareContact, add_care_item_attribute::AddCareItemAttribute,
  create_care_item::CreateCareItem,
};
use crate::{person::Person, store::CareStore};

// ─── Outcome ─────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
  pub message:  String,
  pub is_error: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
  #[error("Invalid date value!")]
  InvalidDate,

  #[error("Invalid care type attribute!")]
  InvalidCategoryReference,

  #[error("Invalid person attribute!")]
  InvalidPersonReference,

  #[error("Invalid requester attribute!")]
  InvalidRequesterReference,

  #[error("Invalid care item attribute!")]
  InvalidCareItemReference,

  #[error("Invalid contactor attribute!")]
  InvalidContactorReference,

  #[error("Care item attribute could not be found!")]
  OutputAttributeNotFound,

  #[error("Invalid attribute key!")]
  InvalidAttributeKey,

  #[error("Could not save value ('{value}')! {message}")]
  AttributeSaveFailed { value: String, message: String },

  #[error("store error: {0}")]
  Store(String),
}

impl ActionError {
  pub(crate) fn store(e: impl std::error::Error) -> Self { Self::Store(e.to_string()) }
}

/// A failed action: every error it recorded, and the full log (which repeats
/// each error as an error entry).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("workflow action failed with {} error(s)", .errors.len())]
pub struct ActionFailure {
  pub errors: Vec<ActionError>,
  pub log:    Vec<LogEntry>,
}

pub type ActionResult = Result<Vec<LogEntry>, ActionFailure>;

/// Collects log entries and errors while an action runs.
#[derive(Debug, Default)]
pub struct ActionLog {
  entries: Vec<LogEntry>,
  errors:  Vec<ActionError>,
}

impl ActionLog {
  pub fn info(&mut self, message: impl Into<String>) {
    self.entries.push(LogEntry { message: message.into(), is_error: false });
  }

  pub fn fail(&mut self, error: ActionError) { self.errors.push(error); }

  /// Success if no error was recorded. Otherwise each error is appended to
  /// the log as its own error entry.
  pub fn finish(mut self) -> ActionResult {
    if self.errors.is_empty() {
      return Ok(self.entries);
    }
    for error in &self.errors {
      self.entries.push(LogEntry { message: error.to_string(), is_error: true });
    }
    Err(ActionFailure { errors: self.errors, log: self.entries })
  }
}

// ─── Merge fields ────────────────────────────────────────────────────────────

/// Template substitution applied to text parameters at execution time.
pub trait MergeFields: Send + Sync {
  fn resolve(&self, template: &str) -> String;
}

/// Leaves text untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMergeFields;

impl MergeFields for NoMergeFields {
  fn resolve(&self, template: &str) -> String { template.to_owned() }
}

/// Replaces `{{ name }}` with the named value. Unknown names render empty.
#[derive(Debug, Clone, Default)]
pub struct TemplateMergeFields {
  values: BTreeMap<String, String>,
}

impl TemplateMergeFields {
  pub fn new(values: BTreeMap<String, String>) -> Self { Self { values } }

  /// Merge fields named after the workflow's attributes.
  pub fn from_attributes(attributes: &WorkflowAttributes) -> Self {
    Self::new(
      attributes
        .0
        .values()
        .map(|a| (a.name.clone(), a.value.clone()))
        .collect(),
    )
  }

  pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
    self.values.insert(name.into(), value.into());
    self
  }
}

impl MergeFields for TemplateMergeFields {
  fn resolve(&self, template: &str) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find("{{") {
      let Some(close) = rest[open + 2..].find("}}") else { break };
      out.push_str(&rest[..open]);
      let name = rest[open + 2..open + 2 + close].trim();
      if let Some(value) = self.values.get(name) {
        out.push_str(value);
      }
      rest = &rest[open + 2 + close + 2..];
    }
    out.push_str(rest);
    out
  }
}

// ─── Parameters ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowAttribute {
  pub name:  String,
  pub value: String,
}

/// The workflow-scoped attributes an action can read and write, keyed by
/// attribute id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkflowAttributes(pub BTreeMap<Uuid, WorkflowAttribute>);

impl WorkflowAttributes {
  pub fn insert(&mut self, id: Uuid, name: impl Into<String>, value: impl Into<String>) {
    self.0.insert(id, WorkflowAttribute { name: name.into(), value: value.into() });
  }

  pub fn value(&self, id: Uuid) -> Option<&str> { self.0.get(&id).map(|a| a.value.as_str()) }

  pub fn name(&self, id: Uuid) -> Option<&str> { self.0.get(&id).map(|a| a.name.as_str()) }

  /// Returns `false` if no attribute has this id.
  pub fn set_value(&mut self, id: Uuid, value: impl Into<String>) -> bool {
    match self.0.get_mut(&id) {
      Some(a) => {
        a.value = value.into();
        true
      }
      None => false,
    }
  }
}

/// A parameter given either literally or as a workflow attribute to read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextOrAttribute {
  Text(String),
  Attribute(Uuid),
}

impl Default for TextOrAttribute {
  fn default() -> Self { Self::Text(String::new()) }
}

/// What an action sees of the running workflow.
pub struct ActionContext<'a> {
  pub attributes:   &'a mut WorkflowAttributes,
  pub merge_fields: &'a dyn MergeFields,
}

impl<'a> ActionContext<'a> {
  pub fn new(attributes: &'a mut WorkflowAttributes, merge_fields: &'a dyn MergeFields) -> Self {
    Self { attributes, merge_fields }
  }

  /// The parameter's text (the attribute's value when it names one), merge
  /// fields resolved.
  pub fn resolve_text(&self, param: &TextOrAttribute) -> String {
    let raw = match param {
      TextOrAttribute::Text(text) => text.as_str(),
      TextOrAttribute::Attribute(id) => self.attributes.value(*id).unwrap_or_default(),
    };
    self.merge_fields.resolve(raw)
  }

  /// Follow a reference parameter: the configured attribute's value, read as
  /// an id.
  pub fn referenced_id(&self, attribute: Option<Uuid>) -> Option<Uuid> {
    let value = self.attributes.value(attribute?)?;
    Uuid::parse_str(value.trim()).ok()
  }

  /// Like [`Self::referenced_id`] for an attribute holding a delimited id
  /// list.
  pub fn referenced_ids(&self, attribute: Option<Uuid>) -> Vec<Uuid> {
    attribute
      .and_then(|id| self.attributes.value(id))
      .map(parse_id_list)
      .unwrap_or_default()
  }
}

/// Split on `,`, `;` or `|`; entries that are not ids are dropped.
pub fn parse_id_list(s: &str) -> Vec<Uuid> {
  s.split([',', ';', '|'])
    .filter_map(|part| Uuid::parse_str(part.trim()).ok())
    .collect()
}

pub(crate) async fn lookup_person<S: CareStore>(
  store: &S,
  id: Option<Uuid>,
) -> Result<Option<Person>, ActionError> {
  match id {
    Some(id) => store.get_person(id).await.map_err(ActionError::store),
    None => Ok(None),
  }
}
