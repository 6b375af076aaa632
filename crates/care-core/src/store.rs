//! The `CareStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `care-store-sqlite`).
//! Workflow actions, the listing composer and the HTTP layer depend on this
//! abstraction, not on any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  attribute::{AttributeDefinition, AttributeValues, EntityKind, NewAttribute},
  care_item::{CareContact, CareItem, CareTypeItem, NewCareContact, NewCareItem},
  care_type::{CareType, NewCareType},
  listing::CareItemRow,
  person::{NewPerson, Person},
};

/// Abstraction over a pastoral care store backend.
///
/// Writes are individual units of work; only [`CareStore::delete_care_item`]
/// spans several tables inside one transaction.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait CareStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── People ────────────────────────────────────────────────────────────

  fn add_person(
    &self,
    input: NewPerson,
  ) -> impl Future<Output = Result<Person, Self::Error>> + Send + '_;

  /// Retrieve a person by UUID. Returns `None` if not found.
  fn get_person(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Person>, Self::Error>> + Send + '_;

  // ── Care types ────────────────────────────────────────────────────────

  fn add_care_type(
    &self,
    input: NewCareType,
  ) -> impl Future<Output = Result<CareType, Self::Error>> + Send + '_;

  fn get_care_type(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<CareType>, Self::Error>> + Send + '_;

  /// Resolve a set of ids. Unknown ids are skipped, so the result may be
  /// shorter than the input.
  fn get_care_types(
    &self,
    ids: Vec<Uuid>,
  ) -> impl Future<Output = Result<Vec<CareType>, Self::Error>> + Send + '_;

  /// All care types ordered by name; inactive ones only when asked for.
  fn list_care_types(
    &self,
    include_inactive: bool,
  ) -> impl Future<Output = Result<Vec<CareType>, Self::Error>> + Send + '_;

  // ── Cases ─────────────────────────────────────────────────────────────

  /// Persist a new case. Both people must exist.
  fn add_care_item(
    &self,
    input: NewCareItem,
  ) -> impl Future<Output = Result<CareItem, Self::Error>> + Send + '_;

  /// Link a case to a care type. Duplicate links are not rejected.
  fn add_care_type_item(
    &self,
    care_item_id: Uuid,
    care_type_id: Uuid,
  ) -> impl Future<Output = Result<CareTypeItem, Self::Error>> + Send + '_;

  /// Retrieve a case with its links and contacts. Returns `None` if not
  /// found.
  fn get_care_item(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<CareItem>, Self::Error>> + Send + '_;

  fn set_care_item_active(
    &self,
    id: Uuid,
    is_active: bool,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  /// Hard-delete a case. Contacts, links and link values are removed in the
  /// same transaction, contacts first.
  fn delete_care_item(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Contacts ──────────────────────────────────────────────────────────

  fn add_care_contact(
    &self,
    input: NewCareContact,
  ) -> impl Future<Output = Result<CareContact, Self::Error>> + Send + '_;

  // ── Custom fields ─────────────────────────────────────────────────────

  fn add_attribute(
    &self,
    input: NewAttribute,
  ) -> impl Future<Output = Result<AttributeDefinition, Self::Error>> + Send + '_;

  /// Every definition registered against `kind`, qualified or not.
  fn list_attributes(
    &self,
    kind: EntityKind,
  ) -> impl Future<Output = Result<Vec<AttributeDefinition>, Self::Error>> + Send + '_;

  fn get_attribute_values(
    &self,
    entity_id: Uuid,
  ) -> impl Future<Output = Result<AttributeValues, Self::Error>> + Send + '_;

  /// Persist a single field value for one entity (last write wins).
  fn save_attribute_value(
    &self,
    entity_id: Uuid,
    key: String,
    value: String,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Listing ───────────────────────────────────────────────────────────

  /// Every link to `care_type_id`, each with its case and link values.
  /// Ordering is unspecified; the listing composer sorts.
  fn list_care_type_items(
    &self,
    care_type_id: Uuid,
  ) -> impl Future<Output = Result<Vec<CareItemRow>, Self::Error>> + Send + '_;
}
