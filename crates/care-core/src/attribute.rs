//! Custom-field definitions and the inheritance order over them.
//!
//! Definitions are registered against an [`EntityKind`]. Definitions for
//! [`EntityKind::CareTypeItem`] may be qualified by a care type id; a case
//! exposes the qualified definitions of every care type it is linked to.
//! Values live on the individual [`CareTypeItem`](crate::care_item::CareTypeItem)
//! links, keyed by definition key.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::{
  auth::{Authorizer, Resource, Viewer},
  care_item::CareItem,
  store::CareStore,
};

/// The record kind a definition attaches to.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum EntityKind {
  CareItem,
  CareTypeItem,
  CareContact,
}

/// Field-type configuration, e.g. `includeInactive = "True"`.
pub type ConfigBag = BTreeMap<String, String>;

/// Current values of one entity's custom fields, keyed by definition key.
pub type AttributeValues = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeDefinition {
  pub attribute_id:   Uuid,
  pub entity_kind:    EntityKind,
  /// The care type this definition is scoped to; `None` applies to every
  /// link of the entity kind.
  pub care_type_id:   Option<Uuid>,
  pub key:            String,
  pub name:           String,
  pub description:    String,
  /// Registry key of the field type (see [`crate::field_type`]).
  pub field_type:     String,
  pub config:         ConfigBag,
  pub order:          i32,
  pub is_grid_column: bool,
}

/// Input to [`crate::store::CareStore::add_attribute`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewAttribute {
  pub entity_kind:    EntityKind,
  pub care_type_id:   Option<Uuid>,
  pub key:            String,
  pub name:           String,
  #[serde(default)]
  pub description:    String,
  pub field_type:     String,
  #[serde(default)]
  pub config:         ConfigBag,
  #[serde(default)]
  pub order:          i32,
  #[serde(default)]
  pub is_grid_column: bool,
}

// ─── Inheritance ─────────────────────────────────────────────────────────────

/// The custom-field definitions a case inherits from its care types.
///
/// `definitions` is the full set registered for the link entity kind. The
/// result groups definitions by care type, in the order the care types were
/// first seen on the case's links; each group is sorted by `order` (stable).
/// Keys are not de-duplicated: two care types may each define the same key.
///
/// A case with no links inherits nothing.
pub fn resolve_inherited_attributes(
  item: &CareItem,
  definitions: &[AttributeDefinition],
) -> Vec<AttributeDefinition> {
  let care_type_ids = item.care_type_ids();

  let mut resolved = Vec::new();
  for care_type_id in care_type_ids {
    let mut group: Vec<&AttributeDefinition> = definitions
      .iter()
      .filter(|d| {
        d.entity_kind == EntityKind::CareTypeItem && d.care_type_id == Some(care_type_id)
      })
      .collect();
    group.sort_by_key(|d| d.order);
    resolved.extend(group.into_iter().cloned());
  }
  resolved
}

/// Fetch the link definitions from `store` and resolve them for `item`.
pub async fn inherited_attributes<S: CareStore>(
  store: &S,
  item: &CareItem,
) -> Result<Vec<AttributeDefinition>, S::Error> {
  if item.care_type_items.is_empty() {
    return Ok(Vec::new());
  }
  let definitions = store.list_attributes(EntityKind::CareTypeItem).await?;
  Ok(resolve_inherited_attributes(item, &definitions))
}

// ─── Grid columns ────────────────────────────────────────────────────────────

/// Definitions shown as listing columns (and filters) for one care type.
///
/// Shared definitions (no care type qualifier) come first, then those scoped
/// to `care_type_id`. Each group is ordered by `(order, name)`. Only grid
/// columns the viewer may see are returned.
pub fn grid_attributes<A: Authorizer + ?Sized>(
  definitions: &[AttributeDefinition],
  care_type_id: Uuid,
  authorizer: &A,
  viewer: Viewer,
) -> Vec<AttributeDefinition> {
  let group = |qualifier: Option<Uuid>| {
    let mut defs: Vec<&AttributeDefinition> = definitions
      .iter()
      .filter(|d| {
        d.entity_kind == EntityKind::CareTypeItem
          && d.is_grid_column
          && d.care_type_id == qualifier
      })
      .collect();
    defs.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.name.cmp(&b.name)));
    defs
  };

  group(None)
    .into_iter()
    .chain(group(Some(care_type_id)))
    .filter(|d| authorizer.can_view(viewer, Resource::Attribute(d.attribute_id)))
    .cloned()
    .collect()
}
