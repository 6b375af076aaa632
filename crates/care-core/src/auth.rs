//! Capability checks.
//!
//! Authorization is owned by the host. This crate only asks yes/no questions
//! through [`Authorizer`]; [`StaticGrants`] is a table-driven implementation
//! for deployments without a richer security model.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use uuid::Uuid;

/// A capability, ordered from weakest to strongest.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Capability {
  View,
  Edit,
  Administrate,
}

/// Something a capability can be granted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
  CareType(Uuid),
  Attribute(Uuid),
}

/// The person looking at a view. `None` is an anonymous viewer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Viewer(pub Option<Uuid>);

pub trait Authorizer: Send + Sync {
  /// Does `viewer` hold exactly `capability` on `resource`?
  fn is_authorized(&self, viewer: Viewer, capability: Capability, resource: Resource) -> bool;

  /// Edit or administrate.
  fn can_edit(&self, viewer: Viewer, resource: Resource) -> bool {
    self.is_authorized(viewer, Capability::Edit, resource)
      || self.is_authorized(viewer, Capability::Administrate, resource)
  }

  /// View, or anything that implies it.
  fn can_view(&self, viewer: Viewer, resource: Resource) -> bool {
    self.can_edit(viewer, resource) || self.is_authorized(viewer, Capability::View, resource)
  }
}

/// Grants every capability to everyone.
#[derive(Debug, Clone, Copy, Default)]
pub struct AllowAll;

impl Authorizer for AllowAll {
  fn is_authorized(&self, _: Viewer, _: Capability, _: Resource) -> bool { true }
}

/// Per-viewer capability levels applied uniformly to every resource.
///
/// A viewer holding a level is authorized for that level and every weaker
/// one. Viewers not in the table fall back to `anonymous`.
#[derive(Debug, Clone, Default)]
pub struct StaticGrants {
  pub grants:    BTreeMap<Uuid, Capability>,
  pub anonymous: Option<Capability>,
}

impl StaticGrants {
  fn level(&self, viewer: Viewer) -> Option<Capability> {
    viewer
      .0
      .and_then(|id| self.grants.get(&id).copied())
      .or(self.anonymous)
  }
}

impl Authorizer for StaticGrants {
  fn is_authorized(&self, viewer: Viewer, capability: Capability, _: Resource) -> bool {
    self.level(viewer).is_some_and(|level| level >= capability)
  }
}
