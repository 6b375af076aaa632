//! Care types: the categories a case can belong to.
//!
//! A care type gates which custom fields a case acquires (see
//! [`crate::attribute`]). Deactivating a care type hides it from pickers used
//! when creating new cases, but existing links are left untouched.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CareType {
  pub care_type_id: Uuid,
  pub name:         String,
  pub is_active:    bool,
}

/// Input to [`crate::store::CareStore::add_care_type`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewCareType {
  pub name:      String,
  #[serde(default = "default_active")]
  pub is_active: bool,
}

fn default_active() -> bool { true }

// ─── Picker ──────────────────────────────────────────────────────────────────

/// The options offered when choosing care types for a case.
#[derive(Debug, Clone, Default)]
pub struct CareTypePicker {
  /// Restrict the options to these care types. `None` offers every type.
  pub allowed:          Option<Vec<Uuid>>,
  pub include_inactive: bool,
  /// Show the picker even when only one option exists.
  pub force_visible:    bool,
}

/// Result of [`CareTypePicker::options`].
#[derive(Debug, Clone)]
pub struct PickerOptions {
  pub items:   Vec<CareType>,
  pub visible: bool,
}

impl CareTypePicker {
  /// Compute the picker items from the full set of care types.
  ///
  /// Already-selected ids are always offered, even when inactive or outside
  /// the allowed set, so an existing selection never silently disappears.
  /// Items are ordered by name.
  pub fn options(&self, all: &[CareType], selected: &[Uuid]) -> PickerOptions {
    let mut items: Vec<CareType> = all
      .iter()
      .filter(|ct| {
        let allowed = self
          .allowed
          .as_ref()
          .is_none_or(|ids| ids.contains(&ct.care_type_id));
        (allowed && (ct.is_active || self.include_inactive))
          || selected.contains(&ct.care_type_id)
      })
      .cloned()
      .collect();
    items.sort_by(|a, b| a.name.cmp(&b.name));

    let visible = items.len() != 1 || self.force_visible;
    PickerOptions { items, visible }
  }
}
