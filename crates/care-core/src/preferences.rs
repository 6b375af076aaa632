//! Per-viewer, per-view preference storage.
//!
//! Stored filter criteria and the selected care type survive between
//! requests. The store is passed by reference into the listing composer; the
//! host decides where it lives.

use std::collections::{BTreeMap, HashMap};

use uuid::Uuid;

use crate::auth::Viewer;

/// A string key/value store already scoped to one (viewer, view) pair.
pub trait PreferenceStore {
  fn get(&self, key: &str) -> Option<String>;

  /// Store `value` under `key`; `None` (or an empty string) clears it.
  fn set(&mut self, key: &str, value: Option<String>);
}

/// In-memory [`PreferenceStore`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryPreferences {
  values: BTreeMap<String, String>,
}

impl PreferenceStore for MemoryPreferences {
  fn get(&self, key: &str) -> Option<String> { self.values.get(key).cloned() }

  fn set(&mut self, key: &str, value: Option<String>) {
    match value.filter(|v| !v.is_empty()) {
      Some(v) => {
        self.values.insert(key.to_owned(), v);
      }
      None => {
        self.values.remove(key);
      }
    }
  }
}

/// Identifies one preference scope.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PreferenceScope {
  pub viewer: Viewer,
  /// The view instance, e.g. `"care-item-list"`.
  pub view:   String,
}

/// Preferences for every (viewer, view) pair, for hosts that keep them in
/// memory.
#[derive(Debug, Clone, Default)]
pub struct PreferenceBook {
  scopes: HashMap<PreferenceScope, MemoryPreferences>,
}

impl PreferenceBook {
  /// A copy of the preferences for `viewer` on `view`; empty if none stored.
  pub fn checkout(&self, viewer: Viewer, view: &str) -> MemoryPreferences {
    self
      .scopes
      .get(&PreferenceScope { viewer, view: view.to_owned() })
      .cloned()
      .unwrap_or_default()
  }

  /// Replace the stored preferences for `viewer` on `view`.
  pub fn store(&mut self, viewer: Viewer, view: &str, prefs: MemoryPreferences) {
    self.scopes.insert(PreferenceScope { viewer, view: view.to_owned() }, prefs);
  }
}

/// Convenience for reading an id preference.
pub fn get_uuid<P: PreferenceStore + ?Sized>(prefs: &P, key: &str) -> Option<Uuid> {
  prefs.get(key).and_then(|v| Uuid::parse_str(v.trim()).ok())
}
