//! Care items ("cases"), their category links, and logged contacts.
//!
//! A [`CareItem`] exclusively owns its [`CareTypeItem`] links and its
//! [`CareContact`] entries; deleting a case removes both. Cases are normally
//! deactivated rather than deleted.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::person::Person;

// ─── Links ───────────────────────────────────────────────────────────────────

/// Join record attaching a case to a care type. Category-scoped custom-field
/// values are stored against this record, so one case can carry different
/// values per care type it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CareTypeItem {
  pub care_type_item_id: Uuid,
  pub care_item_id:      Uuid,
  pub care_type_id:      Uuid,
}

// ─── Contacts ────────────────────────────────────────────────────────────────

/// One logged interaction (visit, call, …) against a case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CareContact {
  pub care_contact_id:     Uuid,
  pub care_item_id:        Uuid,
  pub contactor_person_id: Uuid,
  pub contact_date_time:   DateTime<Utc>,
  pub description:         String,
}

/// Input to [`crate::store::CareStore::add_care_contact`].
#[derive(Debug, Clone)]
pub struct NewCareContact {
  pub care_item_id:        Uuid,
  pub contactor_person_id: Uuid,
  pub contact_date_time:   DateTime<Utc>,
  pub description:         String,
}

// ─── Case ────────────────────────────────────────────────────────────────────

/// A case as read from the store, with its people, links and contacts
/// materialised.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CareItem {
  pub care_item_id:      Uuid,
  pub is_active:         bool,
  /// The person receiving care.
  pub person:            Person,
  /// The person who initiated the case.
  pub contactor:         Person,
  pub contact_date_time: DateTime<Utc>,
  pub description:       String,
  pub care_type_items:   Vec<CareTypeItem>,
  pub contacts:          Vec<CareContact>,
}

impl CareItem {
  /// Display name of the case: the subject's full name.
  pub fn name(&self) -> String { self.person.full_name() }

  /// The contact with the latest timestamp. Ties go to the first contact in
  /// iteration order.
  pub fn last_contact(&self) -> Option<&CareContact> {
    self.contacts.iter().fold(None, |best, c| match best {
      Some(b) if b.contact_date_time >= c.contact_date_time => Some(b),
      _ => Some(c),
    })
  }

  pub fn last_contact_date(&self) -> Option<DateTime<Utc>> {
    self.last_contact().map(|c| c.contact_date_time)
  }

  /// Distinct care type ids across the links, in first-encounter order.
  pub fn care_type_ids(&self) -> Vec<Uuid> {
    let mut ids = Vec::with_capacity(self.care_type_items.len());
    for link in &self.care_type_items {
      if !ids.contains(&link.care_type_id) {
        ids.push(link.care_type_id);
      }
    }
    ids
  }
}

/// Input to [`crate::store::CareStore::add_care_item`].
#[derive(Debug, Clone)]
pub struct NewCareItem {
  pub person_id:           Uuid,
  pub contactor_person_id: Uuid,
  pub contact_date_time:   DateTime<Utc>,
  pub description:         String,
  pub is_active:           bool,
}
