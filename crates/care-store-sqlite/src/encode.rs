//! Encoding and decoding helpers between domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! Timestamps are RFC 3339 strings, UUIDs hyphenated lowercase strings, and
//! field-type configuration compact JSON.

use std::collections::HashMap;

use care_core::{
  attribute::{AttributeDefinition, ConfigBag, EntityKind},
  care_item::{CareContact, CareItem, CareTypeItem},
  care_type::CareType,
  person::Person,
};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String { dt.to_rfc3339() }

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn encode_entity_kind(kind: EntityKind) -> String { kind.to_string() }

pub fn decode_entity_kind(s: &str) -> Result<EntityKind> {
  s.parse()
    .map_err(|_| Error::Decode(format!("unknown entity kind: {s:?}")))
}

pub fn encode_config(config: &ConfigBag) -> Result<String> { Ok(serde_json::to_string(config)?) }

pub fn decode_config(s: &str) -> Result<ConfigBag> { Ok(serde_json::from_str(s)?) }

// ─── Row types ───────────────────────────────────────────────────────────────

pub struct RawPerson {
  pub person_id: String,
  pub nick_name: String,
  pub last_name: String,
}

impl RawPerson {
  pub fn into_person(self) -> Result<Person> {
    Ok(Person {
      person_id: decode_uuid(&self.person_id)?,
      nick_name: self.nick_name,
      last_name: self.last_name,
    })
  }
}

pub struct RawCareType {
  pub care_type_id: String,
  pub name:         String,
  pub is_active:    bool,
}

impl RawCareType {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self { care_type_id: row.get(0)?, name: row.get(1)?, is_active: row.get(2)? })
  }

  pub fn into_care_type(self) -> Result<CareType> {
    Ok(CareType {
      care_type_id: decode_uuid(&self.care_type_id)?,
      name:         self.name,
      is_active:    self.is_active,
    })
  }
}

/// Selects a case joined with its subject and contactor, in the column
/// order [`RawCareItem::from_row`] expects.
pub const CARE_ITEM_SELECT: &str = "
  SELECT ci.care_item_id, ci.is_active, ci.contact_date_time, ci.description,
         p.person_id, p.nick_name, p.last_name,
         c.person_id, c.nick_name, c.last_name
  FROM care_items ci
  JOIN people p ON p.person_id = ci.person_id
  JOIN people c ON c.person_id = ci.contactor_person_id";

pub struct RawCareItem {
  pub care_item_id:      String,
  pub is_active:         bool,
  pub contact_date_time: String,
  pub description:       String,
  pub person:            RawPerson,
  pub contactor:         RawPerson,
}

impl RawCareItem {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      care_item_id:      row.get(0)?,
      is_active:         row.get(1)?,
      contact_date_time: row.get(2)?,
      description:       row.get(3)?,
      person:            RawPerson {
        person_id: row.get(4)?,
        nick_name: row.get(5)?,
        last_name: row.get(6)?,
      },
      contactor:         RawPerson {
        person_id: row.get(7)?,
        nick_name: row.get(8)?,
        last_name: row.get(9)?,
      },
    })
  }
}

pub struct RawCareTypeItem {
  pub care_type_item_id: String,
  pub care_item_id:      String,
  pub care_type_id:      String,
}

impl RawCareTypeItem {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      care_type_item_id: row.get(0)?,
      care_item_id:      row.get(1)?,
      care_type_id:      row.get(2)?,
    })
  }

  pub fn into_link(self) -> Result<CareTypeItem> {
    Ok(CareTypeItem {
      care_type_item_id: decode_uuid(&self.care_type_item_id)?,
      care_item_id:      decode_uuid(&self.care_item_id)?,
      care_type_id:      decode_uuid(&self.care_type_id)?,
    })
  }
}

pub struct RawCareContact {
  pub care_contact_id:     String,
  pub care_item_id:        String,
  pub contactor_person_id: String,
  pub contact_date_time:   String,
  pub description:         String,
}

impl RawCareContact {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      care_contact_id:     row.get(0)?,
      care_item_id:        row.get(1)?,
      contactor_person_id: row.get(2)?,
      contact_date_time:   row.get(3)?,
      description:         row.get(4)?,
    })
  }

  pub fn into_contact(self) -> Result<CareContact> {
    Ok(CareContact {
      care_contact_id:     decode_uuid(&self.care_contact_id)?,
      care_item_id:        decode_uuid(&self.care_item_id)?,
      contactor_person_id: decode_uuid(&self.contactor_person_id)?,
      contact_date_time:   decode_dt(&self.contact_date_time)?,
      description:         self.description,
    })
  }
}

pub struct RawAttribute {
  pub attribute_id:           String,
  pub entity_kind:            String,
  pub qualifier_care_type_id: Option<String>,
  pub key:                    String,
  pub name:                   String,
  pub description:            String,
  pub field_type:             String,
  pub config_json:            String,
  pub sort_order:             i32,
  pub is_grid_column:         bool,
}

impl RawAttribute {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      attribute_id:           row.get(0)?,
      entity_kind:            row.get(1)?,
      qualifier_care_type_id: row.get(2)?,
      key:                    row.get(3)?,
      name:                   row.get(4)?,
      description:            row.get(5)?,
      field_type:             row.get(6)?,
      config_json:            row.get(7)?,
      sort_order:             row.get(8)?,
      is_grid_column:         row.get(9)?,
    })
  }

  pub fn into_definition(self) -> Result<AttributeDefinition> {
    Ok(AttributeDefinition {
      attribute_id:   decode_uuid(&self.attribute_id)?,
      entity_kind:    decode_entity_kind(&self.entity_kind)?,
      care_type_id:   self.qualifier_care_type_id.as_deref().map(decode_uuid).transpose()?,
      key:            self.key,
      name:           self.name,
      description:    self.description,
      field_type:     self.field_type,
      config:         decode_config(&self.config_json)?,
      order:          self.sort_order,
      is_grid_column: self.is_grid_column,
    })
  }
}

// ─── Assembly ────────────────────────────────────────────────────────────────

/// Build cases from raw rows. Links and contacts are attached to their case
/// in the order given; rows whose case is not in `items` are dropped.
pub fn assemble_care_items(
  items: Vec<RawCareItem>,
  links: Vec<RawCareTypeItem>,
  contacts: Vec<RawCareContact>,
) -> Result<Vec<CareItem>> {
  let mut out = Vec::with_capacity(items.len());
  let mut index: HashMap<Uuid, usize> = HashMap::with_capacity(items.len());

  for raw in items {
    let item = CareItem {
      care_item_id:      decode_uuid(&raw.care_item_id)?,
      is_active:         raw.is_active,
      person:            raw.person.into_person()?,
      contactor:         raw.contactor.into_person()?,
      contact_date_time: decode_dt(&raw.contact_date_time)?,
      description:       raw.description,
      care_type_items:   Vec::new(),
      contacts:          Vec::new(),
    };
    index.insert(item.care_item_id, out.len());
    out.push(item);
  }

  for raw in links {
    let link = raw.into_link()?;
    if let Some(&i) = index.get(&link.care_item_id) {
      out[i].care_type_items.push(link);
    }
  }

  for raw in contacts {
    let contact = raw.into_contact()?;
    if let Some(&i) = index.get(&contact.care_item_id) {
      out[i].contacts.push(contact);
    }
  }

  Ok(out)
}
