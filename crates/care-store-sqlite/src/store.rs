//! [`SqliteStore`]: the SQLite implementation of [`CareStore`].

use std::path::Path;

use rusqlite::OptionalExtension as _;
use tracing::debug;
use uuid::Uuid;

use care_core::{
  attribute::{AttributeDefinition, AttributeValues, EntityKind, NewAttribute},
  care_item::{CareContact, CareItem, CareTypeItem, NewCareContact, NewCareItem},
  care_type::{CareType, NewCareType},
  listing::CareItemRow,
  person::{NewPerson, Person},
  store::CareStore,
};

use crate::{
  Error, Result,
  encode::{
    CARE_ITEM_SELECT, RawAttribute, RawCareContact, RawCareItem, RawCareType, RawCareTypeItem,
    RawPerson, assemble_care_items, decode_uuid, encode_config, encode_dt, encode_entity_kind,
    encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A pastoral care store backed by a single SQLite file.
///
/// The inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Does a row with `id` exist in `table`?
  async fn exists(&self, table: &'static str, column: &'static str, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);
    let found = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT 1 FROM {table} WHERE {column} = ?1"),
              rusqlite::params![id_str],
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false),
        )
      })
      .await?;
    Ok(found)
  }

  async fn require_person(&self, id: Uuid) -> Result<()> {
    if self.exists("people", "person_id", id).await? {
      Ok(())
    } else {
      Err(Error::PersonNotFound(id))
    }
  }

  async fn require_care_item(&self, id: Uuid) -> Result<()> {
    if self.exists("care_items", "care_item_id", id).await? {
      Ok(())
    } else {
      Err(Error::CareItemNotFound(id))
    }
  }

  /// Run raw SQL against the connection.
  #[cfg(test)]
  pub(crate) async fn execute_batch(&self, sql: String) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute_batch(&sql)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Row count of `table`.
  #[cfg(test)]
  pub(crate) async fn count_rows(&self, table: &'static str) -> Result<i64> {
    let n = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |r| r.get(0))?)
      })
      .await?;
    Ok(n)
  }
}

// ─── CareStore impl ──────────────────────────────────────────────────────────

impl CareStore for SqliteStore {
  type Error = Error;

  // ── People ────────────────────────────────────────────────────────────────

  async fn add_person(&self, input: NewPerson) -> Result<Person> {
    let person = Person {
      person_id: Uuid::new_v4(),
      nick_name: input.nick_name,
      last_name: input.last_name,
    };

    let id_str = encode_uuid(person.person_id);
    let nick   = person.nick_name.clone();
    let last   = person.last_name.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO people (person_id, nick_name, last_name) VALUES (?1, ?2, ?3)",
          rusqlite::params![id_str, nick, last],
        )?;
        Ok(())
      })
      .await?;

    Ok(person)
  }

  async fn get_person(&self, id: Uuid) -> Result<Option<Person>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawPerson> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT person_id, nick_name, last_name FROM people WHERE person_id = ?1",
              rusqlite::params![id_str],
              |row| {
                Ok(RawPerson {
                  person_id: row.get(0)?,
                  nick_name: row.get(1)?,
                  last_name: row.get(2)?,
                })
              },
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawPerson::into_person).transpose()
  }

  // ── Care types ────────────────────────────────────────────────────────────

  async fn add_care_type(&self, input: NewCareType) -> Result<CareType> {
    let care_type = CareType {
      care_type_id: Uuid::new_v4(),
      name:         input.name,
      is_active:    input.is_active,
    };

    let id_str    = encode_uuid(care_type.care_type_id);
    let name      = care_type.name.clone();
    let is_active = care_type.is_active;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO care_types (care_type_id, name, is_active) VALUES (?1, ?2, ?3)",
          rusqlite::params![id_str, name, is_active],
        )?;
        Ok(())
      })
      .await?;

    Ok(care_type)
  }

  async fn get_care_type(&self, id: Uuid) -> Result<Option<CareType>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawCareType> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT care_type_id, name, is_active FROM care_types WHERE care_type_id = ?1",
              rusqlite::params![id_str],
              RawCareType::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawCareType::into_care_type).transpose()
  }

  async fn get_care_types(&self, ids: Vec<Uuid>) -> Result<Vec<CareType>> {
    let mut id_strs: Vec<String> = Vec::with_capacity(ids.len());
    for id in ids.into_iter().map(encode_uuid) {
      if !id_strs.contains(&id) {
        id_strs.push(id);
      }
    }

    let raws: Vec<RawCareType> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn
          .prepare("SELECT care_type_id, name, is_active FROM care_types WHERE care_type_id = ?1")?;
        let mut rows = Vec::with_capacity(id_strs.len());
        for id in &id_strs {
          if let Some(raw) =
            stmt.query_row(rusqlite::params![id], RawCareType::from_row).optional()?
          {
            rows.push(raw);
          }
        }
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCareType::into_care_type).collect()
  }

  async fn list_care_types(&self, include_inactive: bool) -> Result<Vec<CareType>> {
    let raws: Vec<RawCareType> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT care_type_id, name, is_active FROM care_types
           WHERE is_active = 1 OR ?1
           ORDER BY name, care_type_id",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![include_inactive], RawCareType::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawCareType::into_care_type).collect()
  }

  // ── Cases ─────────────────────────────────────────────────────────────────

  async fn add_care_item(&self, input: NewCareItem) -> Result<CareItem> {
    let person = self
      .get_person(input.person_id)
      .await?
      .ok_or(Error::PersonNotFound(input.person_id))?;
    let contactor = self
      .get_person(input.contactor_person_id)
      .await?
      .ok_or(Error::PersonNotFound(input.contactor_person_id))?;

    let item = CareItem {
      care_item_id:      Uuid::new_v4(),
      is_active:         input.is_active,
      person,
      contactor,
      contact_date_time: input.contact_date_time,
      description:       input.description,
      care_type_items:   Vec::new(),
      contacts:          Vec::new(),
    };

    let id_str        = encode_uuid(item.care_item_id);
    let person_str    = encode_uuid(item.person.person_id);
    let contactor_str = encode_uuid(item.contactor.person_id);
    let at_str        = encode_dt(item.contact_date_time);
    let description   = item.description.clone();
    let is_active     = item.is_active;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO care_items (
             care_item_id, is_active, person_id, contactor_person_id,
             contact_date_time, description
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
          rusqlite::params![id_str, is_active, person_str, contactor_str, at_str, description],
        )?;
        Ok(())
      })
      .await?;

    Ok(item)
  }

  async fn add_care_type_item(&self, care_item_id: Uuid, care_type_id: Uuid) -> Result<CareTypeItem> {
    self.require_care_item(care_item_id).await?;
    if !self.exists("care_types", "care_type_id", care_type_id).await? {
      return Err(Error::CareTypeNotFound(care_type_id));
    }

    let link = CareTypeItem { care_type_item_id: Uuid::new_v4(), care_item_id, care_type_id };

    let id_str   = encode_uuid(link.care_type_item_id);
    let item_str = encode_uuid(care_item_id);
    let type_str = encode_uuid(care_type_id);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO care_type_items (care_type_item_id, care_item_id, care_type_id)
           VALUES (?1, ?2, ?3)",
          rusqlite::params![id_str, item_str, type_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(link)
  }

  async fn get_care_item(&self, id: Uuid) -> Result<Option<CareItem>> {
    let id_str = encode_uuid(id);

    let (items, links, contacts) = self
      .conn
      .call(move |conn| {
        let item: Option<RawCareItem> = conn
          .query_row(
            &format!("{CARE_ITEM_SELECT} WHERE ci.care_item_id = ?1"),
            rusqlite::params![id_str],
            RawCareItem::from_row,
          )
          .optional()?;
        let Some(item) = item else {
          return Ok((Vec::new(), Vec::new(), Vec::new()));
        };

        let links = conn
          .prepare(
            "SELECT care_type_item_id, care_item_id, care_type_id FROM care_type_items
             WHERE care_item_id = ?1 ORDER BY rowid",
          )?
          .query_map(rusqlite::params![id_str], RawCareTypeItem::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let contacts = conn
          .prepare(
            "SELECT care_contact_id, care_item_id, contactor_person_id, contact_date_time,
                    description
             FROM care_contacts WHERE care_item_id = ?1 ORDER BY rowid",
          )?
          .query_map(rusqlite::params![id_str], RawCareContact::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok((vec![item], links, contacts))
      })
      .await?;

    Ok(assemble_care_items(items, links, contacts)?.into_iter().next())
  }

  async fn set_care_item_active(&self, id: Uuid, is_active: bool) -> Result<()> {
    let id_str = encode_uuid(id);

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE care_items SET is_active = ?2 WHERE care_item_id = ?1",
          rusqlite::params![id_str, is_active],
        )?)
      })
      .await?;

    if changed == 0 {
      return Err(Error::CareItemNotFound(id));
    }
    Ok(())
  }

  async fn delete_care_item(&self, id: Uuid) -> Result<()> {
    let id_str = encode_uuid(id);

    let deleted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let contacts = tx.execute(
          "DELETE FROM care_contacts WHERE care_item_id = ?1",
          rusqlite::params![id_str],
        )?;
        tx.execute(
          "DELETE FROM attribute_values WHERE entity_id = ?1
              OR entity_id IN (SELECT care_type_item_id FROM care_type_items WHERE care_item_id = ?1)",
          rusqlite::params![id_str],
        )?;
        tx.execute(
          "DELETE FROM care_type_items WHERE care_item_id = ?1",
          rusqlite::params![id_str],
        )?;
        let items = tx.execute(
          "DELETE FROM care_items WHERE care_item_id = ?1",
          rusqlite::params![id_str],
        )?;
        if items == 0 {
          // Nothing to delete; leave the transaction uncommitted.
          return Ok(None);
        }
        tx.commit()?;
        Ok(Some(contacts))
      })
      .await?;

    match deleted {
      Some(contacts) => {
        debug!(care_item = %id, contacts, "care item deleted");
        Ok(())
      }
      None => Err(Error::CareItemNotFound(id)),
    }
  }

  // ── Contacts ──────────────────────────────────────────────────────────────

  async fn add_care_contact(&self, input: NewCareContact) -> Result<CareContact> {
    self.require_care_item(input.care_item_id).await?;
    self.require_person(input.contactor_person_id).await?;

    let contact = CareContact {
      care_contact_id:     Uuid::new_v4(),
      care_item_id:        input.care_item_id,
      contactor_person_id: input.contactor_person_id,
      contact_date_time:   input.contact_date_time,
      description:         input.description,
    };

    let id_str        = encode_uuid(contact.care_contact_id);
    let item_str      = encode_uuid(contact.care_item_id);
    let contactor_str = encode_uuid(contact.contactor_person_id);
    let at_str        = encode_dt(contact.contact_date_time);
    let description   = contact.description.clone();

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO care_contacts (
             care_contact_id, care_item_id, contactor_person_id, contact_date_time, description
           ) VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![id_str, item_str, contactor_str, at_str, description],
        )?;
        Ok(())
      })
      .await?;

    Ok(contact)
  }

  // ── Custom fields ─────────────────────────────────────────────────────────

  async fn add_attribute(&self, input: NewAttribute) -> Result<AttributeDefinition> {
    let definition = AttributeDefinition {
      attribute_id:   Uuid::new_v4(),
      entity_kind:    input.entity_kind,
      care_type_id:   input.care_type_id,
      key:            input.key,
      name:           input.name,
      description:    input.description,
      field_type:     input.field_type,
      config:         input.config,
      order:          input.order,
      is_grid_column: input.is_grid_column,
    };

    let id_str        = encode_uuid(definition.attribute_id);
    let kind_str      = encode_entity_kind(definition.entity_kind);
    let qualifier_str = definition.care_type_id.map(encode_uuid);
    let key           = definition.key.clone();
    let name          = definition.name.clone();
    let description   = definition.description.clone();
    let field_type    = definition.field_type.clone();
    let config_str    = encode_config(&definition.config)?;
    let order         = definition.order;
    let is_grid       = definition.is_grid_column;

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO attributes (
             attribute_id, entity_kind, qualifier_care_type_id, key, name,
             description, field_type, config_json, sort_order, is_grid_column
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
          rusqlite::params![
            id_str,
            kind_str,
            qualifier_str,
            key,
            name,
            description,
            field_type,
            config_str,
            order,
            is_grid,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(definition)
  }

  async fn list_attributes(&self, kind: EntityKind) -> Result<Vec<AttributeDefinition>> {
    let kind_str = encode_entity_kind(kind);

    let raws: Vec<RawAttribute> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT attribute_id, entity_kind, qualifier_care_type_id, key, name,
                  description, field_type, config_json, sort_order, is_grid_column
           FROM attributes WHERE entity_kind = ?1 ORDER BY rowid",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![kind_str], RawAttribute::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawAttribute::into_definition).collect()
  }

  async fn get_attribute_values(&self, entity_id: Uuid) -> Result<AttributeValues> {
    let id_str = encode_uuid(entity_id);

    let pairs: Vec<(String, String)> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn
          .prepare("SELECT attribute_key, value FROM attribute_values WHERE entity_id = ?1")?;
        let rows = stmt
          .query_map(rusqlite::params![id_str], |row| Ok((row.get(0)?, row.get(1)?)))?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    Ok(pairs.into_iter().collect())
  }

  async fn save_attribute_value(&self, entity_id: Uuid, key: String, value: String) -> Result<()> {
    let id_str = encode_uuid(entity_id);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO attribute_values (entity_id, attribute_key, value) VALUES (?1, ?2, ?3)
           ON CONFLICT (entity_id, attribute_key) DO UPDATE SET value = excluded.value",
          rusqlite::params![id_str, key, value],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Listing ───────────────────────────────────────────────────────────────

  async fn list_care_type_items(&self, care_type_id: Uuid) -> Result<Vec<CareItemRow>> {
    let type_str = encode_uuid(care_type_id);

    let (items, links, contacts, values) = self
      .conn
      .call(move |conn| {
        let in_type = "SELECT care_item_id FROM care_type_items WHERE care_type_id = ?1";

        let items = conn
          .prepare(&format!("{CARE_ITEM_SELECT} WHERE ci.care_item_id IN ({in_type})"))?
          .query_map(rusqlite::params![type_str], RawCareItem::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let links = conn
          .prepare(&format!(
            "SELECT care_type_item_id, care_item_id, care_type_id FROM care_type_items
             WHERE care_item_id IN ({in_type}) ORDER BY rowid"
          ))?
          .query_map(rusqlite::params![type_str], RawCareTypeItem::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let contacts = conn
          .prepare(&format!(
            "SELECT care_contact_id, care_item_id, contactor_person_id, contact_date_time,
                    description
             FROM care_contacts WHERE care_item_id IN ({in_type}) ORDER BY rowid"
          ))?
          .query_map(rusqlite::params![type_str], RawCareContact::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        let values = conn
          .prepare(
            "SELECT v.entity_id, v.attribute_key, v.value
             FROM attribute_values v
             JOIN care_type_items l ON l.care_type_item_id = v.entity_id
             WHERE l.care_type_id = ?1",
          )?
          .query_map(rusqlite::params![type_str], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?, row.get::<_, String>(2)?))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok((items, links, contacts, values))
      })
      .await?;

    let mut values_by_link: std::collections::HashMap<Uuid, AttributeValues> =
      std::collections::HashMap::new();
    for (entity_id, key, value) in values {
      values_by_link.entry(decode_uuid(&entity_id)?).or_default().insert(key, value);
    }

    let items = assemble_care_items(items, links, contacts)?;
    let mut rows = Vec::new();
    for item in items {
      for link in item.care_type_items.iter().filter(|l| l.care_type_id == care_type_id) {
        rows.push(CareItemRow {
          item:   item.clone(),
          link:   link.clone(),
          values: values_by_link.get(&link.care_type_item_id).cloned().unwrap_or_default(),
        });
      }
    }
    Ok(rows)
  }
}
