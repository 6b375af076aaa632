//! SQL schema for the pastoral care SQLite store.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Maintained by the host; read-only to the care workflows.
CREATE TABLE IF NOT EXISTS people (
    person_id  TEXT PRIMARY KEY,
    nick_name  TEXT NOT NULL,
    last_name  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS care_types (
    care_type_id TEXT PRIMARY KEY,
    name         TEXT NOT NULL,
    is_active    INTEGER NOT NULL DEFAULT 1
);

CREATE TABLE IF NOT EXISTS care_items (
    care_item_id        TEXT PRIMARY KEY,
    is_active           INTEGER NOT NULL,
    person_id           TEXT NOT NULL REFERENCES people(person_id),
    contactor_person_id TEXT NOT NULL REFERENCES people(person_id),
    contact_date_time   TEXT NOT NULL,   -- RFC 3339 UTC
    description         TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS care_contacts (
    care_contact_id     TEXT PRIMARY KEY,
    care_item_id        TEXT NOT NULL REFERENCES care_items(care_item_id),
    contactor_person_id TEXT NOT NULL REFERENCES people(person_id),
    contact_date_time   TEXT NOT NULL,
    description         TEXT NOT NULL DEFAULT ''
);

-- No uniqueness on (care_item_id, care_type_id): duplicate links are allowed.
CREATE TABLE IF NOT EXISTS care_type_items (
    care_type_item_id TEXT PRIMARY KEY,
    care_item_id      TEXT NOT NULL REFERENCES care_items(care_item_id),
    care_type_id      TEXT NOT NULL REFERENCES care_types(care_type_id)
);

CREATE TABLE IF NOT EXISTS attributes (
    attribute_id           TEXT PRIMARY KEY,
    entity_kind            TEXT NOT NULL,   -- 'care_item' | 'care_type_item' | 'care_contact'
    qualifier_care_type_id TEXT,
    key                    TEXT NOT NULL,
    name                   TEXT NOT NULL,
    description            TEXT NOT NULL DEFAULT '',
    field_type             TEXT NOT NULL,
    config_json            TEXT NOT NULL DEFAULT '{}',
    sort_order             INTEGER NOT NULL DEFAULT 0,
    is_grid_column         INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS attribute_values (
    entity_id     TEXT NOT NULL,
    attribute_key TEXT NOT NULL,
    value         TEXT NOT NULL,
    PRIMARY KEY (entity_id, attribute_key)
);

CREATE INDEX IF NOT EXISTS care_contacts_item_idx   ON care_contacts(care_item_id);
CREATE INDEX IF NOT EXISTS care_type_items_item_idx ON care_type_items(care_item_id);
CREATE INDEX IF NOT EXISTS care_type_items_type_idx ON care_type_items(care_type_id);
CREATE INDEX IF NOT EXISTS attributes_kind_idx      ON attributes(entity_kind);

PRAGMA user_version = 1;
";
