//! Custom-field types.
//!
//! Each field type is a [`FieldType`] implementation registered in a
//! [`FieldTypeRegistry`] under its type id. The listing composer hands
//! attribute filters to the field type of the definition being filtered and
//! treats the result as opaque.
//!
//! Filters are lists of strings, the same shape they are persisted in: usually
//! `[comparison, operand]`, e.g. `["Contains", "icu"]`.

use std::{
  collections::HashMap,
  fmt::{self, Write as _},
  sync::Arc,
};

use chrono::{
  DateTime, Utc,
  format::{Item, StrftimeItems},
};
use strum::{Display, EnumString};
use uuid::Uuid;

use crate::{Error, Result, attribute::ConfigBag, care_type::CareType, datetime::parse_date_time};

/// One configuration setting a field type understands.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigField {
  pub key:   &'static str,
  pub label: &'static str,
  pub help:  &'static str,
}

pub trait FieldType: Send + Sync {
  /// Registry key, e.g. `"text"`.
  fn type_id(&self) -> &'static str;

  /// The configuration settings an editor should offer.
  fn config_fields(&self) -> Vec<ConfigField>;

  /// Check a raw value against the configuration. Empty values are valid.
  fn validate_value(&self, config: &ConfigBag, value: &str) -> Result<(), String>;

  /// Render a raw value for display.
  fn format_value(&self, config: &ConfigBag, value: &str) -> String;

  /// Does `value` satisfy `filter`? A missing value is `None`. An empty or
  /// unusable filter matches everything.
  fn apply_filter(&self, config: &ConfigBag, filter: &[String], value: Option<&str>) -> bool;

  /// Render a filter for display next to the listing.
  fn format_filter(&self, config: &ConfigBag, filter: &[String]) -> String {
    let _ = config;
    match Filter::parse(filter, ComparisonType::EqualTo) {
      Some(f) if f.is_active() => f.describe(&format!("'{}'", f.operand)),
      _ => String::new(),
    }
  }
}

// ─── Comparisons ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum ComparisonType {
  EqualTo,
  NotEqualTo,
  Contains,
  DoesNotContain,
  StartsWith,
  EndsWith,
  IsBlank,
  IsNotBlank,
  GreaterThan,
  GreaterThanOrEqualTo,
  LessThan,
  LessThanOrEqualTo,
}

impl ComparisonType {
  fn is_blank_check(self) -> bool { matches!(self, Self::IsBlank | Self::IsNotBlank) }

  fn words(self) -> &'static str {
    match self {
      Self::EqualTo => "is",
      Self::NotEqualTo => "is not",
      Self::Contains => "contains",
      Self::DoesNotContain => "does not contain",
      Self::StartsWith => "starts with",
      Self::EndsWith => "ends with",
      Self::IsBlank => "is blank",
      Self::IsNotBlank => "is not blank",
      Self::GreaterThan => "is after",
      Self::GreaterThanOrEqualTo => "is on or after",
      Self::LessThan => "is before",
      Self::LessThanOrEqualTo => "is on or before",
    }
  }
}

/// A parsed `[comparison, operand]` filter.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Filter {
  comparison: ComparisonType,
  operand:    String,
}

impl Filter {
  /// A single element is either a bare comparison (`["IsBlank"]`) or a bare
  /// operand compared with `default`.
  fn parse(filter: &[String], default: ComparisonType) -> Option<Self> {
    match filter {
      [] => None,
      [only] => Some(match only.parse::<ComparisonType>() {
        Ok(comparison) => Self { comparison, operand: String::new() },
        Err(_) => Self { comparison: default, operand: only.trim().to_owned() },
      }),
      [comparison, operand, ..] => Some(Self {
        comparison: comparison.parse().unwrap_or(default),
        operand:    operand.trim().to_owned(),
      }),
    }
  }

  fn is_active(&self) -> bool { self.comparison.is_blank_check() || !self.operand.is_empty() }

  fn describe(&self, operand: &str) -> String {
    if self.comparison.is_blank_check() {
      self.comparison.words().to_owned()
    } else {
      format!("{} {operand}", self.comparison.words())
    }
  }
}

/// Lenient boolean parsing: `true/t/yes/y/1` and their negatives.
pub fn parse_bool(s: &str) -> Option<bool> {
  match s.trim().to_ascii_lowercase().as_str() {
    "true" | "t" | "yes" | "y" | "1" => Some(true),
    "false" | "f" | "no" | "n" | "0" => Some(false),
    _ => None,
  }
}

// ─── Text ────────────────────────────────────────────────────────────────────

const MAX_LENGTH_KEY: &str = "maxLength";

#[derive(Debug, Clone, Copy, Default)]
pub struct TextFieldType;

impl FieldType for TextFieldType {
  fn type_id(&self) -> &'static str { "text" }

  fn config_fields(&self) -> Vec<ConfigField> {
    vec![ConfigField {
      key:   MAX_LENGTH_KEY,
      label: "Max Characters",
      help:  "The maximum number of characters to allow. Leave blank for no limit.",
    }]
  }

  fn validate_value(&self, config: &ConfigBag, value: &str) -> Result<(), String> {
    let max = config
      .get(MAX_LENGTH_KEY)
      .and_then(|v| v.trim().parse::<usize>().ok())
      .filter(|max| *max > 0);
    match max {
      Some(max) if value.chars().count() > max => {
        Err(format!("value is longer than {max} characters"))
      }
      _ => Ok(()),
    }
  }

  fn format_value(&self, _: &ConfigBag, value: &str) -> String { value.to_owned() }

  fn apply_filter(&self, _: &ConfigBag, filter: &[String], value: Option<&str>) -> bool {
    let Some(f) = Filter::parse(filter, ComparisonType::Contains) else { return true };
    if !f.is_active() {
      return true;
    }

    let value = value.unwrap_or_default().trim().to_lowercase();
    let operand = f.operand.to_lowercase();
    match f.comparison {
      ComparisonType::EqualTo => value == operand,
      ComparisonType::NotEqualTo => value != operand,
      ComparisonType::Contains => value.contains(&operand),
      ComparisonType::DoesNotContain => !value.contains(&operand),
      ComparisonType::StartsWith => value.starts_with(&operand),
      ComparisonType::EndsWith => value.ends_with(&operand),
      ComparisonType::IsBlank => value.is_empty(),
      ComparisonType::IsNotBlank => !value.is_empty(),
      ComparisonType::GreaterThan => value > operand,
      ComparisonType::GreaterThanOrEqualTo => value >= operand,
      ComparisonType::LessThan => value < operand,
      ComparisonType::LessThanOrEqualTo => value <= operand,
    }
  }
}

// ─── Boolean ─────────────────────────────────────────────────────────────────

const TRUE_TEXT_KEY: &str = "truetext";
const FALSE_TEXT_KEY: &str = "falsetext";

#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanFieldType;

impl BooleanFieldType {
  fn text<'a>(config: &'a ConfigBag, value: bool) -> &'a str {
    let (key, fallback) = if value { (TRUE_TEXT_KEY, "Yes") } else { (FALSE_TEXT_KEY, "No") };
    config.get(key).map(String::as_str).filter(|s| !s.is_empty()).unwrap_or(fallback)
  }
}

impl FieldType for BooleanFieldType {
  fn type_id(&self) -> &'static str { "boolean" }

  fn config_fields(&self) -> Vec<ConfigField> {
    vec![
      ConfigField { key: TRUE_TEXT_KEY, label: "True Text", help: "The text to display when value is true." },
      ConfigField { key: FALSE_TEXT_KEY, label: "False Text", help: "The text to display when value is false." },
    ]
  }

  fn validate_value(&self, _: &ConfigBag, value: &str) -> Result<(), String> {
    if value.trim().is_empty() || parse_bool(value).is_some() {
      Ok(())
    } else {
      Err(format!("{value:?} is not a yes/no value"))
    }
  }

  fn format_value(&self, config: &ConfigBag, value: &str) -> String {
    parse_bool(value).map(|b| Self::text(config, b).to_owned()).unwrap_or_default()
  }

  fn apply_filter(&self, _: &ConfigBag, filter: &[String], value: Option<&str>) -> bool {
    let Some(f) = Filter::parse(filter, ComparisonType::EqualTo) else { return true };
    let Some(wanted) = parse_bool(&f.operand) else { return true };
    let actual = value.and_then(parse_bool).unwrap_or(false);
    match f.comparison {
      ComparisonType::NotEqualTo => actual != wanted,
      _ => actual == wanted,
    }
  }

  fn format_filter(&self, config: &ConfigBag, filter: &[String]) -> String {
    match Filter::parse(filter, ComparisonType::EqualTo) {
      Some(f) => match parse_bool(&f.operand) {
        Some(b) => f.describe(&format!("'{}'", Self::text(config, b))),
        None => String::new(),
      },
      None => String::new(),
    }
  }
}

// ─── Date ────────────────────────────────────────────────────────────────────

const DATE_FORMAT_KEY: &str = "format";
const DEFAULT_DATE_FORMAT: &str = "%m/%d/%Y";

/// Does chrono understand every specifier in `fmt`?
fn is_valid_date_format(fmt: &str) -> bool {
  StrftimeItems::new(fmt).all(|item| !matches!(item, Item::Error))
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DateFieldType;

impl FieldType for DateFieldType {
  fn type_id(&self) -> &'static str { "date" }

  fn config_fields(&self) -> Vec<ConfigField> {
    vec![ConfigField {
      key:   DATE_FORMAT_KEY,
      label: "Date Format",
      help:  "The strftime format used to display the date. Defaults to MM/DD/YYYY.",
    }]
  }

  fn validate_value(&self, config: &ConfigBag, value: &str) -> Result<(), String> {
    if let Some(fmt) = config.get(DATE_FORMAT_KEY).filter(|f| !is_valid_date_format(f)) {
      return Err(format!("{fmt:?} is not a valid date format"));
    }
    if value.trim().is_empty() || parse_date_time(value).is_some() {
      Ok(())
    } else {
      Err(format!("{value:?} is not a valid date"))
    }
  }

  fn format_value(&self, config: &ConfigBag, value: &str) -> String {
    let fmt = config
      .get(DATE_FORMAT_KEY)
      .map(String::as_str)
      .filter(|f| !f.is_empty() && is_valid_date_format(f))
      .unwrap_or(DEFAULT_DATE_FORMAT);
    let Some(dt) = parse_date_time(value) else { return String::new() };
    let mut out = String::new();
    match write!(out, "{}", dt.format(fmt)) {
      Ok(()) => out,
      Err(_) => dt.format(DEFAULT_DATE_FORMAT).to_string(),
    }
  }

  fn apply_filter(&self, _: &ConfigBag, filter: &[String], value: Option<&str>) -> bool {
    let Some(f) = Filter::parse(filter, ComparisonType::EqualTo) else { return true };
    let actual: Option<DateTime<Utc>> = value.and_then(parse_date_time);
    match f.comparison {
      ComparisonType::IsBlank => return actual.is_none(),
      ComparisonType::IsNotBlank => return actual.is_some(),
      _ => {}
    }
    let Some(operand) = parse_date_time(&f.operand) else { return true };
    let Some(actual) = actual else { return false };

    let (actual, operand) = (actual.date_naive(), operand.date_naive());
    match f.comparison {
      ComparisonType::NotEqualTo => actual != operand,
      ComparisonType::GreaterThan => actual > operand,
      ComparisonType::GreaterThanOrEqualTo => actual >= operand,
      ComparisonType::LessThan => actual < operand,
      ComparisonType::LessThanOrEqualTo => actual <= operand,
      _ => actual == operand,
    }
  }
}

// ─── Care types ──────────────────────────────────────────────────────────────

pub const INCLUDE_INACTIVE_KEY: &str = "includeInactive";
pub const REPEAT_COLUMNS_KEY: &str = "repeatColumns";
const DEFAULT_REPEAT_COLUMNS: usize = 4;

/// A multi-select of care types. Values are comma-delimited care type ids.
#[derive(Debug, Clone, Default)]
pub struct CareTypesFieldType {
  care_types: Vec<CareType>,
}

impl CareTypesFieldType {
  pub fn new(care_types: Vec<CareType>) -> Self { Self { care_types } }

  /// Selectable `(id, name)` pairs. Inactive care types are offered only when
  /// the configuration says `includeInactive`.
  pub fn list_source(&self, config: &ConfigBag) -> Vec<(String, String)> {
    let include_inactive = config
      .get(INCLUDE_INACTIVE_KEY)
      .and_then(|v| parse_bool(v))
      .unwrap_or(false);
    self
      .care_types
      .iter()
      .filter(|ct| ct.is_active || include_inactive)
      .map(|ct| (ct.care_type_id.to_string(), ct.name.clone()))
      .collect()
  }

  /// Number of columns the selector is laid out in; 4 when unset or zero.
  pub fn repeat_columns(config: &ConfigBag) -> usize {
    config
      .get(REPEAT_COLUMNS_KEY)
      .and_then(|v| v.trim().parse::<usize>().ok())
      .filter(|n| *n != 0)
      .unwrap_or(DEFAULT_REPEAT_COLUMNS)
  }

  fn ids(value: &str) -> Vec<Uuid> {
    value
      .split(',')
      .filter_map(|s| Uuid::parse_str(s.trim()).ok())
      .collect()
  }

  /// Names of the selected care types, in list-source order.
  fn names(&self, config: &ConfigBag, ids: &[Uuid]) -> Vec<String> {
    self
      .list_source(config)
      .into_iter()
      .filter(|(id, _)| Uuid::parse_str(id).is_ok_and(|id| ids.contains(&id)))
      .map(|(_, name)| name)
      .collect()
  }

  /// Names of the selected care types, in the order `ids` gives them.
  fn names_in_order(&self, config: &ConfigBag, ids: &[Uuid]) -> Vec<String> {
    let source = self.list_source(config);
    ids
      .iter()
      .filter_map(|id| {
        let id = id.to_string();
        source.iter().find(|(key, _)| *key == id).map(|(_, name)| name.clone())
      })
      .collect()
  }
}

impl FieldType for CareTypesFieldType {
  fn type_id(&self) -> &'static str { "care_types" }

  fn config_fields(&self) -> Vec<ConfigField> {
    vec![
      ConfigField {
        key:   INCLUDE_INACTIVE_KEY,
        label: "Include Inactive",
        help:  "When set, inactive care types will be included in the list.",
      },
      ConfigField {
        key:   REPEAT_COLUMNS_KEY,
        label: "Columns",
        help:  "How many columns the list should use before going to the next row. If blank or 0 then 4 columns will be displayed.",
      },
    ]
  }

  fn validate_value(&self, _: &ConfigBag, value: &str) -> Result<(), String> {
    for part in value.split(',').map(str::trim).filter(|s| !s.is_empty()) {
      let known = Uuid::parse_str(part)
        .is_ok_and(|id| self.care_types.iter().any(|ct| ct.care_type_id == id));
      if !known {
        return Err(format!("{part:?} is not a known care type"));
      }
    }
    Ok(())
  }

  fn format_value(&self, config: &ConfigBag, value: &str) -> String {
    self.names(config, &Self::ids(value)).join(", ")
  }

  fn apply_filter(&self, _: &ConfigBag, filter: &[String], value: Option<&str>) -> bool {
    let Some(f) = Filter::parse(filter, ComparisonType::Contains) else { return true };
    let wanted = Self::ids(&f.operand);
    if wanted.is_empty() {
      return true;
    }
    let actual = Self::ids(value.unwrap_or_default());
    let any = wanted.iter().any(|id| actual.contains(id));
    match f.comparison {
      ComparisonType::DoesNotContain | ComparisonType::NotEqualTo => !any,
      _ => any,
    }
  }

  fn format_filter(&self, config: &ConfigBag, filter: &[String]) -> String {
    match Filter::parse(filter, ComparisonType::Contains) {
      Some(f) => {
        let names = self.names_in_order(config, &Self::ids(&f.operand));
        if names.is_empty() {
          String::new()
        } else {
          f.describe(&format!("'{}'", names.join("' OR '")))
        }
      }
      None => String::new(),
    }
  }
}

// ─── Registry ────────────────────────────────────────────────────────────────

/// Field types keyed by type id, resolved at lookup time.
#[derive(Clone, Default)]
pub struct FieldTypeRegistry {
  types: HashMap<&'static str, Arc<dyn FieldType>>,
}

impl fmt::Debug for FieldTypeRegistry {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let mut keys: Vec<_> = self.types.keys().collect();
    keys.sort();
    f.debug_struct("FieldTypeRegistry").field("types", &keys).finish()
  }
}

impl FieldTypeRegistry {
  pub fn new() -> Self { Self::default() }

  /// The built-in field types. The care types are the ones the care-types
  /// field can offer.
  pub fn with_builtins(care_types: Vec<CareType>) -> Self {
    let mut registry = Self::new();
    registry.register(TextFieldType);
    registry.register(BooleanFieldType);
    registry.register(DateFieldType);
    registry.register(CareTypesFieldType::new(care_types));
    registry
  }

  /// Register (or replace) a field type under its own type id.
  pub fn register(&mut self, field_type: impl FieldType + 'static) {
    self.types.insert(field_type.type_id(), Arc::new(field_type));
  }

  pub fn get(&self, type_id: &str) -> Result<&dyn FieldType> {
    self
      .types
      .get(type_id)
      .map(|ft| ft.as_ref())
      .ok_or_else(|| Error::UnknownFieldType(type_id.to_owned()))
  }
}
