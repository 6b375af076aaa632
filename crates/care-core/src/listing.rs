//! Filtered, sorted listing of the cases linked to one care type.
//!
//! Predicates are applied in a fixed order and AND-combined: care type
//! (always), status, initial-contact date range, most-recent-contact date
//! range, context person, subject person, contactor, then custom-field
//! filters delegated to each definition's field type.
//!
//! Filter criteria are persisted through a [`PreferenceStore`] so they survive
//! between requests.

use std::{cmp::Ordering, collections::BTreeMap};

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::{
  Error, Result,
  attribute::{AttributeDefinition, AttributeValues, EntityKind, grid_attributes},
  auth::{Authorizer, Resource, Viewer},
  care_item::{CareItem, CareTypeItem},
  care_type::CareType,
  datetime::parse_date_time,
  field_type::FieldTypeRegistry,
  preferences::{PreferenceStore, get_uuid},
  store::CareStore,
};

// ─── Preference keys ─────────────────────────────────────────────────────────

pub const STATUS_KEY: &str = "Status";
pub const DATE_RANGE_KEY: &str = "DateRange";
pub const LAST_CONTACT_RANGE_KEY: &str = "LastContactDateRange";
pub const PERSON_KEY: &str = "Person";
pub const CONTACTOR_KEY: &str = "Contactor";
pub const SELECTED_TYPE_KEY: &str = "SelectedCareType";

// ─── Criteria ────────────────────────────────────────────────────────────────

#[derive(
  Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[strum(ascii_case_insensitive)]
pub enum StatusFilter {
  #[default]
  All,
  Active,
  Inactive,
}

impl StatusFilter {
  pub fn matches(self, is_active: bool) -> bool {
    match self {
      Self::All => true,
      Self::Active => is_active,
      Self::Inactive => !is_active,
    }
  }
}

/// An inclusive range; either bound may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
  pub start: Option<DateTime<Utc>>,
  pub end:   Option<DateTime<Utc>>,
}

impl DateRange {
  pub fn is_empty(&self) -> bool { self.start.is_none() && self.end.is_none() }

  pub fn contains(&self, at: DateTime<Utc>) -> bool {
    self.start.is_none_or(|s| at >= s) && self.end.is_none_or(|e| at <= e)
  }

  /// `"start|end"`, each side RFC 3339 or empty.
  pub fn to_delimited(&self) -> String {
    let side = |b: Option<DateTime<Utc>>| b.map(|d| d.to_rfc3339()).unwrap_or_default();
    format!("{}|{}", side(self.start), side(self.end))
  }

  /// Parse `"start|end"`. A bare date as the end bound covers that whole
  /// day.
  pub fn from_delimited(s: &str) -> Result<Self> {
    let s = s.trim();
    if s.is_empty() {
      return Ok(Self::default());
    }
    let (start, end) = s.split_once('|').unwrap_or((s, ""));
    Ok(Self {
      start: parse_bound(start, false).map_err(|_| Error::InvalidDateRange(s.to_owned()))?,
      end:   parse_bound(end, true).map_err(|_| Error::InvalidDateRange(s.to_owned()))?,
    })
  }
}

fn parse_bound(s: &str, end_of_day: bool) -> std::result::Result<Option<DateTime<Utc>>, ()> {
  let s = s.trim();
  if s.is_empty() {
    return Ok(None);
  }
  if end_of_day {
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
      let next = date.checked_add_days(Days::new(1)).ok_or(())?;
      let midnight = next.and_hms_opt(0, 0, 0).ok_or(())?.and_utc();
      return Ok(Some(midnight - chrono::Duration::milliseconds(1)));
    }
  }
  parse_date_time(s).map(Some).ok_or(())
}

#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SortColumn {
  ContactDateTime,
  Name,
  ContactorName,
  LastContactDate,
  Description,
  IsActive,
}

#[derive(
  Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SortDirection {
  #[default]
  Ascending,
  Descending,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortProperty {
  pub column:    SortColumn,
  #[serde(default)]
  pub direction: SortDirection,
}

/// The viewer-chosen filter criteria.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingFilter {
  #[serde(default)]
  pub status:             StatusFilter,
  #[serde(default)]
  pub date_range:         DateRange,
  #[serde(default)]
  pub last_contact_range: DateRange,
  pub person_id:          Option<Uuid>,
  pub contactor_id:       Option<Uuid>,
  /// Custom-field filters keyed by definition key.
  #[serde(default)]
  pub attribute_filters:  BTreeMap<String, Vec<String>>,
}

impl ListingFilter {
  /// Read the stored criteria. Values that no longer parse are ignored.
  pub fn load<P: PreferenceStore + ?Sized>(prefs: &P, attributes: &[AttributeDefinition]) -> Self {
    let range = |key: &str| {
      prefs
        .get(key)
        .and_then(|v| DateRange::from_delimited(&v).ok())
        .unwrap_or_default()
    };

    let attribute_filters = attributes
      .iter()
      .filter_map(|a| {
        let raw = prefs.get(&a.key)?;
        let values: Vec<String> = serde_json::from_str(&raw).ok()?;
        Some((a.key.clone(), values))
      })
      .collect();

    Self {
      status: prefs
        .get(STATUS_KEY)
        .and_then(|v| v.parse().ok())
        .unwrap_or_default(),
      date_range: range(DATE_RANGE_KEY),
      last_contact_range: range(LAST_CONTACT_RANGE_KEY),
      person_id: get_uuid(prefs, PERSON_KEY),
      contactor_id: get_uuid(prefs, CONTACTOR_KEY),
      attribute_filters,
    }
  }

  /// Persist the criteria. Attribute filters are stored as JSON string lists;
  /// definitions without a filter have their stored value cleared.
  pub fn save<P: PreferenceStore + ?Sized>(&self, prefs: &mut P, attributes: &[AttributeDefinition]) {
    let range = |r: &DateRange| (!r.is_empty()).then(|| r.to_delimited());

    prefs.set(STATUS_KEY, Some(self.status.to_string()));
    prefs.set(DATE_RANGE_KEY, range(&self.date_range));
    prefs.set(LAST_CONTACT_RANGE_KEY, range(&self.last_contact_range));
    prefs.set(PERSON_KEY, self.person_id.map(|id| id.to_string()));
    prefs.set(CONTACTOR_KEY, self.contactor_id.map(|id| id.to_string()));

    for attribute in attributes {
      let encoded = self
        .attribute_filters
        .get(&attribute.key)
        .filter(|v| !v.is_empty())
        .and_then(|v| serde_json::to_string(v).ok());
      prefs.set(&attribute.key, encoded);
    }
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListingOptions {
  /// Host configuration: show only active cases on a session's first view.
  pub hide_inactive_by_default: bool,
  pub first_view:               bool,
}

impl ListingOptions {
  fn forces_active(self) -> bool { self.hide_inactive_by_default && self.first_view }
}

/// Everything [`compose`] needs besides the rows.
#[derive(Debug, Clone, Default)]
pub struct ListingQuery {
  pub filter:         ListingFilter,
  /// The person the view is bound to, if any (e.g. a person's profile page).
  pub context_person: Option<Uuid>,
  pub sort:           Option<SortProperty>,
  pub options:        ListingOptions,
}

// ─── Rows ────────────────────────────────────────────────────────────────────

/// One case as seen through one of its care type links.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CareItemRow {
  pub item:   CareItem,
  pub link:   CareTypeItem,
  /// Custom-field values stored on `link`.
  pub values: AttributeValues,
}

// ─── Composition ─────────────────────────────────────────────────────────────

/// Apply the query's predicates and sort to rows already restricted to one
/// care type.
pub fn compose(
  rows: Vec<CareItemRow>,
  query: &ListingQuery,
  attributes: &[AttributeDefinition],
  registry: &FieldTypeRegistry,
) -> Vec<CareItemRow> {
  let filter = &query.filter;
  let status = if query.options.forces_active() { StatusFilter::Active } else { filter.status };

  let mut rows: Vec<CareItemRow> = rows
    .into_iter()
    .filter(|r| status.matches(r.item.is_active))
    .filter(|r| filter.date_range.contains(r.item.contact_date_time))
    .filter(|r| {
      filter.last_contact_range.is_empty()
        || r
          .item
          .last_contact_date()
          .is_some_and(|d| filter.last_contact_range.contains(d))
    })
    .filter(|r| query.context_person.is_none_or(|p| r.item.person.person_id == p))
    .filter(|r| filter.person_id.is_none_or(|p| r.item.person.person_id == p))
    .filter(|r| filter.contactor_id.is_none_or(|p| r.item.contactor.person_id == p))
    .collect();

  for attribute in attributes {
    let Some(values) = filter.attribute_filters.get(&attribute.key).filter(|v| !v.is_empty())
    else {
      continue;
    };
    match registry.get(&attribute.field_type) {
      Ok(field_type) => rows.retain(|r| {
        field_type.apply_filter(
          &attribute.config,
          values,
          r.values.get(&attribute.key).map(String::as_str),
        )
      }),
      Err(e) => warn!(key = %attribute.key, "skipping attribute filter: {e}"),
    }
  }

  sort_rows(&mut rows, query.sort);
  rows
}

fn sort_rows(rows: &mut [CareItemRow], sort: Option<SortProperty>) {
  match sort {
    Some(SortProperty { column, direction }) => rows.sort_by(|a, b| {
      let ord = compare_by(column, &a.item, &b.item);
      match direction {
        SortDirection::Ascending => ord,
        SortDirection::Descending => ord.reverse(),
      }
    }),
    None => rows.sort_by(|a, b| {
      b.item
        .contact_date_time
        .cmp(&a.item.contact_date_time)
        .then_with(|| a.item.person.last_name.cmp(&b.item.person.last_name))
        .then_with(|| a.item.person.nick_name.cmp(&b.item.person.nick_name))
    }),
  }
}

fn compare_by(column: SortColumn, a: &CareItem, b: &CareItem) -> Ordering {
  match column {
    SortColumn::ContactDateTime => a.contact_date_time.cmp(&b.contact_date_time),
    SortColumn::Name => (&a.person.last_name, &a.person.nick_name)
      .cmp(&(&b.person.last_name, &b.person.nick_name)),
    SortColumn::ContactorName => (&a.contactor.last_name, &a.contactor.nick_name)
      .cmp(&(&b.contactor.last_name, &b.contactor.nick_name)),
    // `None` orders before any date, so cases without contacts sort lowest.
    SortColumn::LastContactDate => a.last_contact_date().cmp(&b.last_contact_date()),
    SortColumn::Description => a.description.cmp(&b.description),
    SortColumn::IsActive => a.is_active.cmp(&b.is_active),
  }
}

// ─── Listing ─────────────────────────────────────────────────────────────────

/// Input to [`build_listing`].
#[derive(Debug, Clone)]
pub struct ListingRequest {
  pub care_type_id:   Uuid,
  pub viewer:         Viewer,
  pub context_person: Option<Uuid>,
  /// Newly applied criteria. They are saved to the viewer's preferences;
  /// when `None` the stored criteria are used.
  pub filter:         Option<ListingFilter>,
  pub sort:           Option<SortProperty>,
  pub options:        ListingOptions,
}

#[derive(Debug, Clone, Serialize)]
pub struct Listing {
  pub care_type:  CareType,
  /// Create and delete affordances are offered.
  pub can_edit:   bool,
  /// Custom-field columns (and filters) for this care type.
  pub attributes: Vec<AttributeDefinition>,
  /// The criteria that were applied.
  pub filter:     ListingFilter,
  pub rows:       Vec<CareItemRow>,
}

/// Build the listing for one care type.
///
/// Returns `Ok(None)` when the care type does not exist or the viewer may not
/// view it; the list is omitted rather than reported as an error.
pub async fn build_listing<S, A, P>(
  store: &S,
  authorizer: &A,
  prefs: &mut P,
  registry: &FieldTypeRegistry,
  request: ListingRequest,
) -> Result<Option<Listing>, S::Error>
where
  S: CareStore,
  A: Authorizer + ?Sized,
  P: PreferenceStore + ?Sized,
{
  let Some(care_type) = store.get_care_type(request.care_type_id).await? else {
    return Ok(None);
  };

  let resource = Resource::CareType(care_type.care_type_id);
  let can_edit = authorizer.can_edit(request.viewer, resource);
  if !can_edit && !authorizer.can_view(request.viewer, resource) {
    debug!(care_type = %care_type.care_type_id, "listing omitted: viewer lacks view capability");
    return Ok(None);
  }

  prefs.set(SELECTED_TYPE_KEY, Some(care_type.care_type_id.to_string()));
  if request.options.forces_active() {
    prefs.set(STATUS_KEY, Some(StatusFilter::Active.to_string()));
  }

  let definitions = store.list_attributes(EntityKind::CareTypeItem).await?;
  let attributes =
    grid_attributes(&definitions, care_type.care_type_id, authorizer, request.viewer);

  let filter = match request.filter {
    Some(mut filter) => {
      if request.options.forces_active() {
        filter.status = StatusFilter::Active;
      }
      filter.save(prefs, &attributes);
      filter
    }
    None => ListingFilter::load(prefs, &attributes),
  };

  let query = ListingQuery {
    filter,
    context_person: request.context_person,
    sort: request.sort,
    options: request.options,
  };

  let rows = store.list_care_type_items(care_type.care_type_id).await?;
  let total = rows.len();
  let rows = compose(rows, &query, &attributes, registry);
  debug!(care_type = %care_type.care_type_id, total, shown = rows.len(), "listing composed");

  Ok(Some(Listing { care_type, can_edit, attributes, filter: query.filter, rows }))
}

// ─── Summary ─────────────────────────────────────────────────────────────────

/// An active care type the viewer may view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CareTypeSummary {
  pub care_type_id: Uuid,
  pub name:         String,
  pub is_active:    bool,
  pub can_edit:     bool,
}

pub async fn summarize_care_types<S, A>(
  store: &S,
  authorizer: &A,
  viewer: Viewer,
) -> Result<Vec<CareTypeSummary>, S::Error>
where
  S: CareStore,
  A: Authorizer + ?Sized,
{
  let care_types = store.list_care_types(false).await?;
  Ok(
    care_types
      .into_iter()
      .filter_map(|ct| {
        let resource = Resource::CareType(ct.care_type_id);
        let can_edit = authorizer.can_edit(viewer, resource);
        (can_edit || authorizer.can_view(viewer, resource)).then_some(CareTypeSummary {
          care_type_id: ct.care_type_id,
          name: ct.name,
          is_active: ct.is_active,
          can_edit,
        })
      })
      .collect(),
  )
}

/// The stored selected care type, if it is still one the viewer can see.
pub fn selected_care_type<P: PreferenceStore + ?Sized>(
  prefs: &P,
  summaries: &[CareTypeSummary],
) -> Option<Uuid> {
  get_uuid(prefs, SELECTED_TYPE_KEY).filter(|id| summaries.iter().any(|s| s.care_type_id == *id))
}

// ─── Filter display ──────────────────────────────────────────────────────────

/// Human-readable `(label, value)` pairs for the active criteria.
pub async fn describe_filters<S: CareStore>(
  store: &S,
  filter: &ListingFilter,
  attributes: &[AttributeDefinition],
  registry: &FieldTypeRegistry,
) -> Result<Vec<(String, String)>, S::Error> {
  let mut out = Vec::new();
  let fmt_range = |r: &DateRange| {
    let side = |b: Option<DateTime<Utc>>| b.map(|d| d.format("%m/%d/%Y").to_string());
    match (side(r.start), side(r.end)) {
      (Some(s), Some(e)) => format!("{s} to {e}"),
      (Some(s), None) => format!("from {s}"),
      (None, Some(e)) => format!("through {e}"),
      (None, None) => String::new(),
    }
  };

  if !filter.date_range.is_empty() {
    out.push(("Date Range".to_owned(), fmt_range(&filter.date_range)));
  }
  if !filter.last_contact_range.is_empty() {
    out.push(("Last Contact Date Range".to_owned(), fmt_range(&filter.last_contact_range)));
  }
  for (label, id) in [("Person", filter.person_id), ("Contactor", filter.contactor_id)] {
    if let Some(id) = id {
      let name = store.get_person(id).await?.map(|p| p.full_name()).unwrap_or_default();
      out.push((label.to_owned(), name));
    }
  }
  if filter.status != StatusFilter::All {
    out.push(("Status".to_owned(), filter.status.to_string()));
  }
  for attribute in attributes {
    let Some(values) = filter.attribute_filters.get(&attribute.key) else { continue };
    if let Ok(field_type) = registry.get(&attribute.field_type) {
      let text = field_type.format_filter(&attribute.config, values);
      if !text.is_empty() {
        out.push((attribute.name.clone(), text));
      }
    }
  }
  Ok(out)
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::{
    attribute::fixtures::definition,
    care_item::fixtures::{at, care_item, contact, link, person},
    preferences::MemoryPreferences,
  };

  fn row(mut item: CareItem, care_type_id: Uuid) -> CareItemRow {
    let link = link(&mut item, care_type_id);
    CareItemRow { item, link, values: AttributeValues::new() }
  }

  fn names(rows: &[CareItemRow]) -> Vec<String> {
    rows.iter().map(|r| r.item.person.nick_name.clone()).collect()
  }

  fn compose_with(rows: Vec<CareItemRow>, query: &ListingQuery) -> Vec<CareItemRow> {
    compose(rows, query, &[], &FieldTypeRegistry::with_builtins(Vec::new()))
  }

  #[test]
  fn default_sort_is_date_desc_then_last_then_nick() {
    let ct = Uuid::new_v4();
    let rows = vec![
      row(care_item(person("Bob", "Young"), at(2024, 1, 1)), ct),
      row(care_item(person("Zoe", "Adams"), at(2024, 2, 1)), ct),
      row(care_item(person("Amy", "Adams"), at(2024, 2, 1)), ct),
      row(care_item(person("Cal", "Baker"), at(2024, 2, 1)), ct),
    ];
    let out = compose_with(rows, &ListingQuery::default());
    assert_eq!(names(&out), vec!["Amy", "Zoe", "Cal", "Bob"]);
  }

  #[test]
  fn status_filter_and_forced_active_on_first_view() {
    let ct = Uuid::new_v4();
    let mut closed = care_item(person("Old", "Case"), at(2024, 1, 1));
    closed.is_active = false;
    let rows = vec![row(closed, ct), row(care_item(person("New", "Case"), at(2024, 1, 2)), ct)];

    let mut query = ListingQuery::default();
    assert_eq!(compose_with(rows.clone(), &query).len(), 2);

    query.filter.status = StatusFilter::Inactive;
    assert_eq!(names(&compose_with(rows.clone(), &query)), vec!["Old"]);

    query.filter.status = StatusFilter::All;
    query.options = ListingOptions { hide_inactive_by_default: true, first_view: true };
    assert_eq!(names(&compose_with(rows.clone(), &query)), vec!["New"]);

    query.options.first_view = false;
    assert_eq!(compose_with(rows, &query).len(), 2);
  }

  #[test]
  fn initial_contact_range_is_inclusive() {
    let ct = Uuid::new_v4();
    let rows = vec![
      row(care_item(person("A", "A"), at(2024, 1, 1)), ct),
      row(care_item(person("B", "B"), at(2024, 1, 15)), ct),
      row(care_item(person("C", "C"), at(2024, 1, 31)), ct),
    ];
    let mut query = ListingQuery::default();
    query.filter.date_range = DateRange { start: Some(at(2024, 1, 1)), end: Some(at(2024, 1, 15)) };
    assert_eq!(names(&compose_with(rows.clone(), &query)), vec!["B", "A"]);

    query.filter.date_range = DateRange { start: Some(at(2024, 1, 15)), end: None };
    assert_eq!(names(&compose_with(rows, &query)), vec!["C", "B"]);
  }

  #[test]
  fn last_contact_range_never_matches_cases_without_contacts() {
    let ct = Uuid::new_v4();
    let mut visited = care_item(person("Visited", "X"), at(2024, 1, 1));
    contact(&mut visited, at(2024, 1, 3), "old");
    contact(&mut visited, at(2024, 1, 20), "recent");
    let quiet = care_item(person("Quiet", "X"), at(2024, 1, 1));
    let rows = vec![row(visited, ct), row(quiet, ct)];

    let mut query = ListingQuery::default();
    query.filter.last_contact_range = DateRange { start: None, end: Some(at(2030, 1, 1)) };
    assert_eq!(names(&compose_with(rows.clone(), &query)), vec!["Visited"]);

    // Only the most recent contact counts.
    query.filter.last_contact_range =
      DateRange { start: Some(at(2024, 1, 1)), end: Some(at(2024, 1, 5)) };
    assert!(compose_with(rows, &query).is_empty());
  }

  #[test]
  fn person_filters() {
    let ct = Uuid::new_v4();
    let ann = person("Ann", "Lee");
    let ann_id = ann.person_id;
    let mut by_ted = care_item(person("Bo", "Ray"), at(2024, 1, 1));
    let ted = person("Ted", "Decker");
    let ted_id = ted.person_id;
    by_ted.contactor = ted;
    let rows = vec![row(care_item(ann, at(2024, 1, 1)), ct), row(by_ted, ct)];

    let mut query = ListingQuery { context_person: Some(ann_id), ..Default::default() };
    assert_eq!(names(&compose_with(rows.clone(), &query)), vec!["Ann"]);

    query.context_person = None;
    query.filter.person_id = Some(ann_id);
    assert_eq!(names(&compose_with(rows.clone(), &query)), vec!["Ann"]);

    query.filter.person_id = None;
    query.filter.contactor_id = Some(ted_id);
    assert_eq!(names(&compose_with(rows, &query)), vec!["Bo"]);
  }

  #[test]
  fn attribute_filters_delegate_to_field_type() {
    let ct = Uuid::new_v4();
    let room = definition(Some(ct), "Room", 0);
    let mut icu = row(care_item(person("Icu", "X"), at(2024, 1, 1)), ct);
    icu.values.insert("Room".into(), "ICU 4".into());
    let ward = row(care_item(person("Ward", "X"), at(2024, 1, 2)), ct);

    let mut query = ListingQuery::default();
    query
      .filter
      .attribute_filters
      .insert("Room".into(), vec!["Contains".into(), "icu".into()]);
    let registry = FieldTypeRegistry::with_builtins(Vec::new());
    let out = compose(vec![icu, ward], &query, &[room], &registry);
    assert_eq!(names(&out), vec!["Icu"]);
  }

  #[test]
  fn last_contact_sort_puts_uncontacted_lowest() {
    let ct = Uuid::new_v4();
    let mut early = care_item(person("Early", "X"), at(2024, 1, 1));
    contact(&mut early, at(2024, 1, 2), "");
    let mut late = care_item(person("Late", "X"), at(2024, 1, 1));
    contact(&mut late, at(2024, 3, 2), "");
    let never = care_item(person("Never", "X"), at(2024, 1, 1));
    let rows = vec![row(late, ct), row(never, ct), row(early, ct)];

    let mut query = ListingQuery {
      sort: Some(SortProperty {
        column:    SortColumn::LastContactDate,
        direction: SortDirection::Ascending,
      }),
      ..Default::default()
    };
    assert_eq!(names(&compose_with(rows.clone(), &query)), vec!["Never", "Early", "Late"]);

    query.sort = Some(SortProperty {
      column:    SortColumn::LastContactDate,
      direction: SortDirection::Descending,
    });
    assert_eq!(names(&compose_with(rows, &query)), vec!["Late", "Early", "Never"]);
  }

  #[test]
  fn date_range_delimited_round_trip() {
    let range = DateRange { start: Some(at(2024, 1, 1)), end: None };
    assert_eq!(DateRange::from_delimited(&range.to_delimited()).unwrap(), range);
    assert!(DateRange::from_delimited("").unwrap().is_empty());
    assert!(DateRange::from_delimited("nonsense|").is_err());

    let day = DateRange::from_delimited("2024-01-12|2024-01-12").unwrap();
    assert!(day.contains(at(2024, 1, 12) + chrono::Duration::hours(18)));
    assert!(!day.contains(at(2024, 1, 13)));
  }

  #[test]
  fn filter_preferences_round_trip() {
    let ct = Uuid::new_v4();
    let attributes = vec![definition(Some(ct), "Room", 0), definition(Some(ct), "Bed", 1)];
    let mut filter = ListingFilter {
      status: StatusFilter::Inactive,
      date_range: DateRange { start: Some(at(2024, 1, 1)), end: Some(at(2024, 2, 1)) },
      person_id: Some(Uuid::new_v4()),
      ..Default::default()
    };
    filter.attribute_filters.insert("Room".into(), vec!["EqualTo".into(), "4".into()]);

    let mut prefs = MemoryPreferences::default();
    filter.save(&mut prefs, &attributes);
    assert_eq!(prefs.get("Room").as_deref(), Some(r#"["EqualTo","4"]"#));
    assert_eq!(prefs.get("Bed"), None);
    assert_eq!(ListingFilter::load(&prefs, &attributes), filter);

    // Unparseable stored values are ignored.
    prefs.set("Room", Some("{not json".into()));
    prefs.set(STATUS_KEY, Some("Sideways".into()));
    let loaded = ListingFilter::load(&prefs, &attributes);
    assert!(loaded.attribute_filters.is_empty());
    assert_eq!(loaded.status, StatusFilter::All);
  }

  #[test]
  fn selected_care_type_must_be_viewable() {
    let visible = Uuid::new_v4();
    let summaries = vec![CareTypeSummary {
      care_type_id: visible,
      name:         "Hospital".into(),
      is_active:    true,
      can_edit:     false,
    }];
    let mut prefs = MemoryPreferences::default();
    prefs.set(SELECTED_TYPE_KEY, Some(Uuid::new_v4().to_string()));
    assert_eq!(selected_care_type(&prefs, &summaries), None);
    prefs.set(SELECTED_TYPE_KEY, Some(visible.to_string()));
    assert_eq!(selected_care_type(&prefs, &summaries), Some(visible));
  }
}
