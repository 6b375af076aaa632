//! Integration tests for `SqliteStore` against an in-memory database.

use care_core::{
  attribute::{EntityKind, NewAttribute, inherited_attributes},
  auth::{AllowAll, Capability, StaticGrants, Viewer},
  care_item::{NewCareContact, NewCareItem},
  care_type::{CareType, NewCareType},
  datetime::parse_date_time,
  field_type::FieldTypeRegistry,
  listing::{
    ListingFilter, ListingOptions, ListingRequest, STATUS_KEY, StatusFilter, build_listing,
    describe_filters, summarize_care_types,
  },
  person::{NewPerson, Person},
  preferences::{MemoryPreferences, PreferenceStore},
  store::CareStore,
  workflow::{
    ActionContext, ActionError, AddCareContact, AddCareItemAttribute, CreateCareItem,
    NoMergeFields, TemplateMergeFields, TextOrAttribute, WorkflowAttributes,
  },
};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{Error, SqliteStore};

async fn store() -> SqliteStore {
  SqliteStore::open_in_memory()
    .await
    .expect("in-memory store")
}

fn at(s: &str) -> DateTime<Utc> { parse_date_time(s).expect("valid date") }

async fn person(s: &SqliteStore, nick: &str, last: &str) -> Person {
  s.add_person(NewPerson { nick_name: nick.into(), last_name: last.into() })
    .await
    .unwrap()
}

async fn care_type(s: &SqliteStore, name: &str, is_active: bool) -> CareType {
  s.add_care_type(NewCareType { name: name.into(), is_active }).await.unwrap()
}

async fn open_case(s: &SqliteStore, subject: &Person, contactor: &Person, opened: &str) -> Uuid {
  s.add_care_item(NewCareItem {
    person_id:           subject.person_id,
    contactor_person_id: contactor.person_id,
    contact_date_time:   at(opened),
    description:         String::new(),
    is_active:           true,
  })
  .await
  .unwrap()
  .care_item_id
}

fn link_attribute(care_type_id: Option<Uuid>, key: &str, order: i32) -> NewAttribute {
  NewAttribute {
    entity_kind: EntityKind::CareTypeItem,
    care_type_id,
    key: key.into(),
    name: key.into(),
    description: String::new(),
    field_type: "text".into(),
    config: Default::default(),
    order,
    is_grid_column: true,
  }
}

// ─── People and care types ───────────────────────────────────────────────────

#[tokio::test]
async fn add_and_get_person() {
  let s = store().await;
  let ann = person(&s, "Ann", "Lee").await;
  let fetched = s.get_person(ann.person_id).await.unwrap().unwrap();
  assert_eq!(fetched, ann);
  assert!(s.get_person(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn list_care_types_orders_by_name_and_hides_inactive() {
  let s = store().await;
  care_type(&s, "Hospital", true).await;
  care_type(&s, "Grief", false).await;
  care_type(&s, "Bereavement", true).await;

  let active: Vec<_> = s.list_care_types(false).await.unwrap().into_iter().map(|c| c.name).collect();
  assert_eq!(active, vec!["Bereavement", "Hospital"]);

  let all = s.list_care_types(true).await.unwrap();
  assert_eq!(all.len(), 3);
  assert_eq!(all[1].name, "Grief");
}

#[tokio::test]
async fn get_care_types_skips_unknown_ids() {
  let s = store().await;
  let hospital = care_type(&s, "Hospital", true).await;
  let found = s
    .get_care_types(vec![Uuid::new_v4(), hospital.care_type_id, hospital.care_type_id])
    .await
    .unwrap();
  assert_eq!(found, vec![hospital]);
}

// ─── Cases ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn add_care_item_requires_both_people() {
  let s = store().await;
  let ann = person(&s, "Ann", "Lee").await;
  let missing = Uuid::new_v4();
  let err = s
    .add_care_item(NewCareItem {
      person_id:           ann.person_id,
      contactor_person_id: missing,
      contact_date_time:   at("2024-01-10"),
      description:         String::new(),
      is_active:           true,
    })
    .await
    .unwrap_err();
  assert!(matches!(err, Error::PersonNotFound(id) if id == missing));
  assert_eq!(s.count_rows("care_items").await.unwrap(), 0);
}

#[tokio::test]
async fn get_care_item_loads_links_and_contacts_in_order() {
  let s = store().await;
  let (ann, pat) = (person(&s, "Ann", "Lee").await, person(&s, "Pat", "Pastor").await);
  let (grief, hospital) = (care_type(&s, "Grief", true).await, care_type(&s, "Hospital", true).await);
  let id = open_case(&s, &ann, &pat, "2024-01-10").await;

  s.add_care_type_item(id, hospital.care_type_id).await.unwrap();
  s.add_care_type_item(id, grief.care_type_id).await.unwrap();
  for (when, note) in [("2024-01-12", "first"), ("2024-01-12", "second"), ("2024-01-11", "early")] {
    s.add_care_contact(NewCareContact {
      care_item_id:        id,
      contactor_person_id: pat.person_id,
      contact_date_time:   at(when),
      description:         note.into(),
    })
    .await
    .unwrap();
  }

  let item = s.get_care_item(id).await.unwrap().unwrap();
  assert_eq!(item.name(), "Ann Lee");
  assert_eq!(item.contactor.full_name(), "Pat Pastor");
  assert_eq!(item.care_type_ids(), vec![hospital.care_type_id, grief.care_type_id]);
  assert_eq!(item.contacts.len(), 3);
  assert_eq!(item.last_contact().unwrap().description, "first");

  assert!(s.get_care_item(Uuid::new_v4()).await.unwrap().is_none());
}

#[tokio::test]
async fn duplicate_links_are_accepted() {
  let s = store().await;
  let ann = person(&s, "Ann", "Lee").await;
  let hospital = care_type(&s, "Hospital", true).await;
  let id = open_case(&s, &ann, &ann, "2024-01-10").await;

  s.add_care_type_item(id, hospital.care_type_id).await.unwrap();
  s.add_care_type_item(id, hospital.care_type_id).await.unwrap();
  let item = s.get_care_item(id).await.unwrap().unwrap();
  assert_eq!(item.care_type_items.len(), 2);
  assert_eq!(item.care_type_ids().len(), 1);
}

#[tokio::test]
async fn link_to_unknown_care_type_fails() {
  let s = store().await;
  let ann = person(&s, "Ann", "Lee").await;
  let id = open_case(&s, &ann, &ann, "2024-01-10").await;
  let err = s.add_care_type_item(id, Uuid::new_v4()).await.unwrap_err();
  assert!(matches!(err, Error::CareTypeNotFound(_)));
}

#[tokio::test]
async fn set_care_item_active() {
  let s = store().await;
  let ann = person(&s, "Ann", "Lee").await;
  let id = open_case(&s, &ann, &ann, "2024-01-10").await;

  s.set_care_item_active(id, false).await.unwrap();
  assert!(!s.get_care_item(id).await.unwrap().unwrap().is_active);

  let err = s.set_care_item_active(Uuid::new_v4(), true).await.unwrap_err();
  assert!(matches!(err, Error::CareItemNotFound(_)));
}

#[tokio::test]
async fn delete_removes_contacts_links_and_values() {
  let s = store().await;
  let ann = person(&s, "Ann", "Lee").await;
  let hospital = care_type(&s, "Hospital", true).await;
  let keep = open_case(&s, &ann, &ann, "2024-01-01").await;
  let id = open_case(&s, &ann, &ann, "2024-01-10").await;

  let link = s.add_care_type_item(id, hospital.care_type_id).await.unwrap();
  s.add_care_type_item(keep, hospital.care_type_id).await.unwrap();
  s.save_attribute_value(link.care_type_item_id, "Room".into(), "4".into()).await.unwrap();
  for case in [id, id, keep] {
    s.add_care_contact(NewCareContact {
      care_item_id:        case,
      contactor_person_id: ann.person_id,
      contact_date_time:   at("2024-01-12"),
      description:         String::new(),
    })
    .await
    .unwrap();
  }

  s.delete_care_item(id).await.unwrap();

  assert!(s.get_care_item(id).await.unwrap().is_none());
  assert_eq!(s.count_rows("care_contacts").await.unwrap(), 1);
  assert_eq!(s.count_rows("care_type_items").await.unwrap(), 1);
  assert_eq!(s.count_rows("attribute_values").await.unwrap(), 0);
  assert!(s.get_care_item(keep).await.unwrap().is_some());

  let err = s.delete_care_item(id).await.unwrap_err();
  assert!(matches!(err, Error::CareItemNotFound(_)));
}

// ─── Custom fields ───────────────────────────────────────────────────────────

#[tokio::test]
async fn attribute_values_last_write_wins() {
  let s = store().await;
  let entity = Uuid::new_v4();
  s.save_attribute_value(entity, "Room".into(), "4".into()).await.unwrap();
  s.save_attribute_value(entity, "Room".into(), "12".into()).await.unwrap();
  s.save_attribute_value(entity, "Bed".into(), "B".into()).await.unwrap();

  let values = s.get_attribute_values(entity).await.unwrap();
  assert_eq!(values.get("Room").map(String::as_str), Some("12"));
  assert_eq!(values.len(), 2);
}

#[tokio::test]
async fn inherited_attributes_follow_linked_care_types() {
  let s = store().await;
  let ann = person(&s, "Ann", "Lee").await;
  let (hospital, grief) = (care_type(&s, "Hospital", true).await, care_type(&s, "Grief", true).await);

  s.add_attribute(link_attribute(Some(hospital.care_type_id), "Room", 2)).await.unwrap();
  s.add_attribute(link_attribute(Some(hospital.care_type_id), "Hospital", 1)).await.unwrap();
  s.add_attribute(link_attribute(Some(grief.care_type_id), "Deceased", 0)).await.unwrap();
  s.add_attribute(link_attribute(None, "Shared", 0)).await.unwrap();

  let id = open_case(&s, &ann, &ann, "2024-01-10").await;
  let unlinked = s.get_care_item(id).await.unwrap().unwrap();
  assert!(inherited_attributes(&s, &unlinked).await.unwrap().is_empty());

  s.add_care_type_item(id, hospital.care_type_id).await.unwrap();
  let item = s.get_care_item(id).await.unwrap().unwrap();
  let first = inherited_attributes(&s, &item).await.unwrap();
  let keys: Vec<_> = first.iter().map(|d| d.key.as_str()).collect();
  assert_eq!(keys, vec!["Hospital", "Room"]);
  assert_eq!(inherited_attributes(&s, &item).await.unwrap(), first);
}

#[tokio::test]
async fn attribute_config_round_trips() {
  let s = store().await;
  let mut input = link_attribute(None, "Types", 0);
  input.field_type = "care_types".into();
  input.config.insert("includeInactive".into(), "True".into());
  let saved = s.add_attribute(input).await.unwrap();

  let listed = s.list_attributes(EntityKind::CareTypeItem).await.unwrap();
  assert_eq!(listed, vec![saved]);
  assert!(s.list_attributes(EntityKind::CareContact).await.unwrap().is_empty());
}

// ─── Workflow: create care item ──────────────────────────────────────────────

struct CreateFixture {
  store:      SqliteStore,
  attributes: WorkflowAttributes,
  action:     CreateCareItem,
  subject:    Person,
  hospital:   CareType,
}

async fn create_fixture() -> CreateFixture {
  let store = store().await;
  let subject = person(&store, "Ann", "Lee").await;
  let requester = person(&store, "Rae", "Cole").await;
  let hospital = care_type(&store, "Hospital", true).await;

  let (person_attr, types_attr, requester_attr, output_attr) =
    (Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4(), Uuid::new_v4());
  let mut attributes = WorkflowAttributes::default();
  attributes.insert(person_attr, "Person", subject.person_id.to_string());
  attributes.insert(types_attr, "Care Types", hospital.care_type_id.to_string());
  attributes.insert(requester_attr, "Requester", requester.person_id.to_string());
  attributes.insert(output_attr, "Care Item", "");

  let action = CreateCareItem {
    person:       Some(person_attr),
    care_types:   Some(types_attr),
    requester:    Some(requester_attr),
    request_date: TextOrAttribute::Text("2024-01-10".into()),
    description:  TextOrAttribute::Text("Surgery at {{ Hospital }}".into()),
    care_item:    output_attr,
  };

  CreateFixture { store, attributes, action, subject, hospital }
}

#[tokio::test]
async fn create_care_item_success() {
  let CreateFixture { store: s, mut attributes, action, subject, hospital } =
    create_fixture().await;
  let merge = TemplateMergeFields::default().with("Hospital", "Mercy");
  let mut ctx = ActionContext::new(&mut attributes, &merge);

  let log = action.execute(&s, &mut ctx).await.unwrap();
  assert_eq!(log.len(), 1);
  assert_eq!(log[0].message, "Set 'Care Item' attribute to 'Ann Lee'.");
  assert!(!log[0].is_error);

  let id = Uuid::parse_str(attributes.value(action.care_item).unwrap()).unwrap();
  let item = s.get_care_item(id).await.unwrap().unwrap();
  assert!(item.is_active);
  assert_eq!(item.person.person_id, subject.person_id);
  assert_eq!(item.contactor.full_name(), "Rae Cole");
  assert_eq!(item.contact_date_time, at("2024-01-10"));
  assert_eq!(item.description, "Surgery at Mercy");
  assert_eq!(item.care_type_ids(), vec![hospital.care_type_id]);
}

#[tokio::test]
async fn create_care_item_with_no_categories_persists_nothing() {
  let CreateFixture { store: s, mut attributes, action, .. } = create_fixture().await;
  let types_attr = action.care_types.unwrap();
  attributes.set_value(types_attr, "");
  let mut ctx = ActionContext::new(&mut attributes, &NoMergeFields);

  let failure = action.execute(&s, &mut ctx).await.unwrap_err();
  assert_eq!(failure.errors, vec![ActionError::InvalidCategoryReference]);
  assert_eq!(failure.log.len(), 1);
  assert!(failure.log[0].is_error);
  assert_eq!(s.count_rows("care_items").await.unwrap(), 0);
  assert_eq!(s.count_rows("care_type_items").await.unwrap(), 0);
}

#[tokio::test]
async fn create_care_item_validation_order() {
  // Bad date wins over every other problem.
  let CreateFixture { store: s, mut attributes, mut action, .. } = create_fixture().await;
  action.request_date = TextOrAttribute::Text("not a date".into());
  attributes.set_value(action.care_types.unwrap(), Uuid::new_v4().to_string());
  let mut ctx = ActionContext::new(&mut attributes, &NoMergeFields);
  let failure = action.execute(&s, &mut ctx).await.unwrap_err();
  assert_eq!(failure.errors, vec![ActionError::InvalidDate]);

  // Unknown category ids resolve to nothing.
  action.request_date = TextOrAttribute::Text("2024-01-10".into());
  let mut ctx = ActionContext::new(&mut attributes, &NoMergeFields);
  let failure = action.execute(&s, &mut ctx).await.unwrap_err();
  assert_eq!(failure.errors, vec![ActionError::InvalidCategoryReference]);

  let CreateFixture { store: s, mut attributes, action, .. } = create_fixture().await;
  attributes.set_value(action.person.unwrap(), Uuid::new_v4().to_string());
  attributes.set_value(action.requester.unwrap(), "garbage");
  let mut ctx = ActionContext::new(&mut attributes, &NoMergeFields);
  let failure = action.execute(&s, &mut ctx).await.unwrap_err();
  assert_eq!(failure.errors, vec![ActionError::InvalidPersonReference]);

  let CreateFixture { store: s, mut attributes, action, .. } = create_fixture().await;
  attributes.set_value(action.requester.unwrap(), "garbage");
  let mut ctx = ActionContext::new(&mut attributes, &NoMergeFields);
  let failure = action.execute(&s, &mut ctx).await.unwrap_err();
  assert_eq!(failure.errors, vec![ActionError::InvalidRequesterReference]);
  assert_eq!(s.count_rows("care_items").await.unwrap(), 0);
}

#[tokio::test]
async fn create_care_item_needs_output_slot() {
  let CreateFixture { store: s, mut attributes, mut action, .. } = create_fixture().await;
  action.care_item = Uuid::new_v4();
  let mut ctx = ActionContext::new(&mut attributes, &NoMergeFields);
  let failure = action.execute(&s, &mut ctx).await.unwrap_err();
  assert_eq!(failure.errors, vec![ActionError::OutputAttributeNotFound]);
  assert_eq!(s.count_rows("care_items").await.unwrap(), 0);
}

// ─── Workflow: add care contact ──────────────────────────────────────────────

#[tokio::test]
async fn create_then_add_contact() {
  let CreateFixture { store: s, mut attributes, action, .. } = create_fixture().await;
  let contactor = person(&s, "Cy", "Moss").await;
  let contactor_attr = Uuid::new_v4();
  attributes.insert(contactor_attr, "Contactor", contactor.person_id.to_string());

  let mut ctx = ActionContext::new(&mut attributes, &NoMergeFields);
  action.execute(&s, &mut ctx).await.unwrap();

  let add = AddCareContact {
    care_item:    Some(action.care_item),
    contactor:    Some(contactor_attr),
    contact_date: TextOrAttribute::Text("2024-01-12".into()),
    description:  TextOrAttribute::Text("Visited".into()),
  };
  let log = add.execute(&s, &mut ctx).await.unwrap();
  assert_eq!(log.len(), 1);

  let id = Uuid::parse_str(attributes.value(action.care_item).unwrap()).unwrap();
  let item = s.get_care_item(id).await.unwrap().unwrap();
  assert_eq!(item.contacts.len(), 1);
  assert_eq!(item.last_contact_date(), Some(at("2024-01-12")));
  let contact = item.last_contact().unwrap();
  assert_eq!(contact.description, "Visited");
  assert_eq!(contact.contactor_person_id, contactor.person_id);
}

#[tokio::test]
async fn add_contact_validation_order() {
  let s = store().await;
  let cy = person(&s, "Cy", "Moss").await;
  let id = open_case(&s, &cy, &cy, "2024-01-10").await;
  let (case_attr, contactor_attr) = (Uuid::new_v4(), Uuid::new_v4());
  let mut attributes = WorkflowAttributes::default();
  attributes.insert(case_attr, "Case", Uuid::new_v4().to_string());
  attributes.insert(contactor_attr, "Contactor", "");

  let mut add = AddCareContact {
    care_item:    Some(case_attr),
    contactor:    Some(contactor_attr),
    contact_date: TextOrAttribute::Text(String::new()),
    description:  TextOrAttribute::default(),
  };

  let mut ctx = ActionContext::new(&mut attributes, &NoMergeFields);
  let failure = add.execute(&s, &mut ctx).await.unwrap_err();
  assert_eq!(failure.errors, vec![ActionError::InvalidDate]);

  add.contact_date = TextOrAttribute::Text("2024-01-12".into());
  let failure = add.execute(&s, &mut ctx).await.unwrap_err();
  assert_eq!(failure.errors, vec![ActionError::InvalidCareItemReference]);

  ctx.attributes.set_value(case_attr, id.to_string());
  let failure = add.execute(&s, &mut ctx).await.unwrap_err();
  assert_eq!(failure.errors, vec![ActionError::InvalidContactorReference]);
  assert_eq!(s.count_rows("care_contacts").await.unwrap(), 0);
}

// ─── Workflow: add care item attribute ───────────────────────────────────────

struct BulkFixture {
  store:      SqliteStore,
  attributes: WorkflowAttributes,
  action:     AddCareItemAttribute,
  links:      Vec<Uuid>,
  types:      (CareType, CareType),
}

async fn bulk_fixture() -> BulkFixture {
  let store = store().await;
  let ann = person(&store, "Ann", "Lee").await;
  let (a, b) = (care_type(&store, "A", true).await, care_type(&store, "B", true).await);
  let id = open_case(&store, &ann, &ann, "2024-01-10").await;
  let la = store.add_care_type_item(id, a.care_type_id).await.unwrap();
  let lb = store.add_care_type_item(id, b.care_type_id).await.unwrap();

  let (case_attr, types_attr) = (Uuid::new_v4(), Uuid::new_v4());
  let mut attributes = WorkflowAttributes::default();
  attributes.insert(case_attr, "Case", id.to_string());
  attributes.insert(types_attr, "Types", "");

  let action = AddCareItemAttribute {
    care_item:       Some(case_attr),
    care_types:      Some(types_attr),
    attribute_key:   TextOrAttribute::Text("Room".into()),
    attribute_value: TextOrAttribute::Text("4".into()),
  };

  BulkFixture {
    store,
    attributes,
    action,
    links: vec![la.care_type_item_id, lb.care_type_item_id],
    types: (a, b),
  }
}

async fn room(s: &SqliteStore, link: Uuid) -> Option<String> {
  s.get_attribute_values(link).await.unwrap().get("Room").cloned()
}

#[tokio::test]
async fn bulk_set_without_filter_sets_every_link() {
  let BulkFixture { store: s, mut attributes, action, links, .. } = bulk_fixture().await;
  let mut ctx = ActionContext::new(&mut attributes, &NoMergeFields);

  let log = action.execute(&s, &mut ctx).await.unwrap();
  assert_eq!(log.len(), 1);
  assert_eq!(log[0].message, "Set 'Room' attribute to '4'.");
  for link in links {
    assert_eq!(room(&s, link).await.as_deref(), Some("4"));
  }
}

#[tokio::test]
async fn bulk_set_with_filter_touches_matching_links_only() {
  let BulkFixture { store: s, mut attributes, action, links, types } = bulk_fixture().await;
  attributes.set_value(action.care_types.unwrap(), types.1.care_type_id.to_string());
  let mut ctx = ActionContext::new(&mut attributes, &NoMergeFields);

  action.execute(&s, &mut ctx).await.unwrap();
  assert_eq!(room(&s, links[0]).await, None);
  assert_eq!(room(&s, links[1]).await.as_deref(), Some("4"));
}

#[tokio::test]
async fn bulk_set_continues_past_a_failed_save() {
  let BulkFixture { store: s, mut attributes, action, links, .. } = bulk_fixture().await;
  s.execute_batch(format!(
    "CREATE TRIGGER lock_link BEFORE INSERT ON attribute_values
     WHEN NEW.entity_id = '{}'
     BEGIN SELECT RAISE(ABORT, 'locked'); END;",
    links[0]
  ))
  .await
  .unwrap();
  let mut ctx = ActionContext::new(&mut attributes, &NoMergeFields);

  let failure = action.execute(&s, &mut ctx).await.unwrap_err();
  assert_eq!(failure.errors.len(), 1);
  assert!(matches!(
    &failure.errors[0],
    ActionError::AttributeSaveFailed { value, message } if value == "4" && message.contains("locked")
  ));
  let summaries = failure.log.iter().filter(|e| e.message == "Set 'Room' attribute to '4'.");
  assert_eq!(summaries.count(), 1);

  assert_eq!(room(&s, links[0]).await, None);
  assert_eq!(room(&s, links[1]).await.as_deref(), Some("4"));
}

#[tokio::test]
async fn bulk_set_hard_stops() {
  let BulkFixture { store: s, mut attributes, mut action, links, .. } = bulk_fixture().await;
  action.attribute_key = TextOrAttribute::Text("  ".into());
  let mut ctx = ActionContext::new(&mut attributes, &NoMergeFields);
  let failure = action.execute(&s, &mut ctx).await.unwrap_err();
  assert_eq!(failure.errors, vec![ActionError::InvalidAttributeKey]);

  action.attribute_key = TextOrAttribute::Text("Room".into());
  ctx.attributes.set_value(action.care_item.unwrap(), Uuid::new_v4().to_string());
  let failure = action.execute(&s, &mut ctx).await.unwrap_err();
  assert_eq!(failure.errors, vec![ActionError::InvalidCareItemReference]);
  assert_eq!(room(&s, links[0]).await, None);
}

// ─── Listing ─────────────────────────────────────────────────────────────────

async fn listing_fixture() -> (SqliteStore, CareType, Uuid, Uuid) {
  let s = store().await;
  let hospital = care_type(&s, "Hospital", true).await;
  let pat = person(&s, "Pat", "Pastor").await;
  let active = open_case(&s, &person(&s, "Ann", "Lee").await, &pat, "2024-01-10").await;
  let closed = open_case(&s, &person(&s, "Bo", "Ray").await, &pat, "2024-01-05").await;
  s.set_care_item_active(closed, false).await.unwrap();
  for id in [active, closed] {
    s.add_care_type_item(id, hospital.care_type_id).await.unwrap();
  }
  (s, hospital, active, closed)
}

fn request(care_type_id: Uuid) -> ListingRequest {
  ListingRequest {
    care_type_id,
    viewer: Viewer::default(),
    context_person: None,
    filter: None,
    sort: None,
    options: ListingOptions::default(),
  }
}

#[tokio::test]
async fn first_view_hides_inactive_even_when_all_is_stored() {
  let (s, hospital, active, _) = listing_fixture().await;
  let registry = FieldTypeRegistry::with_builtins(Vec::new());
  let mut prefs = MemoryPreferences::default();
  prefs.set(STATUS_KEY, Some("All".into()));

  let mut req = request(hospital.care_type_id);
  req.options = ListingOptions { hide_inactive_by_default: true, first_view: true };
  let listing = build_listing(&s, &AllowAll, &mut prefs, &registry, req.clone())
    .await
    .unwrap()
    .unwrap();
  assert_eq!(listing.rows.len(), 1);
  assert_eq!(listing.rows[0].item.care_item_id, active);
  assert_eq!(prefs.get(STATUS_KEY).as_deref(), Some("Active"));

  // Later views honor whatever the viewer picks.
  req.options.first_view = false;
  req.filter = Some(ListingFilter { status: StatusFilter::All, ..Default::default() });
  let listing = build_listing(&s, &AllowAll, &mut prefs, &registry, req).await.unwrap().unwrap();
  assert_eq!(listing.rows.len(), 2);
  assert!(listing.can_edit);
}

#[tokio::test]
async fn first_view_reports_the_forced_status() {
  let (s, hospital, active, _) = listing_fixture().await;
  let registry = FieldTypeRegistry::with_builtins(Vec::new());
  let mut prefs = MemoryPreferences::default();

  let mut req = request(hospital.care_type_id);
  req.options = ListingOptions { hide_inactive_by_default: true, first_view: true };
  req.filter = Some(ListingFilter { status: StatusFilter::All, ..Default::default() });
  let listing = build_listing(&s, &AllowAll, &mut prefs, &registry, req).await.unwrap().unwrap();

  assert_eq!(listing.rows.len(), 1);
  assert_eq!(listing.rows[0].item.care_item_id, active);
  assert_eq!(listing.filter.status, StatusFilter::Active);
  assert_eq!(prefs.get(STATUS_KEY).as_deref(), Some("Active"));

  let labels = describe_filters(&s, &listing.filter, &listing.attributes, &registry).await.unwrap();
  assert_eq!(labels, vec![("Status".to_string(), "Active".to_string())]);
}

#[tokio::test]
async fn listing_rows_carry_link_values_and_default_sort() {
  let (s, hospital, active, closed) = listing_fixture().await;
  s.add_attribute(link_attribute(Some(hospital.care_type_id), "Room", 0)).await.unwrap();
  let item = s.get_care_item(active).await.unwrap().unwrap();
  s.save_attribute_value(item.care_type_items[0].care_type_item_id, "Room".into(), "ICU".into())
    .await
    .unwrap();

  let registry = FieldTypeRegistry::with_builtins(Vec::new());
  let mut prefs = MemoryPreferences::default();
  let listing = build_listing(&s, &AllowAll, &mut prefs, &registry, request(hospital.care_type_id))
    .await
    .unwrap()
    .unwrap();

  let ids: Vec<_> = listing.rows.iter().map(|r| r.item.care_item_id).collect();
  assert_eq!(ids, vec![active, closed]);
  assert_eq!(listing.rows[0].values.get("Room").map(String::as_str), Some("ICU"));
  assert_eq!(listing.attributes.len(), 1);

  let mut req = request(hospital.care_type_id);
  let mut filter = ListingFilter::default();
  filter.attribute_filters.insert("Room".into(), vec!["EqualTo".into(), "icu".into()]);
  req.filter = Some(filter);
  let listing = build_listing(&s, &AllowAll, &mut prefs, &registry, req).await.unwrap().unwrap();
  assert_eq!(listing.rows.len(), 1);

  // The applied filter was stored and is picked up next time.
  let listing = build_listing(&s, &AllowAll, &mut prefs, &registry, request(hospital.care_type_id))
    .await
    .unwrap()
    .unwrap();
  assert_eq!(listing.rows.len(), 1);
  assert_eq!(prefs.get("Room").as_deref(), Some(r#"["EqualTo","icu"]"#));
}

#[tokio::test]
async fn listing_is_omitted_without_view_capability() {
  let (s, hospital, ..) = listing_fixture().await;
  let registry = FieldTypeRegistry::with_builtins(Vec::new());
  let mut prefs = MemoryPreferences::default();

  let nobody = StaticGrants::default();
  let listing = build_listing(&s, &nobody, &mut prefs, &registry, request(hospital.care_type_id))
    .await
    .unwrap();
  assert!(listing.is_none());

  let viewers = StaticGrants { anonymous: Some(Capability::View), ..Default::default() };
  let listing = build_listing(&s, &viewers, &mut prefs, &registry, request(hospital.care_type_id))
    .await
    .unwrap()
    .unwrap();
  assert!(!listing.can_edit);

  let missing = build_listing(&s, &AllowAll, &mut prefs, &registry, request(Uuid::new_v4()))
    .await
    .unwrap();
  assert!(missing.is_none());
}

#[tokio::test]
async fn summary_lists_active_viewable_types() {
  let s = store().await;
  care_type(&s, "Hospital", true).await;
  care_type(&s, "Grief", false).await;
  let viewer = Uuid::new_v4();
  let grants = StaticGrants {
    grants:    [(viewer, Capability::Administrate)].into_iter().collect(),
    anonymous: Some(Capability::View),
  };

  let anon = summarize_care_types(&s, &grants, Viewer(None)).await.unwrap();
  assert_eq!(anon.len(), 1);
  assert_eq!(anon[0].name, "Hospital");
  assert!(!anon[0].can_edit);

  let admin = summarize_care_types(&s, &grants, Viewer(Some(viewer))).await.unwrap();
  assert!(admin[0].can_edit);

  assert!(summarize_care_types(&s, &StaticGrants::default(), Viewer(None)).await.unwrap().is_empty());
}

#[tokio::test]
async fn describe_filters_resolves_names() {
  let s = store().await;
  let ann = person(&s, "Ann", "Lee").await;
  let filter = ListingFilter {
    status: StatusFilter::Inactive,
    person_id: Some(ann.person_id),
    ..Default::default()
  };
  let registry = FieldTypeRegistry::with_builtins(Vec::new());
  let described = describe_filters(&s, &filter, &[], &registry).await.unwrap();
  assert_eq!(
    described,
    vec![("Person".to_string(), "Ann Lee".to_string()), ("Status".to_string(), "Inactive".to_string())]
  );
}
