use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use super::{ActionContext, ActionError, ActionLog, ActionResult, TextOrAttribute, lookup_person};
use crate::{care_item::NewCareItem, datetime::parse_date_time, store::CareStore};

/// Opens a new, active case and links it to one or more care types.
///
/// The reference parameters name workflow attributes; `care_item` names the
/// attribute that receives the new case's id.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateCareItem {
  /// Attribute holding the subject person's id.
  pub person:       Option<Uuid>,
  /// Attribute holding a delimited list of care type ids.
  pub care_types:   Option<Uuid>,
  /// Attribute holding the requester's id.
  pub requester:    Option<Uuid>,
  #[serde(default)]
  pub request_date: TextOrAttribute,
  #[serde(default)]
  pub description:  TextOrAttribute,
  pub care_item:    Uuid,
}

impl CreateCareItem {
  pub async fn execute<S: CareStore>(&self, store: &S, ctx: &mut ActionContext<'_>) -> ActionResult {
    let mut log = ActionLog::default();
    if let Err(e) = self.run(store, ctx, &mut log).await {
      warn!(error = %e, "create care item failed");
      log.fail(e);
    }
    log.finish()
  }

  async fn run<S: CareStore>(
    &self,
    store: &S,
    ctx: &mut ActionContext<'_>,
    log: &mut ActionLog,
  ) -> Result<(), ActionError> {
    let description = ctx.resolve_text(&self.description);
    let request_date =
      parse_date_time(&ctx.resolve_text(&self.request_date)).ok_or(ActionError::InvalidDate)?;

    let ids = ctx.referenced_ids(self.care_types);
    let care_types = if ids.is_empty() {
      Vec::new()
    } else {
      store.get_care_types(ids).await.map_err(ActionError::store)?
    };
    if care_types.is_empty() {
      return Err(ActionError::InvalidCategoryReference);
    }

    let person = lookup_person(store, ctx.referenced_id(self.person))
      .await?
      .ok_or(ActionError::InvalidPersonReference)?;
    let requester = lookup_person(store, ctx.referenced_id(self.requester))
      .await?
      .ok_or(ActionError::InvalidRequesterReference)?;

    let slot_name = ctx
      .attributes
      .name(self.care_item)
      .ok_or(ActionError::OutputAttributeNotFound)?
      .to_owned();

    let item = store
      .add_care_item(NewCareItem {
        person_id: person.person_id,
        contactor_person_id: requester.person_id,
        contact_date_time: request_date,
        description,
        is_active: true,
      })
      .await
      .map_err(ActionError::store)?;

    for care_type in &care_types {
      store
        .add_care_type_item(item.care_item_id, care_type.care_type_id)
        .await
        .map_err(ActionError::store)?;
    }

    ctx.attributes.set_value(self.care_item, item.care_item_id.to_string());
    info!(care_item = %item.care_item_id, links = care_types.len(), "care item created");
    log.info(format!("Set '{slot_name}' attribute to '{}'.", item.name()));
    Ok(())
  }
}
