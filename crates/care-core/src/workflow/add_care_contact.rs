use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use super::{ActionContext, ActionError, ActionLog, ActionResult, TextOrAttribute, lookup_person};
use crate::{care_item::NewCareContact, datetime::parse_date_time, store::CareStore};

/// Logs one contact against an existing case.
#[derive(Debug, Clone, Deserialize)]
pub struct AddCareContact {
  /// Attribute holding the case id.
  pub care_item:    Option<Uuid>,
  /// Attribute holding the contactor's id.
  pub contactor:    Option<Uuid>,
  #[serde(default)]
  pub contact_date: TextOrAttribute,
  #[serde(default)]
  pub description:  TextOrAttribute,
}

impl AddCareContact {
  pub async fn execute<S: CareStore>(&self, store: &S, ctx: &mut ActionContext<'_>) -> ActionResult {
    let mut log = ActionLog::default();
    if let Err(e) = self.run(store, ctx, &mut log).await {
      warn!(error = %e, "add care contact failed");
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
    let contact_date =
      parse_date_time(&ctx.resolve_text(&self.contact_date)).ok_or(ActionError::InvalidDate)?;

    let item = match ctx.referenced_id(self.care_item) {
      Some(id) => store.get_care_item(id).await.map_err(ActionError::store)?,
      None => None,
    }
    .ok_or(ActionError::InvalidCareItemReference)?;

    let contactor = lookup_person(store, ctx.referenced_id(self.contactor))
      .await?
      .ok_or(ActionError::InvalidContactorReference)?;

    let contact = store
      .add_care_contact(NewCareContact {
        care_item_id: item.care_item_id,
        contactor_person_id: contactor.person_id,
        contact_date_time: contact_date,
        description,
      })
      .await
      .map_err(ActionError::store)?;

    info!(care_item = %item.care_item_id, contact = %contact.care_contact_id, "care contact added");
    log.info(format!(
      "Added contact by '{}' to '{}'.",
      contactor.full_name(),
      item.name()
    ));
    Ok(())
  }
}
