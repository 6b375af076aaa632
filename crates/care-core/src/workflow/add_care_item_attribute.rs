use serde::Deserialize;
use tracing::{info, warn};
use uuid::Uuid;

use super::{ActionContext, ActionError, ActionLog, ActionResult, TextOrAttribute};
use crate::store::CareStore;

/// Sets one custom field on a case's care type links.
///
/// With no care types given (or none that resolve) every link is updated.
/// Each link is saved on its own; a failed save is recorded and the remaining
/// links are still processed.
#[derive(Debug, Clone, Deserialize)]
pub struct AddCareItemAttribute {
  /// Attribute holding the case id.
  pub care_item:       Option<Uuid>,
  /// Attribute holding a delimited list of care type ids.
  pub care_types:      Option<Uuid>,
  pub attribute_key:   TextOrAttribute,
  #[serde(default)]
  pub attribute_value: TextOrAttribute,
}

impl AddCareItemAttribute {
  pub async fn execute<S: CareStore>(&self, store: &S, ctx: &mut ActionContext<'_>) -> ActionResult {
    let mut log = ActionLog::default();
    if let Err(e) = self.run(store, ctx, &mut log).await {
      warn!(error = %e, "add care item attribute failed");
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
    let item = match ctx.referenced_id(self.care_item) {
      Some(id) => store.get_care_item(id).await.map_err(ActionError::store)?,
      None => None,
    }
    .ok_or(ActionError::InvalidCareItemReference)?;

    let ids = ctx.referenced_ids(self.care_types);
    let selected: Vec<Uuid> = if ids.is_empty() {
      Vec::new()
    } else {
      store
        .get_care_types(ids)
        .await
        .map_err(ActionError::store)?
        .into_iter()
        .map(|ct| ct.care_type_id)
        .collect()
    };

    let key = ctx.resolve_text(&self.attribute_key).trim().to_owned();
    if key.is_empty() {
      return Err(ActionError::InvalidAttributeKey);
    }
    let value = ctx.resolve_text(&self.attribute_value);

    let links = item
      .care_type_items
      .iter()
      .filter(|link| selected.is_empty() || selected.contains(&link.care_type_id));

    for link in links {
      let saved = store
        .save_attribute_value(link.care_type_item_id, key.clone(), value.clone())
        .await;
      if let Err(e) = saved {
        warn!(link = %link.care_type_item_id, %key, error = %e, "attribute save failed");
        log.fail(ActionError::AttributeSaveFailed { value: value.clone(), message: e.to_string() });
      }
    }

    info!(care_item = %item.care_item_id, %key, "care item attribute set");
    log.info(format!("Set '{key}' attribute to '{value}'."));
    Ok(())
  }
}
