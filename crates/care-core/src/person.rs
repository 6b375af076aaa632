//! Person: the external record a case and its contacts point at.
//!
//! People are owned by the host system. This module only reads them, so the
//! record carries just what listing and display need.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
  pub person_id: Uuid,
  /// Preferred (nick) name.
  pub nick_name: String,
  pub last_name: String,
}

impl Person {
  /// "Nick Last".
  pub fn full_name(&self) -> String {
    format!("{} {}", self.nick_name, self.last_name).trim().to_owned()
  }

  /// "Last, Nick", the form used in listing grids.
  pub fn full_name_reversed(&self) -> String {
    match (self.last_name.is_empty(), self.nick_name.is_empty()) {
      (true, _) => self.nick_name.clone(),
      (_, true) => self.last_name.clone(),
      _ => format!("{}, {}", self.last_name, self.nick_name),
    }
  }
}

/// Input to [`crate::store::CareStore::add_person`].
#[derive(Debug, Clone, Deserialize)]
pub struct NewPerson {
  pub nick_name: String,
  pub last_name: String,
}

#[cfg(test)]
mod tests {
  use super::*;

  fn person(nick: &str, last: &str) -> Person {
    Person { person_id: Uuid::nil(), nick_name: nick.into(), last_name: last.into() }
  }

  #[test]
  fn names() {
    let p = person("Ted", "Decker");
    assert_eq!(p.full_name(), "Ted Decker");
    assert_eq!(p.full_name_reversed(), "Decker, Ted");
  }

  #[test]
  fn reversed_name_without_last_name() {
    assert_eq!(person("Cher", "").full_name_reversed(), "Cher");
    assert_eq!(person("Cher", "").full_name(), "Cher");
  }
}
