//! User profiles and the roles derived from them.
//!
//! Authentication itself belongs to the identity provider. This module only
//! decides what an authenticated identity may do.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

use crate::archive::{Actor, ActorRole};

#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Default,
  Serialize,
  Deserialize,
  AsRefStr,
  EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
  #[default]
  User,
  Admin,
}

/// The stored profile for an identity-provider account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
  pub uid:          String,
  pub email:        String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub display_name: Option<String>,
  pub role:         Role,
  #[serde(with = "chrono::serde::ts_milliseconds")]
  pub created_at:   DateTime<Utc>,
}

/// A signed-in caller.
///
/// `role` is `None` when the profile could not be loaded after sign-in. Such
/// a caller is still present but holds no privilege.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
  pub uid:   String,
  pub email: String,
  pub role:  Option<Role>,
}

impl Identity {
  pub fn is_admin(&self) -> bool { self.role == Some(Role::Admin) }

  /// The actor this identity's mutations are attributed to.
  pub fn actor(&self) -> Actor {
    let role = if self.is_admin() { ActorRole::Admin } else { ActorRole::Patient };
    Actor {
      role,
      uid: Some(self.uid.clone()),
      email: Some(self.email.clone()),
    }
  }
}

/// Canonical form used when matching configured admin emails.
pub fn normalize_email(email: &str) -> String { email.trim().to_lowercase() }

#[cfg(test)]
mod tests {
  use super::*;

  fn identity(role: Option<Role>) -> Identity {
    Identity {
      uid:   "u1".into(),
      email: "u1@example.com".into(),
      role,
    }
  }

  #[test]
  fn missing_role_is_not_admin() {
    let id = identity(None);
    assert!(!id.is_admin());
    assert_eq!(id.actor().role, ActorRole::Patient);
  }

  #[test]
  fn admin_acts_as_admin() {
    let id = identity(Some(Role::Admin));
    assert!(id.is_admin());
    let actor = id.actor();
    assert_eq!(actor.role, ActorRole::Admin);
    assert_eq!(actor.uid.as_deref(), Some("u1"));
  }

  #[test]
  fn user_acts_as_patient() {
    assert_eq!(identity(Some(Role::User)).actor().role, ActorRole::Patient);
  }

  #[test]
  fn email_normalization() {
    assert_eq!(normalize_email("  Admin@Clinic.Example "), "admin@clinic.example");
  }
}
