//! Portal messages sent from the clinic to a patient's inbox.
//!
//! A message is immutable once sent except for `read_at`, which the recipient
//! sets exactly once.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};
use uuid::Uuid;

/// Who a message is from.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Serialize,
  Deserialize,
  AsRefStr,
  EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SenderRole {
  Admin,
  System,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortalMessage {
  pub id:             Uuid,
  pub to_email:       String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub to_uid:         Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub from_email:     Option<String>,
  pub from_role:      SenderRole,
  /// The appointment this message concerns, if any. Not checked.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub appointment_id: Option<Uuid>,
  pub subject:        String,
  pub body:           String,
  #[serde(with = "chrono::serde::ts_milliseconds")]
  pub created_at:     DateTime<Utc>,
  #[serde(
    default,
    with = "chrono::serde::ts_milliseconds_option",
    skip_serializing_if = "Option::is_none"
  )]
  pub read_at:        Option<DateTime<Utc>>,
}

impl PortalMessage {
  pub fn is_read(&self) -> bool { self.read_at.is_some() }
}

/// Input to [`crate::store::ClinicStore::send_message`]. The store assigns
/// the id and `created_at`; a new message is always unread.
#[derive(Debug, Clone)]
pub struct NewMessage {
  pub to_email:       String,
  pub to_uid:         Option<String>,
  pub from_email:     Option<String>,
  pub from_role:      SenderRole,
  pub appointment_id: Option<Uuid>,
  pub subject:        String,
  pub body:           String,
}

impl NewMessage {
  pub fn into_message(self, id: Uuid, created_at: DateTime<Utc>) -> PortalMessage {
    PortalMessage {
      id,
      to_email: self.to_email,
      to_uid: self.to_uid,
      from_email: self.from_email,
      from_role: self.from_role,
      appointment_id: self.appointment_id,
      subject: self.subject,
      body: self.body,
      created_at,
      read_at: None,
    }
  }
}

/// Inbox order: newest first.
pub fn sort_inbox(messages: &mut [PortalMessage]) {
  messages.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}
