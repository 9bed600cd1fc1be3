//! Encoding and decoding helpers between Rust domain types and the plain
//! representations stored in SQLite columns.
//!
//! Timestamps are stored as epoch milliseconds. Enums are stored as their
//! lowercase wire names. UUIDs are stored as hyphenated lowercase strings.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use clinic_core::{
  appointment::Appointment,
  archive::{Actor, ArchiveFlags, ArchivedAppointment},
  message::PortalMessage,
  profile::Profile,
};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Uuid ────────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_ms(dt: DateTime<Utc>) -> i64 { dt.timestamp_millis() }

pub fn decode_ms(ms: i64) -> Result<DateTime<Utc>> {
  DateTime::from_timestamp_millis(ms)
    .ok_or_else(|| Error::Decode(format!("timestamp out of range: {ms}")))
}

// ─── Enums and checked strings ───────────────────────────────────────────────

/// Parse a stored column value through its `FromStr` impl.
pub fn decode_text<T: FromStr>(column: &str, s: &str) -> Result<T> {
  s.parse()
    .map_err(|_| Error::Decode(format!("bad {column}: {s:?}")))
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Columns selected for an active appointment, in [`RawAppointment`] order.
pub const APPOINTMENT_COLUMNS: &str = "appointment_id, patient_name, \
  patient_email, patient_uid, date, time, status, created_at";

/// Raw values read directly from an `appointments` row.
pub struct RawAppointment {
  pub appointment_id: String,
  pub patient_name:   String,
  pub patient_email:  String,
  pub patient_uid:    Option<String>,
  pub date:           String,
  pub time:           String,
  pub status:         String,
  pub created_at:     i64,
}

impl RawAppointment {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      appointment_id: row.get(0)?,
      patient_name:   row.get(1)?,
      patient_email:  row.get(2)?,
      patient_uid:    row.get(3)?,
      date:           row.get(4)?,
      time:           row.get(5)?,
      status:         row.get(6)?,
      created_at:     row.get(7)?,
    })
  }

  pub fn into_appointment(self) -> Result<Appointment> {
    Ok(Appointment {
      id:            decode_uuid(&self.appointment_id)?,
      patient_name:  self.patient_name,
      patient_email: self.patient_email,
      patient_uid:   self.patient_uid,
      date:          decode_text("date", &self.date)?,
      time:          decode_text("time", &self.time)?,
      status:        decode_text("status", &self.status)?,
      created_at:    decode_ms(self.created_at)?,
    })
  }
}

/// Columns selected for an archived appointment, in [`RawArchived`] order.
pub const ARCHIVE_COLUMNS: &str = "appointment_id, patient_name, \
  patient_email, patient_uid, date, time, status, created_at, archived_at, \
  archived_by_role, archived_by_uid, archived_by_email, archive_reason, \
  deleted_before_appointment, deleted_while_approved";

/// Raw values read directly from an `appointments_archive` row.
pub struct RawArchived {
  pub appointment:                RawAppointment,
  pub archived_at:                i64,
  pub archived_by_role:           String,
  pub archived_by_uid:            Option<String>,
  pub archived_by_email:          Option<String>,
  pub archive_reason:             String,
  pub deleted_before_appointment: bool,
  pub deleted_while_approved:     bool,
}

impl RawArchived {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      appointment:                RawAppointment::from_row(row)?,
      archived_at:                row.get(8)?,
      archived_by_role:           row.get(9)?,
      archived_by_uid:            row.get(10)?,
      archived_by_email:          row.get(11)?,
      archive_reason:             row.get(12)?,
      deleted_before_appointment: row.get(13)?,
      deleted_while_approved:     row.get(14)?,
    })
  }

  pub fn into_archived(self) -> Result<ArchivedAppointment> {
    Ok(ArchivedAppointment {
      appointment:    self.appointment.into_appointment()?,
      archived_at:    decode_ms(self.archived_at)?,
      archived_by:    Actor {
        role:  decode_text("archived_by_role", &self.archived_by_role)?,
        uid:   self.archived_by_uid,
        email: self.archived_by_email,
      },
      archive_reason: decode_text("archive_reason", &self.archive_reason)?,
      flags:          ArchiveFlags {
        deleted_before_appointment: self.deleted_before_appointment,
        deleted_while_approved:     self.deleted_while_approved,
      },
    })
  }
}

/// Columns selected for a message, in [`RawMessage`] order.
pub const MESSAGE_COLUMNS: &str = "message_id, to_email, to_uid, from_email, \
  from_role, appointment_id, subject, body, created_at, read_at";

/// Raw values read directly from a `messages` row.
pub struct RawMessage {
  pub message_id:     String,
  pub to_email:       String,
  pub to_uid:         Option<String>,
  pub from_email:     Option<String>,
  pub from_role:      String,
  pub appointment_id: Option<String>,
  pub subject:        String,
  pub body:           String,
  pub created_at:     i64,
  pub read_at:        Option<i64>,
}

impl RawMessage {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      message_id:     row.get(0)?,
      to_email:       row.get(1)?,
      to_uid:         row.get(2)?,
      from_email:     row.get(3)?,
      from_role:      row.get(4)?,
      appointment_id: row.get(5)?,
      subject:        row.get(6)?,
      body:           row.get(7)?,
      created_at:     row.get(8)?,
      read_at:        row.get(9)?,
    })
  }

  pub fn into_message(self) -> Result<PortalMessage> {
    Ok(PortalMessage {
      id:             decode_uuid(&self.message_id)?,
      to_email:       self.to_email,
      to_uid:         self.to_uid,
      from_email:     self.from_email,
      from_role:      decode_text("from_role", &self.from_role)?,
      appointment_id: self.appointment_id.as_deref().map(decode_uuid).transpose()?,
      subject:        self.subject,
      body:           self.body,
      created_at:     decode_ms(self.created_at)?,
      read_at:        self.read_at.map(decode_ms).transpose()?,
    })
  }
}

/// Columns selected for a profile, in [`RawProfile`] order.
pub const PROFILE_COLUMNS: &str = "uid, email, display_name, role, created_at";

/// Raw values read directly from a `profiles` row.
pub struct RawProfile {
  pub uid:          String,
  pub email:        String,
  pub display_name: Option<String>,
  pub role:         String,
  pub created_at:   i64,
}

impl RawProfile {
  pub fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      uid:          row.get(0)?,
      email:        row.get(1)?,
      display_name: row.get(2)?,
      role:         row.get(3)?,
      created_at:   row.get(4)?,
    })
  }

  pub fn into_profile(self) -> Result<Profile> {
    Ok(Profile {
      uid:          self.uid,
      email:        self.email,
      display_name: self.display_name,
      role:         decode_text("role", &self.role)?,
      created_at:   decode_ms(self.created_at)?,
    })
  }
}
