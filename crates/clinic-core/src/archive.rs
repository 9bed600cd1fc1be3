//! The archive transition's record derivation.
//!
//! Archiving moves an appointment out of the active collection into the
//! append-only archive collection, stamped with who removed it, why, and two
//! audit flags. This module computes the archived record; the store applies
//! the write and the delete as one transaction.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString};

use crate::{
  appointment::{Appointment, AppointmentStatus},
  schedule::{ClinicTimeZone, appointment_instant},
};

// ─── Actor ───────────────────────────────────────────────────────────────────

/// The kind of party a mutation is attributed to.
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
pub enum ActorRole {
  Admin,
  Patient,
  System,
}

/// Who performed a mutation. Supplied by the identity layer and trusted as
/// given.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
  pub role:  ActorRole,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub uid:   Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub email: Option<String>,
}

impl Actor {
  pub fn system() -> Self {
    Self { role: ActorRole::System, uid: None, email: None }
  }
}

// ─── Archive metadata ────────────────────────────────────────────────────────

/// Why a record was archived.
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
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ArchiveReason {
  AdminDeleted,
  PatientDeleted,
  Cleanup,
  /// Written by an earlier revision; never produced now, still readable.
  Deleted,
}

impl From<ActorRole> for ArchiveReason {
  fn from(role: ActorRole) -> Self {
    match role {
      ActorRole::Admin => Self::AdminDeleted,
      ActorRole::Patient => Self::PatientDeleted,
      ActorRole::System => Self::Cleanup,
    }
  }
}

/// Risk signals recorded at archive time.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub struct ArchiveFlags {
  /// The archive happened strictly before the appointment's scheduled time.
  pub deleted_before_appointment: bool,
  /// The appointment was `approved` when archived.
  pub deleted_while_approved:     bool,
}

// ─── ArchivedAppointment ─────────────────────────────────────────────────────

/// A terminal, immutable record in the archive collection. Keeps the original
/// appointment id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArchivedAppointment {
  #[serde(flatten)]
  pub appointment:    Appointment,
  #[serde(with = "chrono::serde::ts_milliseconds")]
  pub archived_at:    DateTime<Utc>,
  pub archived_by:    Actor,
  pub archive_reason: ArchiveReason,
  pub flags:          ArchiveFlags,
}

/// Derive the audit flags for archiving `appointment` at `now`.
///
/// A date/time that cannot be placed on the timeline never counts as "before
/// the appointment".
pub fn derive_flags(
  appointment: &Appointment,
  now: DateTime<Utc>,
  tz: ClinicTimeZone,
) -> ArchiveFlags {
  let scheduled = appointment_instant(&appointment.date, &appointment.time, tz);
  ArchiveFlags {
    deleted_before_appointment: scheduled.is_some_and(|at| now < at),
    deleted_while_approved:     appointment.status == AppointmentStatus::Approved,
  }
}

/// Build the archived form of `appointment`, removed by `actor` at `now`.
pub fn archive_record(
  appointment: Appointment,
  actor: Actor,
  now: DateTime<Utc>,
  tz: ClinicTimeZone,
) -> ArchivedAppointment {
  let flags = derive_flags(&appointment, now, tz);
  ArchivedAppointment {
    appointment,
    archived_at: now,
    archive_reason: ArchiveReason::from(actor.role),
    archived_by: actor,
    flags,
  }
}

#[cfg(test)]
mod tests {
  use uuid::Uuid;

  use super::*;

  fn appt(date: &str, time: &str, status: AppointmentStatus) -> Appointment {
    Appointment {
      id:            Uuid::new_v4(),
      patient_name:  "Pat".into(),
      patient_email: "pat@example.com".into(),
      patient_uid:   Some("uid-1".into()),
      date:          date.parse().unwrap(),
      time:          time.parse().unwrap(),
      status,
      created_at:    Utc::now(),
    }
  }

  #[test]
  fn future_approved_sets_both_flags() {
    let a = appt("2099-01-01", "10:00", AppointmentStatus::Approved);
    let flags = derive_flags(&a, Utc::now(), ClinicTimeZone::Local);
    assert_eq!(flags, ArchiveFlags {
      deleted_before_appointment: true,
      deleted_while_approved:     true,
    });
  }

  #[test]
  fn rejected_is_not_deleted_while_approved() {
    let a = appt("2099-01-01", "10:00", AppointmentStatus::Rejected);
    let flags = derive_flags(&a, Utc::now(), ClinicTimeZone::Local);
    assert!(flags.deleted_before_appointment);
    assert!(!flags.deleted_while_approved);
  }

  #[test]
  fn past_appointment_is_not_deleted_before() {
    let a = appt("2000-01-01", "10:00", AppointmentStatus::Approved);
    let flags = derive_flags(&a, Utc::now(), ClinicTimeZone::Local);
    assert!(!flags.deleted_before_appointment);
  }

  #[test]
  fn exact_start_time_is_not_before() {
    let tz = ClinicTimeZone::from_utc_offset_minutes(Some(0)).unwrap();
    let a = appt("2030-05-05", "12:00", AppointmentStatus::Requested);
    let start = appointment_instant(&a.date, &a.time, tz).unwrap();
    assert!(!derive_flags(&a, start, tz).deleted_before_appointment);
    assert!(
      derive_flags(&a, start - chrono::Duration::milliseconds(1), tz)
        .deleted_before_appointment
    );
  }

  #[test]
  fn reason_follows_actor_role() {
    assert_eq!(ArchiveReason::from(ActorRole::Admin), ArchiveReason::AdminDeleted);
    assert_eq!(ArchiveReason::from(ActorRole::Patient), ArchiveReason::PatientDeleted);
    assert_eq!(ArchiveReason::from(ActorRole::System), ArchiveReason::Cleanup);
  }

  #[test]
  fn record_keeps_original_fields() {
    let a = appt("2099-01-01", "10:00", AppointmentStatus::Requested);
    let now = Utc::now();
    let actor = Actor {
      role:  ActorRole::Patient,
      uid:   Some("uid-1".into()),
      email: Some("pat@example.com".into()),
    };
    let archived = archive_record(a.clone(), actor.clone(), now, ClinicTimeZone::Local);
    assert_eq!(archived.appointment, a);
    assert_eq!(archived.archived_at, now);
    assert_eq!(archived.archived_by, actor);
    assert_eq!(archived.archive_reason, ArchiveReason::PatientDeleted);
  }

  #[test]
  fn archived_wire_format_is_flat() {
    let a = appt("2099-01-01", "10:00", AppointmentStatus::Approved);
    let archived = archive_record(a.clone(), Actor::system(), Utc::now(), ClinicTimeZone::Local);
    let json = serde_json::to_value(&archived).unwrap();
    assert_eq!(json["id"], a.id.to_string());
    assert_eq!(json["archiveReason"], "cleanup");
    assert_eq!(json["archivedBy"]["role"], "system");
    assert_eq!(json["flags"]["deletedWhileApproved"], true);
  }
}
