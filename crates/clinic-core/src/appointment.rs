//! Appointment types: the records of the active collection.
//!
//! An appointment is created in the `requested` state and changes only through
//! explicit status transitions. It leaves the active collection exclusively
//! through the archive transition (see [`crate::archive`]).

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Status ──────────────────────────────────────────────────────────────────

/// Where an appointment is in its lifecycle.
#[derive(
  Debug,
  Clone,
  Copy,
  PartialEq,
  Eq,
  Hash,
  Serialize,
  Deserialize,
  AsRefStr,
  Display,
  EnumIter,
  EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum AppointmentStatus {
  Requested,
  Approved,
  Rejected,
  Canceled,
}

impl AppointmentStatus {
  /// Attention rank used to order same-slot appointments and to pick the
  /// indicator for a calendar day. Higher is more urgent.
  pub fn urgency(self) -> u8 {
    match self {
      Self::Canceled => 4,
      Self::Rejected => 3,
      Self::Requested => 2,
      Self::Approved => 1,
    }
  }

  /// The strict transition table. Writing the current status again is always
  /// allowed.
  pub fn can_transition_to(self, next: Self) -> bool {
    use AppointmentStatus::*;
    self == next
      || matches!(
        (self, next),
        (Requested, Approved | Rejected | Canceled) | (Approved, Canceled)
      )
  }
}

/// How `set_status` treats the transition table.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum TransitionPolicy {
  /// Any status may overwrite any other.
  #[default]
  Permissive,
  /// Only transitions allowed by [`AppointmentStatus::can_transition_to`].
  Strict,
}

impl TransitionPolicy {
  pub fn check(self, from: AppointmentStatus, to: AppointmentStatus) -> Result<()> {
    match self {
      Self::Strict if !from.can_transition_to(to) => {
        Err(Error::InvalidTransition { from, to })
      }
      _ => Ok(()),
    }
  }
}

// ─── Date and time ───────────────────────────────────────────────────────────

fn has_shape(s: &str, len: usize, separators: &[(usize, u8)]) -> bool {
  s.len() == len
    && s.bytes().enumerate().all(|(i, b)| {
      match separators.iter().find(|(at, _)| *at == i) {
        Some((_, sep)) => b == *sep,
        None => b.is_ascii_digit(),
      }
    })
}

/// Value of a run of ASCII digits. Callers have already checked the shape.
fn digits(s: &str) -> u32 {
  s.bytes().fold(0, |acc, b| acc * 10 + u32::from(b - b'0'))
}

/// A calendar date in fixed-width `YYYY-MM-DD` form.
///
/// Only the shape is checked; `2025-02-30` is accepted. Fixed width makes the
/// lexicographic order of the text equal to chronological order.
#[derive(
  Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct AppointmentDate(String);

impl AppointmentDate {
  pub fn as_str(&self) -> &str { &self.0 }

  /// `(year, month, day)` with the month 1-indexed, as written.
  pub fn components(&self) -> (i32, u32, u32) {
    let year = digits(&self.0[0..4]) as i32;
    (year, digits(&self.0[5..7]), digits(&self.0[8..10]))
  }
}

impl TryFrom<String> for AppointmentDate {
  type Error = Error;

  fn try_from(s: String) -> Result<Self> {
    if has_shape(&s, 10, &[(4, b'-'), (7, b'-')]) {
      Ok(Self(s))
    } else {
      Err(Error::InvalidDate(s))
    }
  }
}

impl FromStr for AppointmentDate {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> { Self::try_from(s.to_owned()) }
}

impl From<AppointmentDate> for String {
  fn from(d: AppointmentDate) -> Self { d.0 }
}

impl fmt::Display for AppointmentDate {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

/// A local time of day in fixed-width `HH:mm` form. No time zone is stored.
#[derive(
  Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(try_from = "String", into = "String")]
pub struct AppointmentTime(String);

impl AppointmentTime {
  pub fn as_str(&self) -> &str { &self.0 }

  /// `(hour, minute)`.
  pub fn components(&self) -> (u32, u32) {
    (digits(&self.0[0..2]), digits(&self.0[3..5]))
  }
}

impl TryFrom<String> for AppointmentTime {
  type Error = Error;

  fn try_from(s: String) -> Result<Self> {
    if has_shape(&s, 5, &[(2, b':')]) {
      Ok(Self(s))
    } else {
      Err(Error::InvalidTime(s))
    }
  }
}

impl FromStr for AppointmentTime {
  type Err = Error;

  fn from_str(s: &str) -> Result<Self> { Self::try_from(s.to_owned()) }
}

impl From<AppointmentTime> for String {
  fn from(t: AppointmentTime) -> Self { t.0 }
}

impl fmt::Display for AppointmentTime {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

// ─── Appointment ─────────────────────────────────────────────────────────────

/// A record in the active collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
  pub id:            Uuid,
  pub patient_name:  String,
  /// Informal link to a patient identity. Matched exactly, case included.
  pub patient_email: String,
  /// Present only when the requester was signed in.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub patient_uid:   Option<String>,
  pub date:          AppointmentDate,
  pub time:          AppointmentTime,
  pub status:        AppointmentStatus,
  /// Server-assigned; never changes after creation.
  #[serde(with = "chrono::serde::ts_milliseconds")]
  pub created_at:    DateTime<Utc>,
}

// ─── NewAppointment ──────────────────────────────────────────────────────────

/// Input to [`crate::store::ClinicStore::create_appointment`].
///
/// There is no `status` or `created_at` here: the store always starts an
/// appointment as `requested` and stamps the creation time itself.
#[derive(Debug, Clone)]
pub struct NewAppointment {
  pub patient_name:  String,
  pub patient_email: String,
  pub patient_uid:   Option<String>,
  pub date:          AppointmentDate,
  pub time:          AppointmentTime,
}

impl NewAppointment {
  pub fn validate(&self) -> Result<()> {
    if self.patient_name.trim().is_empty() {
      return Err(Error::EmptyPatientName);
    }
    Ok(())
  }

  /// Build the stored record. `created_at` is the caller's clock reading.
  pub fn into_appointment(self, id: Uuid, created_at: DateTime<Utc>) -> Appointment {
    Appointment {
      id,
      patient_name: self.patient_name,
      patient_email: self.patient_email,
      patient_uid: self.patient_uid,
      date: self.date,
      time: self.time,
      status: AppointmentStatus::Requested,
      created_at,
    }
  }
}
