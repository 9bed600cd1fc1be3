//! Presentation order for appointment lists.
//!
//! Earliest slot first. Within a slot, the most urgent status leads, then the
//! most recently created record. The sort is stable, so records that compare
//! equal keep their input order.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};

use crate::{
  appointment::{Appointment, AppointmentDate, AppointmentStatus, AppointmentTime},
  archive::ArchivedAppointment,
};

/// Anything that occupies an appointment slot.
pub trait Scheduled {
  fn date(&self) -> &AppointmentDate;
  fn time(&self) -> &AppointmentTime;
  /// `None` for a record whose status is unknown; it ranks below every
  /// known status.
  fn status(&self) -> Option<AppointmentStatus>;
  fn created_at(&self) -> DateTime<Utc>;
}

impl Scheduled for Appointment {
  fn date(&self) -> &AppointmentDate { &self.date }

  fn time(&self) -> &AppointmentTime { &self.time }

  fn status(&self) -> Option<AppointmentStatus> { Some(self.status) }

  fn created_at(&self) -> DateTime<Utc> { self.created_at }
}

impl Scheduled for ArchivedAppointment {
  fn date(&self) -> &AppointmentDate { &self.appointment.date }

  fn time(&self) -> &AppointmentTime { &self.appointment.time }

  fn status(&self) -> Option<AppointmentStatus> { Some(self.appointment.status) }

  fn created_at(&self) -> DateTime<Utc> { self.appointment.created_at }
}

/// Urgency rank; unknown status is `0`.
pub fn urgency(status: Option<AppointmentStatus>) -> u8 {
  status.map_or(0, AppointmentStatus::urgency)
}

/// The comparison behind [`sort_for_display`].
pub fn compare<T: Scheduled>(a: &T, b: &T) -> Ordering {
  a.date()
    .cmp(b.date())
    .then_with(|| a.time().cmp(b.time()))
    .then_with(|| urgency(b.status()).cmp(&urgency(a.status())))
    .then_with(|| b.created_at().cmp(&a.created_at()))
}

/// Sort in place into presentation order.
pub fn sort_for_display<T: Scheduled>(items: &mut [T]) {
  items.sort_by(compare);
}

/// Owned variant of [`sort_for_display`].
pub fn ordered<T: Scheduled>(mut items: Vec<T>) -> Vec<T> {
  sort_for_display(&mut items);
  items
}

/// The most urgent status among `items`, used for a calendar day's indicator.
pub fn dominant_status<'a, T, I>(items: I) -> Option<AppointmentStatus>
where
  T: Scheduled + 'a,
  I: IntoIterator<Item = &'a T>,
{
  items
    .into_iter()
    .filter_map(|item| item.status())
    .max_by_key(|s| s.urgency())
}

/// Keep only the records on `date`, preserving order.
pub fn filter_by_date<T: Scheduled>(items: Vec<T>, date: &AppointmentDate) -> Vec<T> {
  items.into_iter().filter(|a| a.date() == date).collect()
}
