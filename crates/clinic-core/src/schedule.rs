//! Composing an appointment's stored `date` and `time` into an instant.
//!
//! Neither field carries a zone, so the clinic's zone is supplied separately.
//! Out-of-range components roll over the way host calendar arithmetic does:
//! day 32 lands in the next month, month 13 in the next year.

use chrono::{
  DateTime, Duration, FixedOffset, Local, NaiveDate, NaiveDateTime, TimeZone,
  Utc,
};

use crate::{
  Error, Result,
  appointment::{AppointmentDate, AppointmentTime},
};

/// The zone appointment wall-clock times are interpreted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ClinicTimeZone {
  /// Whatever zone the host process runs in.
  #[default]
  Local,
  /// A fixed offset from UTC.
  Fixed(FixedOffset),
}

impl ClinicTimeZone {
  /// `None` selects the host zone.
  pub fn from_utc_offset_minutes(minutes: Option<i32>) -> Result<Self> {
    match minutes {
      None => Ok(Self::Local),
      Some(m) => m
        .checked_mul(60)
        .and_then(FixedOffset::east_opt)
        .map(Self::Fixed)
        .ok_or(Error::InvalidOffset(m)),
    }
  }
}

/// The wall-clock moment described by `date` and `time`, seconds zero.
fn naive_instant(date: &AppointmentDate, time: &AppointmentTime) -> Option<NaiveDateTime> {
  let (year, month, day) = date.components();
  let (hour, minute) = time.components();

  // Months are 1-indexed in storage; count them from year zero.
  let months = i64::from(year) * 12 + i64::from(month) - 1;
  let first_of_month = NaiveDate::from_ymd_opt(
    i32::try_from(months.div_euclid(12)).ok()?,
    u32::try_from(months.rem_euclid(12)).ok()? + 1,
    1,
  )?;

  let offset = Duration::days(i64::from(day) - 1)
    + Duration::hours(i64::from(hour))
    + Duration::minutes(i64::from(minute));

  first_of_month.and_hms_opt(0, 0, 0)?.checked_add_signed(offset)
}

fn resolve<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> Option<DateTime<Utc>> {
  tz.from_local_datetime(&naive)
    .earliest()
    // Skipped by a DST jump: move forward past the gap.
    .or_else(|| tz.from_local_datetime(&(naive + Duration::hours(1))).earliest())
    .map(|dt| dt.with_timezone(&Utc))
}

/// Compose `date` and `time` into a UTC instant in the given zone.
///
/// Returns `None` only when the result falls outside chrono's range.
pub fn appointment_instant(
  date: &AppointmentDate,
  time: &AppointmentTime,
  tz: ClinicTimeZone,
) -> Option<DateTime<Utc>> {
  let naive = naive_instant(date, time)?;
  match tz {
    ClinicTimeZone::Local => resolve(&Local, naive),
    ClinicTimeZone::Fixed(offset) => resolve(&offset, naive),
  }
}

#[cfg(test)]
mod tests {
  use chrono::{Datelike, Timelike};

  use super::*;

  fn at(date: &str, time: &str) -> DateTime<Utc> {
    appointment_instant(
      &date.parse().unwrap(),
      &time.parse().unwrap(),
      ClinicTimeZone::Fixed(FixedOffset::east_opt(0).unwrap()),
    )
    .unwrap()
  }

  #[test]
  fn composes_in_utc() {
    let t = at("2025-06-01", "09:30");
    assert_eq!((t.year(), t.month(), t.day()), (2025, 6, 1));
    assert_eq!((t.hour(), t.minute(), t.second()), (9, 30, 0));
  }

  #[test]
  fn applies_fixed_offset() {
    let tz = ClinicTimeZone::from_utc_offset_minutes(Some(-7 * 60)).unwrap();
    let t = appointment_instant(
      &"2025-06-01".parse().unwrap(),
      &"09:30".parse().unwrap(),
      tz,
    )
    .unwrap();
    assert_eq!(t.hour(), 16);
  }

  #[test]
  fn rolls_over_out_of_range_components() {
    assert_eq!(at("2025-02-30", "00:00"), at("2025-03-02", "00:00"));
    assert_eq!(at("2025-13-01", "00:00"), at("2026-01-01", "00:00"));
    assert_eq!(at("2025-00-15", "00:00"), at("2024-12-15", "00:00"));
    assert_eq!(at("2025-06-01", "24:00"), at("2025-06-02", "00:00"));
    assert_eq!(at("2025-06-00", "12:00"), at("2025-05-31", "12:00"));
  }

  #[test]
  fn local_zone_always_resolves() {
    let t = appointment_instant(
      &"2099-01-01".parse().unwrap(),
      &"10:00".parse().unwrap(),
      ClinicTimeZone::Local,
    );
    assert!(t.is_some());
  }

  #[test]
  fn offset_bounds() {
    assert!(ClinicTimeZone::from_utc_offset_minutes(None).is_ok());
    assert!(matches!(
      ClinicTimeZone::from_utc_offset_minutes(Some(24 * 60)),
      Err(Error::InvalidOffset(_))
    ));
  }
}
