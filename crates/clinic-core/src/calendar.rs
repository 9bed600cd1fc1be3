//! Month grid summaries for the calendar view.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;

use crate::{
  Error, Result,
  appointment::{Appointment, AppointmentDate, AppointmentStatus},
  ordering::dominant_status,
};

/// One cell of the month grid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DaySummary {
  pub date:            AppointmentDate,
  pub count:           usize,
  /// Status whose colour the cell shows; `None` on an empty day.
  pub dominant_status: Option<AppointmentStatus>,
}

fn days_in_month(year: i32, month: u32) -> Option<u32> {
  let first = NaiveDate::from_ymd_opt(year, month, 1)?;
  let next = first.checked_add_months(chrono::Months::new(1))?;
  Some(next.signed_duration_since(first).num_days() as u32)
}

/// Summaries for every day of `month` (1-indexed) in `year`.
pub fn month_grid(
  year: i32,
  month: u32,
  appointments: &[Appointment],
) -> Result<Vec<DaySummary>> {
  if !(1..=12).contains(&month) {
    return Err(Error::InvalidMonth(month));
  }
  let days = days_in_month(year, month).ok_or(Error::InvalidYear(year))?;

  (1..=days)
    .map(|day| {
      let date: AppointmentDate = format!("{year:04}-{month:02}-{day:02}").parse()?;
      let on_day: Vec<&Appointment> =
        appointments.iter().filter(|a| a.date == date).collect();
      Ok(DaySummary {
        count: on_day.len(),
        dominant_status: dominant_status(on_day.iter().copied()),
        date,
      })
    })
    .collect()
}

/// The current month in the host calendar, as `(year, month)`.
pub fn current_month() -> (i32, u32) {
  let today = chrono::Local::now().date_naive();
  (today.year(), today.month())
}

#[cfg(test)]
mod tests {
  use chrono::{DateTime, Utc};
  use uuid::Uuid;

  use super::*;

  fn appt(date: &str, status: AppointmentStatus) -> Appointment {
    Appointment {
      id:            Uuid::new_v4(),
      patient_name:  "P".into(),
      patient_email: "p@example.com".into(),
      patient_uid:   None,
      date:          date.parse().unwrap(),
      time:          "09:00".parse().unwrap(),
      status,
      created_at:    DateTime::<Utc>::from_timestamp_millis(0).unwrap(),
    }
  }

  #[test]
  fn grid_covers_every_day() {
    assert_eq!(month_grid(2024, 2, &[]).unwrap().len(), 29);
    assert_eq!(month_grid(2025, 2, &[]).unwrap().len(), 28);
    assert_eq!(month_grid(2025, 12, &[]).unwrap().len(), 31);
  }

  #[test]
  fn invalid_month_is_rejected() {
    assert!(matches!(month_grid(2025, 13, &[]), Err(Error::InvalidMonth(13))));
    assert!(matches!(month_grid(2025, 0, &[]), Err(Error::InvalidMonth(0))));
  }

  #[test]
  fn out_of_range_year_names_the_year() {
    assert!(matches!(
      month_grid(i32::MAX, 6, &[]),
      Err(Error::InvalidYear(i32::MAX))
    ));
    assert!(matches!(month_grid(i32::MAX, 13, &[]), Err(Error::InvalidMonth(13))));
  }

  #[test]
  fn most_urgent_status_colours_the_day() {
    use AppointmentStatus::*;
    let appts = vec![
      appt("2025-06-03", Approved),
      appt("2025-06-03", Canceled),
      appt("2025-06-03", Requested),
      appt("2025-06-04", Approved),
      appt("2025-07-03", Rejected),
    ];
    let grid = month_grid(2025, 6, &appts).unwrap();

    let third = &grid[2];
    assert_eq!(third.date.as_str(), "2025-06-03");
    assert_eq!(third.count, 3);
    assert_eq!(third.dominant_status, Some(Canceled));

    assert_eq!(grid[3].dominant_status, Some(Approved));
    assert_eq!(grid[0].count, 0);
    assert_eq!(grid[0].dominant_status, None);
  }
}
