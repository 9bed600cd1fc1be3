//! Handlers for `GET /calendar` and `GET /calendar/:year/:month`.
//!
//! Returns one [`DaySummary`] per day. `?email=` narrows the grid to one
//! patient's appointments. Without a year and month the host's current month
//! is shown.

use axum::{
  Json,
  extract::{Path, Query, State},
};
use clinic_core::{
  calendar::{DaySummary, current_month, month_grid},
  store::ClinicStore,
};
use serde::Deserialize;

use crate::{ApiState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct MonthParams {
  pub email: Option<String>,
}

/// `GET /calendar/:year/:month[?email=...]`
pub async fn month<S>(
  State(state): State<ApiState<S>>,
  Path((year, month)): Path<(i32, u32)>,
  Query(params): Query<MonthParams>,
) -> Result<Json<Vec<DaySummary>>, ApiError>
where
  S: ClinicStore,
{
  grid(&state, year, month, params.email.as_deref()).await.map(Json)
}

/// `GET /calendar[?email=...]`
pub async fn this_month<S>(
  State(state): State<ApiState<S>>,
  Query(params): Query<MonthParams>,
) -> Result<Json<Vec<DaySummary>>, ApiError>
where
  S: ClinicStore,
{
  let (year, month) = current_month();
  grid(&state, year, month, params.email.as_deref()).await.map(Json)
}

async fn grid<S>(
  state: &ApiState<S>,
  year:  i32,
  month: u32,
  email: Option<&str>,
) -> Result<Vec<DaySummary>, ApiError>
where
  S: ClinicStore,
{
  let appointments = match email {
    Some(email) => state.store.list_appointments_by_email(email).await,
    None => state.store.list_appointments().await,
  }
  .map_err(ApiError::store)?;

  Ok(month_grid(year, month, &appointments)?)
}
