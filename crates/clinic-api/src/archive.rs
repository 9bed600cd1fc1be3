//! Handlers for archiving appointments.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/appointments/:id/archive` | Body: the caller's [`Identity`]; 404 if already archived |
//! | `GET`  | `/archive` | Archived appointments in presentation order |
//!
//! Admins may archive any appointment. Everyone else, including a caller
//! whose role is unknown, may only archive their own and is recorded as the
//! patient.

use axum::{
  Json,
  extract::{Path, State},
};
use clinic_core::{
  archive::ArchivedAppointment,
  ordering::ordered,
  profile::Identity,
  store::ClinicStore,
};
use uuid::Uuid;

use crate::{ApiState, error::ApiError};

/// `POST /appointments/:id/archive`
///
/// Only a committed archive yields 200. A racing second request sees 404.
pub async fn archive_one<S>(
  State(state): State<ApiState<S>>,
  Path(id): Path<Uuid>,
  Json(caller): Json<Identity>,
) -> Result<Json<ArchivedAppointment>, ApiError>
where
  S: ClinicStore,
{
  if !caller.is_admin() {
    let appointment = state
      .store
      .get_appointment(id)
      .await
      .map_err(ApiError::store)?
      .ok_or_else(|| ApiError::NotFound(format!("appointment {id} not found")))?;
    if appointment.patient_email != caller.email {
      return Err(ApiError::Forbidden(format!(
        "appointment {id} belongs to another patient"
      )));
    }
  }

  let archived = state
    .store
    .archive_and_delete(id, caller.actor())
    .await
    .map_err(ApiError::store)?;
  Ok(Json(archived))
}

/// `GET /archive`
pub async fn list<S>(
  State(state): State<ApiState<S>>,
) -> Result<Json<Vec<ArchivedAppointment>>, ApiError>
where
  S: ClinicStore,
{
  let archived = state.store.list_archived().await.map_err(ApiError::store)?;
  Ok(Json(ordered(archived)))
}
