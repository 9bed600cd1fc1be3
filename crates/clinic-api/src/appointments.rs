//! Handlers for `/appointments` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/appointments` | Optional `?email=` (exact match) and `?date=YYYY-MM-DD` |
//! | `POST` | `/appointments` | Body: [`CreateBody`]; returns 201 + stored appointment |
//! | `GET`  | `/appointments/:id` | 404 if not active |
//! | `POST` | `/appointments/:id/status` | Body: `{"status":"approved"}` |
//!
//! Lists come back in presentation order.

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use clinic_core::{
  appointment::{Appointment, AppointmentDate, AppointmentStatus, AppointmentTime, NewAppointment},
  ordering::{filter_by_date, ordered},
  store::ClinicStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{ApiState, error::ApiError};

// ─── List ─────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  /// Restrict to one patient's appointments. Case-sensitive.
  pub email: Option<String>,
  /// Restrict to one calendar day.
  pub date:  Option<AppointmentDate>,
}

/// `GET /appointments[?email=...][&date=...]`
pub async fn list<S>(
  State(state): State<ApiState<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Vec<Appointment>>, ApiError>
where
  S: ClinicStore,
{
  let appointments = match &params.email {
    Some(email) => state.store.list_appointments_by_email(email).await,
    None => state.store.list_appointments().await,
  }
  .map_err(ApiError::store)?;

  let appointments = match &params.date {
    Some(date) => filter_by_date(appointments, date),
    None => appointments,
  };

  Ok(Json(ordered(appointments)))
}

// ─── Get one ──────────────────────────────────────────────────────────────────

/// `GET /appointments/:id`
pub async fn get_one<S>(
  State(state): State<ApiState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<Appointment>, ApiError>
where
  S: ClinicStore,
{
  let appointment = state
    .store
    .get_appointment(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("appointment {id} not found")))?;
  Ok(Json(appointment))
}

// ─── Create ───────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /appointments`.
///
/// Any `status` or `createdAt` a caller sends is not part of this type and is
/// dropped during deserialisation.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBody {
  pub patient_name:  String,
  pub patient_email: String,
  pub patient_uid:   Option<String>,
  pub date:          AppointmentDate,
  pub time:          AppointmentTime,
}

impl From<CreateBody> for NewAppointment {
  fn from(b: CreateBody) -> Self {
    NewAppointment {
      patient_name:  b.patient_name,
      patient_email: b.patient_email,
      patient_uid:   b.patient_uid,
      date:          b.date,
      time:          b.time,
    }
  }
}

/// `POST /appointments` returns 201 and the stored [`Appointment`].
pub async fn create<S>(
  State(state): State<ApiState<S>>,
  Json(body): Json<CreateBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ClinicStore,
{
  let appointment = state
    .store
    .create_appointment(NewAppointment::from(body))
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(appointment)))
}

// ─── Status ───────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct StatusBody {
  pub status: AppointmentStatus,
}

/// `POST /appointments/:id/status`. Responds with the re-read appointment.
pub async fn set_status<S>(
  State(state): State<ApiState<S>>,
  Path(id): Path<Uuid>,
  Json(body): Json<StatusBody>,
) -> Result<Json<Appointment>, ApiError>
where
  S: ClinicStore,
{
  state
    .store
    .set_status(id, body.status, state.options.transitions)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(appointment_id = %id, status = %body.status, "status updated");

  // The store does not push changes; read back what was committed.
  let appointment = state
    .store
    .get_appointment(id)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("appointment {id} not found")))?;
  Ok(Json(appointment))
}
