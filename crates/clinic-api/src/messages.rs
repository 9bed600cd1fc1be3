//! Handlers for `/messages` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `GET`  | `/messages` | `?to_email=` required; newest first |
//! | `POST` | `/messages` | Body: [`SendBody`]; returns 201 + stored message |
//! | `POST` | `/messages/:id/read` | Sets `readAt` once |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::IntoResponse,
};
use clinic_core::{
  message::{NewMessage, PortalMessage, SenderRole},
  store::ClinicStore,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{ApiState, error::ApiError};

#[derive(Debug, Deserialize)]
pub struct InboxParams {
  pub to_email: String,
}

/// `GET /messages?to_email=...`
pub async fn inbox<S>(
  State(state): State<ApiState<S>>,
  Query(params): Query<InboxParams>,
) -> Result<Json<Vec<PortalMessage>>, ApiError>
where
  S: ClinicStore,
{
  let messages = state
    .store
    .inbox(&params.to_email)
    .await
    .map_err(ApiError::store)?;
  Ok(Json(messages))
}

/// JSON body accepted by `POST /messages`. `createdAt` and `readAt` are set by
/// the store.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendBody {
  pub to_email:       String,
  pub to_uid:         Option<String>,
  pub from_email:     Option<String>,
  pub from_role:      SenderRole,
  pub appointment_id: Option<Uuid>,
  pub subject:        String,
  pub body:           String,
}

impl From<SendBody> for NewMessage {
  fn from(b: SendBody) -> Self {
    NewMessage {
      to_email:       b.to_email,
      to_uid:         b.to_uid,
      from_email:     b.from_email,
      from_role:      b.from_role,
      appointment_id: b.appointment_id,
      subject:        b.subject,
      body:           b.body,
    }
  }
}

/// `POST /messages`
pub async fn send<S>(
  State(state): State<ApiState<S>>,
  Json(body): Json<SendBody>,
) -> Result<impl IntoResponse, ApiError>
where
  S: ClinicStore,
{
  if body.to_email.trim().is_empty() {
    return Err(ApiError::BadRequest("toEmail must not be empty".into()));
  }
  let message = state
    .store
    .send_message(NewMessage::from(body))
    .await
    .map_err(ApiError::store)?;
  Ok((StatusCode::CREATED, Json(message)))
}

/// `POST /messages/:id/read`
pub async fn mark_read<S>(
  State(state): State<ApiState<S>>,
  Path(id): Path<Uuid>,
) -> Result<Json<PortalMessage>, ApiError>
where
  S: ClinicStore,
{
  let message = state.store.mark_read(id).await.map_err(ApiError::store)?;
  Ok(Json(message))
}
