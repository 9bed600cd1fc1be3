//! Handlers for `/profiles` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/profiles` | Body: `{"uid":..,"email":..,"displayName":..}`; creates a `user` profile if absent |
//! | `GET`  | `/profiles/:uid` | 404 if not found |
//! | `PUT`  | `/profiles/:uid/role` | Body: `{"by":<Identity>,"role":"admin"}`; admins only |

use axum::{
  Json,
  extract::{Path, State},
};
use clinic_core::{
  profile::{Identity, Profile, Role},
  store::ClinicStore,
};
use serde::Deserialize;

use crate::{ApiState, error::ApiError};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnsureBody {
  pub uid:          String,
  pub email:        String,
  pub display_name: Option<String>,
}

/// `POST /profiles`, called after every sign-in.
pub async fn ensure<S>(
  State(state): State<ApiState<S>>,
  Json(body): Json<EnsureBody>,
) -> Result<Json<Profile>, ApiError>
where
  S: ClinicStore,
{
  let profile = state
    .store
    .ensure_profile(&body.uid, body.email.trim(), body.display_name.as_deref())
    .await
    .map_err(ApiError::store)?;
  Ok(Json(profile))
}

/// `GET /profiles/:uid`
pub async fn get_one<S>(
  State(state): State<ApiState<S>>,
  Path(uid): Path<String>,
) -> Result<Json<Profile>, ApiError>
where
  S: ClinicStore,
{
  let profile = state
    .store
    .get_profile(&uid)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("profile {uid} not found")))?;
  Ok(Json(profile))
}

#[derive(Debug, Deserialize)]
pub struct RoleBody {
  /// The caller making the change.
  pub by:   Identity,
  pub role: Role,
}

/// `PUT /profiles/:uid/role`
pub async fn set_role<S>(
  State(state): State<ApiState<S>>,
  Path(uid): Path<String>,
  Json(body): Json<RoleBody>,
) -> Result<Json<Profile>, ApiError>
where
  S: ClinicStore,
{
  if !body.by.is_admin() {
    return Err(ApiError::Forbidden("only admins may change roles".into()));
  }

  state
    .store
    .set_role(&uid, body.role)
    .await
    .map_err(ApiError::store)?;
  tracing::info!(%uid, role = body.role.as_ref(), by = %body.by.uid, "role changed");

  let profile = state
    .store
    .get_profile(&uid)
    .await
    .map_err(ApiError::store)?
    .ok_or_else(|| ApiError::NotFound(format!("profile {uid} not found")))?;
  Ok(Json(profile))
}
