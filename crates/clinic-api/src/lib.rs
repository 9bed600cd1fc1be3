//! JSON REST API for the clinic appointment service.
//!
//! Exposes an axum [`Router`] backed by any [`clinic_core::store::ClinicStore`].
//! Authentication is the caller's responsibility: the acting
//! [`clinic_core::profile::Identity`] arrives in request bodies and is trusted
//! as given. Role checks are made here from that identity; an identity
//! without a role holds no privilege.
//!
//! # Mounting
//!
//! ```rust,ignore
//! .nest("/api", clinic_api::api_router(store.clone(), ApiOptions::default()))
//! ```

pub mod appointments;
pub mod archive;
pub mod calendar;
pub mod error;
pub mod messages;
pub mod profiles;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, post, put},
};
use clinic_core::{appointment::TransitionPolicy, store::ClinicStore};

pub use error::ApiError;

/// Behaviour switches for the API.
#[derive(Debug, Clone, Copy, Default)]
pub struct ApiOptions {
  /// How `POST /appointments/{id}/status` treats the transition table.
  pub transitions: TransitionPolicy,
}

/// Shared state threaded through all handlers.
pub struct ApiState<S> {
  pub store:   Arc<S>,
  pub options: ApiOptions,
}

impl<S> Clone for ApiState<S> {
  fn clone(&self) -> Self {
    Self { store: Arc::clone(&self.store), options: self.options }
  }
}

/// Build a fully-materialised API router for `store`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(store: Arc<S>, options: ApiOptions) -> Router<()>
where
  S: ClinicStore + 'static,
{
  Router::new()
    // Appointments
    .route(
      "/appointments",
      get(appointments::list::<S>).post(appointments::create::<S>),
    )
    .route("/appointments/{id}", get(appointments::get_one::<S>))
    .route("/appointments/{id}/status", post(appointments::set_status::<S>))
    .route("/appointments/{id}/archive", post(archive::archive_one::<S>))
    // Archive
    .route("/archive", get(archive::list::<S>))
    // Calendar
    .route("/calendar", get(calendar::this_month::<S>))
    .route("/calendar/{year}/{month}", get(calendar::month::<S>))
    // Messages
    .route("/messages", get(messages::inbox::<S>).post(messages::send::<S>))
    .route("/messages/{id}/read", post(messages::mark_read::<S>))
    // Profiles
    .route("/profiles", post(profiles::ensure::<S>))
    .route("/profiles/{uid}", get(profiles::get_one::<S>))
    .route("/profiles/{uid}/role", put(profiles::set_role::<S>))
    .with_state(ApiState { store, options })
}

#[cfg(test)]
mod tests;
