//! The `ClinicStore` trait.
//!
//! The trait is implemented by storage backends (e.g. `clinic-store-sqlite`).
//! Higher layers (`clinic-api`, `clinic-server`) depend on this abstraction,
//! not on any concrete backend.

use std::future::Future;

use uuid::Uuid;

use crate::{
  StoreError,
  appointment::{Appointment, AppointmentStatus, NewAppointment, TransitionPolicy},
  archive::{Actor, ArchivedAppointment},
  message::{NewMessage, PortalMessage},
  profile::{Profile, Role},
};

/// Abstraction over the clinic's record store.
///
/// The store is pull-based: it never pushes change notifications, so callers
/// re-read after every write to observe the new state.
///
/// All methods return `Send` futures so the trait can be used in multi-threaded
/// async runtimes (e.g. tokio with `axum`).
pub trait ClinicStore: Send + Sync {
  type Error: StoreError;

  // ── Appointments ──────────────────────────────────────────────────────

  /// Every active appointment. A failure here means the state is unknown,
  /// not that there are no appointments.
  fn list_appointments(
    &self,
  ) -> impl Future<Output = Result<Vec<Appointment>, Self::Error>> + Send + '_;

  /// Active appointments whose `patient_email` equals `email` exactly. No
  /// case or whitespace normalisation is applied.
  fn list_appointments_by_email<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Vec<Appointment>, Self::Error>> + Send + 'a;

  /// Point lookup of an active appointment.
  fn get_appointment(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Appointment>, Self::Error>> + Send + '_;

  /// Persist a new appointment in the `requested` state. The id and
  /// `created_at` are assigned by the store.
  fn create_appointment(
    &self,
    input: NewAppointment,
  ) -> impl Future<Output = Result<Appointment, Self::Error>> + Send + '_;

  /// Overwrite an appointment's status, subject to `policy`.
  ///
  /// Fails with a not-found error if `id` is not active.
  fn set_status(
    &self,
    id: Uuid,
    status: AppointmentStatus,
    policy: TransitionPolicy,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  // ── Archive ───────────────────────────────────────────────────────────

  /// Move an active appointment into the archive collection.
  ///
  /// The archive write and the active delete commit together or not at all.
  /// A second call for the same `id` fails with a not-found error.
  fn archive_and_delete(
    &self,
    id: Uuid,
    actor: Actor,
  ) -> impl Future<Output = Result<ArchivedAppointment, Self::Error>> + Send + '_;

  /// Every archived appointment.
  fn list_archived(
    &self,
  ) -> impl Future<Output = Result<Vec<ArchivedAppointment>, Self::Error>> + Send + '_;

  // ── Messages ──────────────────────────────────────────────────────────

  /// Persist a new unread message. The id and `created_at` are assigned by
  /// the store.
  fn send_message(
    &self,
    input: NewMessage,
  ) -> impl Future<Output = Result<PortalMessage, Self::Error>> + Send + '_;

  /// Messages addressed to `to_email` (exact match), newest first.
  fn inbox<'a>(
    &'a self,
    to_email: &'a str,
  ) -> impl Future<Output = Result<Vec<PortalMessage>, Self::Error>> + Send + 'a;

  /// Stamp `read_at` if unset and return the message. Marking an already
  /// read message keeps the original timestamp.
  fn mark_read(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<PortalMessage, Self::Error>> + Send + '_;

  // ── Profiles ──────────────────────────────────────────────────────────

  /// Return the profile for `uid`, creating it with [`Role::User`] if absent.
  fn ensure_profile<'a>(
    &'a self,
    uid: &'a str,
    email: &'a str,
    display_name: Option<&'a str>,
  ) -> impl Future<Output = Result<Profile, Self::Error>> + Send + 'a;

  fn get_profile<'a>(
    &'a self,
    uid: &'a str,
  ) -> impl Future<Output = Result<Option<Profile>, Self::Error>> + Send + 'a;

  fn set_role<'a>(
    &'a self,
    uid: &'a str,
    role: Role,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + 'a;

  /// Promote the profile whose email matches `email` (trimmed,
  /// case-insensitive) to admin, but only while no admin exists.
  ///
  /// Returns the promoted profile, or `None` if an admin already exists or no
  /// profile matches.
  fn bootstrap_admin<'a>(
    &'a self,
    email: &'a str,
  ) -> impl Future<Output = Result<Option<Profile>, Self::Error>> + Send + 'a;
}
