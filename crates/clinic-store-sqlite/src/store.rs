//! [`SqliteStore`]: the SQLite implementation of [`ClinicStore`].

use std::path::Path;

use chrono::Utc;
use clinic_core::{
  appointment::{Appointment, AppointmentStatus, NewAppointment, TransitionPolicy},
  archive::{Actor, ArchivedAppointment, archive_record},
  message::{NewMessage, PortalMessage, sort_inbox},
  profile::{Profile, Role, normalize_email},
  schedule::ClinicTimeZone,
  store::ClinicStore,
};
use rusqlite::OptionalExtension as _;
use uuid::Uuid;

use crate::{
  Error, Result,
  encode::{
    APPOINTMENT_COLUMNS, ARCHIVE_COLUMNS, MESSAGE_COLUMNS, PROFILE_COLUMNS,
    RawAppointment, RawArchived, RawMessage, RawProfile, decode_text, encode_ms,
    encode_uuid,
  },
  schema::SCHEMA,
};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A clinic record store backed by a single SQLite file.
///
/// The inner connection is reference-counted, so clones share it. All calls
/// run in order on one connection thread.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
  time_zone:       ClinicTimeZone,
  /// Normalised email promoted to admin on sign-in while no admin exists.
  admin_email:     Option<String>,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path)
      .await
      .map_err(Error::Open)?;
    let store = Self {
      conn,
      time_zone: ClinicTimeZone::default(),
      admin_email: None,
    };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory()
      .await
      .map_err(Error::Open)?;
    let store = Self {
      conn,
      time_zone: ClinicTimeZone::default(),
      admin_email: None,
    };
    store.init_schema().await?;
    Ok(store)
  }

  /// Interpret appointment date/time fields in `time_zone` when archiving.
  pub fn with_time_zone(mut self, time_zone: ClinicTimeZone) -> Self {
    self.time_zone = time_zone;
    self
  }

  /// Promote the profile signing in with `email` to admin while the store
  /// has no admin yet.
  pub fn with_bootstrap_admin(mut self, email: &str) -> Self {
    self.admin_email = Some(normalize_email(email));
    self
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await
      .map_err(Error::Open)?;
    Ok(())
  }

  async fn query_appointments(
    &self,
    email: Option<String>,
  ) -> Result<Vec<Appointment>> {
    let raws: Vec<RawAppointment> = self
      .conn
      .call(move |conn| {
        let rows = if let Some(e) = email {
          let mut stmt = conn.prepare(&format!(
            "SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE patient_email = ?1"
          ))?;
          stmt
            .query_map(rusqlite::params![e], RawAppointment::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        } else {
          let mut stmt =
            conn.prepare(&format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments"))?;
          stmt
            .query_map([], RawAppointment::from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };
        Ok(rows)
      })
      .await
      .map_err(Error::Read)?;

    raws.into_iter().map(RawAppointment::into_appointment).collect()
  }
}

// ─── Transactional steps ─────────────────────────────────────────────────────
//
// Each runs on the connection thread inside one SQLite transaction. Returning
// early with an error drops the transaction, which rolls it back.

fn set_status_tx(
  conn:   &mut rusqlite::Connection,
  id:     Uuid,
  status: AppointmentStatus,
  policy: TransitionPolicy,
) -> Result<()> {
  let tx = conn.transaction()?;
  let id_str = encode_uuid(id);

  let current: Option<String> = tx
    .query_row(
      "SELECT status FROM appointments WHERE appointment_id = ?1",
      rusqlite::params![id_str],
      |row| row.get(0),
    )
    .optional()?;
  let current = current.ok_or(Error::AppointmentNotFound(id))?;
  policy.check(decode_text("status", &current)?, status)?;

  tx.execute(
    "UPDATE appointments SET status = ?2 WHERE appointment_id = ?1",
    rusqlite::params![id_str, status.as_ref()],
  )?;
  tx.commit()?;
  Ok(())
}

fn archive_tx(
  conn:      &mut rusqlite::Connection,
  id:        Uuid,
  actor:     Actor,
  time_zone: ClinicTimeZone,
) -> Result<ArchivedAppointment> {
  let tx = conn.transaction()?;
  let id_str = encode_uuid(id);

  let raw = tx
    .query_row(
      &format!("SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE appointment_id = ?1"),
      rusqlite::params![id_str],
      RawAppointment::from_row,
    )
    .optional()?
    .ok_or(Error::AppointmentNotFound(id))?;

  let archived = archive_record(raw.into_appointment()?, actor, Utc::now(), time_zone);
  let appt = &archived.appointment;

  tx.execute(
    &format!(
      "INSERT INTO appointments_archive ({ARCHIVE_COLUMNS})
       VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)"
    ),
    rusqlite::params![
      id_str,
      appt.patient_name,
      appt.patient_email,
      appt.patient_uid,
      appt.date.as_str(),
      appt.time.as_str(),
      appt.status.as_ref(),
      encode_ms(appt.created_at),
      encode_ms(archived.archived_at),
      archived.archived_by.role.as_ref(),
      archived.archived_by.uid,
      archived.archived_by.email,
      archived.archive_reason.as_ref(),
      archived.flags.deleted_before_appointment,
      archived.flags.deleted_while_approved,
    ],
  )?;
  tx.execute(
    "DELETE FROM appointments WHERE appointment_id = ?1",
    rusqlite::params![id_str],
  )?;
  tx.commit()?;

  Ok(archived)
}

fn mark_read_tx(conn: &mut rusqlite::Connection, id: Uuid) -> Result<PortalMessage> {
  let tx = conn.transaction()?;
  let id_str = encode_uuid(id);

  let changed = tx.execute(
    "UPDATE messages SET read_at = COALESCE(read_at, ?2) WHERE message_id = ?1",
    rusqlite::params![id_str, encode_ms(Utc::now())],
  )?;
  if changed == 0 {
    return Err(Error::MessageNotFound(id));
  }

  let raw = tx.query_row(
    &format!("SELECT {MESSAGE_COLUMNS} FROM messages WHERE message_id = ?1"),
    rusqlite::params![id_str],
    RawMessage::from_row,
  )?;
  tx.commit()?;
  raw.into_message()
}

fn ensure_profile_tx(
  conn:         &mut rusqlite::Connection,
  uid:          String,
  email:        String,
  display_name: Option<String>,
  admin_email:  Option<String>,
) -> Result<(Profile, bool)> {
  let tx = conn.transaction()?;
  let inserted = tx.execute(
    "INSERT OR IGNORE INTO profiles (uid, email, display_name, role, created_at)
     VALUES (?1, ?2, ?3, ?4, ?5)",
    rusqlite::params![
      uid,
      email,
      display_name,
      Role::User.as_ref(),
      encode_ms(Utc::now()),
    ],
  )?;

  let promoted = match admin_email {
    Some(admin) if inserted > 0 && normalize_email(&email) == admin => {
      promote_first_admin(&tx, &admin)?.is_some()
    }
    _ => false,
  };

  let raw = tx.query_row(
    &format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE uid = ?1"),
    rusqlite::params![uid],
    RawProfile::from_row,
  )?;
  tx.commit()?;
  Ok((raw.into_profile()?, promoted))
}

fn bootstrap_admin_tx(
  conn:  &mut rusqlite::Connection,
  email: String,
) -> Result<Option<Profile>> {
  let tx = conn.transaction()?;
  let promoted = promote_first_admin(&tx, &email)?;
  tx.commit()?;
  Ok(promoted)
}

/// Promote the oldest profile whose normalised email equals `email`, unless
/// an admin already exists. Emails are compared in Rust so non-ASCII case
/// folds the same way as [`normalize_email`].
fn promote_first_admin(
  tx:    &rusqlite::Transaction<'_>,
  email: &str,
) -> Result<Option<Profile>> {
  let admins: i64 = tx.query_row(
    "SELECT COUNT(*) FROM profiles WHERE role = ?1",
    rusqlite::params![Role::Admin.as_ref()],
    |row| row.get(0),
  )?;
  if admins > 0 {
    return Ok(None);
  }

  let mut stmt = tx.prepare(&format!(
    "SELECT {PROFILE_COLUMNS} FROM profiles ORDER BY created_at, uid"
  ))?;
  let mut candidate = None;
  for raw in stmt.query_map([], RawProfile::from_row)? {
    let raw = raw?;
    if normalize_email(&raw.email) == email {
      candidate = Some(raw);
      break;
    }
  }
  drop(stmt);
  let Some(raw) = candidate else {
    return Ok(None);
  };

  tx.execute(
    "UPDATE profiles SET role = ?2 WHERE uid = ?1",
    rusqlite::params![raw.uid, Role::Admin.as_ref()],
  )?;

  let mut profile = raw.into_profile()?;
  profile.role = Role::Admin;
  Ok(Some(profile))
}

// ─── ClinicStore impl ────────────────────────────────────────────────────────

impl ClinicStore for SqliteStore {
  type Error = Error;

  // ── Appointments ──────────────────────────────────────────────────────────

  async fn list_appointments(&self) -> Result<Vec<Appointment>> {
    self.query_appointments(None).await
  }

  async fn list_appointments_by_email(&self, email: &str) -> Result<Vec<Appointment>> {
    self.query_appointments(Some(email.to_owned())).await
  }

  async fn get_appointment(&self, id: Uuid) -> Result<Option<Appointment>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawAppointment> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE appointment_id = ?1"
              ),
              rusqlite::params![id_str],
              RawAppointment::from_row,
            )
            .optional()?,
        )
      })
      .await
      .map_err(Error::Read)?;

    raw.map(RawAppointment::into_appointment).transpose()
  }

  async fn create_appointment(&self, input: NewAppointment) -> Result<Appointment> {
    input.validate()?;
    let appt = input.into_appointment(Uuid::new_v4(), Utc::now());

    let id_str        = encode_uuid(appt.id);
    let patient_name  = appt.patient_name.clone();
    let patient_email = appt.patient_email.clone();
    let patient_uid   = appt.patient_uid.clone();
    let date          = appt.date.to_string();
    let time          = appt.time.to_string();
    let status        = appt.status.as_ref().to_owned();
    let created_at    = encode_ms(appt.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO appointments (
             appointment_id, patient_name, patient_email, patient_uid,
             date, time, status, created_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
          rusqlite::params![
            id_str,
            patient_name,
            patient_email,
            patient_uid,
            date,
            time,
            status,
            created_at,
          ],
        )?;
        Ok(())
      })
      .await
      .map_err(Error::Write)?;

    tracing::debug!(appointment_id = %appt.id, date = %appt.date, time = %appt.time, "appointment requested");
    Ok(appt)
  }

  async fn set_status(
    &self,
    id:     Uuid,
    status: AppointmentStatus,
    policy: TransitionPolicy,
  ) -> Result<()> {
    self
      .conn
      .call(move |conn| Ok(set_status_tx(conn, id, status, policy)))
      .await
      .map_err(Error::Write)??;

    tracing::debug!(appointment_id = %id, %status, "appointment status set");
    Ok(())
  }

  // ── Archive ───────────────────────────────────────────────────────────────

  async fn archive_and_delete(&self, id: Uuid, actor: Actor) -> Result<ArchivedAppointment> {
    let time_zone = self.time_zone;

    let archived = self
      .conn
      .call(move |conn| Ok(archive_tx(conn, id, actor, time_zone)))
      .await
      .map_err(Error::Write)??;

    tracing::info!(
      appointment_id = %id,
      reason = archived.archive_reason.as_ref(),
      actor = archived.archived_by.role.as_ref(),
      deleted_before_appointment = archived.flags.deleted_before_appointment,
      deleted_while_approved = archived.flags.deleted_while_approved,
      "appointment archived"
    );
    Ok(archived)
  }

  async fn list_archived(&self) -> Result<Vec<ArchivedAppointment>> {
    let raws: Vec<RawArchived> = self
      .conn
      .call(|conn| {
        let mut stmt = conn
          .prepare(&format!("SELECT {ARCHIVE_COLUMNS} FROM appointments_archive"))?;
        let rows = stmt
          .query_map([], RawArchived::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
      .map_err(Error::Read)?;

    raws.into_iter().map(RawArchived::into_archived).collect()
  }

  // ── Messages ──────────────────────────────────────────────────────────────

  async fn send_message(&self, input: NewMessage) -> Result<PortalMessage> {
    let msg = input.into_message(Uuid::new_v4(), Utc::now());

    let id_str         = encode_uuid(msg.id);
    let to_email       = msg.to_email.clone();
    let to_uid         = msg.to_uid.clone();
    let from_email     = msg.from_email.clone();
    let from_role      = msg.from_role.as_ref().to_owned();
    let appointment_id = msg.appointment_id.map(encode_uuid);
    let subject        = msg.subject.clone();
    let body           = msg.body.clone();
    let created_at     = encode_ms(msg.created_at);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO messages (
             message_id, to_email, to_uid, from_email, from_role,
             appointment_id, subject, body, created_at, read_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, NULL)",
          rusqlite::params![
            id_str,
            to_email,
            to_uid,
            from_email,
            from_role,
            appointment_id,
            subject,
            body,
            created_at,
          ],
        )?;
        Ok(())
      })
      .await
      .map_err(Error::Write)?;

    Ok(msg)
  }

  async fn inbox(&self, to_email: &str) -> Result<Vec<PortalMessage>> {
    let to_email = to_email.to_owned();

    let raws: Vec<RawMessage> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {MESSAGE_COLUMNS} FROM messages WHERE to_email = ?1"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![to_email], RawMessage::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await
      .map_err(Error::Read)?;

    let mut messages: Vec<PortalMessage> = raws
      .into_iter()
      .map(RawMessage::into_message)
      .collect::<Result<_>>()?;
    sort_inbox(&mut messages);
    Ok(messages)
  }

  async fn mark_read(&self, id: Uuid) -> Result<PortalMessage> {
    self
      .conn
      .call(move |conn| Ok(mark_read_tx(conn, id)))
      .await
      .map_err(Error::Write)?
  }

  // ── Profiles ──────────────────────────────────────────────────────────────

  async fn ensure_profile(
    &self,
    uid:          &str,
    email:        &str,
    display_name: Option<&str>,
  ) -> Result<Profile> {
    let uid          = uid.to_owned();
    let email        = email.to_owned();
    let display_name = display_name.map(str::to_owned);
    let admin_email  = self.admin_email.clone();

    let (profile, promoted) = self
      .conn
      .call(move |conn| {
        Ok(ensure_profile_tx(conn, uid, email, display_name, admin_email))
      })
      .await
      .map_err(Error::Write)??;

    if promoted {
      tracing::info!(uid = %profile.uid, "bootstrap admin assigned on sign-in");
    }
    Ok(profile)
  }

  async fn get_profile(&self, uid: &str) -> Result<Option<Profile>> {
    let uid = uid.to_owned();

    let raw: Option<RawProfile> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {PROFILE_COLUMNS} FROM profiles WHERE uid = ?1"),
              rusqlite::params![uid],
              RawProfile::from_row,
            )
            .optional()?,
        )
      })
      .await
      .map_err(Error::Read)?;

    raw.map(RawProfile::into_profile).transpose()
  }

  async fn set_role(&self, uid: &str, role: Role) -> Result<()> {
    let uid_owned = uid.to_owned();

    let changed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "UPDATE profiles SET role = ?2 WHERE uid = ?1",
          rusqlite::params![uid_owned, role.as_ref()],
        )?)
      })
      .await
      .map_err(Error::Write)?;

    if changed == 0 {
      return Err(Error::ProfileNotFound(uid.to_owned()));
    }
    Ok(())
  }

  async fn bootstrap_admin(&self, email: &str) -> Result<Option<Profile>> {
    let email = normalize_email(email);

    let promoted = self
      .conn
      .call(move |conn| Ok(bootstrap_admin_tx(conn, email)))
      .await
      .map_err(Error::Write)??;

    if let Some(profile) = &promoted {
      tracing::info!(uid = %profile.uid, "bootstrap admin assigned");
    }
    Ok(promoted)
  }
}
