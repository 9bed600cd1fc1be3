//! Router tests driving the API in-process against an in-memory store.

use std::sync::Arc;

use axum::{
  Router,
  body::Body,
  http::{Method, Request, StatusCode, header},
};
use clinic_core::appointment::TransitionPolicy;
use clinic_store_sqlite::SqliteStore;
use serde_json::{Value, json};
use tower::ServiceExt as _;

use crate::{ApiOptions, api_router};

async fn app_with(options: ApiOptions) -> Router {
  let store = SqliteStore::open_in_memory()
    .await
    .expect("in-memory store");
  api_router(Arc::new(store), options)
}

async fn app() -> Router { app_with(ApiOptions::default()).await }

async fn call(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
  let req = Request::builder()
    .method(method)
    .uri(uri)
    .header(header::CONTENT_TYPE, "application/json")
    .body(body.map_or_else(Body::empty, |b| Body::from(b.to_string())))
    .unwrap();
  let resp = app.clone().oneshot(req).await.unwrap();
  let status = resp.status();
  let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
  (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

async fn create(app: &Router, email: &str, date: &str, time: &str) -> Value {
  let (status, body) = call(
    app,
    Method::POST,
    "/appointments",
    Some(json!({
      "patientName": "Pat Doe",
      "patientEmail": email,
      "date": date,
      "time": time,
    })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  body
}

// ─── Appointments ────────────────────────────────────────────────────────────

#[tokio::test]
async fn create_ignores_spoofed_status_and_timestamp() {
  let app = app().await;
  let (status, body) = call(
    &app,
    Method::POST,
    "/appointments",
    Some(json!({
      "patientName": "Pat Doe",
      "patientEmail": "pat@example.com",
      "date": "2025-06-01",
      "time": "09:00",
      "status": "approved",
      "createdAt": 1,
    })),
  )
  .await;

  assert_eq!(status, StatusCode::CREATED);
  assert_eq!(body["status"], "requested");
  assert!(body["createdAt"].as_i64().unwrap() > 1);
  assert!(body["id"].is_string());
}

#[tokio::test]
async fn create_rejects_malformed_input() {
  let app = app().await;

  let (status, _) = call(
    &app,
    Method::POST,
    "/appointments",
    Some(json!({
      "patientName": "",
      "patientEmail": "pat@example.com",
      "date": "2025-06-01",
      "time": "09:00",
    })),
  )
  .await;
  assert_eq!(status, StatusCode::BAD_REQUEST);

  let (status, _) = call(
    &app,
    Method::POST,
    "/appointments",
    Some(json!({
      "patientName": "Pat",
      "patientEmail": "pat@example.com",
      "date": "June 1st",
      "time": "09:00",
    })),
  )
  .await;
  assert!(status.is_client_error());
}

#[tokio::test]
async fn list_is_ordered_and_filterable() {
  let app = app().await;
  let later = create(&app, "a@b.com", "2025-06-02", "09:00").await;
  let first = create(&app, "a@b.com", "2025-06-01", "08:00").await;
  create(&app, "A@b.com", "2025-06-01", "07:00").await;

  let (status, all) = call(&app, Method::GET, "/appointments", None).await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(all.as_array().unwrap().len(), 3);
  assert_eq!(all[0]["patientEmail"], "A@b.com");

  let (_, mine) = call(&app, Method::GET, "/appointments?email=a@b.com", None).await;
  let mine = mine.as_array().unwrap();
  assert_eq!(mine.len(), 2);
  assert_eq!(mine[0]["id"], first["id"]);
  assert_eq!(mine[1]["id"], later["id"]);

  let (_, day) = call(&app, Method::GET, "/appointments?date=2025-06-02", None).await;
  assert_eq!(day.as_array().unwrap().len(), 1);
  assert_eq!(day[0]["id"], later["id"]);
}

#[tokio::test]
async fn status_update_returns_refreshed_record() {
  let app = app().await;
  let appt = create(&app, "a@b.com", "2025-06-01", "08:00").await;
  let id = appt["id"].as_str().unwrap();

  let (status, body) = call(
    &app,
    Method::POST,
    &format!("/appointments/{id}/status"),
    Some(json!({ "status": "canceled" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["status"], "canceled");

  // Permissive by default: a canceled appointment can be approved again.
  let (status, body) = call(
    &app,
    Method::POST,
    &format!("/appointments/{id}/status"),
    Some(json!({ "status": "approved" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(body["status"], "approved");
}

#[tokio::test]
async fn strict_transitions_conflict() {
  let app = app_with(ApiOptions { transitions: TransitionPolicy::Strict }).await;
  let appt = create(&app, "a@b.com", "2025-06-01", "08:00").await;
  let id = appt["id"].as_str().unwrap();

  let (status, _) = call(
    &app,
    Method::POST,
    &format!("/appointments/{id}/status"),
    Some(json!({ "status": "rejected" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);

  let (status, body) = call(
    &app,
    Method::POST,
    &format!("/appointments/{id}/status"),
    Some(json!({ "status": "approved" })),
  )
  .await;
  assert_eq!(status, StatusCode::CONFLICT);
  assert!(body["error"].as_str().unwrap().contains("rejected"));
}

#[tokio::test]
async fn unknown_appointment_is_404() {
  let app = app().await;
  let id = uuid::Uuid::new_v4();
  let (status, _) = call(&app, Method::GET, &format!("/appointments/{id}"), None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);

  let (status, _) = call(
    &app,
    Method::POST,
    &format!("/appointments/{id}/status"),
    Some(json!({ "status": "approved" })),
  )
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

// ─── Archive ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn archive_then_rearchive_is_404() {
  let app = app().await;
  let appt = create(&app, "a@b.com", "2099-01-01", "10:00").await;
  let id = appt["id"].as_str().unwrap();
  let actor = json!({ "uid": "u1", "email": "a@b.com", "role": "user" });

  let (status, archived) = call(
    &app,
    Method::POST,
    &format!("/appointments/{id}/archive"),
    Some(actor.clone()),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(archived["id"], appt["id"]);
  assert_eq!(archived["archiveReason"], "patient_deleted");
  assert_eq!(archived["flags"]["deletedBeforeAppointment"], true);
  assert_eq!(archived["flags"]["deletedWhileApproved"], false);

  let (status, _) = call(
    &app,
    Method::POST,
    &format!("/appointments/{id}/archive"),
    Some(actor),
  )
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);

  let (_, active) = call(&app, Method::GET, "/appointments", None).await;
  assert!(active.as_array().unwrap().is_empty());
  let (_, archive) = call(&app, Method::GET, "/archive", None).await;
  assert_eq!(archive.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn patients_may_only_archive_their_own() {
  let app = app().await;
  let appt = create(&app, "a@b.com", "2099-01-01", "10:00").await;
  let id = appt["id"].as_str().unwrap();

  // No role loaded: no privilege beyond the caller's own appointments.
  let (status, body) = call(
    &app,
    Method::POST,
    &format!("/appointments/{id}/archive"),
    Some(json!({ "uid": "u2", "email": "other@b.com" })),
  )
  .await;
  assert_eq!(status, StatusCode::FORBIDDEN);
  assert!(body["error"].is_string());

  let (status, archived) = call(
    &app,
    Method::POST,
    &format!("/appointments/{id}/archive"),
    Some(json!({ "uid": "adm", "email": "admin@clinic.example", "role": "admin" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(archived["archiveReason"], "admin_deleted");
  assert_eq!(archived["archivedBy"]["role"], "admin");
}

// ─── Calendar ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn calendar_marks_dominant_status() {
  let app = app().await;
  let a = create(&app, "a@b.com", "2025-06-03", "08:00").await;
  create(&app, "a@b.com", "2025-06-03", "09:00").await;
  let id = a["id"].as_str().unwrap();
  call(
    &app,
    Method::POST,
    &format!("/appointments/{id}/status"),
    Some(json!({ "status": "approved" })),
  )
  .await;

  let (status, grid) = call(&app, Method::GET, "/calendar/2025/6", None).await;
  assert_eq!(status, StatusCode::OK);
  let grid = grid.as_array().unwrap();
  assert_eq!(grid.len(), 30);
  assert_eq!(grid[2]["date"], "2025-06-03");
  assert_eq!(grid[2]["count"], 2);
  assert_eq!(grid[2]["dominantStatus"], "requested");
  assert_eq!(grid[0]["dominantStatus"], Value::Null);

  let (status, _) = call(&app, Method::GET, "/calendar/2025/13", None).await;
  assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn bare_calendar_shows_the_current_month() {
  let app = app().await;
  let (status, grid) = call(&app, Method::GET, "/calendar", None).await;
  assert_eq!(status, StatusCode::OK);
  let days = grid.as_array().unwrap().len();
  assert!((28..=31).contains(&days));
}

// ─── Messages ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn message_send_inbox_and_read() {
  let app = app().await;
  let (status, sent) = call(
    &app,
    Method::POST,
    "/messages",
    Some(json!({
      "toEmail": "pat@example.com",
      "fromEmail": "admin@clinic.example",
      "fromRole": "admin",
      "subject": "Your appointment",
      "body": "Approved.",
      "readAt": 5,
    })),
  )
  .await;
  assert_eq!(status, StatusCode::CREATED);
  assert!(sent.get("readAt").is_none());

  let (_, inbox) = call(&app, Method::GET, "/messages?to_email=pat@example.com", None).await;
  assert_eq!(inbox.as_array().unwrap().len(), 1);

  let id = sent["id"].as_str().unwrap();
  let (status, read) = call(&app, Method::POST, &format!("/messages/{id}/read"), None).await;
  assert_eq!(status, StatusCode::OK);
  assert!(read["readAt"].as_i64().is_some());
}

// ─── Profiles ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn profile_is_created_as_user() {
  let app = app().await;
  let (status, profile) = call(
    &app,
    Method::POST,
    "/profiles",
    Some(json!({ "uid": "u1", "email": " u1@example.com ", "displayName": "Una" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(profile["role"], "user");
  assert_eq!(profile["email"], "u1@example.com");

  let (status, _) = call(&app, Method::GET, "/profiles/u1", None).await;
  assert_eq!(status, StatusCode::OK);
  let (status, _) = call(&app, Method::GET, "/profiles/nobody", None).await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn only_admins_change_roles() {
  let app = app().await;
  call(
    &app,
    Method::POST,
    "/profiles",
    Some(json!({ "uid": "u1", "email": "u1@example.com" })),
  )
  .await;

  for by in [
    json!({ "uid": "u9", "email": "u9@example.com" }),
    json!({ "uid": "u9", "email": "u9@example.com", "role": "user" }),
  ] {
    let (status, _) = call(
      &app,
      Method::PUT,
      "/profiles/u1/role",
      Some(json!({ "by": by, "role": "admin" })),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
  }

  let admin = json!({ "uid": "adm", "email": "admin@clinic.example", "role": "admin" });
  let (status, profile) = call(
    &app,
    Method::PUT,
    "/profiles/u1/role",
    Some(json!({ "by": admin.clone(), "role": "admin" })),
  )
  .await;
  assert_eq!(status, StatusCode::OK);
  assert_eq!(profile["role"], "admin");

  let (status, _) = call(
    &app,
    Method::PUT,
    "/profiles/ghost/role",
    Some(json!({ "by": admin, "role": "user" })),
  )
  .await;
  assert_eq!(status, StatusCode::NOT_FOUND);
}

// ─── Failures ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn unreadable_store_is_500_not_empty() {
  let path = std::env::temp_dir().join(format!("clinic-api-{}.db", uuid::Uuid::new_v4()));
  let store = SqliteStore::open(&path).await.unwrap();
  let app = api_router(Arc::new(store), ApiOptions::default());

  let raw = rusqlite::Connection::open(&path).unwrap();
  raw
    .execute(
      "INSERT INTO appointments (
         appointment_id, patient_name, patient_email, date, time, status,
         created_at
       ) VALUES ('not-a-uuid', 'x', 'a@b.com', '2025-06-02', '10:00',
                 'requested', 0)",
      [],
    )
    .unwrap();
  drop(raw);

  let (status, body) = call(&app, Method::GET, "/appointments", None).await;
  assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
  assert!(body["error"].is_string());

  let (status, _) = call(&app, Method::GET, "/calendar/2025/6", None).await;
  assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);

  let _ = std::fs::remove_file(&path);
}
