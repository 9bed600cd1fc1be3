//! SQL schema for the clinic SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Active collection.
CREATE TABLE IF NOT EXISTS appointments (
    appointment_id TEXT PRIMARY KEY,
    patient_name   TEXT NOT NULL,
    patient_email  TEXT NOT NULL,   -- matched exactly, case-sensitive
    patient_uid    TEXT,
    date           TEXT NOT NULL,   -- YYYY-MM-DD
    time           TEXT NOT NULL,   -- HH:mm, clinic-local
    status         TEXT NOT NULL
                   CHECK (status IN ('requested', 'approved', 'rejected', 'canceled')),
    created_at     INTEGER NOT NULL -- epoch milliseconds; server-assigned
);

-- Archive collection. Append-only: rows are never updated or deleted.
CREATE TABLE IF NOT EXISTS appointments_archive (
    appointment_id             TEXT PRIMARY KEY,  -- same id as the active row
    patient_name               TEXT NOT NULL,
    patient_email              TEXT NOT NULL,
    patient_uid                TEXT,
    date                       TEXT NOT NULL,
    time                       TEXT NOT NULL,
    status                     TEXT NOT NULL,     -- status at archive time
    created_at                 INTEGER NOT NULL,
    archived_at                INTEGER NOT NULL,
    archived_by_role           TEXT NOT NULL,     -- 'admin' | 'patient' | 'system'
    archived_by_uid            TEXT,
    archived_by_email          TEXT,
    archive_reason             TEXT NOT NULL,
    deleted_before_appointment INTEGER NOT NULL,
    deleted_while_approved     INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS messages (
    message_id     TEXT PRIMARY KEY,
    to_email       TEXT NOT NULL,
    to_uid         TEXT,
    from_email     TEXT,
    from_role      TEXT NOT NULL,   -- 'admin' | 'system'
    appointment_id TEXT,            -- informal; no foreign key
    subject        TEXT NOT NULL,
    body           TEXT NOT NULL,
    created_at     INTEGER NOT NULL,
    read_at        INTEGER          -- set once by the recipient
);

CREATE TABLE IF NOT EXISTS profiles (
    uid          TEXT PRIMARY KEY,
    email        TEXT NOT NULL,
    display_name TEXT,
    role         TEXT NOT NULL DEFAULT 'user',
    created_at   INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS appointments_email_idx ON appointments(patient_email);
CREATE INDEX IF NOT EXISTS appointments_date_idx  ON appointments(date);
CREATE INDEX IF NOT EXISTS messages_to_email_idx  ON messages(to_email);

PRAGMA user_version = 1;
";
