//! SQL schema for the ProCheck SQLite store.
//!
//! Executed once at connection startup. The version is recorded in
//! `PRAGMA user_version`; there are no migrations.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;

-- Guests are insert-only.
-- No UPDATE or DELETE is ever issued against this table.
CREATE TABLE IF NOT EXISTS guests (
    id              TEXT PRIMARY KEY,              -- PC-<base36>-<base36>
    full_name       TEXT NOT NULL,
    date_of_birth   TEXT NOT NULL,                 -- YYYY-MM-DD
    id_number       TEXT NOT NULL UNIQUE,          -- natural identifier
    adm_no          TEXT NOT NULL,
    registered_at   TEXT NOT NULL,                 -- RFC 3339 UTC; server-assigned
    registered_from TEXT NOT NULL,
    status          TEXT NOT NULL DEFAULT 'active',
    version         TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS guests_registered_idx ON guests(registered_at);

PRAGMA user_version = 1;
";
