//! SQL schema for the roster SQLite store.
//!
//! Executed once when a store is opened. The `CHECK` constraints mirror the
//! entity invariants so a write that slips past validation still fails in
//! the store.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
-- AUTOINCREMENT: ids are never reused, even after a force delete.
CREATE TABLE IF NOT EXISTS person (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    name         TEXT    NOT NULL CHECK (length(name) BETWEEN 1 AND 100),
    description  TEXT             CHECK (description IS NULL OR length(description) <= 200),
    email        TEXT             CHECK (email IS NULL OR length(email) <= 150),
    is_deleted   INTEGER NOT NULL DEFAULT 0 CHECK (is_deleted IN (0, 1)),
    created_date TEXT    NOT NULL   -- RFC 3339 UTC; never updated
);

-- Credentials; no operation reads or writes this table yet.
CREATE TABLE IF NOT EXISTS account (
    id        INTEGER PRIMARY KEY AUTOINCREMENT,
    user_name TEXT NOT NULL CHECK (length(user_name) <= 100),
    password  TEXT NOT NULL CHECK (length(password) <= 100)
);

CREATE INDEX IF NOT EXISTS person_deleted_idx ON person(is_deleted);

PRAGMA user_version = 1;
";

/// Busy wait applied to every connection before it reports `SQLITE_BUSY`.
pub const BUSY_TIMEOUT_MS: u64 = 5_000;
