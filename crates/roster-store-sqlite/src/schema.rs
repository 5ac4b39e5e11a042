//! SQL schema for the Roster SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Base identity rows. Archiving sets deleted_at; rows are never removed.
CREATE TABLE IF NOT EXISTS users (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    pub_id        TEXT NOT NULL UNIQUE,   -- hyphenated UUID
    resource_name TEXT NOT NULL,
    name          TEXT NOT NULL DEFAULT '',
    description   TEXT NOT NULL DEFAULT '',
    owner_id      INTEGER REFERENCES users(id),
    auth_id       TEXT UNIQUE,
    legal_id      TEXT,
    legal_id_type TEXT,
    active        INTEGER NOT NULL DEFAULT 1 CHECK (active IN (0, 1)),
    created_at    TEXT NOT NULL,          -- ISO 8601 UTC
    updated_at    TEXT NOT NULL,
    deleted_at    TEXT
);

CREATE TABLE IF NOT EXISTS persons (
    id           INTEGER PRIMARY KEY REFERENCES users(id),
    given_name   TEXT NOT NULL DEFAULT '',
    family_name  TEXT NOT NULL DEFAULT '',
    email        TEXT NOT NULL DEFAULT '',
    phone        TEXT NOT NULL DEFAULT '',   -- bare digits
    backup_email TEXT NOT NULL DEFAULT '',
    backup_phone TEXT NOT NULL DEFAULT '',   -- bare digits
    avatar_url   TEXT NOT NULL DEFAULT ''
);

CREATE TABLE IF NOT EXISTS locations (
    id       INTEGER PRIMARY KEY AUTOINCREMENT,
    address1 TEXT NOT NULL DEFAULT '',
    address2 TEXT NOT NULL DEFAULT '',
    city     TEXT NOT NULL DEFAULT '',
    state    TEXT NOT NULL DEFAULT '',
    zip      TEXT NOT NULL DEFAULT '',
    lat      REAL,
    lng      REAL
);

-- Address links are fully replaced on every write of their owner.
CREATE TABLE IF NOT EXISTS address_links (
    entity_id   INTEGER NOT NULL REFERENCES users(id),
    location_id INTEGER NOT NULL REFERENCES locations(id),
    idx         INTEGER NOT NULL CHECK (idx >= 1),
    label       TEXT NOT NULL DEFAULT '',
    PRIMARY KEY (entity_id, idx)
);

CREATE INDEX IF NOT EXISTS address_links_location_idx ON address_links(location_id);

PRAGMA user_version = 1;
";
