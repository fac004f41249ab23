//! SQL schema for the Tally SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
///
/// Audit tables are append-only (billing's PAID transition is the single
/// permitted mutation). Aggregate tables are maintained by atomic
/// upsert-increments keyed on their natural key.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- Inventory audit trail; one row per applied event.
CREATE TABLE IF NOT EXISTS inventory_log (
    event_key  TEXT PRIMARY KEY,  -- idempotency key
    at         TEXT NOT NULL,     -- ISO 8601 UTC
    item       TEXT NOT NULL,     -- lower-cased item name
    quantity   INTEGER NOT NULL,
    direction  TEXT NOT NULL,     -- 'deposit' | 'withdraw'
    actor      TEXT NOT NULL
);

-- Inventory aggregate: running signed stock per item.
CREATE TABLE IF NOT EXISTS stock_levels (
    item       TEXT PRIMARY KEY,
    quantity   INTEGER NOT NULL,
    updated_at TEXT NOT NULL
);

-- Billing audit trail. status is the one mutable column: an UNPAID row
-- flips to PAID when a matching payment arrives.
CREATE TABLE IF NOT EXISTS bill_log (
    event_key  TEXT PRIMARY KEY,
    at         TEXT NOT NULL,
    amount     INTEGER NOT NULL,
    issuer     TEXT NOT NULL,
    customer   TEXT NOT NULL,
    status     TEXT NOT NULL     -- 'UNPAID' | 'PAID'
);

-- Ledger audit trail.
CREATE TABLE IF NOT EXISTS ledger_log (
    event_key  TEXT PRIMARY KEY,
    at         TEXT NOT NULL,
    amount     INTEGER NOT NULL,
    direction  TEXT NOT NULL,     -- 'deposit' | 'withdraw'
    actor      TEXT NOT NULL,
    business   TEXT NOT NULL
);

-- Ledger aggregate: running signed balance per business.
CREATE TABLE IF NOT EXISTS business_balances (
    business   TEXT PRIMARY KEY,
    balance    INTEGER NOT NULL,
    updated_at TEXT NOT NULL
);

-- Live summary message pointers: at most one per (community, topic).
CREATE TABLE IF NOT EXISTS summary_messages (
    community_id TEXT NOT NULL,
    topic        TEXT NOT NULL,   -- 'inventory' | 'billing' | 'ledger'
    message_id   TEXT NOT NULL,
    updated_at   TEXT NOT NULL,
    PRIMARY KEY (community_id, topic)
);

CREATE INDEX IF NOT EXISTS bill_log_match_idx  ON bill_log(customer, status, at);
CREATE INDEX IF NOT EXISTS ledger_log_scan_idx ON ledger_log(business, at);

PRAGMA user_version = 1;
";
