//! SQLite schema for the durable key-value store.
//!
//! Every logical table shares one physical table:
//! - `kv_items` keeps one JSON document per `(table_name, partition_key, sort_key)`
//! - `store_meta` records the schema version and creation time

/// Migration v1: document table plus store metadata.
pub const MIGRATION_V1_SQL: &str = r"
CREATE TABLE IF NOT EXISTS kv_items (
    table_name TEXT NOT NULL CHECK (
        table_name IN ('solves', 'daily_activity', 'streaks', 'profiles', 'pending_effects')
    ),
    partition_key TEXT NOT NULL CHECK (length(trim(partition_key)) > 0),
    sort_key TEXT NOT NULL DEFAULT '',
    body TEXT NOT NULL CHECK (json_valid(body)),
    updated_at_us INTEGER NOT NULL,
    PRIMARY KEY (table_name, partition_key, sort_key)
) WITHOUT ROWID;

CREATE TABLE IF NOT EXISTS store_meta (
    id INTEGER PRIMARY KEY CHECK (id = 1),
    schema_version INTEGER NOT NULL,
    created_at_us INTEGER NOT NULL DEFAULT 0
);

INSERT OR IGNORE INTO store_meta (id, schema_version, created_at_us)
VALUES (1, 1, CAST((julianday('now') - 2440587.5) * 86400000000 AS INTEGER));
";

/// Migration v2: scan index for table-wide reads (leaderboards, outbox replay).
pub const MIGRATION_V2_SQL: &str = r"
CREATE INDEX IF NOT EXISTS idx_kv_items_table_updated
    ON kv_items(table_name, updated_at_us DESC);
";

/// Indexes the latest schema must provide.
pub const REQUIRED_INDEXES: &[&str] = &["idx_kv_items_table_updated"];
