//! Key-value storage abstraction shared by every component.
//!
//! The engine only needs a handful of primitives from its storage layer:
//! point reads, partition queries ordered by sort key, plain puts, a
//! conditional insert, and an atomic batch ([`KvStore::transact`]) used by the
//! outbox so a component record and its progress marker land together.
//!
//! Two backends implement [`KvStore`]:
//! - [`MemoryStore`] for tests and throwaway sessions
//! - [`crate::db::SqliteStore`] for durable local storage

mod memory;

pub use memory::MemoryStore;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::fmt;

// ---------------------------------------------------------------------------
// Tables and keys
// ---------------------------------------------------------------------------

/// Logical tables, one per owning component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Table {
    Solves,
    DailyActivity,
    Streaks,
    Profiles,
    PendingEffects,
}

impl Table {
    pub const ALL: [Self; 5] = [
        Self::Solves,
        Self::DailyActivity,
        Self::Streaks,
        Self::Profiles,
        Self::PendingEffects,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Solves => "solves",
            Self::DailyActivity => "daily_activity",
            Self::Streaks => "streaks",
            Self::Profiles => "profiles",
            Self::PendingEffects => "pending_effects",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Composite key: partition (always the user id here) plus an optional sort key.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ItemKey {
    pub partition: String,
    pub sort: String,
}

impl ItemKey {
    /// Key for tables with one record per partition.
    pub fn single(partition: impl Into<String>) -> Self {
        Self {
            partition: partition.into(),
            sort: String::new(),
        }
    }

    pub fn new(partition: impl Into<String>, sort: impl Into<String>) -> Self {
        Self {
            partition: partition.into(),
            sort: sort.into(),
        }
    }
}

impl fmt::Display for ItemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.sort.is_empty() {
            f.write_str(&self.partition)
        } else {
            write!(f, "{}/{}", self.partition, self.sort)
        }
    }
}

/// A stored document with its key.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub key: ItemKey,
    pub body: Value,
}

// ---------------------------------------------------------------------------
// Queries and writes
// ---------------------------------------------------------------------------

/// Restriction on the sort key within a partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SortCondition {
    Equals(String),
    BeginsWith(String),
    /// Inclusive on both ends.
    Between(String, String),
}

impl SortCondition {
    #[must_use]
    pub fn matches(&self, sort: &str) -> bool {
        match self {
            Self::Equals(value) => sort == value,
            Self::BeginsWith(prefix) => sort.starts_with(prefix.as_str()),
            Self::Between(low, high) => sort >= low.as_str() && sort <= high.as_str(),
        }
    }
}

/// Partition query: optional sort-key condition, direction and row cap.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pub condition: Option<SortCondition>,
    pub descending: bool,
    pub limit: Option<usize>,
}

impl Query {
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn newest_first(limit: usize) -> Self {
        Self {
            condition: None,
            descending: true,
            limit: Some(limit),
        }
    }

    #[must_use]
    pub fn with_condition(mut self, condition: SortCondition) -> Self {
        self.condition = Some(condition);
        self
    }
}

/// One element of an atomic batch.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOp {
    /// Unconditional upsert.
    Put {
        table: Table,
        key: ItemKey,
        body: Value,
    },
    /// Insert that fails the whole batch when the key already exists.
    Insert {
        table: Table,
        key: ItemKey,
        body: Value,
    },
    Delete {
        table: Table,
        key: ItemKey,
    },
}

impl WriteOp {
    /// Build a `Put` from any serializable record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Encode`] if the record cannot be serialized.
    pub fn put<T: Serialize>(table: Table, key: ItemKey, record: &T) -> Result<Self, StoreError> {
        Ok(Self::Put {
            table,
            body: encode(table, &key, record)?,
            key,
        })
    }

    /// Build a conditional `Insert` from any serializable record.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Encode`] if the record cannot be serialized.
    pub fn insert<T: Serialize>(
        table: Table,
        key: ItemKey,
        record: &T,
    ) -> Result<Self, StoreError> {
        Ok(Self::Insert {
            table,
            body: encode(table, &key, record)?,
            key,
        })
    }

    #[must_use]
    pub const fn delete(table: Table, key: ItemKey) -> Self {
        Self::Delete { table, key }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failures reported by a storage backend.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// The backend could not complete the call (I/O, SQL, connection).
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// A conditional insert found the key already present.
    #[error("conditional write failed: {table}/{key} already exists")]
    ConditionFailed { table: &'static str, key: String },

    /// A stored document did not decode into the expected record type.
    #[error("corrupt record {table}/{key}: {reason}")]
    Corrupt {
        table: &'static str,
        key: String,
        reason: String,
    },

    /// A record could not be serialized for writing.
    #[error("cannot encode record {table}/{key}: {reason}")]
    Encode {
        table: &'static str,
        key: String,
        reason: String,
    },

    #[error("storage lock poisoned")]
    Poisoned,
}

// ---------------------------------------------------------------------------
// Backend trait
// ---------------------------------------------------------------------------

/// Minimal key-value contract the engine runs on.
///
/// Reads may lag writes on eventually consistent backends; both bundled
/// backends are read-your-writes.
pub trait KvStore: Send + Sync {
    /// Fetch one document.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] when the backend fails.
    fn get(&self, table: Table, key: &ItemKey) -> Result<Option<Value>, StoreError>;

    /// Documents of one partition, ordered by sort key.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] when the backend fails.
    fn query(&self, table: Table, partition: &str, query: &Query)
    -> Result<Vec<Record>, StoreError>;

    /// Every document of a table, ordered by key, optionally capped.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] when the backend fails.
    fn scan(&self, table: Table, limit: Option<usize>) -> Result<Vec<Record>, StoreError>;

    /// Upsert one document.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] when the backend fails.
    fn put(&self, table: Table, key: &ItemKey, body: &Value) -> Result<(), StoreError>;

    /// Insert one document unless the key exists. Returns `true` when inserted.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] when the backend fails.
    fn insert_if_absent(&self, table: Table, key: &ItemKey, body: &Value)
    -> Result<bool, StoreError>;

    /// Remove one document; missing keys are not an error.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] when the backend fails.
    fn delete(&self, table: Table, key: &ItemKey) -> Result<(), StoreError>;

    /// Apply a batch atomically: either every op lands or none does.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::ConditionFailed`] if an `Insert` collides with an
    /// existing key, or [`StoreError::Unavailable`] when the backend fails.
    fn transact(&self, ops: &[WriteOp]) -> Result<(), StoreError>;
}

// ---------------------------------------------------------------------------
// Typed helpers
// ---------------------------------------------------------------------------

/// Serialize a record into a document.
///
/// # Errors
///
/// Returns [`StoreError::Encode`] if serialization fails.
pub fn encode<T: Serialize>(table: Table, key: &ItemKey, record: &T) -> Result<Value, StoreError> {
    serde_json::to_value(record).map_err(|err| StoreError::Encode {
        table: table.as_str(),
        key: key.to_string(),
        reason: err.to_string(),
    })
}

/// Deserialize a document into a record.
///
/// # Errors
///
/// Returns [`StoreError::Corrupt`] if the document does not match `T`.
pub fn decode<T: DeserializeOwned>(
    table: Table,
    key: &ItemKey,
    body: Value,
) -> Result<T, StoreError> {
    serde_json::from_value(body).map_err(|err| StoreError::Corrupt {
        table: table.as_str(),
        key: key.to_string(),
        reason: err.to_string(),
    })
}

/// Typed point read.
///
/// # Errors
///
/// Propagates backend failures and decode errors.
pub fn load<T: DeserializeOwned>(
    store: &dyn KvStore,
    table: Table,
    key: &ItemKey,
) -> Result<Option<T>, StoreError> {
    store
        .get(table, key)?
        .map(|body| decode(table, key, body))
        .transpose()
}

/// Typed partition query.
///
/// # Errors
///
/// Propagates backend failures and decode errors.
pub fn load_partition<T: DeserializeOwned>(
    store: &dyn KvStore,
    table: Table,
    partition: &str,
    query: &Query,
) -> Result<Vec<T>, StoreError> {
    store
        .query(table, partition, query)?
        .into_iter()
        .map(|record| decode(table, &record.key, record.body))
        .collect()
}

/// Typed table scan.
///
/// # Errors
///
/// Propagates backend failures and decode errors.
pub fn load_all<T: DeserializeOwned>(
    store: &dyn KvStore,
    table: Table,
    limit: Option<usize>,
) -> Result<Vec<T>, StoreError> {
    store
        .scan(table, limit)?
        .into_iter()
        .map(|record| decode(table, &record.key, record.body))
        .collect()
}

/// Typed upsert.
///
/// # Errors
///
/// Propagates encode errors and backend failures.
pub fn save<T: Serialize>(
    store: &dyn KvStore,
    table: Table,
    key: &ItemKey,
    record: &T,
) -> Result<(), StoreError> {
    let body = encode(table, key, record)?;
    store.put(table, key, &body)
}
