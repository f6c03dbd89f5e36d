//! [`KvStore`] implementation over the `kv_items` table.

use std::fmt::Write as _;
use std::sync::{Mutex, MutexGuard};

use rusqlite::{Connection, OptionalExtension, params, params_from_iter};
use serde_json::Value;

use crate::store::{ItemKey, KvStore, Query, Record, SortCondition, StoreError, Table, WriteOp};

const UPSERT_SQL: &str = "INSERT INTO kv_items \
     (table_name, partition_key, sort_key, body, updated_at_us) \
     VALUES (?1, ?2, ?3, ?4, ?5) \
     ON CONFLICT (table_name, partition_key, sort_key) \
     DO UPDATE SET body = excluded.body, updated_at_us = excluded.updated_at_us";

const INSERT_SQL: &str = "INSERT INTO kv_items \
     (table_name, partition_key, sort_key, body, updated_at_us) \
     VALUES (?1, ?2, ?3, ?4, ?5) \
     ON CONFLICT (table_name, partition_key, sort_key) DO NOTHING";

const DELETE_SQL: &str =
    "DELETE FROM kv_items WHERE table_name = ?1 AND partition_key = ?2 AND sort_key = ?3";

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Unavailable(err.to_string())
    }
}

/// Durable [`KvStore`] on a single SQLite connection.
///
/// Conditional inserts use `ON CONFLICT DO NOTHING` and inspect the affected
/// row count, so the uniqueness check and the write are one statement.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub(crate) const fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    /// Run a closure against the underlying connection.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Poisoned`] if the lock is poisoned, or the
    /// closure's SQLite error as [`StoreError::Unavailable`].
    pub fn with_connection<T>(
        &self,
        f: impl FnOnce(&Connection) -> rusqlite::Result<T>,
    ) -> Result<T, StoreError> {
        let conn = self.lock()?;
        Ok(f(&conn)?)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }
}

fn now_us() -> i64 {
    chrono::Utc::now().timestamp_micros()
}

fn parse_body(table: Table, key: &ItemKey, text: &str) -> Result<Value, StoreError> {
    serde_json::from_str(text).map_err(|err| StoreError::Corrupt {
        table: table.as_str(),
        key: key.to_string(),
        reason: err.to_string(),
    })
}

fn write_row(
    conn: &Connection,
    sql: &str,
    table: Table,
    key: &ItemKey,
    body: &Value,
) -> Result<usize, StoreError> {
    Ok(conn.execute(
        sql,
        params![
            table.as_str(),
            key.partition,
            key.sort,
            body.to_string(),
            now_us()
        ],
    )?)
}

impl KvStore for SqliteStore {
    fn get(&self, table: Table, key: &ItemKey) -> Result<Option<Value>, StoreError> {
        let conn = self.lock()?;
        let text: Option<String> = conn
            .query_row(
                "SELECT body FROM kv_items \
                 WHERE table_name = ?1 AND partition_key = ?2 AND sort_key = ?3",
                params![table.as_str(), key.partition, key.sort],
                |row| row.get(0),
            )
            .optional()?;
        text.map(|text| parse_body(table, key, &text)).transpose()
    }

    fn query(
        &self,
        table: Table,
        partition: &str,
        query: &Query,
    ) -> Result<Vec<Record>, StoreError> {
        let mut sql = String::from(
            "SELECT sort_key, body FROM kv_items WHERE table_name = ?1 AND partition_key = ?2",
        );
        let mut args: Vec<String> = vec![table.as_str().to_string(), partition.to_string()];

        match &query.condition {
            None => {}
            Some(SortCondition::Equals(value)) => {
                sql.push_str(" AND sort_key = ?3");
                args.push(value.clone());
            }
            Some(SortCondition::BeginsWith(prefix)) => {
                sql.push_str(" AND substr(sort_key, 1, length(?3)) = ?3");
                args.push(prefix.clone());
            }
            Some(SortCondition::Between(low, high)) => {
                sql.push_str(" AND sort_key BETWEEN ?3 AND ?4");
                args.push(low.clone());
                args.push(high.clone());
            }
        }

        sql.push_str(if query.descending {
            " ORDER BY sort_key DESC"
        } else {
            " ORDER BY sort_key ASC"
        });
        if let Some(limit) = query.limit {
            let _ = write!(sql, " LIMIT {limit}");
        }

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(args.iter()), |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter()
            .map(|(sort, text)| {
                let key = ItemKey::new(partition, sort);
                let body = parse_body(table, &key, &text)?;
                Ok(Record { key, body })
            })
            .collect()
    }

    fn scan(&self, table: Table, limit: Option<usize>) -> Result<Vec<Record>, StoreError> {
        let mut sql = String::from(
            "SELECT partition_key, sort_key, body FROM kv_items \
             WHERE table_name = ?1 ORDER BY partition_key, sort_key",
        );
        if let Some(limit) = limit {
            let _ = write!(sql, " LIMIT {limit}");
        }

        let conn = self.lock()?;
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map([table.as_str()], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        rows.into_iter()
            .map(|(partition, sort, text)| {
                let key = ItemKey::new(partition, sort);
                let body = parse_body(table, &key, &text)?;
                Ok(Record { key, body })
            })
            .collect()
    }

    fn put(&self, table: Table, key: &ItemKey, body: &Value) -> Result<(), StoreError> {
        let conn = self.lock()?;
        write_row(&conn, UPSERT_SQL, table, key, body)?;
        Ok(())
    }

    fn insert_if_absent(
        &self,
        table: Table,
        key: &ItemKey,
        body: &Value,
    ) -> Result<bool, StoreError> {
        let conn = self.lock()?;
        Ok(write_row(&conn, INSERT_SQL, table, key, body)? == 1)
    }

    fn delete(&self, table: Table, key: &ItemKey) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(DELETE_SQL, params![table.as_str(), key.partition, key.sort])?;
        Ok(())
    }

    fn transact(&self, ops: &[WriteOp]) -> Result<(), StoreError> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        for op in ops {
            match op {
                WriteOp::Put { table, key, body } => {
                    write_row(&tx, UPSERT_SQL, *table, key, body)?;
                }
                WriteOp::Insert { table, key, body } => {
                    if write_row(&tx, INSERT_SQL, *table, key, body)? == 0 {
                        // Dropping `tx` rolls back everything staged so far.
                        return Err(StoreError::ConditionFailed {
                            table: table.as_str(),
                            key: key.to_string(),
                        });
                    }
                }
                WriteOp::Delete { table, key } => {
                    tx.execute(DELETE_SQL, params![table.as_str(), key.partition, key.sort])?;
                }
            }
        }

        tx.commit()?;
        Ok(())
    }
}
