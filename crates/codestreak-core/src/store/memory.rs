use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use serde_json::Value;

use super::{ItemKey, KvStore, Query, Record, StoreError, Table, WriteOp};

type Items = BTreeMap<(Table, ItemKey), Value>;

/// In-process [`KvStore`] backed by a single ordered map.
///
/// Every call holds one lock for its whole duration, so `transact` batches are
/// atomic with respect to other callers.
#[derive(Debug, Default)]
pub struct MemoryStore {
    items: Mutex<Items>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of documents held in `table`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Poisoned`] if a writer panicked mid-call.
    pub fn len(&self, table: Table) -> Result<usize, StoreError> {
        Ok(self.lock()?.keys().filter(|(t, _)| *t == table).count())
    }

    fn lock(&self) -> Result<MutexGuard<'_, Items>, StoreError> {
        self.items.lock().map_err(|_| StoreError::Poisoned)
    }
}

fn conflict(table: Table, key: &ItemKey) -> StoreError {
    StoreError::ConditionFailed {
        table: table.as_str(),
        key: key.to_string(),
    }
}

impl KvStore for MemoryStore {
    fn get(&self, table: Table, key: &ItemKey) -> Result<Option<Value>, StoreError> {
        Ok(self.lock()?.get(&(table, key.clone())).cloned())
    }

    fn query(
        &self,
        table: Table,
        partition: &str,
        query: &Query,
    ) -> Result<Vec<Record>, StoreError> {
        let items = self.lock()?;
        let matching = items.iter().filter(|((t, key), _)| {
            *t == table
                && key.partition == partition
                && query
                    .condition
                    .as_ref()
                    .is_none_or(|condition| condition.matches(&key.sort))
        });

        let to_record = |((_, key), body): (&(Table, ItemKey), &Value)| Record {
            key: key.clone(),
            body: body.clone(),
        };
        let limit = query.limit.unwrap_or(usize::MAX);
        let records = if query.descending {
            matching.rev().take(limit).map(to_record).collect()
        } else {
            matching.take(limit).map(to_record).collect()
        };
        Ok(records)
    }

    fn scan(&self, table: Table, limit: Option<usize>) -> Result<Vec<Record>, StoreError> {
        Ok(self
            .lock()?
            .iter()
            .filter(|((t, _), _)| *t == table)
            .take(limit.unwrap_or(usize::MAX))
            .map(|((_, key), body)| Record {
                key: key.clone(),
                body: body.clone(),
            })
            .collect())
    }

    fn put(&self, table: Table, key: &ItemKey, body: &Value) -> Result<(), StoreError> {
        self.lock()?.insert((table, key.clone()), body.clone());
        Ok(())
    }

    fn insert_if_absent(
        &self,
        table: Table,
        key: &ItemKey,
        body: &Value,
    ) -> Result<bool, StoreError> {
        let mut items = self.lock()?;
        let slot = (table, key.clone());
        if items.contains_key(&slot) {
            return Ok(false);
        }
        items.insert(slot, body.clone());
        Ok(true)
    }

    fn delete(&self, table: Table, key: &ItemKey) -> Result<(), StoreError> {
        self.lock()?.remove(&(table, key.clone()));
        Ok(())
    }

    fn transact(&self, ops: &[WriteOp]) -> Result<(), StoreError> {
        let mut items = self.lock()?;

        // Validate every condition before touching the map, including inserts
        // that collide with an earlier op of the same batch.
        let mut staged: Vec<(Table, &ItemKey)> = Vec::new();
        for op in ops {
            if let WriteOp::Insert { table, key, .. } = op {
                let exists = items.contains_key(&(*table, key.clone()));
                if exists || staged.contains(&(*table, key)) {
                    return Err(conflict(*table, key));
                }
                staged.push((*table, key));
            }
        }

        for op in ops {
            match op {
                WriteOp::Put { table, key, body } | WriteOp::Insert { table, key, body } => {
                    items.insert((*table, key.clone()), body.clone());
                }
                WriteOp::Delete { table, key } => {
                    items.remove(&(*table, key.clone()));
                }
            }
        }
        Ok(())
    }
}
