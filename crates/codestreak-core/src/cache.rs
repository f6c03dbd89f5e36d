//! Day-keyed cache for the daily challenge list.
//!
//! The list is shared by every user and only changes when the calendar day
//! does. Callers own a [`DailyCache`] and pass it where it is needed; there is
//! no process-wide instance.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::NaiveDate;
use tracing::debug;

#[derive(Debug)]
pub struct DailyCache<T> {
    slot: Mutex<Option<(NaiveDate, Arc<Vec<T>>)>>,
}

impl<T> Default for DailyCache<T> {
    fn default() -> Self {
        Self {
            slot: Mutex::new(None),
        }
    }
}

impl<T> DailyCache<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached list for `today`, refreshed via `load` when the cached day is
    /// stale or the cached list is empty.
    ///
    /// `load` runs under the cache lock, so concurrent callers on a new day
    /// trigger one refresh.
    ///
    /// # Errors
    ///
    /// Returns `load`'s error; the previous entry is kept in that case.
    pub fn get_or_refresh<E>(
        &self,
        today: NaiveDate,
        load: impl FnOnce() -> Result<Vec<T>, E>,
    ) -> Result<Arc<Vec<T>>, E> {
        let mut slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some((day, items)) = slot.as_ref()
            && *day == today
            && !items.is_empty()
        {
            return Ok(Arc::clone(items));
        }

        let items = Arc::new(load()?);
        debug!(%today, count = items.len(), "daily cache refreshed");
        *slot = Some((today, Arc::clone(&items)));
        Ok(items)
    }

    /// Cached list if it belongs to `today`.
    pub fn peek(&self, today: NaiveDate) -> Option<Arc<Vec<T>>> {
        let slot = self.slot.lock().unwrap_or_else(PoisonError::into_inner);
        slot.as_ref()
            .filter(|(day, _)| *day == today)
            .map(|(_, items)| Arc::clone(items))
    }

    pub fn invalidate(&self) {
        *self.slot.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}
