//! Profile book: lazily enrolled [`UserProfile`] records.
//!
//! The progress engine only ever increments XP and solve counts and mirrors
//! streak values here. Reads of an unknown user do not create a profile;
//! writes enroll one with zeroed counters first.

use tracing::{debug, info};

use crate::clock::Clock;
use crate::error::{Result, TrackerError};
use crate::model::UserProfile;
use crate::model::solve::require_id;
use crate::store::{self, KvStore, Table, WriteOp};

const MAX_DISPLAY_NAME_CHARS: usize = 64;

pub struct ProfileBook<'s> {
    store: &'s dyn KvStore,
    clock: &'s dyn Clock,
}

impl<'s> ProfileBook<'s> {
    #[must_use]
    pub const fn new(store: &'s dyn KvStore, clock: &'s dyn Clock) -> Self {
        Self { store, clock }
    }

    /// # Errors
    ///
    /// Propagates storage and decode failures.
    pub fn get(&self, user_id: &str) -> Result<Option<UserProfile>> {
        Ok(store::load(
            self.store,
            Table::Profiles,
            &UserProfile::key_for(user_id),
        )?)
    }

    /// # Errors
    ///
    /// [`TrackerError::UserNotFound`] if no profile exists.
    pub fn require(&self, user_id: &str) -> Result<UserProfile> {
        self.get(user_id)?
            .ok_or_else(|| TrackerError::UserNotFound(user_id.to_string()))
    }

    /// Existing profile, or a freshly enrolled one.
    ///
    /// # Errors
    ///
    /// Validation, storage and encode failures.
    pub fn get_or_enroll(&self, user_id: &str) -> Result<UserProfile> {
        require_id("user_id", user_id)?;
        if let Some(profile) = self.get(user_id)? {
            return Ok(profile);
        }

        let profile = UserProfile::new(user_id, self.clock.now());
        let key = profile.key();
        let body = store::encode(Table::Profiles, &key, &profile)?;
        if self.store.insert_if_absent(Table::Profiles, &key, &body)? {
            info!(user_id, "profile enrolled");
            return Ok(profile);
        }
        // Lost a race with another enrollment; theirs wins.
        self.require(user_id)
    }

    /// Profile after crediting one solve worth `xp`, and the write for it.
    ///
    /// # Errors
    ///
    /// Validation, storage and encode failures.
    pub fn plan_credit(&self, user_id: &str, xp: u64) -> Result<(UserProfile, WriteOp)> {
        let mut profile = self.get_or_enroll(user_id)?;
        profile.xp = profile.xp.saturating_add(xp);
        profile.total_problems_solved = profile.total_problems_solved.saturating_add(1);
        profile.updated_at = self.clock.now();
        let op = WriteOp::put(Table::Profiles, profile.key(), &profile)?;
        Ok((profile, op))
    }

    /// Add `xp` and one solved problem to the user's profile.
    ///
    /// # Errors
    ///
    /// Validation, storage and encode failures.
    pub fn credit_solve(&self, user_id: &str, xp: u64) -> Result<UserProfile> {
        let (profile, op) = self.plan_credit(user_id, xp)?;
        self.store.transact(&[op])?;
        debug!(user_id, xp, total_xp = profile.xp, "profile credited");
        Ok(profile)
    }

    /// Profile after copying streak counters onto it, and the write for it.
    ///
    /// # Errors
    ///
    /// Validation, storage and encode failures.
    pub fn plan_mirror(
        &self,
        user_id: &str,
        current_streak: u32,
        best_streak: u32,
    ) -> Result<(UserProfile, WriteOp)> {
        let mut profile = self.get_or_enroll(user_id)?;
        profile.current_streak = current_streak;
        profile.best_streak = best_streak;
        profile.updated_at = self.clock.now();
        let op = WriteOp::put(Table::Profiles, profile.key(), &profile)?;
        Ok((profile, op))
    }

    /// # Errors
    ///
    /// Validation, storage and encode failures.
    pub fn mirror_streak(
        &self,
        user_id: &str,
        current_streak: u32,
        best_streak: u32,
    ) -> Result<UserProfile> {
        let (profile, op) = self.plan_mirror(user_id, current_streak, best_streak)?;
        self.store.transact(&[op])?;
        Ok(profile)
    }

    /// Change the display name.
    ///
    /// # Errors
    ///
    /// [`TrackerError::Validation`] for a blank or overlong name, plus storage
    /// failures.
    pub fn rename(&self, user_id: &str, display_name: &str) -> Result<UserProfile> {
        let name = display_name.trim();
        if name.is_empty() {
            return Err(TrackerError::validation("display_name", "must not be empty"));
        }
        if name.chars().count() > MAX_DISPLAY_NAME_CHARS {
            return Err(TrackerError::validation(
                "display_name",
                format!("must be at most {MAX_DISPLAY_NAME_CHARS} characters"),
            ));
        }

        let mut profile = self.get_or_enroll(user_id)?;
        profile.display_name = name.to_string();
        profile.updated_at = self.clock.now();
        store::save(self.store, Table::Profiles, &profile.key(), &profile)?;
        info!(user_id, display_name = name, "profile renamed");
        Ok(profile)
    }

    /// Profiles in user-id order.
    ///
    /// # Errors
    ///
    /// Propagates storage and decode failures.
    pub fn list(&self, limit: Option<usize>) -> Result<Vec<UserProfile>> {
        Ok(store::load_all(self.store, Table::Profiles, limit)?)
    }
}
