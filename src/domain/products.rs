//! Product invariants: field validation and the like-membership arithmetic.

use std::collections::BTreeSet;

use time::OffsetDateTime;

use crate::domain::entities::{ProductFields, ProductRecord};
use crate::domain::error::DomainError;
use crate::domain::types::{UserId, UserRef};

/// A single-user change to a product's `liked_by` set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeChange {
    Add(UserId),
    Remove(UserId),
}

impl LikeChange {
    pub fn user_id(self) -> UserId {
        match self {
            LikeChange::Add(user_id) | LikeChange::Remove(user_id) => user_id,
        }
    }
}

impl ProductFields {
    /// Rejects values no store should persist.
    ///
    /// Request validation happens upstream; this only guards the numeric
    /// invariants the catalog relies on.
    pub fn validate(&self) -> Result<(), DomainError> {
        if !self.price.is_finite() {
            return Err(DomainError::validation("price must be a finite number"));
        }
        if self.price < 0.0 {
            return Err(DomainError::validation("price must not be negative"));
        }
        Ok(())
    }
}

impl ProductRecord {
    /// Returns true when `user_id` is in the loaded `liked_by` set.
    ///
    /// A record read without the projection never reports a like.
    pub fn has_liked(&self, user_id: UserId) -> bool {
        self.liked_by
            .as_ref()
            .is_some_and(|liked_by| liked_by.contains(&UserRef::new(user_id)))
    }

    /// Applies `change` in place and recounts `likes_count` from the set.
    ///
    /// Returns whether the membership changed. A drifted count is healed by
    /// any applied change; an unapplied change leaves the record untouched.
    pub fn apply_like_change(&mut self, change: LikeChange, now: OffsetDateTime) -> bool {
        let liked_by = self.liked_by.get_or_insert_with(BTreeSet::new);
        let applied = match change {
            LikeChange::Add(user_id) => liked_by.insert(UserRef::new(user_id)),
            LikeChange::Remove(user_id) => liked_by.remove(&UserRef::new(user_id)),
        };

        if applied {
            self.likes_count = u32::try_from(liked_by.len()).unwrap_or(u32::MAX);
            self.updated_at = now;
        }
        applied
    }

    /// Checks the `likes_count == |liked_by|` invariant on a fully loaded record.
    pub fn ensure_likes_consistent(&self) -> Result<(), DomainError> {
        let Some(liked_by) = self.liked_by.as_ref() else {
            return Ok(());
        };
        if usize::try_from(self.likes_count).ok() != Some(liked_by.len()) {
            return Err(DomainError::invariant(format!(
                "product {} has likes_count {} but {} likers",
                self.id,
                self.likes_count,
                liked_by.len()
            )));
        }
        Ok(())
    }
}
