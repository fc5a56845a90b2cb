//! # Behavior Registry
//!
//! Behaviors follow the material handle contract (pooled, slot 0 pre-filled,
//! handle in, record out) without the instancing tier. Handles are never
//! negative.

use subtile_core::{Pool, SubtileError, SubtileResult, SENTINEL};

/// What a tile does over time. No fields yet.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Behavior {}

/// Typed behavior handle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum BehaviorHandle {
    /// No explicit behavior: slot 0.
    #[default]
    Default,
    /// A shared row.
    Canonical(u16),
}

impl BehaviorHandle {
    /// Decodes the wire form; negative values are not behavior handles.
    #[must_use]
    pub const fn from_raw(raw: i16) -> Option<Self> {
        match raw {
            0 => Some(Self::Default),
            r if r > 0 => Some(Self::Canonical(r.unsigned_abs())),
            _ => None,
        }
    }

    /// Returns true unless the handle is `Canonical` with slot 0 or a slot
    /// past `i16::MAX`.
    #[inline]
    #[must_use]
    pub const fn is_valid(self) -> bool {
        match self {
            Self::Default => true,
            Self::Canonical(slot) => slot != 0 && slot <= i16::MAX.unsigned_abs(),
        }
    }

    /// Encodes to the wire form.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub const fn to_raw(self) -> i16 {
        match self {
            Self::Default => SENTINEL,
            Self::Canonical(slot) => slot as i16,
        }
    }
}

/// Pool-backed behavior storage.
#[derive(Clone, Debug)]
pub struct BehaviorRegistry {
    pool: Pool<Behavior>,
    /// Live slots in registration order; slot 0 first.
    active: Vec<i16>,
}

impl BehaviorRegistry {
    /// Creates a registry whose slot 0 holds the default behavior.
    ///
    /// # Panics
    ///
    /// Panics under the same conditions as [`Pool::new`].
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let mut active = Vec::with_capacity(capacity);
        active.push(SENTINEL);

        Self {
            pool: Pool::new("behaviors", capacity, Behavior::default()),
            active,
        }
    }

    /// Returns the pool capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.pool.capacity()
    }

    /// Returns the number of rows in use.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.pool.live_count()
    }

    /// Returns true if `handle` addresses a row in use.
    #[must_use]
    pub fn is_live(&self, handle: BehaviorHandle) -> bool {
        handle.is_valid() && self.pool.is_live(handle.to_raw())
    }

    /// Looks up a behavior by handle.
    ///
    /// # Errors
    ///
    /// Returns [`SubtileError::OutOfRange`] if the slot was never populated.
    #[inline]
    pub fn resolve(&self, handle: BehaviorHandle) -> SubtileResult<&Behavior> {
        self.pool.at(handle.to_raw())
    }

    /// Looks up a behavior by its wire handle.
    ///
    /// # Errors
    ///
    /// Returns [`SubtileError::OutOfRange`] for negative or unpopulated
    /// handles.
    #[inline]
    pub fn resolve_raw(&self, raw: i16) -> SubtileResult<&Behavior> {
        self.pool.at(raw)
    }

    /// Finds a live row equal to `behavior`.
    #[must_use]
    pub fn find(&self, behavior: &Behavior) -> Option<BehaviorHandle> {
        self.active.iter().copied().find_map(|slot| {
            let stored = self.pool.at(slot).ok()?;
            if stored == behavior {
                BehaviorHandle::from_raw(slot)
            } else {
                None
            }
        })
    }

    /// Checks, without changing anything, that
    /// [`place_or_reuse`](Self::place_or_reuse) would succeed.
    ///
    /// # Errors
    ///
    /// Returns [`SubtileError::InvalidHandle`] if `wanted` is explicit but
    /// not live, or [`SubtileError::CapacityExceeded`] if a new row is
    /// needed and the pool is full.
    pub fn check_place(&self, behavior: &Behavior, wanted: BehaviorHandle) -> SubtileResult<()> {
        match wanted {
            BehaviorHandle::Default => {
                if self.find(behavior).is_none() && !self.pool.can_acquire() {
                    return Err(SubtileError::CapacityExceeded {
                        what: "behaviors",
                        capacity: self.pool.capacity(),
                    });
                }
                Ok(())
            }
            explicit if self.is_live(explicit) => Ok(()),
            explicit => Err(SubtileError::InvalidHandle(explicit.to_raw())),
        }
    }

    /// Resolves the behavior a placement should use: the explicit handle,
    /// else an equal live row, else a new row. The flag is true when a row
    /// was created.
    ///
    /// # Errors
    ///
    /// Same as [`check_place`](Self::check_place).
    pub fn place_or_reuse(
        &mut self,
        behavior: Behavior,
        wanted: BehaviorHandle,
    ) -> SubtileResult<(BehaviorHandle, bool)> {
        self.check_place(&behavior, wanted)?;

        if wanted != BehaviorHandle::Default {
            return Ok((wanted, false));
        }
        if let Some(existing) = self.find(&behavior) {
            return Ok((existing, false));
        }
        Ok((self.create(behavior)?, true))
    }

    /// Adds a new row.
    ///
    /// # Errors
    ///
    /// Returns [`SubtileError::CapacityExceeded`] if the pool is full.
    pub fn create(&mut self, behavior: Behavior) -> SubtileResult<BehaviorHandle> {
        let (slot, stored) = self.pool.acquire()?;
        *stored = behavior;
        self.active.push(slot);
        Ok(BehaviorHandle::Canonical(slot.unsigned_abs()))
    }

    /// Releases a row.
    ///
    /// # Errors
    ///
    /// Returns [`SubtileError::InvalidHandle`] for the default behavior or a
    /// row that is not live.
    pub fn release(&mut self, handle: BehaviorHandle) -> SubtileResult<()> {
        if !handle.is_valid() {
            return Err(SubtileError::InvalidHandle(handle.to_raw()));
        }
        self.pool.release(handle.to_raw())?;
        self.active.retain(|&slot| slot != handle.to_raw());
        Ok(())
    }

    /// Iterates live rows in registration order, default first.
    pub fn active(&self) -> impl Iterator<Item = (BehaviorHandle, &Behavior)> + '_ {
        self.active.iter().filter_map(|&slot| {
            let handle = BehaviorHandle::from_raw(slot)?;
            self.pool.at(slot).ok().map(|behavior| (handle, behavior))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_behavior_reused() {
        let mut registry = BehaviorRegistry::new(8);
        let (handle, created) = registry
            .place_or_reuse(Behavior::default(), BehaviorHandle::Default)
            .unwrap();
        assert_eq!(handle, BehaviorHandle::Default);
        assert!(!created);
        assert_eq!(registry.live_count(), 1);
    }

    #[test]
    fn test_behavior_handles() {
        assert_eq!(BehaviorHandle::from_raw(0), Some(BehaviorHandle::Default));
        assert_eq!(BehaviorHandle::from_raw(4), Some(BehaviorHandle::Canonical(4)));
        assert_eq!(BehaviorHandle::from_raw(-4), None);
        assert_eq!(BehaviorHandle::Canonical(4).to_raw(), 4);
    }

    #[test]
    fn test_create_resolve_release() {
        let mut registry = BehaviorRegistry::new(8);
        let handle = registry.create(Behavior::default()).unwrap();
        assert_eq!(handle, BehaviorHandle::Canonical(1));
        assert!(registry.resolve(handle).is_ok());
        assert_eq!(registry.active().count(), 2);

        registry.release(handle).unwrap();
        assert!(!registry.is_live(handle));
        assert_eq!(registry.active().count(), 1);
        assert_eq!(registry.release(BehaviorHandle::Default), Err(SubtileError::InvalidHandle(0)));
    }

    #[test]
    fn test_explicit_handle_must_be_live() {
        let registry = BehaviorRegistry::new(8);
        assert_eq!(
            registry.check_place(&Behavior::default(), BehaviorHandle::Canonical(3)),
            Err(SubtileError::InvalidHandle(3))
        );
        assert_eq!(registry.resolve_raw(-1), Err(SubtileError::OutOfRange { handle: -1, len: 1 }));
    }

    #[test]
    fn test_zero_slot_is_not_canonical() {
        let mut registry = BehaviorRegistry::new(8);
        assert!(!BehaviorHandle::Canonical(0).is_valid());
        assert!(!registry.is_live(BehaviorHandle::Canonical(0)));
        assert!(!registry.is_live(BehaviorHandle::Canonical(40_000)));
        assert_eq!(
            registry.check_place(&Behavior::default(), BehaviorHandle::Canonical(0)),
            Err(SubtileError::InvalidHandle(0))
        );
        assert_eq!(registry.release(BehaviorHandle::Canonical(0)), Err(SubtileError::InvalidHandle(0)));
        assert_eq!(registry.live_count(), 1);
    }
}
