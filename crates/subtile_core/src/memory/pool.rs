//! # Slot Pool
//!
//! Fixed-capacity slot allocator addressed by signed 16-bit handles.

use crate::error::{SubtileError, SubtileResult};

/// Handle of the sentinel slot every pool is born with.
pub const SENTINEL: i16 = 0;

/// A fixed-capacity pool of `T` slots with free-list recycling.
///
/// Slot 0 is the sentinel: it is populated at construction and can never be
/// released. Released slots go onto a stack and are handed out again before
/// any never-used slot, most recently released first.
///
/// Handles carry no generation. A handle kept past its release aliases
/// whatever reacquires the slot, so callers must drop handles on release.
///
/// # Thread Safety
///
/// This pool is NOT thread-safe. One world, one thread.
///
/// # Example
///
/// ```rust,ignore
/// let mut pool: Pool<u32> = Pool::new("numbers", 16, 0);
///
/// // Acquire - O(1), no heap allocation
/// let (handle, slot) = pool.acquire()?;
/// *slot = 42;
///
/// // Release - O(1), no heap deallocation
/// pool.release(handle)?;
/// ```
#[derive(Clone, Debug)]
pub struct Pool<T> {
    /// Populated slots; `len()` is the high-water mark.
    storage: Vec<T>,
    /// Stack of released handles.
    free_list: Vec<i16>,
    /// Whether each populated slot currently sits on the free list.
    released: Vec<bool>,
    /// Total capacity, sentinel included.
    capacity: usize,
    /// Name used in capacity errors.
    name: &'static str,
}

impl<T: Default> Pool<T> {
    /// Creates a pool whose sentinel slot holds `sentinel`.
    ///
    /// All memory is reserved upfront.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero or larger than a signed 16-bit handle can
    /// address.
    #[must_use]
    pub fn new(name: &'static str, capacity: usize, sentinel: T) -> Self {
        assert!(capacity > 0, "Capacity must be greater than zero");
        assert!(
            capacity <= i16::MAX as usize + 1,
            "Capacity cannot exceed the 16-bit handle space"
        );

        let mut storage = Vec::with_capacity(capacity);
        storage.push(sentinel);

        let mut released = Vec::with_capacity(capacity);
        released.push(false);

        Self {
            storage,
            free_list: Vec::with_capacity(capacity),
            released,
            capacity,
            name,
        }
    }

    /// Returns the total capacity, sentinel included.
    #[inline]
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Returns the high-water mark: how many slots have ever been populated.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.storage.len()
    }

    /// Returns true if only the sentinel has ever been populated.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.storage.len() == 1
    }

    /// Returns the number of slots currently handed out, sentinel included.
    #[inline]
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.storage.len() - self.free_list.len()
    }

    /// Returns true if the next [`acquire`](Self::acquire) will succeed.
    #[inline]
    #[must_use]
    pub fn can_acquire(&self) -> bool {
        !self.free_list.is_empty() || self.storage.len() < self.capacity
    }

    /// Hands out a slot.
    ///
    /// A recycled slot still holds its previous occupant; the caller is
    /// expected to overwrite it.
    ///
    /// # Errors
    ///
    /// Returns [`SubtileError::CapacityExceeded`] if no slot is free.
    pub fn acquire(&mut self) -> SubtileResult<(i16, &mut T)> {
        let handle = if let Some(handle) = self.free_list.pop() {
            self.released[handle as usize] = false;
            handle
        } else if self.storage.len() < self.capacity {
            // Bounded by the constructor's capacity check.
            #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
            let handle = self.storage.len() as i16;
            self.storage.push(T::default());
            self.released.push(false);
            handle
        } else {
            return Err(SubtileError::CapacityExceeded {
                what: self.name,
                capacity: self.capacity,
            });
        };

        Ok((handle, &mut self.storage[handle as usize]))
    }

    /// Hands out a slot and writes its handle into `handle`.
    ///
    /// # Errors
    ///
    /// Returns [`SubtileError::InvalidHandle`] if `handle` is not zero, so a
    /// live handle is never silently overwritten, or
    /// [`SubtileError::CapacityExceeded`] if no slot is free.
    pub fn acquire_into(&mut self, handle: &mut i16) -> SubtileResult<&mut T> {
        if *handle != SENTINEL {
            return Err(SubtileError::InvalidHandle(*handle));
        }
        let (acquired, slot) = self.acquire()?;
        *handle = acquired;
        Ok(slot)
    }

    /// Returns a slot to the free list.
    ///
    /// # Errors
    ///
    /// Returns [`SubtileError::InvalidHandle`] for the sentinel, a negative
    /// handle, a handle beyond the high-water mark, or a slot that is already
    /// free.
    pub fn release(&mut self, handle: i16) -> SubtileResult<()> {
        if handle <= SENTINEL || handle as usize >= self.storage.len() {
            return Err(SubtileError::InvalidHandle(handle));
        }

        let index = handle as usize;
        if self.released[index] {
            return Err(SubtileError::InvalidHandle(handle));
        }

        self.released[index] = true;
        self.free_list.push(handle);
        Ok(())
    }

    /// Returns true if `handle` addresses a slot that is currently handed out.
    #[inline]
    #[must_use]
    pub fn is_live(&self, handle: i16) -> bool {
        handle >= 0 && self.released.get(handle as usize).is_some_and(|released| !released)
    }

    /// Gets the slot at `handle`.
    ///
    /// Released slots below the high-water mark are still readable; their
    /// contents are whatever the last occupant left behind.
    ///
    /// # Errors
    ///
    /// Returns [`SubtileError::OutOfRange`] for a negative handle or one at or
    /// beyond the high-water mark.
    #[inline]
    pub fn at(&self, handle: i16) -> SubtileResult<&T> {
        let index = self.index(handle)?;
        Ok(&self.storage[index])
    }

    /// Gets the slot at `handle` mutably.
    ///
    /// # Errors
    ///
    /// Same as [`at`](Self::at).
    #[inline]
    pub fn at_mut(&mut self, handle: i16) -> SubtileResult<&mut T> {
        let index = self.index(handle)?;
        Ok(&mut self.storage[index])
    }

    fn index(&self, handle: i16) -> SubtileResult<usize> {
        if handle < 0 || handle as usize >= self.storage.len() {
            return Err(SubtileError::OutOfRange {
                handle,
                len: self.storage.len(),
            });
        }
        Ok(handle as usize)
    }
}
