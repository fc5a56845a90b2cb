//! # Island Index
//!
//! The world is split into square chunks ("islands") of `size` world units
//! per edge, one set per altitude. Each island owns a fixed array of tiles
//! and a lifetime counter that any access resets.
//!
//! ## Coordinates
//!
//! Chunk origins use floor division, so chunk boundaries stay contiguous
//! across the origin:
//!
//! ```text
//! size 4:   ... [-8,-5] [-4,-1] [0,3] [4,7] ...
//! ```

use std::collections::HashMap;

use bytemuck::{Pod, Zeroable};
use subtile_core::config::STORAGE_ISLAND;
use subtile_core::{Bounds, Pool, SubtileError, SubtileResult, Transform, Vector};

use crate::behavior::BehaviorHandle;
use crate::material::MaterialHandle;

/// Snaps a coordinate to the origin of its chunk.
///
/// Rounds toward negative infinity: with `size` 4, both -1 and -4 map to -4.
/// Returns `None` if `size` is not positive or the origin falls below
/// `i32::MIN`.
#[inline]
#[must_use]
pub fn normalize(coord: i32, size: i32) -> Option<i32> {
    if size <= 0 {
        return None;
    }
    coord.div_euclid(size).checked_mul(size)
}

/// Snaps a world position component to the origin of its chunk.
///
/// Returns `None` for non-finite coordinates and for coordinates whose floor
/// is not an `i32`.
#[inline]
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn normalize_position(coord: f32, size: i32) -> Option<i32> {
    // Both ends are exact in f32.
    const GRID: std::ops::Range<f32> = -2_147_483_648.0..2_147_483_648.0;

    let floor = coord.floor();
    if !GRID.contains(&floor) {
        return None;
    }
    normalize(floor as i32, size)
}

/// A placed tile, stored inline in its island.
///
/// Handles are kept in their signed wire form so the record can be framed
/// as-is.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct Tile {
    /// Plane the tile sits on.
    pub altitude: i32,
    /// X position.
    pub x: f32,
    /// Y position.
    pub y: f32,
    /// Rotation in radians.
    pub rotation: f32,
    /// Raw material handle.
    pub material: i16,
    /// Raw behavior handle.
    pub behavior: i16,
}

impl Tile {
    /// Creates a tile record.
    #[must_use]
    pub const fn new(transform: Transform, material: MaterialHandle, behavior: BehaviorHandle) -> Self {
        Self {
            altitude: transform.altitude,
            x: transform.position.x,
            y: transform.position.y,
            rotation: transform.rotation,
            material: material.to_raw(),
            behavior: behavior.to_raw(),
        }
    }

    /// Returns where the tile sits.
    #[inline]
    #[must_use]
    pub const fn transform(&self) -> Transform {
        Transform::new(self.altitude, self.x, self.y, self.rotation)
    }

    /// Returns the position on the tile's plane.
    #[inline]
    #[must_use]
    pub const fn position(&self) -> Vector {
        Vector::new(self.x, self.y)
    }

    /// Returns the typed material handle.
    #[inline]
    #[must_use]
    pub const fn material_handle(&self) -> MaterialHandle {
        MaterialHandle::from_raw(self.material)
    }
}

/// Identity of an island: chunk origin plus altitude.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct IslandKey {
    /// Chunk origin X.
    pub x: i32,
    /// Chunk origin Y.
    pub y: i32,
    /// Plane.
    pub altitude: i32,
}

impl IslandKey {
    /// Creates a key from an already normalized origin.
    #[must_use]
    pub const fn new(altitude: i32, x: i32, y: i32) -> Self {
        Self { x, y, altitude }
    }
}

/// One chunk of the world.
#[derive(Clone, Debug)]
pub struct Island {
    key: IslandKey,
    life: i32,
    count: usize,
    tiles: [Tile; STORAGE_ISLAND],
    bounds: Bounds,
}

impl Default for Island {
    fn default() -> Self {
        Self {
            key: IslandKey::default(),
            life: 0,
            count: 0,
            tiles: [Tile::zeroed(); STORAGE_ISLAND],
            bounds: Bounds::default(),
        }
    }
}

impl Island {
    /// Returns the island's key.
    #[inline]
    #[must_use]
    pub const fn key(&self) -> IslandKey {
        self.key
    }

    /// Returns the remaining lifetime in ticks.
    #[inline]
    #[must_use]
    pub const fn life(&self) -> i32 {
        self.life
    }

    /// Returns the number of tiles stored.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.count
    }

    /// Returns true if no tile is stored.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Returns true if no more tiles fit.
    #[inline]
    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.count >= STORAGE_ISLAND
    }

    /// Returns the footprint volume.
    #[inline]
    #[must_use]
    pub const fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    /// Returns the stored tiles.
    #[inline]
    #[must_use]
    pub fn tiles(&self) -> &[Tile] {
        &self.tiles[..self.count]
    }

    /// Appends a tile.
    ///
    /// # Errors
    ///
    /// Returns [`SubtileError::CapacityExceeded`] if the island is full.
    pub fn push(&mut self, tile: Tile) -> SubtileResult<()> {
        if self.is_full() {
            return Err(SubtileError::CapacityExceeded {
                what: "island tiles",
                capacity: STORAGE_ISLAND,
            });
        }
        self.tiles[self.count] = tile;
        self.count += 1;
        Ok(())
    }

    /// Resets the lifetime counter.
    #[inline]
    pub fn touch(&mut self, lifetime: i32) {
        self.life = lifetime;
    }

    fn reset(&mut self, key: IslandKey, size: i32, lifetime: i32) {
        self.key = key;
        self.life = lifetime;
        self.count = 0;
        self.bounds = Bounds::footprint(key.altitude, key.x, key.y, size);
    }
}

/// Pool-backed island storage with a key index.
#[derive(Clone, Debug)]
pub struct IslandIndex {
    pool: Pool<Island>,
    /// Live slots in creation order.
    active: Vec<i16>,
    lookup: HashMap<IslandKey, i16>,
    size: i32,
    lifetime: i32,
}

impl IslandIndex {
    /// Creates an empty index.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is out of the pool's range or `size` is not
    /// positive.
    #[must_use]
    pub fn new(capacity: usize, size: i32, lifetime: i32) -> Self {
        assert!(size > 0, "Island size must be positive");

        Self {
            pool: Pool::new("islands", capacity, Island::default()),
            active: Vec::with_capacity(capacity),
            lookup: HashMap::with_capacity(capacity),
            size,
            lifetime,
        }
    }

    /// Returns the island edge length.
    #[inline]
    #[must_use]
    pub const fn size(&self) -> i32 {
        self.size
    }

    /// Returns the lifetime a touched island is reset to.
    #[inline]
    #[must_use]
    pub const fn lifetime(&self) -> i32 {
        self.lifetime
    }

    /// Returns the number of active islands.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.active.len()
    }

    /// Returns true if no island is active.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    /// Returns the key of the island that holds `position` on `altitude`.
    ///
    /// # Errors
    ///
    /// Returns [`SubtileError::PositionOutOfRange`] if a component is not
    /// finite, or if the island's footprint would leave the `i32` grid.
    pub fn key_for(&self, altitude: i32, position: Vector) -> SubtileResult<IslandKey> {
        let x = normalize_position(position.x, self.size).ok_or(SubtileError::PositionOutOfRange)?;
        let y = normalize_position(position.y, self.size).ok_or(SubtileError::PositionOutOfRange)?;
        Ok(IslandKey::new(altitude, self.origin(x)?, self.origin(y)?))
    }

    /// Checks that a chunk origin's far edge is still on the grid.
    fn origin(&self, coord: i32) -> SubtileResult<i32> {
        normalize(coord, self.size)
            .filter(|origin| origin.checked_add(self.size).is_some())
            .ok_or(SubtileError::PositionOutOfRange)
    }

    /// Looks up an active island without touching it.
    #[must_use]
    pub fn find(&self, key: &IslandKey) -> Option<&Island> {
        let slot = *self.lookup.get(key)?;
        self.pool.at(slot).ok()
    }

    /// Returns the island holding `(x, y)` on `altitude`, creating it on a
    /// miss. A hit resets the island's lifetime. The flag is true when the
    /// island was created.
    ///
    /// # Errors
    ///
    /// Returns [`SubtileError::CapacityExceeded`] if a new island is needed
    /// and the pool is full, or [`SubtileError::PositionOutOfRange`] if the
    /// island would not fit the `i32` grid.
    pub fn find_or_create(&mut self, altitude: i32, x: i32, y: i32) -> SubtileResult<(&mut Island, bool)> {
        let key = IslandKey::new(altitude, self.origin(x)?, self.origin(y)?);

        if let Some(&slot) = self.lookup.get(&key) {
            let island = self.pool.at_mut(slot)?;
            island.touch(self.lifetime);
            return Ok((island, false));
        }

        let (slot, island) = self.pool.acquire()?;
        island.reset(key, self.size, self.lifetime);
        self.active.push(slot);
        self.lookup.insert(key, slot);
        Ok((island, true))
    }

    /// Checks, without changing anything, that a tile can go into the
    /// island at `key`.
    ///
    /// # Errors
    ///
    /// Returns [`SubtileError::CapacityExceeded`] if the island is full, or
    /// if it does not exist yet and no island slot is free.
    pub fn check_place(&self, key: &IslandKey) -> SubtileResult<()> {
        match self.find(key) {
            Some(island) if island.is_full() => Err(SubtileError::CapacityExceeded {
                what: "island tiles",
                capacity: STORAGE_ISLAND,
            }),
            Some(_) => Ok(()),
            None if self.pool.can_acquire() => Ok(()),
            None => Err(SubtileError::CapacityExceeded {
                what: "islands",
                capacity: self.pool.capacity(),
            }),
        }
    }

    /// Stores a tile in the island covering its position. Returns true when
    /// the island was created.
    ///
    /// # Errors
    ///
    /// Same as [`key_for`](Self::key_for) and
    /// [`check_place`](Self::check_place). Nothing changes on failure.
    pub fn place(&mut self, tile: Tile) -> SubtileResult<bool> {
        let key = self.key_for(tile.altitude, tile.position())?;
        self.check_place(&key)?;

        let (island, created) = self.find_or_create(key.altitude, key.x, key.y)?;
        island.push(tile)?;
        Ok(created)
    }

    /// Advances every island's lifetime by `ticks` and evicts the ones that
    /// run out, oldest first. `on_evict` sees each island before its tiles
    /// are dropped. Returns the evicted keys.
    pub fn decay<F>(&mut self, ticks: u32, mut on_evict: F) -> Vec<IslandKey>
    where
        F: FnMut(&Island),
    {
        let ticks = i32::try_from(ticks).unwrap_or(i32::MAX);
        let mut evicted = Vec::new();

        let pool = &mut self.pool;
        let lookup = &mut self.lookup;
        self.active.retain(|&slot| {
            let Ok(island) = pool.at_mut(slot) else {
                return false;
            };
            island.life = island.life.saturating_sub(ticks);
            if island.life > 0 {
                return true;
            }

            on_evict(island);
            let key = island.key;
            island.count = 0;
            lookup.remove(&key);
            let released = pool.release(slot);
            debug_assert!(released.is_ok(), "active island slot {slot} was not live");
            evicted.push(key);
            false
        });

        evicted
    }

    /// Iterates active islands in creation order.
    pub fn islands(&self) -> impl Iterator<Item = &Island> + '_ {
        self.active.iter().filter_map(|&slot| self.pool.at(slot).ok())
    }
}
