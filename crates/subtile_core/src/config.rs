//! # World Constants & Configuration
//!
//! **CRITICAL:** the constants that shape fixed-size arrays (labels, island
//! tile storage, frames) are baked into the binary. Changing them breaks
//! every frame produced by an older build.
//!
//! The remaining knobs live in [`WorldConfig`], loaded once at startup.

use serde::Deserialize;

use crate::error::{SubtileError, SubtileResult};

// =============================================================================
// ISLANDS
// =============================================================================

/// Ticks an island survives without being touched.
pub const LIFETIME_ISLAND: i32 = 128;

/// Edge length of an island's square footprint, in world units.
pub const SIZE_ISLAND: i32 = 4;

/// Tiles one island can hold.
pub const STORAGE_ISLAND: usize = 64;

// =============================================================================
// RECORDS
// =============================================================================

/// Bytes in one frame.
pub const STORAGE_FRAME: usize = 128;

/// Bytes in one label, terminator included.
pub const STORAGE_LABEL: usize = 12;

// =============================================================================
// POOLS
// =============================================================================

/// Material pool capacity.
pub const POOL_MATERIAL: usize = 4096;

/// Behavior pool capacity.
pub const POOL_BEHAVIOR: usize = 2048;

/// Island pool capacity.
pub const POOL_ISLAND: usize = 64;

/// Largest pool a signed 16-bit handle can address.
pub const MAX_POOL_CAPACITY: usize = i16::MAX as usize + 1;

/// Tunable world parameters.
///
/// Every field defaults to its build-time constant, so a TOML file only needs
/// to name what it changes:
///
/// ```toml
/// island_lifetime = 600
/// material_capacity = 1024
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorldConfig {
    /// Ticks an untouched island survives.
    pub island_lifetime: i32,
    /// Island footprint edge length.
    pub island_size: i32,
    /// Material pool capacity.
    pub material_capacity: usize,
    /// Behavior pool capacity.
    pub behavior_capacity: usize,
    /// Island pool capacity.
    pub island_capacity: usize,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            island_lifetime: LIFETIME_ISLAND,
            island_size: SIZE_ISLAND,
            material_capacity: POOL_MATERIAL,
            behavior_capacity: POOL_BEHAVIOR,
            island_capacity: POOL_ISLAND,
        }
    }
}

impl WorldConfig {
    /// Parses and validates a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`SubtileError::InvalidConfig`] if the text does not parse or
    /// a value is out of range.
    pub fn from_toml_str(text: &str) -> SubtileResult<Self> {
        let config: Self = toml::from_str(text)
            .map_err(|e| SubtileError::InvalidConfig(format!("failed to parse: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that every value is usable.
    ///
    /// # Errors
    ///
    /// Returns [`SubtileError::InvalidConfig`] naming the first bad field.
    pub fn validate(&self) -> SubtileResult<()> {
        if self.island_lifetime <= 0 {
            return Err(SubtileError::InvalidConfig(
                "island_lifetime must be positive".to_string(),
            ));
        }
        if self.island_size <= 0 {
            return Err(SubtileError::InvalidConfig(
                "island_size must be positive".to_string(),
            ));
        }

        let pools = [
            ("material_capacity", self.material_capacity),
            ("behavior_capacity", self.behavior_capacity),
            ("island_capacity", self.island_capacity),
        ];
        for (name, capacity) in pools {
            // Slot 0 is the sentinel, so a usable pool needs at least two.
            if !(2..=MAX_POOL_CAPACITY).contains(&capacity) {
                return Err(SubtileError::InvalidConfig(format!(
                    "{name} must be within 2..={MAX_POOL_CAPACITY}, got {capacity}"
                )));
            }
        }

        Ok(())
    }
}
