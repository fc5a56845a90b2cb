//! Placement requests.

use subtile_core::{Label, Transform};

use crate::behavior::BehaviorHandle;
use crate::material::{MaterialHandle, DEFAULT_MATERIAL};

/// Which material a placement wants.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MaterialRequest {
    /// Name looked up (or registered) when `handle` is the default.
    pub label: Label,
    /// Explicit handle; wins over the label when not the default.
    pub handle: MaterialHandle,
}

impl Default for MaterialRequest {
    fn default() -> Self {
        Self {
            label: DEFAULT_MATERIAL,
            handle: MaterialHandle::Default,
        }
    }
}

/// Which behavior a placement wants.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BehaviorRequest {
    /// Explicit handle; the default behavior otherwise.
    pub handle: BehaviorHandle,
}

/// Everything needed to place one tile.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PlacementRequest {
    /// Where the tile goes.
    pub transform: Transform,
    /// Material description.
    pub material: MaterialRequest,
    /// Behavior description.
    pub behavior: BehaviorRequest,
}

impl PlacementRequest {
    /// Requests a default-material tile at the given location.
    #[must_use]
    pub fn new(altitude: i32, x: f32, y: f32, rotation: f32) -> Self {
        Self {
            transform: Transform::new(altitude, x, y, rotation),
            ..Self::default()
        }
    }

    /// Uses the canonical material named `label`.
    #[must_use]
    pub fn with_label(mut self, label: Label) -> Self {
        self.material.label = label;
        self.material.handle = MaterialHandle::Default;
        self
    }

    /// Uses an existing material row, canonical or instance.
    #[must_use]
    pub fn with_material(mut self, handle: MaterialHandle) -> Self {
        self.material.handle = handle;
        self
    }

    /// Uses an existing behavior row.
    #[must_use]
    pub fn with_behavior(mut self, handle: BehaviorHandle) -> Self {
        self.behavior.handle = handle;
        self
    }
}
