//! Push-style traversal callbacks.
//!
//! The world drives the walk and calls back into a [`Visitor`]. Every method
//! has an empty default, so a visitor only implements what it consumes.

use subtile_core::Transform;

use crate::behavior::{Behavior, BehaviorHandle};
use crate::material::{Material, MaterialHandle};

/// Receives records during a world traversal.
///
/// Visitors get shared references only; the world cannot be changed from
/// inside a walk.
pub trait Visitor {
    /// Called once per active canonical material, full traversal only.
    fn on_material(&mut self, handle: MaterialHandle, material: &Material) {
        let _ = (handle, material);
    }

    /// Called once per active behavior, full traversal only.
    fn on_behavior(&mut self, handle: BehaviorHandle, behavior: &Behavior) {
        let _ = (handle, behavior);
    }

    /// Called once per visited tile with its resolved records.
    fn on_tile(&mut self, transform: &Transform, material: &Material, behavior: &Behavior) {
        let _ = (transform, material, behavior);
    }
}
