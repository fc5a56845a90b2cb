//! # World Observer
//!
//! The world never logs directly. Every state change worth reporting goes
//! through a [`WorldObserver`], so tests can record events and embedders can
//! route them wherever they like.

use subtile_core::{Label, SubtileError};

use crate::behavior::BehaviorHandle;
use crate::island::IslandKey;
use crate::material::MaterialHandle;

/// Receives world events. All methods default to doing nothing.
pub trait WorldObserver {
    /// A canonical material row was created.
    fn material_created(&mut self, handle: MaterialHandle, label: &Label) {
        let _ = (handle, label);
    }

    /// A canonical material was cloned into an instance.
    fn instance_created(&mut self, instance: MaterialHandle, parent: MaterialHandle) {
        let _ = (instance, parent);
    }

    /// An instance was released back to its parent.
    fn instance_removed(&mut self, instance: MaterialHandle, parent: MaterialHandle) {
        let _ = (instance, parent);
    }

    /// A behavior row was created.
    fn behavior_created(&mut self, handle: BehaviorHandle) {
        let _ = handle;
    }

    /// An island was created.
    fn island_created(&mut self, key: IslandKey) {
        let _ = key;
    }

    /// An island ran out of lifetime and was dropped with its tiles.
    fn island_evicted(&mut self, key: IslandKey, tiles: usize) {
        let _ = (key, tiles);
    }

    /// A placement failed and nothing was committed.
    fn placement_rejected(&mut self, error: &SubtileError) {
        let _ = error;
    }

    /// A frame could not be applied.
    fn frame_rejected(&mut self, name: &[u8], error: &SubtileError) {
        let _ = (name, error);
    }
}

/// Forwards events to `tracing`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingObserver;

impl WorldObserver for TracingObserver {
    fn material_created(&mut self, handle: MaterialHandle, label: &Label) {
        tracing::debug!(handle = handle.to_raw(), label = %label, "material created");
    }

    fn instance_created(&mut self, instance: MaterialHandle, parent: MaterialHandle) {
        tracing::trace!(instance = instance.to_raw(), parent = parent.to_raw(), "material instanced");
    }

    fn instance_removed(&mut self, instance: MaterialHandle, parent: MaterialHandle) {
        tracing::trace!(instance = instance.to_raw(), parent = parent.to_raw(), "material uninstanced");
    }

    fn behavior_created(&mut self, handle: BehaviorHandle) {
        tracing::debug!(handle = handle.to_raw(), "behavior created");
    }

    fn island_created(&mut self, key: IslandKey) {
        tracing::debug!(x = key.x, y = key.y, altitude = key.altitude, "island created");
    }

    fn island_evicted(&mut self, key: IslandKey, tiles: usize) {
        tracing::debug!(x = key.x, y = key.y, altitude = key.altitude, tiles, "island evicted");
    }

    fn placement_rejected(&mut self, error: &SubtileError) {
        tracing::warn!("Placement rejected: {error}");
    }

    fn frame_rejected(&mut self, name: &[u8], error: &SubtileError) {
        let name = String::from_utf8_lossy(name);
        tracing::warn!("Frame {name:?} rejected: {error}");
    }
}

/// Discards every event.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullObserver;

impl WorldObserver for NullObserver {}
