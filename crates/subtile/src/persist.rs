//! Frame records used by [`World::pack`](crate::World::pack) and
//! [`World::parse`](crate::World::parse).
//!
//! A packed world is a run of `"materials"` frames (canonical rows, then
//! instances) followed by `"tiles"` frames. Handles inside the records are
//! the source world's; the receiving world remaps them.

use bytemuck::{Pod, Zeroable};
use subtile_core::{Frame, Label, SubtileResult, Value};

use crate::material::{Material, MaterialHandle};

/// Frame name for [`MaterialRecord`] batches.
pub const MATERIALS_FRAME: &str = "materials";

/// Frame name for [`Tile`](crate::Tile) batches.
pub const TILES_FRAME: &str = "tiles";

/// A material row as it travels: source handle, label, values.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Pod, Zeroable)]
pub struct MaterialRecord {
    /// Raw handle in the source world.
    pub handle: i16,
    /// Name.
    pub label: Label,
    /// Values in record order; `base` holds the source parent for instances.
    pub values: [Value; 6],
}

impl MaterialRecord {
    /// Captures a row.
    #[must_use]
    pub const fn new(handle: MaterialHandle, material: &Material) -> Self {
        Self {
            handle: handle.to_raw(),
            label: material.label,
            values: material.values,
        }
    }

    /// Returns the source handle.
    #[must_use]
    pub const fn material_handle(&self) -> MaterialHandle {
        MaterialHandle::from_raw(self.handle)
    }
}

/// Encodes `records` into as many frames named `name` as needed.
///
/// # Errors
///
/// Propagates [`Frame::encode`] failures.
pub fn pack_records<T: Pod>(name: &str, records: &[T], frames: &mut Vec<Frame>) -> SubtileResult<()> {
    let per_frame = Frame::max_records::<T>(name).max(1);
    for chunk in records.chunks(per_frame) {
        let mut frame = Frame::new();
        frame.encode(name, chunk)?;
        frames.push(frame);
    }
    Ok(())
}
