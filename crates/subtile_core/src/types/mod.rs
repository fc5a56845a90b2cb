//! # Value Types
//!
//! Plain fixed-size data shared by every record in the world.

mod geometry;
mod label;
mod value;

pub use geometry::{Bounds, Transform, Vector};
pub use label::Label;
pub use value::{Value, ValueMeta};
