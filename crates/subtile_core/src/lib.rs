//! # SUBTILE Core
//!
//! Fixed-memory building blocks for the tile world store:
//! - Slot pools addressed by signed 16-bit handles
//! - Fixed-width labels and scalar values
//! - Planar geometry and query volumes
//! - The 128-byte named-record frame codec
//!
//! ## Architecture Rules
//!
//! 1. **Sized once** - Every pool reserves its capacity upfront
//! 2. **Plain data** - Records are `Copy` and, where they travel, `Pod`
//! 3. **Local failures** - Every error is returned at the point of violation
//!
//! ## Example
//!
//! ```rust,ignore
//! use subtile_core::{Frame, Label, Pool};
//!
//! let mut pool: Pool<Label> = Pool::new("labels", 16, Label::new("blank")?);
//! let (handle, slot) = pool.acquire()?;
//! *slot = Label::new("stone")?;
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod config;
pub mod error;
pub mod frame;
pub mod memory;
pub mod types;

pub use config::WorldConfig;
pub use error::{SubtileError, SubtileResult};
pub use frame::Frame;
pub use memory::{Pool, SENTINEL};
pub use types::{Bounds, Label, Transform, Value, ValueMeta, Vector};
