//! # SUBTILE
//!
//! State store for a sparse tile world stacked in integer altitudes:
//! - Material registry with shared definitions and private per-tile instances
//! - Behavior registry with the same handle contract
//! - Island index: square chunks that stay alive while they are touched
//! - Push-style traversal, full or bounded
//! - Whole-world persistence as 128-byte frames
//!
//! ## Architecture Rules
//!
//! 1. **Fixed memory** - Every pool is sized when the world is built
//! 2. **One owner** - A world belongs to one thread; there are no locks
//! 3. **No side effects** - Events go to a [`WorldObserver`], never to stdout
//!
//! ## Example
//!
//! ```rust,ignore
//! use subtile::{LineMesh, PlacementRequest, World};
//! use subtile::core::Bounds;
//!
//! let mut world = World::new("universe");
//! world.place(&PlacementRequest::new(0, 2.0, -1.0, 0.0))?;
//!
//! let mut mesh = LineMesh::new();
//! world.visit_bounded(&Bounds::new(0, -2.0, -2.0, 0, 2.0, 2.0), &mut mesh)?;
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub use subtile_core as core;

pub mod behavior;
pub mod island;
pub mod material;
pub mod mesh;
pub mod observer;
pub mod persist;
pub mod request;
pub mod visit;
pub mod world;

pub use behavior::{Behavior, BehaviorHandle, BehaviorRegistry};
pub use island::{normalize, Island, IslandIndex, IslandKey, Tile};
pub use material::{Material, MaterialHandle, MaterialRegistry, MaterialValue, DEFAULT_MATERIAL};
pub use mesh::LineMesh;
pub use observer::{NullObserver, TracingObserver, WorldObserver};
pub use persist::{MaterialRecord, MATERIALS_FRAME, TILES_FRAME};
pub use request::{BehaviorRequest, MaterialRequest, PlacementRequest};
pub use visit::Visitor;
pub use world::World;
