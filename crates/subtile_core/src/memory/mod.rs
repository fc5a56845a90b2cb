//! # Memory Management
//!
//! Pre-sized slot pools for zero-allocation world mutation.
//!
//! ## Design Philosophy
//!
//! Every pool reserves its full capacity when the world is created. After
//! that:
//! - No heap allocations per record
//! - No compaction, no resizing
//! - O(1) acquire and release

mod pool;

pub use pool::{Pool, SENTINEL};
