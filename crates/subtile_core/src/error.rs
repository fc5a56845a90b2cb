//! # Error Types
//!
//! Every failure in the world store is local and synchronous: it is raised at
//! the point of violation and never retried internally.

use thiserror::Error;

/// Errors that can occur in the world store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SubtileError {
    /// A pool or an island's tile storage is full.
    #[error("capacity exceeded: {what} holds at most {capacity}")]
    CapacityExceeded {
        /// What ran out of room.
        what: &'static str,
        /// The fixed capacity that was hit.
        capacity: usize,
    },

    /// Release of the sentinel slot, of a slot that is already free, or of a
    /// handle beyond the populated range. Also raised when a handle is passed
    /// where its sign or kind is not accepted.
    #[error("invalid handle: {0}")]
    InvalidHandle(i16),

    /// Access to a slot that was never populated.
    #[error("handle {handle} out of range (populated: {len})")]
    OutOfRange {
        /// The offending handle.
        handle: i16,
        /// The pool's high-water mark.
        len: usize,
    },

    /// A position is not finite, or its chunk does not fit the `i32` grid.
    #[error("position out of range")]
    PositionOutOfRange,

    /// A name does not fit a label.
    #[error("label too long: {len} bytes, capacity {capacity} including terminator")]
    LabelTooLong {
        /// Byte length of the rejected name.
        len: usize,
        /// Label capacity in bytes.
        capacity: usize,
    },

    /// A name contains a NUL byte, or label bytes read back from a frame
    /// are not valid UTF-8.
    #[error("label is not a valid name")]
    LabelEncoding,

    /// A frame could not be encoded.
    #[error("frame encode failed: {reason}")]
    FrameEncode {
        /// Why encoding was refused.
        reason: &'static str,
    },

    /// The name embedded in a frame differs from the expected one.
    #[error("frame tag mismatch")]
    FrameTagMismatch,

    /// The frame's own header does not describe a well-formed payload.
    #[error("malformed frame: {reason}")]
    FrameMalformed {
        /// What was wrong with the frame.
        reason: &'static str,
    },

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for world store operations.
pub type SubtileResult<T> = Result<T, SubtileError>;
