//! Fixed-width names.

use std::fmt;

use bytemuck::{Pod, Zeroable};

use crate::config::STORAGE_LABEL;
use crate::error::{SubtileError, SubtileResult};

/// A name stored inline in [`STORAGE_LABEL`] bytes, terminator included.
///
/// Bytes after the terminator are always zero, so equality is a plain
/// content comparison.
#[repr(transparent)]
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct Label([u8; STORAGE_LABEL]);

impl Label {
    /// Builds a label from a name.
    ///
    /// # Errors
    ///
    /// Returns [`SubtileError::LabelTooLong`] if the name and its terminator
    /// do not fit, or [`SubtileError::LabelEncoding`] if the name contains a
    /// NUL byte.
    pub fn new(name: &str) -> SubtileResult<Self> {
        let bytes = name.as_bytes();
        if bytes.len() >= STORAGE_LABEL {
            return Err(SubtileError::LabelTooLong {
                len: bytes.len(),
                capacity: STORAGE_LABEL,
            });
        }
        if bytes.contains(&0) {
            return Err(SubtileError::LabelEncoding);
        }

        let mut data = [0u8; STORAGE_LABEL];
        data[..bytes.len()].copy_from_slice(bytes);
        Ok(Self(data))
    }

    /// Builds a label from a name known at compile time.
    ///
    /// # Panics
    ///
    /// Panics if the name does not fit or contains a NUL byte. In a `const`
    /// item this fails the build instead.
    #[must_use]
    pub const fn from_static(name: &'static str) -> Self {
        let bytes = name.as_bytes();
        assert!(bytes.len() < STORAGE_LABEL, "label too long");

        let mut data = [0u8; STORAGE_LABEL];
        let mut i = 0;
        while i < bytes.len() {
            assert!(bytes[i] != 0, "label contains NUL");
            data[i] = bytes[i];
            i += 1;
        }
        Self(data)
    }

    /// Rebuilds a label from its raw bytes, as read back from a frame.
    ///
    /// # Errors
    ///
    /// Returns [`SubtileError::LabelTooLong`] if no terminator is present, or
    /// [`SubtileError::LabelEncoding`] if the name is not UTF-8.
    pub fn from_bytes(raw: [u8; STORAGE_LABEL]) -> SubtileResult<Self> {
        let len = raw.iter().position(|&b| b == 0).ok_or(SubtileError::LabelTooLong {
            len: STORAGE_LABEL,
            capacity: STORAGE_LABEL,
        })?;
        let name = std::str::from_utf8(&raw[..len]).map_err(|_| SubtileError::LabelEncoding)?;
        Self::new(name)
    }

    /// Returns the name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        let len = self.0.iter().position(|&b| b == 0).unwrap_or(STORAGE_LABEL);
        std::str::from_utf8(&self.0[..len]).unwrap_or("")
    }

    /// Returns the raw bytes, terminator and zero padding included.
    #[inline]
    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; STORAGE_LABEL] {
        &self.0
    }
}

impl TryFrom<&str> for Label {
    type Error = SubtileError;

    fn try_from(name: &str) -> SubtileResult<Self> {
        Self::new(name)
    }
}

impl fmt::Debug for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Label({:?})", self.as_str())
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
