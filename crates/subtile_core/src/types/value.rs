//! Scalar values with static metadata.

use bytemuck::{Pod, Zeroable};

/// A 16-bit signed scalar.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Pod, Zeroable)]
pub struct Value(pub i16);

impl Value {
    /// Creates a value.
    #[inline]
    #[must_use]
    pub const fn new(value: i16) -> Self {
        Self(value)
    }

    /// Returns the raw scalar.
    #[inline]
    #[must_use]
    pub const fn get(self) -> i16 {
        self.0
    }

    /// Adds `delta`, clamping at the 16-bit bounds.
    #[inline]
    #[must_use]
    pub const fn saturating_add(self, delta: i16) -> Self {
        Self(self.0.saturating_add(delta))
    }
}

impl From<i16> for Value {
    fn from(value: i16) -> Self {
        Self(value)
    }
}

/// Static description of one value slot in a record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ValueMeta {
    /// Display name.
    pub name: &'static str,
    /// Position of the value inside its record.
    pub index: usize,
    /// Upper limit, which is also the value a fresh record starts with.
    pub limit: i16,
}

impl ValueMeta {
    /// Creates a value description.
    #[must_use]
    pub const fn new(name: &'static str, index: usize, limit: i16) -> Self {
        Self { name, index, limit }
    }

    /// Returns the value a fresh record starts with.
    #[inline]
    #[must_use]
    pub const fn initial(&self) -> Value {
        Value(self.limit)
    }
}
