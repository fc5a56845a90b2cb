//! # Material Registry
//!
//! Materials come in two tiers:
//!
//! - **Canonical** rows are shared, named definitions. Many tiles point at
//!   the same row by handle.
//! - **Instances** are private clones of a canonical row. A tile that needs
//!   its own mutable state (hitpoints going down, heating up) swaps its
//!   canonical handle for an instance, and swaps back when the state is
//!   no longer needed.
//!
//! ## Handle encoding
//!
//! On the wire and inside tiles a material handle is a signed 16-bit integer:
//!
//! ```text
//!  0  -> the default material ("blank", slot 0)
//! >0  -> canonical row at that slot
//! <0  -> instance at slot |h|, whose `base` value holds the parent handle
//! ```
//!
//! In code it is the [`MaterialHandle`] enum; the sign trick only exists at
//! [`MaterialHandle::to_raw`] / [`MaterialHandle::from_raw`].

use subtile_core::{Label, Pool, SubtileError, SubtileResult, Value, ValueMeta, SENTINEL};

/// Name of the material every world starts with, in slot 0.
pub const DEFAULT_MATERIAL: Label = Label::from_static("blank");

/// The six values every material carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MaterialValue {
    /// Parent handle for instances, 0 for canonical rows.
    Base = 0,
    /// How much of the tile is filled.
    Volume = 1,
    /// Mass per volume.
    Density = 2,
    /// Damage left before the tile is destroyed.
    Hitpoints = 3,
    /// Heat.
    Temperature = 4,
    /// How much light passes through.
    Transparency = 5,
}

/// Static metadata for each [`MaterialValue`], indexed by discriminant.
pub static MATERIAL_VALUES: [ValueMeta; 6] = [
    ValueMeta::new("base", 0, 0),
    ValueMeta::new("volume", 1, 100),
    ValueMeta::new("density", 2, 100),
    ValueMeta::new("hitpoints", 3, 100),
    ValueMeta::new("temperature", 4, 100),
    ValueMeta::new("transparency", 5, 100),
];

impl MaterialValue {
    /// Every value, in record order.
    pub const ALL: [Self; 6] = [
        Self::Base,
        Self::Volume,
        Self::Density,
        Self::Hitpoints,
        Self::Temperature,
        Self::Transparency,
    ];

    /// Returns this value's static metadata.
    #[inline]
    #[must_use]
    pub fn meta(self) -> &'static ValueMeta {
        &MATERIAL_VALUES[self as usize]
    }
}

/// A named material with its six values.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Material {
    /// Name, used to deduplicate canonical rows.
    pub label: Label,
    /// Values in [`MaterialValue`] order.
    pub values: [Value; 6],
}

impl Material {
    /// Creates a material with every value at its limit.
    #[must_use]
    pub fn new(label: Label) -> Self {
        Self {
            label,
            values: MATERIAL_VALUES.map(|meta| meta.initial()),
        }
    }

    /// Returns one value.
    #[inline]
    #[must_use]
    pub const fn value(&self, kind: MaterialValue) -> Value {
        self.values[kind as usize]
    }

    /// Overwrites one value.
    #[inline]
    pub fn set_value(&mut self, kind: MaterialValue, value: Value) {
        self.values[kind as usize] = value;
    }

    /// Returns true if this row is an instance of some canonical row.
    #[inline]
    #[must_use]
    pub fn instanced(&self) -> bool {
        self.value(MaterialValue::Base).get() != MaterialValue::Base.meta().limit
    }

    /// Returns true once hitpoints are used up.
    #[inline]
    #[must_use]
    pub fn destroyed(&self) -> bool {
        self.value(MaterialValue::Hitpoints).get() <= 0
    }
}

impl Default for Material {
    fn default() -> Self {
        Self::new(Label::default())
    }
}

/// Typed material handle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum MaterialHandle {
    /// No explicit material: slot 0.
    #[default]
    Default,
    /// A shared, canonical row.
    Canonical(u16),
    /// A private instance.
    Instance(u16),
}

impl MaterialHandle {
    /// Decodes the signed wire form.
    #[must_use]
    pub const fn from_raw(raw: i16) -> Self {
        match raw {
            0 => Self::Default,
            r if r > 0 => Self::Canonical(r.unsigned_abs()),
            r => Self::Instance(r.unsigned_abs()),
        }
    }

    /// Encodes to the signed wire form.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub const fn to_raw(self) -> i16 {
        match self {
            Self::Default => 0,
            Self::Canonical(slot) => slot as i16,
            Self::Instance(slot) => (slot as i16).wrapping_neg(),
        }
    }

    /// Returns the pool slot this handle addresses.
    #[inline]
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub const fn slot(self) -> i16 {
        match self {
            Self::Default => SENTINEL,
            Self::Canonical(slot) | Self::Instance(slot) => slot as i16,
        }
    }

    /// Returns true for instance handles.
    #[inline]
    #[must_use]
    pub const fn is_instance(self) -> bool {
        matches!(self, Self::Instance(_))
    }

    /// Returns true if the handle survives the wire form unchanged: slot 0
    /// only as [`Default`](Self::Default), and no slot past `i16::MAX`.
    #[inline]
    #[must_use]
    pub const fn is_valid(self) -> bool {
        match self {
            Self::Default => true,
            Self::Canonical(slot) | Self::Instance(slot) => slot != 0 && slot <= i16::MAX.unsigned_abs(),
        }
    }
}

/// Canonical material storage plus the instancing state machine.
#[derive(Clone, Debug)]
pub struct MaterialRegistry {
    pool: Pool<Material>,
    /// Canonical slots in registration order; slot 0 first.
    active: Vec<i16>,
}

impl MaterialRegistry {
    /// Creates a registry whose slot 0 holds [`DEFAULT_MATERIAL`].
    ///
    /// # Panics
    ///
    /// Panics under the same conditions as [`Pool::new`].
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let mut active = Vec::with_capacity(capacity);
        active.push(SENTINEL);

        Self {
            pool: Pool::new("materials", capacity, Material::new(DEFAULT_MATERIAL)),
            active,
        }
    }

    /// Returns the pool capacity.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.pool.capacity()
    }

    /// Returns the number of rows in use, canonical and instanced.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.pool.live_count()
    }

    /// Returns true if `handle` is valid and addresses a row that is in use
    /// and of the kind the handle claims.
    #[must_use]
    pub fn is_live(&self, handle: MaterialHandle) -> bool {
        let slot = handle.slot();
        handle.is_valid()
            && self.pool.is_live(slot)
            && self
                .pool
                .at(slot)
                .is_ok_and(|material| material.instanced() == handle.is_instance())
    }

    /// Looks up a material by handle.
    ///
    /// # Errors
    ///
    /// Returns [`SubtileError::OutOfRange`] if the slot was never populated.
    #[inline]
    pub fn resolve(&self, handle: MaterialHandle) -> SubtileResult<&Material> {
        self.pool.at(handle.slot())
    }

    /// Looks up a material by its signed wire handle.
    ///
    /// # Errors
    ///
    /// Same as [`resolve`](Self::resolve).
    #[inline]
    pub fn resolve_raw(&self, raw: i16) -> SubtileResult<&Material> {
        self.resolve(MaterialHandle::from_raw(raw))
    }

    /// Looks up a material for mutation. Mutating a canonical row changes
    /// every tile that shares it.
    ///
    /// # Errors
    ///
    /// Same as [`resolve`](Self::resolve).
    pub fn resolve_mut(&mut self, handle: MaterialHandle) -> SubtileResult<&mut Material> {
        self.pool.at_mut(handle.slot())
    }

    /// Finds the canonical row named `label`.
    #[must_use]
    pub fn find(&self, label: &Label) -> Option<MaterialHandle> {
        self.active.iter().copied().find_map(|slot| {
            let material = self.pool.at(slot).ok()?;
            (!material.instanced() && material.label == *label).then_some(MaterialHandle::from_raw(slot))
        })
    }

    /// Checks, without changing anything, that
    /// [`place_or_reuse`](Self::place_or_reuse) would succeed.
    ///
    /// # Errors
    ///
    /// Returns [`SubtileError::InvalidHandle`] if `wanted` is explicit but
    /// not live, or [`SubtileError::CapacityExceeded`] if a new row is
    /// needed and the pool is full.
    pub fn check_place(&self, label: &Label, wanted: MaterialHandle) -> SubtileResult<()> {
        match wanted {
            MaterialHandle::Default => {
                if self.find(label).is_none() && !self.pool.can_acquire() {
                    return Err(self.full());
                }
                Ok(())
            }
            explicit if self.is_live(explicit) => Ok(()),
            explicit => Err(SubtileError::InvalidHandle(explicit.to_raw())),
        }
    }

    /// Resolves the material a placement should use.
    ///
    /// An explicit `wanted` handle is used as-is. Otherwise the canonical row
    /// named `label` is reused, or created if none exists. The flag is true
    /// when a row was created.
    ///
    /// # Errors
    ///
    /// Same as [`check_place`](Self::check_place).
    pub fn place_or_reuse(
        &mut self,
        label: Label,
        wanted: MaterialHandle,
    ) -> SubtileResult<(MaterialHandle, bool)> {
        self.check_place(&label, wanted)?;

        if wanted != MaterialHandle::Default {
            return Ok((wanted, false));
        }
        if let Some(existing) = self.find(&label) {
            return Ok((existing, false));
        }
        Ok((self.create(label)?, true))
    }

    /// Adds a new canonical row, even if one with the same label exists.
    ///
    /// # Errors
    ///
    /// Returns [`SubtileError::CapacityExceeded`] if the pool is full.
    pub fn create(&mut self, label: Label) -> SubtileResult<MaterialHandle> {
        let (slot, material) = self.pool.acquire()?;
        *material = Material::new(label);
        self.active.push(slot);
        Ok(MaterialHandle::from_raw(slot))
    }

    /// Clones a canonical row into a fresh slot and returns the instance.
    ///
    /// # Errors
    ///
    /// Returns [`SubtileError::InvalidHandle`] unless `base` is a live
    /// canonical handle (the default material cannot be instanced: 0 is the
    /// "not an instance" marker), or [`SubtileError::CapacityExceeded`] if
    /// the pool is full.
    pub fn instantiate(&mut self, base: MaterialHandle) -> SubtileResult<MaterialHandle> {
        if !matches!(base, MaterialHandle::Canonical(_)) || !self.is_live(base) {
            return Err(SubtileError::InvalidHandle(base.to_raw()));
        }

        let mut clone = *self.pool.at(base.slot())?;
        clone.set_value(MaterialValue::Base, Value::new(base.to_raw()));

        let (slot, material) = self.pool.acquire()?;
        *material = clone;
        Ok(MaterialHandle::Instance(slot.unsigned_abs()))
    }

    /// Releases an instance and returns the canonical handle it came from.
    ///
    /// # Errors
    ///
    /// Returns [`SubtileError::InvalidHandle`] unless `instance` is a live
    /// instance handle.
    pub fn uninstantiate(&mut self, instance: MaterialHandle) -> SubtileResult<MaterialHandle> {
        let parent = self.parent_of(instance)?;
        self.pool.release(instance.slot())?;
        Ok(parent)
    }

    /// Returns the canonical handle an instance was cloned from.
    ///
    /// # Errors
    ///
    /// Returns [`SubtileError::InvalidHandle`] unless `instance` is a live
    /// instance handle.
    pub fn parent_of(&self, instance: MaterialHandle) -> SubtileResult<MaterialHandle> {
        if !instance.is_instance() || !self.is_live(instance) {
            return Err(SubtileError::InvalidHandle(instance.to_raw()));
        }
        let base = self.pool.at(instance.slot())?.value(MaterialValue::Base);
        Ok(MaterialHandle::from_raw(base.get()))
    }

    /// Releases a canonical row. Tiles still pointing at it will resolve to
    /// whatever reuses the slot.
    ///
    /// # Errors
    ///
    /// Returns [`SubtileError::InvalidHandle`] for the default material, for
    /// instances (use [`uninstantiate`](Self::uninstantiate)), and for rows
    /// that are not live.
    pub fn release(&mut self, handle: MaterialHandle) -> SubtileResult<()> {
        if !matches!(handle, MaterialHandle::Canonical(_)) || !self.is_live(handle) {
            return Err(SubtileError::InvalidHandle(handle.to_raw()));
        }
        self.pool.release(handle.slot())?;
        self.active.retain(|&slot| slot != handle.slot());
        Ok(())
    }

    /// Iterates canonical rows in registration order, default first.
    pub fn active(&self) -> impl Iterator<Item = (MaterialHandle, &Material)> + '_ {
        self.active.iter().filter_map(|&slot| {
            self.pool
                .at(slot)
                .ok()
                .map(|material| (MaterialHandle::from_raw(slot), material))
        })
    }

    fn full(&self) -> SubtileError {
        SubtileError::CapacityExceeded {
            what: "materials",
            capacity: self.pool.capacity(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn label(name: &str) -> Label {
        Label::new(name).unwrap()
    }

    #[test]
    fn test_material_defaults() {
        let material = Material::new(label("stone"));
        assert_eq!(material.value(MaterialValue::Base), Value(0));
        assert_eq!(material.value(MaterialValue::Hitpoints), Value(100));
        assert!(!material.instanced());
        assert!(!material.destroyed());
    }

    #[test]
    fn test_material_destroyed() {
        let mut material = Material::new(label("glass"));
        material.set_value(MaterialValue::Hitpoints, Value(0));
        assert!(material.destroyed());
    }

    #[test]
    fn test_handle_raw_encoding() {
        for raw in [0, 1, 7, i16::MAX, -1, -7, -i16::MAX] {
            assert_eq!(MaterialHandle::from_raw(raw).to_raw(), raw);
        }
        assert_eq!(MaterialHandle::from_raw(-3), MaterialHandle::Instance(3));
        assert_eq!(MaterialHandle::Instance(3).slot(), 3);
    }

    #[test]
    fn test_unencodable_handles_rejected() {
        let mut registry = MaterialRegistry::new(16);
        let stone = registry.create(label("stone")).unwrap();
        registry.instantiate(stone).unwrap();
        let live = registry.live_count();

        for handle in [
            MaterialHandle::Canonical(0),
            MaterialHandle::Instance(0),
            MaterialHandle::Canonical(40_000),
            MaterialHandle::Instance(32_768),
        ] {
            assert!(!handle.is_valid());
            assert!(!registry.is_live(handle));
        }
        assert_eq!(registry.instantiate(MaterialHandle::Canonical(0)), Err(SubtileError::InvalidHandle(0)));
        assert!(registry.instantiate(MaterialHandle::Canonical(40_000)).is_err());
        assert_eq!(registry.release(MaterialHandle::Canonical(0)), Err(SubtileError::InvalidHandle(0)));
        assert_eq!(registry.uninstantiate(MaterialHandle::Instance(0)), Err(SubtileError::InvalidHandle(0)));
        assert_eq!(
            registry.check_place(&label("sand"), MaterialHandle::Canonical(0)),
            Err(SubtileError::InvalidHandle(0))
        );
        assert_eq!(registry.live_count(), live);
        assert!(MaterialHandle::Canonical(1).is_valid() && MaterialHandle::Instance(32_767).is_valid());
    }

    #[test]
    fn test_default_material_preregistered() {
        let registry = MaterialRegistry::new(16);
        assert_eq!(registry.find(&DEFAULT_MATERIAL), Some(MaterialHandle::Default));
        assert_eq!(registry.resolve(MaterialHandle::Default).unwrap().label, DEFAULT_MATERIAL);
        assert_eq!(registry.active().count(), 1);
    }

    #[test]
    fn test_place_or_reuse_deduplicates() {
        let mut registry = MaterialRegistry::new(16);

        let (stone, created) = registry.place_or_reuse(label("stone"), MaterialHandle::Default).unwrap();
        assert_eq!(stone, MaterialHandle::Canonical(1));
        assert!(created);

        let (again, created) = registry.place_or_reuse(label("stone"), MaterialHandle::Default).unwrap();
        assert_eq!(again, stone);
        assert!(!created);

        let (blank, created) = registry.place_or_reuse(DEFAULT_MATERIAL, MaterialHandle::Default).unwrap();
        assert_eq!(blank, MaterialHandle::Default);
        assert!(!created);
        assert_eq!(registry.live_count(), 2);
    }

    #[test]
    fn test_place_explicit_handle() {
        let mut registry = MaterialRegistry::new(16);
        let stone = registry.create(label("stone")).unwrap();

        // The explicit handle wins over the label.
        let (handle, created) = registry.place_or_reuse(label("sand"), stone).unwrap();
        assert_eq!(handle, stone);
        assert!(!created);

        assert_eq!(
            registry.place_or_reuse(label("sand"), MaterialHandle::Canonical(9)),
            Err(SubtileError::InvalidHandle(9))
        );
        assert_eq!(
            registry.place_or_reuse(label("sand"), MaterialHandle::Instance(1)),
            Err(SubtileError::InvalidHandle(-1))
        );
    }

    #[test]
    fn test_instancing_roundtrip() {
        let mut registry = MaterialRegistry::new(16);
        let stone = registry.create(label("stone")).unwrap();

        let instance = registry.instantiate(stone).unwrap();
        assert_eq!(instance, MaterialHandle::Instance(2));
        assert_eq!(instance.to_raw(), -2);

        let clone = registry.resolve(instance).unwrap();
        assert!(clone.instanced());
        assert_eq!(clone.label, label("stone"));
        assert_eq!(clone.value(MaterialValue::Base), Value(1));

        // Instances never satisfy label lookups.
        assert_eq!(registry.find(&label("stone")), Some(stone));

        assert_eq!(registry.uninstantiate(instance), Ok(stone));
        assert!(!registry.is_live(instance));

        // The released slot is the next one handed out.
        assert_eq!(registry.instantiate(stone), Ok(instance));
    }

    #[test]
    fn test_instance_state_is_private() {
        let mut registry = MaterialRegistry::new(16);
        let stone = registry.create(label("stone")).unwrap();
        let instance = registry.instantiate(stone).unwrap();

        registry
            .resolve_mut(instance)
            .unwrap()
            .set_value(MaterialValue::Hitpoints, Value(40));

        assert_eq!(registry.resolve(instance).unwrap().value(MaterialValue::Hitpoints), Value(40));
        assert_eq!(registry.resolve(stone).unwrap().value(MaterialValue::Hitpoints), Value(100));
    }

    #[test]
    fn test_instancing_rejects() {
        let mut registry = MaterialRegistry::new(16);
        let stone = registry.create(label("stone")).unwrap();
        let instance = registry.instantiate(stone).unwrap();

        assert_eq!(registry.instantiate(MaterialHandle::Default), Err(SubtileError::InvalidHandle(0)));
        assert_eq!(registry.instantiate(instance), Err(SubtileError::InvalidHandle(-2)));
        assert_eq!(registry.uninstantiate(stone), Err(SubtileError::InvalidHandle(1)));

        registry.uninstantiate(instance).unwrap();
        assert_eq!(registry.uninstantiate(instance), Err(SubtileError::InvalidHandle(-2)));
    }

    #[test]
    fn test_release_canonical() {
        let mut registry = MaterialRegistry::new(16);
        let stone = registry.create(label("stone")).unwrap();

        assert_eq!(registry.release(MaterialHandle::Default), Err(SubtileError::InvalidHandle(0)));
        registry.release(stone).unwrap();
        assert_eq!(registry.find(&label("stone")), None);
        assert_eq!(registry.active().count(), 1);
        assert_eq!(registry.release(stone), Err(SubtileError::InvalidHandle(1)));
    }

    #[test]
    fn test_registry_full() {
        let mut registry = MaterialRegistry::new(2);
        registry.create(label("stone")).unwrap();

        let full = SubtileError::CapacityExceeded { what: "materials", capacity: 2 };
        assert_eq!(registry.check_place(&label("sand"), MaterialHandle::Default), Err(full.clone()));
        assert_eq!(registry.place_or_reuse(label("sand"), MaterialHandle::Default), Err(full));

        // Reuse still works on a full pool.
        assert!(registry.place_or_reuse(label("stone"), MaterialHandle::Default).is_ok());
    }
}
