//! # World
//!
//! One world owns three pools (materials, behaviors, islands) and is driven
//! from one thread. Every operation runs to completion; nothing blocks.
//!
//! ## Placement
//!
//! A placement resolves its material, its behavior and its island, then
//! appends the tile. All capacity checks run before the first commit, so a
//! rejected placement leaves no orphaned material or empty island behind.
//!
//! ## Lifetime
//!
//! Islands decay under [`World::step`]. Any placement into an island resets
//! its counter. Evicted islands lose their tiles; [`World::pack`] first if
//! they matter.

use std::collections::HashMap;

use subtile_core::{Bounds, Frame, Label, SubtileError, SubtileResult, WorldConfig};

use crate::behavior::{Behavior, BehaviorHandle, BehaviorRegistry};
use crate::island::{IslandIndex, IslandKey, Tile};
use crate::material::{Material, MaterialHandle, MaterialRegistry, MaterialValue};
use crate::observer::{TracingObserver, WorldObserver};
use crate::persist::{pack_records, MaterialRecord, MATERIALS_FRAME, TILES_FRAME};
use crate::request::{BehaviorRequest, MaterialRequest, PlacementRequest};
use crate::visit::Visitor;

/// The tile world state store.
#[derive(Debug)]
pub struct World<O: WorldObserver = TracingObserver> {
    guid: String,
    config: WorldConfig,
    materials: MaterialRegistry,
    behaviors: BehaviorRegistry,
    islands: IslandIndex,
    observer: O,
    /// Source material handle -> local handle, filled while parsing frames.
    remap: HashMap<i16, MaterialHandle>,
}

impl World<TracingObserver> {
    /// Creates a world with the default configuration, reporting through
    /// `tracing`.
    #[must_use]
    pub fn new(guid: impl Into<String>) -> Self {
        Self::build(guid.into(), WorldConfig::default(), TracingObserver)
    }

    /// Creates a world with a custom configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SubtileError::InvalidConfig`] if `config` does not validate.
    pub fn with_config(guid: impl Into<String>, config: WorldConfig) -> SubtileResult<Self> {
        Self::with_observer(guid, config, TracingObserver)
    }
}

impl<O: WorldObserver> World<O> {
    /// Creates a world reporting to `observer`.
    ///
    /// # Errors
    ///
    /// Returns [`SubtileError::InvalidConfig`] if `config` does not validate.
    pub fn with_observer(guid: impl Into<String>, config: WorldConfig, observer: O) -> SubtileResult<Self> {
        config.validate()?;
        Ok(Self::build(guid.into(), config, observer))
    }

    fn build(guid: String, config: WorldConfig, observer: O) -> Self {
        Self {
            guid,
            config,
            materials: MaterialRegistry::new(config.material_capacity),
            behaviors: BehaviorRegistry::new(config.behavior_capacity),
            islands: IslandIndex::new(config.island_capacity, config.island_size, config.island_lifetime),
            observer,
            remap: HashMap::new(),
        }
    }

    /// Returns the world's identifier.
    #[must_use]
    pub fn guid(&self) -> &str {
        &self.guid
    }

    /// Returns the configuration the world was built with.
    #[must_use]
    pub const fn config(&self) -> &WorldConfig {
        &self.config
    }

    /// Returns the material registry.
    #[must_use]
    pub const fn materials(&self) -> &MaterialRegistry {
        &self.materials
    }

    /// Returns the behavior registry.
    #[must_use]
    pub const fn behaviors(&self) -> &BehaviorRegistry {
        &self.behaviors
    }

    /// Returns the island index.
    #[must_use]
    pub const fn islands(&self) -> &IslandIndex {
        &self.islands
    }

    /// Returns the observer.
    #[must_use]
    pub const fn observer(&self) -> &O {
        &self.observer
    }

    /// Returns the observer mutably.
    pub fn observer_mut(&mut self) -> &mut O {
        &mut self.observer
    }

    // =========================================================================
    // PLACEMENT
    // =========================================================================

    /// Places one tile and returns the stored record.
    ///
    /// # Errors
    ///
    /// Returns [`SubtileError::CapacityExceeded`] if the target island, the
    /// island pool, the material pool or the behavior pool is full, or
    /// [`SubtileError::InvalidHandle`] if an explicit handle is not live, or
    /// [`SubtileError::PositionOutOfRange`] if the position is not finite or
    /// lies beyond the island grid. Nothing changes on failure.
    pub fn place(&mut self, request: &PlacementRequest) -> SubtileResult<Tile> {
        self.try_place(request).map_err(|error| {
            self.observer.placement_rejected(&error);
            error
        })
    }

    fn try_place(&mut self, request: &PlacementRequest) -> SubtileResult<Tile> {
        let transform = request.transform;
        let key = self.islands.key_for(transform.altitude, transform.position)?;
        let behavior = Behavior::default();

        self.islands.check_place(&key)?;
        self.materials
            .check_place(&request.material.label, request.material.handle)?;
        self.behaviors.check_place(&behavior, request.behavior.handle)?;

        let (material, created) = self
            .materials
            .place_or_reuse(request.material.label, request.material.handle)?;
        if created {
            self.observer.material_created(material, &request.material.label);
        }

        let (behavior, created) = self.behaviors.place_or_reuse(behavior, request.behavior.handle)?;
        if created {
            self.observer.behavior_created(behavior);
        }

        let tile = Tile::new(transform, material, behavior);
        if self.islands.place(tile)? {
            self.observer.island_created(key);
        }

        Ok(tile)
    }

    // =========================================================================
    // MATERIALS
    // =========================================================================

    /// Clones a canonical material into a private instance. Place tiles with
    /// the returned handle to give them their own mutable state.
    ///
    /// # Errors
    ///
    /// See [`MaterialRegistry::instantiate`].
    pub fn instantiate_material(&mut self, base: MaterialHandle) -> SubtileResult<MaterialHandle> {
        let instance = self.materials.instantiate(base)?;
        self.observer.instance_created(instance, base);
        Ok(instance)
    }

    /// Releases an instance and returns its parent.
    ///
    /// Tiles still holding the instance handle are left as they are.
    ///
    /// # Errors
    ///
    /// See [`MaterialRegistry::uninstantiate`].
    pub fn uninstantiate_material(&mut self, instance: MaterialHandle) -> SubtileResult<MaterialHandle> {
        let parent = self.materials.uninstantiate(instance)?;
        self.observer.instance_removed(instance, parent);
        Ok(parent)
    }

    /// Returns a material for mutation.
    ///
    /// # Errors
    ///
    /// Returns [`SubtileError::InvalidHandle`] if `handle` is not live.
    pub fn material_mut(&mut self, handle: MaterialHandle) -> SubtileResult<&mut Material> {
        if !self.materials.is_live(handle) {
            return Err(SubtileError::InvalidHandle(handle.to_raw()));
        }
        self.materials.resolve_mut(handle)
    }

    /// Registers a new behavior row.
    ///
    /// # Errors
    ///
    /// Returns [`SubtileError::CapacityExceeded`] if the behavior pool is
    /// full.
    pub fn create_behavior(&mut self, behavior: Behavior) -> SubtileResult<BehaviorHandle> {
        let handle = self.behaviors.create(behavior)?;
        self.observer.behavior_created(handle);
        Ok(handle)
    }

    // =========================================================================
    // TRAVERSAL
    // =========================================================================

    /// Walks the whole world: every active material, then every active
    /// behavior, then every tile in island order.
    ///
    /// # Errors
    ///
    /// Returns [`SubtileError::OutOfRange`] if a tile references a slot that
    /// was never populated.
    pub fn visit<V: Visitor + ?Sized>(&self, visitor: &mut V) -> SubtileResult<()> {
        for (handle, material) in self.materials.active() {
            visitor.on_material(handle, material);
        }
        for (handle, behavior) in self.behaviors.active() {
            visitor.on_behavior(handle, behavior);
        }
        for island in self.islands.islands() {
            for tile in island.tiles() {
                self.visit_tile(tile, visitor)?;
            }
        }
        Ok(())
    }

    /// Walks only the tiles inside `bounds`, edges included. No material or
    /// behavior callbacks fire.
    ///
    /// # Errors
    ///
    /// Same as [`visit`](Self::visit).
    pub fn visit_bounded<V: Visitor + ?Sized>(&self, bounds: &Bounds, visitor: &mut V) -> SubtileResult<()> {
        for island in self.islands.islands().filter(|island| island.bounds().overlaps(bounds)) {
            for tile in island
                .tiles()
                .iter()
                .filter(|tile| bounds.contains(tile.altitude, tile.position()))
            {
                self.visit_tile(tile, visitor)?;
            }
        }
        Ok(())
    }

    fn visit_tile<V: Visitor + ?Sized>(&self, tile: &Tile, visitor: &mut V) -> SubtileResult<()> {
        let material = self.materials.resolve_raw(tile.material)?;
        let behavior = self.behaviors.resolve_raw(tile.behavior)?;
        visitor.on_tile(&tile.transform(), material, behavior);
        Ok(())
    }

    // =========================================================================
    // DECAY
    // =========================================================================

    /// Advances island lifetimes by `ticks` and evicts expired islands with
    /// their tiles. Instances held by evicted tiles go back to the pool once
    /// no tile in a surviving island uses them. Returns the evicted keys,
    /// oldest island first.
    pub fn step(&mut self, ticks: u32) -> Vec<IslandKey> {
        let observer = &mut self.observer;
        let mut orphans: Vec<MaterialHandle> = Vec::new();

        let evicted = self.islands.decay(ticks, |island| {
            for handle in island.tiles().iter().map(Tile::material_handle) {
                if handle.is_instance() && !orphans.contains(&handle) {
                    orphans.push(handle);
                }
            }
            observer.island_evicted(island.key(), island.len());
        });
        if orphans.is_empty() {
            return evicted;
        }

        for tile in self.islands.islands().flat_map(|island| island.tiles()) {
            orphans.retain(|&handle| handle.to_raw() != tile.material);
        }
        for handle in orphans {
            if let Ok(parent) = self.materials.uninstantiate(handle) {
                self.observer.instance_removed(handle, parent);
            }
        }

        evicted
    }

    // =========================================================================
    // PERSISTENCE
    // =========================================================================

    /// Encodes the world into frames: `"materials"` frames (canonical rows
    /// other than the default, then instances held by tiles), then `"tiles"`
    /// frames in island order.
    ///
    /// # Errors
    ///
    /// Returns [`SubtileError::OutOfRange`] if a tile references a slot that
    /// was never populated.
    pub fn pack(&self) -> SubtileResult<Vec<Frame>> {
        let mut records: Vec<MaterialRecord> = self
            .materials
            .active()
            .filter(|(handle, _)| *handle != MaterialHandle::Default)
            .map(|(handle, material)| MaterialRecord::new(handle, material))
            .collect();

        let mut instances: Vec<MaterialHandle> = Vec::new();
        let mut tiles: Vec<Tile> = Vec::new();
        for island in self.islands.islands() {
            for tile in island.tiles() {
                let handle = tile.material_handle();
                if handle.is_instance() && !instances.contains(&handle) {
                    instances.push(handle);
                }
                tiles.push(*tile);
            }
        }
        for handle in instances {
            records.push(MaterialRecord::new(handle, self.materials.resolve(handle)?));
        }

        let mut frames = Vec::new();
        pack_records(MATERIALS_FRAME, &records, &mut frames)?;
        pack_records(TILES_FRAME, &tiles, &mut frames)?;
        Ok(frames)
    }

    /// Applies one frame produced by [`pack`](Self::pack), returning how many
    /// records it held.
    ///
    /// Material handles are remapped: canonical rows by label, instances
    /// re-cloned from their remapped parent. Tiles are placed through the
    /// normal placement path. A tiles frame must follow the materials frames
    /// it refers to.
    ///
    /// # Errors
    ///
    /// Returns [`SubtileError::FrameTagMismatch`] for an unknown frame name,
    /// [`SubtileError::InvalidHandle`] for a handle no earlier frame defined,
    /// or any placement or decoding error. Records before the failing one
    /// stay applied.
    pub fn parse(&mut self, frame: &Frame) -> SubtileResult<usize> {
        let result = if frame.is_named(MATERIALS_FRAME) {
            self.parse_materials(frame)
        } else if frame.is_named(TILES_FRAME) {
            self.parse_tiles(frame)
        } else {
            Err(SubtileError::FrameTagMismatch)
        };

        if let Err(error) = &result {
            self.observer.frame_rejected(frame.name().unwrap_or_default(), error);
        }
        result
    }

    /// Applies a full packed world. Returns the number of records applied.
    ///
    /// # Errors
    ///
    /// Stops at the first frame [`parse`](Self::parse) rejects.
    pub fn restore(&mut self, frames: &[Frame]) -> SubtileResult<usize> {
        self.remap.clear();
        frames.iter().try_fold(0, |total, frame| Ok(total + self.parse(frame)?))
    }

    fn parse_materials(&mut self, frame: &Frame) -> SubtileResult<usize> {
        let records = frame.decode_vec::<MaterialRecord>(MATERIALS_FRAME)?;

        for record in &records {
            let label = Label::from_bytes(*record.label.as_bytes())?;
            let handle = match record.material_handle() {
                MaterialHandle::Default => MaterialHandle::Default,
                MaterialHandle::Canonical(_) => {
                    let (handle, created) = self.materials.place_or_reuse(label, MaterialHandle::Default)?;
                    if created {
                        self.observer.material_created(handle, &label);
                    }
                    handle
                }
                MaterialHandle::Instance(_) => {
                    let source_parent = record.values[MaterialValue::Base as usize].get();
                    let parent = self
                        .remap
                        .get(&source_parent)
                        .copied()
                        .ok_or(SubtileError::InvalidHandle(source_parent))?;
                    self.instantiate_material(parent)?
                }
            };

            let material = self.materials.resolve_mut(handle)?;
            for kind in MaterialValue::ALL.into_iter().filter(|kind| *kind != MaterialValue::Base) {
                material.set_value(kind, record.values[kind as usize]);
            }
            self.remap.insert(record.handle, handle);
        }

        Ok(records.len())
    }

    fn parse_tiles(&mut self, frame: &Frame) -> SubtileResult<usize> {
        let tiles = frame.decode_vec::<Tile>(TILES_FRAME)?;

        for tile in &tiles {
            let material = match tile.material {
                0 => MaterialHandle::Default,
                raw => self
                    .remap
                    .get(&raw)
                    .copied()
                    .ok_or(SubtileError::InvalidHandle(raw))?,
            };
            // Behaviors carry no content, so unknown ones fall back to the default.
            let behavior = BehaviorHandle::from_raw(tile.behavior)
                .filter(|handle| self.behaviors.is_live(*handle))
                .unwrap_or_default();

            let request = PlacementRequest {
                transform: tile.transform(),
                material: MaterialRequest {
                    label: self.materials.resolve(material)?.label,
                    handle: material,
                },
                behavior: BehaviorRequest { handle: behavior },
            };
            self.try_place(&request)?;
        }

        Ok(tiles.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observer::NullObserver;
    use crate::DEFAULT_MATERIAL;
    use subtile_core::{Transform, Value};

    #[derive(Default)]
    struct Collect {
        materials: Vec<MaterialHandle>,
        behaviors: usize,
        tiles: Vec<(Transform, Label)>,
    }

    impl Visitor for Collect {
        fn on_material(&mut self, handle: MaterialHandle, _material: &Material) {
            self.materials.push(handle);
        }

        fn on_behavior(&mut self, _handle: BehaviorHandle, _behavior: &Behavior) {
            self.behaviors += 1;
        }

        fn on_tile(&mut self, transform: &Transform, material: &Material, _behavior: &Behavior) {
            self.tiles.push((*transform, material.label));
        }
    }

    fn world() -> World<NullObserver> {
        World::with_observer("test", WorldConfig::default(), NullObserver).unwrap()
    }

    fn label(name: &str) -> Label {
        Label::new(name).unwrap()
    }

    #[test]
    fn test_place_default_material() {
        let mut world = world();
        let tile = world.place(&PlacementRequest::new(0, 2.0, -1.0, 0.0)).unwrap();
        assert_eq!(tile.material_handle(), MaterialHandle::Default);
        assert_eq!(world.materials().live_count(), 1);

        let mut collect = Collect::default();
        world.visit(&mut collect).unwrap();
        assert_eq!(collect.materials, vec![MaterialHandle::Default]);
        assert_eq!(collect.behaviors, 1);
        assert_eq!(collect.tiles, vec![(Transform::new(0, 2.0, -1.0, 0.0), DEFAULT_MATERIAL)]);
    }

    #[test]
    fn test_placement_reuses_labels() {
        let mut world = world();
        let request = PlacementRequest::new(0, 0.0, 0.0, 0.0).with_label(label("stone"));
        let first = world.place(&request).unwrap();
        let second = world.place(&request).unwrap();
        assert_eq!(first.material, second.material);
        assert_eq!(world.materials().live_count(), 2);
    }

    #[test]
    fn test_rejected_placement_commits_nothing() {
        let config = WorldConfig {
            island_capacity: 2,
            ..WorldConfig::default()
        };
        let mut world = World::with_observer("test", config, NullObserver).unwrap();
        world.place(&PlacementRequest::new(0, 0.0, 0.0, 0.0)).unwrap();

        // New island needed, none left: the new label must not be registered.
        let request = PlacementRequest::new(0, 8.0, 0.0, 0.0).with_label(label("sand"));
        assert_eq!(
            world.place(&request),
            Err(SubtileError::CapacityExceeded { what: "islands", capacity: 2 })
        );
        assert_eq!(world.materials().find(&label("sand")), None);
        assert_eq!(world.islands().len(), 1);
    }

    #[test]
    fn test_bounded_visit() {
        let mut world = world();
        for (x, y) in [(0.0, 0.0), (2.0, 2.0), (2.5, 0.0), (-3.0, -3.0), (9.0, 9.0)] {
            world.place(&PlacementRequest::new(0, x, y, 0.0)).unwrap();
        }
        world.place(&PlacementRequest::new(1, 0.0, 0.0, 0.0)).unwrap();

        let mut collect = Collect::default();
        world
            .visit_bounded(&Bounds::new(0, -2.0, -2.0, 0, 2.0, 2.0), &mut collect)
            .unwrap();
        assert!(collect.materials.is_empty());
        assert_eq!(collect.behaviors, 0);

        let positions: Vec<_> = collect.tiles.iter().map(|(t, _)| (t.position.x, t.position.y)).collect();
        assert_eq!(positions, vec![(0.0, 0.0), (2.0, 2.0)]);
    }

    #[test]
    fn test_step_evicts_and_returns_instances() {
        let mut world = world();
        let stone = world
            .place(&PlacementRequest::new(0, 0.0, 0.0, 0.0).with_label(label("stone")))
            .unwrap()
            .material_handle();
        let instance = world.instantiate_material(stone).unwrap();
        world
            .place(&PlacementRequest::new(0, 1.0, 0.0, 0.0).with_material(instance))
            .unwrap();
        world
            .place(&PlacementRequest::new(0, 2.0, 0.0, 0.0).with_material(instance))
            .unwrap();
        assert!(world.materials().is_live(instance));

        assert!(world.step(100).is_empty());
        assert_eq!(world.step(28), vec![IslandKey::new(0, 0, 0)]);
        assert!(world.islands().is_empty());
        assert!(!world.materials().is_live(instance));
        assert!(world.materials().is_live(stone));
    }

    #[test]
    fn test_step_keeps_instances_used_elsewhere() {
        let mut world = world();
        let stone = world
            .place(&PlacementRequest::new(0, 0.0, 0.0, 0.0).with_label(label("stone")))
            .unwrap()
            .material_handle();
        let instance = world.instantiate_material(stone).unwrap();
        for x in [1.0, 5.0] {
            world
                .place(&PlacementRequest::new(0, x, 0.0, 0.0).with_material(instance))
                .unwrap();
        }

        world.step(100);
        world.place(&PlacementRequest::new(0, 6.0, 0.0, 0.0)).unwrap();
        assert_eq!(world.step(28), vec![IslandKey::new(0, 0, 0)]);
        assert!(world.materials().is_live(instance));

        // A new row must not take the instance's slot.
        let sand = world
            .place(&PlacementRequest::new(0, 7.0, 0.0, 0.0).with_label(label("sand")))
            .unwrap()
            .material_handle();
        assert_ne!(sand.slot(), instance.slot());

        let mut collect = Collect::default();
        world.visit(&mut collect).unwrap();
        let labels: Vec<_> = collect.tiles.iter().map(|(_, label)| *label).collect();
        assert_eq!(labels, vec![label("stone"), DEFAULT_MATERIAL, label("sand")]);

        assert_eq!(world.step(128), vec![IslandKey::new(0, 4, 0)]);
        assert!(!world.materials().is_live(instance));
        assert!(world.materials().is_live(stone));
    }

    #[test]
    fn test_placement_outside_grid_rejected() {
        let mut world = world();
        for (x, y) in [(3.0e9, 0.0), (-3.0e9, 0.0), (f32::NAN, 0.0), (0.0, f32::NEG_INFINITY)] {
            let request = PlacementRequest::new(0, x, y, 0.0).with_label(label("stone"));
            assert_eq!(world.place(&request), Err(SubtileError::PositionOutOfRange));
        }
        assert!(world.islands().is_empty());
        assert_eq!(world.materials().find(&label("stone")), None);

        world.place(&PlacementRequest::new(0, 2.0e9, -2.0e9, 0.0)).unwrap();
        let mut collect = Collect::default();
        world
            .visit_bounded(&Bounds::new(0, 1.9e9, -2.1e9, 0, 2.1e9, -1.9e9), &mut collect)
            .unwrap();
        assert_eq!(collect.tiles.len(), 1);
    }

    #[test]
    fn test_material_mut() {
        let mut world = world();
        let stone = world.place(&PlacementRequest::new(0, 0.0, 0.0, 0.0).with_label(label("stone"))).unwrap();
        let instance = world.instantiate_material(stone.material_handle()).unwrap();

        world
            .material_mut(instance)
            .unwrap()
            .set_value(MaterialValue::Hitpoints, Value(0));
        assert!(world.materials().resolve(instance).unwrap().destroyed());
        assert_eq!(world.uninstantiate_material(instance), Ok(stone.material_handle()));
        assert_eq!(world.material_mut(instance).err(), Some(SubtileError::InvalidHandle(instance.to_raw())));
    }

    #[test]
    fn test_parse_rejects_unknown_frame() {
        let mut world = world();
        let mut frame = Frame::new();
        frame.encode("islands", &[1u32, 2, 3]).unwrap();
        assert_eq!(world.parse(&frame), Err(SubtileError::FrameTagMismatch));
    }

    #[test]
    fn test_parse_unknown_material_handle() {
        let mut world = world();
        let tile = Tile::new(Transform::new(0, 0.0, 0.0, 0.0), MaterialHandle::Canonical(5), BehaviorHandle::Default);
        let mut frame = Frame::new();
        frame.encode(TILES_FRAME, &[tile]).unwrap();
        assert_eq!(world.parse(&frame), Err(SubtileError::InvalidHandle(5)));
        assert!(world.islands().is_empty());
    }
}
