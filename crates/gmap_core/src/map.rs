//! A seamless map made of a grid of lazily loaded levels
//!
//! Global tile coordinates span the whole map; they are split into a grid
//! cell (which level) and a local coordinate (where inside that level).
//! Levels are loaded from the map's [`LevelMapSource`] the first time a cell
//! is touched and stay cached afterwards.

use crate::nw;
use crate::{
    FileResolver, GmapSource, Level, LevelMapSource, LevelSize, MapError, Npc, Result,
    SingleLevelSource, Tile,
};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Stable handle to an NPC: the level cell it lives in plus its level-local id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NpcRef {
    pub level_x: usize,
    pub level_y: usize,
    pub id: u32,
}

impl NpcRef {
    pub fn new(level_x: usize, level_y: usize, id: u32) -> Self {
        Self {
            level_x,
            level_y,
            id,
        }
    }
}

/// Notification that the level at a grid cell was modified
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "bevy", derive(bevy::ecs::message::Message))]
pub struct LevelChanged {
    pub level_x: usize,
    pub level_y: usize,
}

/// An NPC stopped being reachable through `from` and now lives at `to`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NpcRelocated {
    pub from: NpcRef,
    pub to: NpcRef,
}

/// Grid of levels with global tile and NPC addressing
pub struct LevelMap {
    level_size: LevelSize,
    width: usize,
    height: usize,
    levels: Vec<Option<Level>>,
    /// Per cell, the lowest NPC id not yet handed out by any level held there
    id_floors: Vec<u32>,
    source: Option<Box<dyn LevelMapSource>>,
    changes: Vec<LevelChanged>,
    relocations: Vec<NpcRelocated>,
}

impl std::fmt::Debug for LevelMap {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LevelMap")
            .field("level_size", &self.level_size)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("loaded", &self.loaded_levels().count())
            .finish_non_exhaustive()
    }
}

impl LevelMap {
    /// Create an empty map without a source
    pub fn new(level_size: LevelSize) -> Self {
        Self {
            level_size,
            width: 0,
            height: 0,
            levels: Vec::new(),
            id_floors: Vec::new(),
            source: None,
            changes: Vec::new(),
            relocations: Vec::new(),
        }
    }

    /// Create a map shaped like `source` that loads its levels on demand
    pub fn with_source(source: Box<dyn LevelMapSource>, level_size: LevelSize) -> Self {
        let mut map = Self::new(level_size);
        map.set_size(source.width(), source.height());
        map.source = Some(source);
        map
    }

    /// Open a single level file as a 1x1 map
    pub fn open_level_file(path: &Path, level_size: LevelSize) -> Result<Self> {
        let level = nw::load_level(path, level_size)?;
        let mut map = Self::with_source(Box::new(SingleLevelSource::new(path)), level_size);
        map.set_level(level, 0, 0);
        map.changes.clear();
        Ok(map)
    }

    /// Open a map descriptor; its levels load when first accessed
    pub fn open_gmap(
        path: &Path,
        resolver: Box<dyn FileResolver>,
        level_size: LevelSize,
    ) -> Result<Self> {
        let source = GmapSource::load(path, resolver)?;
        Ok(Self::with_source(Box::new(source), level_size))
    }

    pub fn source(&self) -> Option<&dyn LevelMapSource> {
        self.source.as_deref()
    }

    pub fn source_mut(&mut self) -> Option<&mut (dyn LevelMapSource + 'static)> {
        self.source.as_deref_mut()
    }

    pub fn set_source(&mut self, source: Box<dyn LevelMapSource>) {
        self.source = Some(source);
    }

    /// Size of the map in levels
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Size of the map in tiles
    pub fn width_tiles(&self) -> usize {
        self.width * self.level_size.width
    }

    pub fn height_tiles(&self) -> usize {
        self.height * self.level_size.height
    }

    /// Size of every level in tiles
    pub fn level_size(&self) -> LevelSize {
        self.level_size
    }

    /// Reshape the grid, keeping every loaded level that still fits
    pub fn set_size(&mut self, width: usize, height: usize) {
        let mut levels: Vec<Option<Level>> = Vec::with_capacity(width * height);
        levels.resize_with(width * height, || None);
        let mut id_floors = vec![0; width * height];
        for y in 0..self.height.min(height) {
            for x in 0..self.width.min(width) {
                levels[y * width + x] = self.levels[y * self.width + x].take();
                id_floors[y * width + x] = self.id_floors[y * self.width + x];
            }
        }
        self.width = width;
        self.height = height;
        self.levels = levels;
        self.id_floors = id_floors;
    }

    /// Put a level into a cell. NPC ids of earlier levels in the cell are
    /// never reused, so stale [`NpcRef`]s cannot reach the new level's NPCs.
    fn install(&mut self, index: usize, mut level: Level) {
        self.retire(index);
        level.reserve_npc_ids(self.id_floors[index]);
        self.levels[index] = Some(level);
    }

    fn retire(&mut self, index: usize) -> Option<Level> {
        let level = self.levels[index].take()?;
        self.id_floors[index] = self.id_floors[index].max(level.next_npc_id());
        Some(level)
    }

    fn cell_index(&self, x: usize, y: usize) -> Result<usize> {
        if x < self.width && y < self.height {
            Ok(y * self.width + x)
        } else {
            Err(MapError::out_of_bounds(
                x as i64,
                y as i64,
                self.width,
                self.height,
            ))
        }
    }

    /// The level at a cell, loading it from the source on first access.
    ///
    /// `Ok(None)` when the source has no level for the cell; the load is
    /// retried on the next call.
    pub fn get_level(&mut self, x: usize, y: usize) -> Result<Option<&mut Level>> {
        let index = self.cell_index(x, y)?;
        if self.levels[index].is_none() {
            let loaded = match &self.source {
                Some(source) => source.load_level(x, y, self.level_size)?,
                None => None,
            };
            if let Some(level) = loaded {
                self.install(index, level);
            }
        }
        Ok(self.levels[index].as_mut())
    }

    /// Like [`get_level`](Self::get_level), failing with `LevelNotLoaded` when there is no level
    pub fn require_level(&mut self, x: usize, y: usize) -> Result<&mut Level> {
        self.get_level(x, y)?
            .ok_or(MapError::LevelNotLoaded { x, y })
    }

    /// The level at a cell if it is already loaded
    pub fn loaded_level(&self, x: usize, y: usize) -> Option<&Level> {
        let index = self.cell_index(x, y).ok()?;
        self.levels[index].as_ref()
    }

    /// All loaded levels with their cell coordinates
    pub fn loaded_levels(&self) -> impl Iterator<Item = (usize, usize, &Level)> {
        let width = self.width.max(1);
        self.levels
            .iter()
            .enumerate()
            .filter_map(move |(i, level)| level.as_ref().map(|l| (i % width, i / width, l)))
    }

    /// Place a level into a cell, growing the grid if needed.
    ///
    /// Any level previously cached at that cell is dropped.
    pub fn set_level(&mut self, level: Level, x: usize, y: usize) {
        if x >= self.width || y >= self.height {
            let width = if x >= self.width {
                (self.width * 2).max(x + 1)
            } else {
                self.width
            };
            let height = if y >= self.height {
                (self.height * 2).max(y + 1)
            } else {
                self.height
            };
            self.set_size(width, height);
        }
        self.install(y * self.width + x, level);
        self.notify(x, y);
    }

    /// Drop a cached level so the next access reloads it from the source
    pub fn unload_level(&mut self, x: usize, y: usize) -> Option<Level> {
        let index = self.cell_index(x, y).ok()?;
        self.retire(index)
    }

    /// Write the level at a cell through the source. Unloaded cells are skipped.
    pub fn save_level(&self, x: usize, y: usize) -> Result<()> {
        let Some(level) = self.loaded_level(x, y) else {
            return Ok(());
        };
        match &self.source {
            Some(source) => source.save_level(x, y, level),
            None => {
                tracing::debug!("Level ({}, {}) has no source to save to", x, y);
                Ok(())
            }
        }
    }

    /// Split a global tile position into (cell x, cell y, local x, local y)
    pub fn locate(&self, x: usize, y: usize) -> Result<(usize, usize, usize, usize)> {
        if x >= self.width_tiles() || y >= self.height_tiles() {
            return Err(MapError::out_of_bounds(
                x as i64,
                y as i64,
                self.width_tiles(),
                self.height_tiles(),
            ));
        }
        let LevelSize { width, height } = self.level_size;
        Ok((x / width, y / height, x % width, y % height))
    }

    /// Tile at a global position, loading its level and creating the layer if needed
    pub fn get_tile(&mut self, x: usize, y: usize, layer: usize) -> Result<Tile> {
        let (level_x, level_y, tile_x, tile_y) = self.locate(x, y)?;
        self.require_level(level_x, level_y)?
            .ensure_layer(layer)
            .tile(tile_x, tile_y)
    }

    /// Set the tile at a global position and notify that its level changed
    pub fn set_tile(&mut self, x: usize, y: usize, layer: usize, tile: Tile) -> Result<()> {
        let (level_x, level_y, tile_x, tile_y) = self.locate(x, y)?;
        self.require_level(level_x, level_y)?
            .set_tile(tile_x, tile_y, layer, tile)?;
        self.notify(level_x, level_y);
        Ok(())
    }

    /// NPCs of the level containing the global tile position
    pub fn npcs_at(&mut self, x: usize, y: usize) -> Result<&[Npc]> {
        let (level_x, level_y, _, _) = self.locate(x, y)?;
        Ok(self.require_level(level_x, level_y)?.npcs())
    }

    fn not_found(npc: &NpcRef) -> MapError {
        MapError::NotFound {
            level_x: npc.level_x,
            level_y: npc.level_y,
            id: npc.id,
        }
    }

    /// Look up an NPC in an already loaded level
    pub fn npc(&self, npc: &NpcRef) -> Result<&Npc> {
        self.loaded_level(npc.level_x, npc.level_y)
            .and_then(|level| level.npc(npc.id))
            .ok_or_else(|| Self::not_found(npc))
    }

    /// Look up an NPC for editing, loading its level if needed.
    ///
    /// The level is reported as changed.
    pub fn npc_mut(&mut self, npc: &NpcRef) -> Result<&mut Npc> {
        if self
            .require_level(npc.level_x, npc.level_y)?
            .npc(npc.id)
            .is_none()
        {
            return Err(Self::not_found(npc));
        }
        self.notify(npc.level_x, npc.level_y);
        self.require_level(npc.level_x, npc.level_y)?
            .npc_mut(npc.id)
            .ok_or_else(|| Self::not_found(npc))
    }

    /// Add an NPC to the level at a cell, giving it a fresh id there
    pub fn add_npc(&mut self, level_x: usize, level_y: usize, npc: Npc) -> Result<NpcRef> {
        let id = self.require_level(level_x, level_y)?.add_npc(npc).id;
        self.notify(level_x, level_y);
        Ok(NpcRef::new(level_x, level_y, id))
    }

    /// Reference the next NPC added to a cell will get
    pub fn next_npc_ref(&mut self, level_x: usize, level_y: usize) -> Result<NpcRef> {
        let id = self.require_level(level_x, level_y)?.next_npc_id();
        Ok(NpcRef::new(level_x, level_y, id))
    }

    /// Put back an NPC that used to be reachable through `previous`.
    ///
    /// It gets a fresh id; the change of reference is queued as a relocation.
    pub fn restore_npc(&mut self, previous: NpcRef, npc: Npc) -> Result<NpcRef> {
        let restored = self.add_npc(previous.level_x, previous.level_y, npc)?;
        if restored != previous {
            self.relocations.push(NpcRelocated {
                from: previous,
                to: restored,
            });
        }
        Ok(restored)
    }

    /// Remove an NPC and return it
    pub fn delete_npc(&mut self, npc: &NpcRef) -> Result<Npc> {
        let removed = self
            .require_level(npc.level_x, npc.level_y)?
            .remove_npc(npc.id)
            .ok_or_else(|| Self::not_found(npc))?;
        self.notify(npc.level_x, npc.level_y);
        Ok(removed)
    }

    /// Position of an NPC in global tile coordinates
    pub fn global_npc_position(&self, npc: &NpcRef) -> Result<(f32, f32)> {
        let found = self.npc(npc)?;
        let LevelSize { width, height } = self.level_size;
        Ok((
            (npc.level_x * width) as f32 + found.level_x(),
            (npc.level_y * height) as f32 + found.level_y(),
        ))
    }

    /// Move an NPC to a global position (in tiles, half-tile resolution).
    ///
    /// When the position falls into another level the NPC is re-homed there
    /// with a new id and `npc` is updated to point at it.
    pub fn move_npc(&mut self, npc: &mut NpcRef, x: f32, y: f32) -> Result<&Npc> {
        let half_width = (self.level_size.width * 2) as i64;
        let half_height = (self.level_size.height * 2) as i64;
        let half_x = (x * 2.0).floor() as i64;
        let half_y = (y * 2.0).floor() as i64;
        if half_x < 0
            || half_y < 0
            || half_x >= self.width as i64 * half_width
            || half_y >= self.height as i64 * half_height
        {
            return Err(MapError::out_of_bounds(
                x.floor() as i64,
                y.floor() as i64,
                self.width_tiles(),
                self.height_tiles(),
            ));
        }

        let level_x = (half_x / half_width) as usize;
        let level_y = (half_y / half_height) as usize;
        let local_x = (half_x % half_width) as i32;
        let local_y = (half_y % half_height) as i32;

        let current = self.npc_mut(npc)?;
        if (level_x, level_y) == (npc.level_x, npc.level_y) {
            current.x = local_x;
            current.y = local_y;
            self.notify(level_x, level_y);
            return self.npc(npc);
        }

        let mut moved = current.clone();
        moved.x = local_x;
        moved.y = local_y;

        // The destination has to exist before the NPC leaves its level
        let id = self.require_level(level_x, level_y)?.add_npc(moved).id;
        self.require_level(npc.level_x, npc.level_y)?
            .remove_npc(npc.id);

        let from = *npc;
        *npc = NpcRef::new(level_x, level_y, id);
        self.relocations.push(NpcRelocated { from, to: *npc });
        self.notify(from.level_x, from.level_y);
        self.notify(level_x, level_y);
        tracing::debug!(
            "NPC {} moved from level ({}, {}) to ({}, {}) as {}",
            from.id,
            from.level_x,
            from.level_y,
            level_x,
            level_y,
            id
        );
        self.npc(npc)
    }

    fn notify(&mut self, level_x: usize, level_y: usize) {
        let change = LevelChanged { level_x, level_y };
        if self.changes.last() != Some(&change) {
            self.changes.push(change);
        }
    }

    /// Drain pending level-changed notifications
    pub fn take_changes(&mut self) -> Vec<LevelChanged> {
        std::mem::take(&mut self.changes)
    }

    /// Drain pending NPC relocations
    pub fn take_relocations(&mut self) -> Vec<NpcRelocated> {
        std::mem::take(&mut self.relocations)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::LevelNames;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Source producing generated levels and counting loads
    struct CountingSource {
        names: LevelNames,
        loads: Arc<AtomicUsize>,
    }

    impl CountingSource {
        fn new(width: usize, height: usize) -> (Self, Arc<AtomicUsize>) {
            let mut names = LevelNames::new(width, height);
            for y in 0..height {
                for x in 0..width {
                    names.set(x, y, format!("level_{}_{}.nw", x, y));
                }
            }
            let loads = Arc::new(AtomicUsize::new(0));
            (
                Self {
                    names,
                    loads: loads.clone(),
                },
                loads,
            )
        }
    }

    impl LevelMapSource for CountingSource {
        fn names(&self) -> &LevelNames {
            &self.names
        }

        fn names_mut(&mut self) -> &mut LevelNames {
            &mut self.names
        }

        fn resolve(&self, _name: &str) -> Option<PathBuf> {
            None
        }

        fn load_level(&self, x: usize, y: usize, size: LevelSize) -> Result<Option<Level>> {
            if self.level_name(x, y).is_empty() {
                return Ok(None);
            }
            self.loads.fetch_add(1, Ordering::SeqCst);
            Ok(Some(Level::with_fill(size, Tile::new((x + y * 10) as i32))))
        }
    }

    fn size() -> LevelSize {
        LevelSize::new(4, 4)
    }

    fn two_by_one() -> (LevelMap, Arc<AtomicUsize>) {
        let (source, loads) = CountingSource::new(2, 1);
        (LevelMap::with_source(Box::new(source), size()), loads)
    }

    #[test]
    fn test_lazy_load_happens_once() {
        let (mut map, loads) = two_by_one();
        assert_eq!((map.width(), map.height()), (2, 1));
        assert_eq!(loads.load(Ordering::SeqCst), 0);

        assert!(map.get_level(1, 0).unwrap().is_some());
        assert!(map.get_level(1, 0).unwrap().is_some());
        assert_eq!(loads.load(Ordering::SeqCst), 1);
        assert!(map.loaded_level(0, 0).is_none());
    }

    #[test]
    fn test_missing_levels_are_retried() {
        let (mut source, loads) = CountingSource::new(2, 1);
        source.names.set(1, 0, "");
        let mut map = LevelMap::with_source(Box::new(source), size());

        assert!(map.get_level(1, 0).unwrap().is_none());
        map.source_mut().unwrap().set_level_name(1, 0, "late.nw");
        assert!(map.get_level(1, 0).unwrap().is_some());
        assert_eq!(loads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_out_of_bounds_level() {
        let (mut map, _) = two_by_one();
        assert!(matches!(
            map.get_level(2, 0),
            Err(MapError::OutOfBounds { x: 2, y: 0, .. })
        ));
        assert!(matches!(
            map.get_tile(8, 0, 0),
            Err(MapError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_global_tile_addressing() {
        let (mut map, _) = two_by_one();
        assert_eq!(map.width_tiles(), 8);
        assert_eq!(map.get_tile(5, 1, 0).unwrap(), Tile::new(1));
        assert_eq!(map.get_tile(3, 3, 0).unwrap(), Tile::new(0));

        map.set_tile(5, 2, 0, Tile::new(77)).unwrap();
        assert_eq!(map.loaded_level(1, 0).unwrap().tile(1, 2, 0).unwrap(), Tile::new(77));
        assert_eq!(
            map.take_changes(),
            vec![LevelChanged {
                level_x: 1,
                level_y: 0
            }]
        );
        assert!(map.take_changes().is_empty());
    }

    #[test]
    fn test_get_tile_creates_layers() {
        let (mut map, _) = two_by_one();
        assert_eq!(map.get_tile(0, 0, 2).unwrap(), Tile::default());
        assert_eq!(map.loaded_level(0, 0).unwrap().layer_count(), 3);
    }

    #[test]
    fn test_cell_without_level_is_reported() {
        let mut map = LevelMap::new(size());
        map.set_size(2, 1);
        assert!(matches!(
            map.get_tile(6, 0, 0),
            Err(MapError::LevelNotLoaded { x: 1, y: 0 })
        ));
    }

    #[test]
    fn test_set_level_grows_grid() {
        let mut map = LevelMap::new(size());
        map.set_level(Level::new(size()), 0, 0);
        assert_eq!((map.width(), map.height()), (1, 1));

        map.set_level(Level::with_fill(size(), Tile::new(3)), 2, 0);
        assert_eq!((map.width(), map.height()), (3, 1));
        assert!(map.loaded_level(0, 0).is_some());

        map.set_level(Level::new(size()), 3, 1);
        assert_eq!((map.width(), map.height()), (6, 2));
        assert_eq!(map.loaded_level(2, 0).unwrap().tile(0, 0, 0).unwrap(), Tile::new(3));

        map.set_level(Level::with_fill(size(), Tile::new(9)), 2, 0);
        assert_eq!(map.loaded_level(2, 0).unwrap().tile(0, 0, 0).unwrap(), Tile::new(9));
        assert_eq!(map.loaded_levels().count(), 3);
    }

    #[test]
    fn test_move_npc_within_level() {
        let (mut map, _) = two_by_one();
        let mut npc = map.add_npc(0, 0, Npc::new("a.png", "")).unwrap();
        let before = npc;

        let moved = map.move_npc(&mut npc, 2.5, 1.0).unwrap();
        assert_eq!((moved.x, moved.y), (5, 2));
        assert_eq!(npc, before);
        assert_eq!(map.global_npc_position(&npc).unwrap(), (2.5, 1.0));
        assert!(map.take_relocations().is_empty());
    }

    #[test]
    fn test_move_npc_across_levels() {
        let (mut map, _) = two_by_one();
        map.add_npc(1, 0, Npc::new("resident.png", "")).unwrap();
        let mut npc = map.add_npc(0, 0, Npc::new("a.png", "hi\n")).unwrap();
        map.move_npc(&mut npc, 3.5, 0.0).unwrap();
        let original = npc;

        let moved = map.move_npc(&mut npc, 4.5, 2.0).unwrap();
        assert_eq!(moved.image, "a.png");
        assert_eq!(moved.script, "hi\n");
        assert_eq!((moved.x, moved.y), (1, 4));

        assert_eq!(npc, NpcRef::new(1, 0, 2));
        assert!(map.loaded_level(0, 0).unwrap().npcs().is_empty());
        assert_eq!(map.loaded_level(1, 0).unwrap().npcs().len(), 2);
        assert_eq!(map.global_npc_position(&npc).unwrap(), (4.5, 2.0));
        assert_eq!(
            map.take_relocations(),
            vec![NpcRelocated {
                from: original,
                to: npc
            }]
        );
        assert!(matches!(
            map.npc(&original),
            Err(MapError::NotFound { id: 1, .. })
        ));
    }

    #[test]
    fn test_move_npc_outside_map_keeps_it() {
        let (mut map, _) = two_by_one();
        let mut npc = map.add_npc(0, 0, Npc::default()).unwrap();
        assert!(matches!(
            map.move_npc(&mut npc, 8.0, 0.0),
            Err(MapError::OutOfBounds { .. })
        ));
        assert!(map.move_npc(&mut npc, -0.5, 0.0).is_err());
        assert!(map.npc(&npc).is_ok());
    }

    #[test]
    fn test_delete_and_restore_npc() {
        let (mut map, _) = two_by_one();
        let npc = map.add_npc(1, 0, Npc::new("", "script\n")).unwrap();
        let removed = map.delete_npc(&npc).unwrap();
        assert!(map.delete_npc(&npc).is_err());

        let restored = map.restore_npc(npc, removed).unwrap();
        assert_ne!(restored.id, npc.id);
        assert_eq!(map.npc(&restored).unwrap().script, "script\n");
        assert_eq!(
            map.take_relocations(),
            vec![NpcRelocated {
                from: npc,
                to: restored
            }]
        );
    }

    #[test]
    fn test_restore_at_next_ref_keeps_the_reference() {
        let (mut map, _) = two_by_one();
        map.add_npc(1, 0, Npc::default()).unwrap();
        let next = map.next_npc_ref(1, 0).unwrap();
        let placed = map.restore_npc(next, Npc::new("bush.png", "")).unwrap();
        assert_eq!(placed, next);
        assert!(map.take_relocations().is_empty());
        assert!(matches!(
            map.next_npc_ref(5, 0),
            Err(MapError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn test_replaced_level_does_not_reuse_npc_ids() {
        let (mut map, _) = two_by_one();
        let old = map.add_npc(0, 0, Npc::new("old.png", "")).unwrap();

        let mut replacement = Level::new(size());
        replacement.add_npc(Npc::new("new.png", ""));
        map.set_level(replacement, 0, 0);
        assert!(matches!(map.npc(&old), Err(MapError::NotFound { .. })));
        assert!(map.loaded_level(0, 0).unwrap().npcs()[0].id > old.id);

        let stale = map.add_npc(1, 0, Npc::default()).unwrap();
        map.unload_level(1, 0).unwrap();
        assert!(map.get_level(1, 0).unwrap().is_some());
        assert!(matches!(map.npc(&stale), Err(MapError::NotFound { .. })));
        let added = map.add_npc(1, 0, Npc::default()).unwrap();
        assert!(added.id > stale.id);
    }

    #[test]
    fn test_npcs_at_global_position() {
        let (mut map, _) = two_by_one();
        map.add_npc(1, 0, Npc::default()).unwrap();
        assert_eq!(map.npcs_at(6, 3).unwrap().len(), 1);
        assert!(map.npcs_at(1, 1).unwrap().is_empty());
    }
}
