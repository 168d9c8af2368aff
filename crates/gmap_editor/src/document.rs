//! One open document: a level map with its edit history
//!
//! Every edit goes through the [`EditLog`] so it can be undone, and every
//! level the edits touch is remembered as unsaved until it is written back.

use crate::commands::{
    follow_relocations, CreateNpcDiff, DeleteNpcDiff, Diff, EditLog, MoveNpcDiff, NpcFieldDiff,
    TileRegionDiff,
};
use crate::config::EditorConfig;
use gmap_core::{
    nw, FilesystemResolver, Level, LevelMap, MapError, Npc, NpcRef, Result, SingleLevelSource,
    Tile, TileGrid,
};
use std::collections::{BTreeSet, VecDeque};
use std::path::Path;

#[cfg_attr(feature = "bevy", derive(bevy::prelude::Resource))]
pub struct LevelDocument {
    map: LevelMap,
    history: EditLog,
    active_layer: usize,
    default_tile: Tile,
    unsaved: BTreeSet<(usize, usize)>,
}

impl std::fmt::Debug for LevelDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LevelDocument")
            .field("map", &self.map)
            .field("active_layer", &self.active_layer)
            .field("unsaved", &self.unsaved)
            .finish_non_exhaustive()
    }
}

impl LevelDocument {
    /// Wrap an already opened map
    pub fn with_map(map: LevelMap, config: &EditorConfig) -> Self {
        let mut document = Self {
            map,
            history: EditLog::new(config.history_limit),
            active_layer: 0,
            default_tile: config.map.default_tile,
            unsaved: BTreeSet::new(),
        };
        document.collect_changes();
        document
    }

    /// A fresh single level filled with the default tile, not yet saved anywhere
    pub fn new_level(config: &EditorConfig) -> Self {
        let size = config.map.level_size();
        let mut map = LevelMap::new(size);
        map.set_level(Level::with_fill(size, config.map.default_tile), 0, 0);
        Self::with_map(map, config)
    }

    /// Open a single level file
    pub fn open_level(path: &Path, config: &EditorConfig) -> Result<Self> {
        let map = LevelMap::open_level_file(path, config.map.level_size())?;
        tracing::info!("Opened level {:?}", path);
        Ok(Self::with_map(map, config))
    }

    /// Open a map descriptor, resolving level names below the configured
    /// search root (or the descriptor's directory)
    pub fn open_gmap(path: &Path, config: &EditorConfig) -> Result<Self> {
        let root = match &config.search_root {
            Some(root) => root.clone(),
            None => path.parent().map(Path::to_path_buf).unwrap_or_default(),
        };
        let mut resolver = FilesystemResolver::new(root);
        if !resolver.import_filename_cache() {
            resolver.update_cache();
        }
        let map = LevelMap::open_gmap(path, Box::new(resolver), config.map.level_size())?;
        Ok(Self::with_map(map, config))
    }

    pub fn map(&self) -> &LevelMap {
        &self.map
    }

    /// Direct map access. Changes made here are not recorded in the history.
    pub fn map_mut(&mut self) -> &mut LevelMap {
        &mut self.map
    }

    pub fn history(&self) -> &EditLog {
        &self.history
    }

    pub fn clear_history(&mut self) {
        self.history.clear();
    }

    pub fn active_layer(&self) -> usize {
        self.active_layer
    }

    pub fn set_active_layer(&mut self, layer: usize) {
        self.active_layer = layer;
    }

    pub fn default_tile(&self) -> Tile {
        self.default_tile
    }

    pub fn set_default_tile(&mut self, tile: Tile) {
        self.default_tile = tile;
    }

    fn collect_changes(&mut self) {
        for change in self.map.take_changes() {
            self.unsaved.insert((change.level_x, change.level_y));
        }
    }

    fn perform(&mut self, diff: Box<dyn Diff>) -> Result<bool> {
        let result = self.history.perform(diff, &mut self.map);
        self.collect_changes();
        result
    }

    /// Paste `tiles` with its top-left corner at a global position on the
    /// active layer, clipped to the map. Returns false when nothing overlaps.
    pub fn paste_tiles(&mut self, x: i64, y: i64, tiles: &TileGrid) -> Result<bool> {
        let left = x.max(0);
        let top = y.max(0);
        let right = (x + tiles.width() as i64).min(self.map.width_tiles() as i64);
        let bottom = (y + tiles.height() as i64).min(self.map.height_tiles() as i64);
        if right <= left || bottom <= top {
            return Ok(false);
        }

        let clipped = tiles.region(
            (left - x) as usize,
            (top - y) as usize,
            (right - left) as usize,
            (bottom - top) as usize,
        )?;
        let diff = TileRegionDiff::new(left as usize, top as usize, self.active_layer, clipped)
            .with_description("Paste Tiles");
        self.perform(Box::new(diff))
    }

    /// Copy a rectangle of the active layer
    pub fn copy_tiles(
        &mut self,
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    ) -> Result<TileGrid> {
        if x + width > self.map.width_tiles() || y + height > self.map.height_tiles() {
            return Err(MapError::OutOfBounds {
                x: (x + width) as i64,
                y: (y + height) as i64,
                width: self.map.width_tiles(),
                height: self.map.height_tiles(),
            });
        }
        let mut grid = TileGrid::new(width, height);
        for dy in 0..height {
            for dx in 0..width {
                let tile = self.map.get_tile(x + dx, y + dy, self.active_layer)?;
                grid.set_tile(dx, dy, tile)?;
            }
        }
        Ok(grid)
    }

    /// Cut a rectangle out of the active layer, leaving default tiles behind
    pub fn lift_tiles(
        &mut self,
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    ) -> Result<TileGrid> {
        let lifted = self.copy_tiles(x, y, width, height)?;
        let blank = TileGrid::filled(width, height, self.default_tile);
        let diff =
            TileRegionDiff::new(x, y, self.active_layer, blank).with_description("Lift Tiles");
        self.perform(Box::new(diff))?;
        Ok(lifted)
    }

    /// Flood fill the 4-connected area around a global position on the
    /// active layer. Cells without a level stop the fill.
    pub fn flood_fill(&mut self, x: usize, y: usize, tile: Tile) -> Result<bool> {
        let layer = self.active_layer;
        let target = self.map.get_tile(x, y, layer)?;
        if target == tile {
            return Ok(false);
        }

        let (map_width, map_height) = (self.map.width_tiles(), self.map.height_tiles());
        let mut visited = vec![false; map_width * map_height];
        let mut filled = Vec::new();
        let mut queue = VecDeque::from([(x, y)]);
        visited[y * map_width + x] = true;

        while let Some((cx, cy)) = queue.pop_front() {
            match self.map.get_tile(cx, cy, layer) {
                Ok(current) if current == target => filled.push((cx, cy)),
                Ok(_) | Err(MapError::LevelNotLoaded { .. }) => continue,
                Err(e) => return Err(e),
            }

            let mut neighbours = Vec::with_capacity(4);
            if cx > 0 {
                neighbours.push((cx - 1, cy));
            }
            if cy > 0 {
                neighbours.push((cx, cy - 1));
            }
            if cx + 1 < map_width {
                neighbours.push((cx + 1, cy));
            }
            if cy + 1 < map_height {
                neighbours.push((cx, cy + 1));
            }
            for (nx, ny) in neighbours {
                let index = ny * map_width + nx;
                if !visited[index] {
                    visited[index] = true;
                    queue.push_back((nx, ny));
                }
            }
        }

        let min_x = filled.iter().map(|p| p.0).min().unwrap_or(x);
        let max_x = filled.iter().map(|p| p.0).max().unwrap_or(x);
        let min_y = filled.iter().map(|p| p.1).min().unwrap_or(y);
        let max_y = filled.iter().map(|p| p.1).max().unwrap_or(y);

        // Positions outside the fill keep their tiles; missing levels are skipped by the diff
        let mut grid = TileGrid::new(max_x - min_x + 1, max_y - min_y + 1);
        for gy in min_y..=max_y {
            for gx in min_x..=max_x {
                if let Ok(current) = self.map.get_tile(gx, gy, layer) {
                    grid.set_tile(gx - min_x, gy - min_y, current)?;
                }
            }
        }
        for (fx, fy) in &filled {
            grid.set_tile(fx - min_x, fy - min_y, tile)?;
        }

        tracing::debug!("Flood fill covers {} tiles", filled.len());
        let diff = TileRegionDiff::new(min_x, min_y, layer, grid).with_description("Flood Fill");
        self.perform(Box::new(diff))
    }

    /// Place a new NPC at a global position in tiles
    pub fn create_npc(&mut self, x: f32, y: f32, mut npc: Npc) -> Result<NpcRef> {
        if x < 0.0 || y < 0.0 {
            return Err(MapError::OutOfBounds {
                x: x.floor() as i64,
                y: y.floor() as i64,
                width: self.map.width_tiles(),
                height: self.map.height_tiles(),
            });
        }
        let (level_x, level_y, _, _) = self.map.locate(x as usize, y as usize)?;
        let size = self.map.level_size();
        npc.set_level_x(x - (level_x * size.width) as f32);
        npc.set_level_y(y - (level_y * size.height) as f32);

        let placed = self.map.next_npc_ref(level_x, level_y)?;
        self.perform(Box::new(DeleteNpcDiff::new(placed, npc)))?;
        Ok(follow_relocations(self.history.last_relocations(), placed))
    }

    /// Delete an NPC and return the removed value
    pub fn delete_npc(&mut self, npc: &NpcRef) -> Result<Npc> {
        self.map.require_level(npc.level_x, npc.level_y)?;
        let removed = self.map.npc(npc)?.clone();
        self.perform(Box::new(CreateNpcDiff::new(*npc)))?;
        Ok(removed)
    }

    /// Move an NPC to a global position, updating `npc` if it changes level
    pub fn move_npc(&mut self, npc: &mut NpcRef, x: f32, y: f32) -> Result<()> {
        self.perform(Box::new(MoveNpcDiff::new(*npc, x, y)))?;
        *npc = follow_relocations(self.history.last_relocations(), *npc);
        Ok(())
    }

    /// Replace the image and script of an NPC. Returns false when nothing differs.
    pub fn update_npc(&mut self, npc: &NpcRef, image: &str, script: &str) -> Result<bool> {
        self.map.require_level(npc.level_x, npc.level_y)?;
        let current = self.map.npc(npc)?;
        if current.image == image && current.script == script {
            return Ok(false);
        }
        let fields = Npc::new(image, script);
        self.perform(Box::new(NpcFieldDiff::new(*npc, fields)))
    }

    pub fn undo(&mut self) -> Result<bool> {
        let result = self.history.undo(&mut self.map);
        self.collect_changes();
        result
    }

    pub fn redo(&mut self) -> Result<bool> {
        let result = self.history.redo(&mut self.map);
        self.collect_changes();
        result
    }

    pub fn is_modified(&self) -> bool {
        !self.unsaved.is_empty()
    }

    pub fn is_level_unsaved(&self, x: usize, y: usize) -> bool {
        self.unsaved.contains(&(x, y))
    }

    /// Cells with changes not yet written to disk
    pub fn unsaved_levels(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.unsaved.iter().copied()
    }

    /// Write a level back to where it came from.
    ///
    /// Returns false when the level has no file yet; use [`save_level_as`](Self::save_level_as).
    pub fn save_level(&mut self, x: usize, y: usize) -> Result<bool> {
        let has_file = self
            .map
            .source()
            .is_some_and(|source| !source.level_name(x, y).is_empty());
        if !has_file {
            return Ok(false);
        }
        self.map.save_level(x, y)?;
        self.unsaved.remove(&(x, y));
        Ok(true)
    }

    /// Write a level to a new file, which becomes its file from then on
    pub fn save_level_as(&mut self, x: usize, y: usize, path: &Path) -> Result<()> {
        let level = self
            .map
            .loaded_level(x, y)
            .ok_or(MapError::LevelNotLoaded { x, y })?;
        nw::save_level(level, path)?;

        match self.map.source_mut() {
            Some(source) => source.set_level_name(x, y, &path.to_string_lossy()),
            None => self.map.set_source(Box::new(SingleLevelSource::new(path))),
        }
        self.unsaved.remove(&(x, y));
        tracing::info!("Saved level ({}, {}) as {:?}", x, y, path);
        Ok(())
    }

    /// Save every unsaved level that has a file. Returns how many were written.
    pub fn save_all(&mut self) -> Result<usize> {
        let pending: Vec<_> = self.unsaved.iter().copied().collect();
        let mut saved = 0;
        for (x, y) in pending {
            if self.save_level(x, y)? {
                saved += 1;
            }
        }
        Ok(saved)
    }
}
