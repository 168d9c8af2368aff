//! Reversible edit records
//!
//! Applying a diff performs its change on a [`LevelMap`] and returns the diff
//! that would restore the previous state. Diffs only hold copies of tiles and
//! NPC values; live NPCs are reached through [`NpcRef`] lookups.

use gmap_core::{LevelMap, MapError, Npc, NpcRef, Result, TileGrid};

/// A reversible change to a level map
pub trait Diff: Send + Sync + std::fmt::Debug {
    /// Perform the change and return its inverse
    fn apply(&self, map: &mut LevelMap) -> Result<Box<dyn Diff>>;

    /// Human readable name for menus
    fn description(&self) -> &str;

    /// Point references to an NPC that was re-homed at its new location
    fn remap_npc(&mut self, _from: &NpcRef, _to: &NpcRef) {}

    /// Whether applying this diff would change nothing
    fn is_noop(&self) -> bool {
        false
    }
}

fn remap(npc: &mut NpcRef, from: &NpcRef, to: &NpcRef) {
    if npc == from {
        *npc = *to;
    }
}

/// Overwrites a rectangle of tiles on one layer, in global tile coordinates.
///
/// Positions inside cells that have no level are left untouched.
#[derive(Debug, Clone)]
pub struct TileRegionDiff {
    pub x: usize,
    pub y: usize,
    pub layer: usize,
    pub tiles: TileGrid,
    description: String,
}

impl TileRegionDiff {
    pub fn new(x: usize, y: usize, layer: usize, tiles: TileGrid) -> Self {
        Self {
            x,
            y,
            layer,
            tiles,
            description: "Edit Tiles".to_string(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }
}

impl Diff for TileRegionDiff {
    fn apply(&self, map: &mut LevelMap) -> Result<Box<dyn Diff>> {
        let (width, height) = (self.tiles.width(), self.tiles.height());
        if self.x + width > map.width_tiles() || self.y + height > map.height_tiles() {
            return Err(MapError::OutOfBounds {
                x: (self.x + width) as i64,
                y: (self.y + height) as i64,
                width: map.width_tiles(),
                height: map.height_tiles(),
            });
        }

        // Capture everything before writing so a failure leaves the map untouched
        let mut previous = TileGrid::new(width, height);
        let mut writes = Vec::with_capacity(width * height);
        for (dy, row) in self.tiles.rows().enumerate() {
            for (dx, tile) in row.iter().enumerate() {
                match map.get_tile(self.x + dx, self.y + dy, self.layer) {
                    Ok(old) => {
                        previous.set_tile(dx, dy, old)?;
                        writes.push((self.x + dx, self.y + dy, *tile));
                    }
                    Err(MapError::LevelNotLoaded { .. }) => {}
                    Err(e) => return Err(e),
                }
            }
        }

        for (x, y, tile) in writes {
            map.set_tile(x, y, self.layer, tile)?;
        }

        Ok(Box::new(TileRegionDiff {
            x: self.x,
            y: self.y,
            layer: self.layer,
            tiles: previous,
            description: self.description.clone(),
        }))
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn is_noop(&self) -> bool {
        self.tiles.is_empty()
    }
}

/// Undoes the creation of an NPC by removing it
#[derive(Debug, Clone)]
pub struct CreateNpcDiff {
    pub npc: NpcRef,
}

impl CreateNpcDiff {
    pub fn new(npc: NpcRef) -> Self {
        Self { npc }
    }
}

impl Diff for CreateNpcDiff {
    fn apply(&self, map: &mut LevelMap) -> Result<Box<dyn Diff>> {
        let captured = map.delete_npc(&self.npc)?;
        Ok(Box::new(DeleteNpcDiff::new(self.npc, captured)))
    }

    fn description(&self) -> &str {
        "Create NPC"
    }

    fn remap_npc(&mut self, from: &NpcRef, to: &NpcRef) {
        remap(&mut self.npc, from, to);
    }
}

/// Undoes the deletion of an NPC by putting a copy back into its level
#[derive(Debug, Clone)]
pub struct DeleteNpcDiff {
    pub npc: NpcRef,
    pub captured: Npc,
}

impl DeleteNpcDiff {
    pub fn new(npc: NpcRef, captured: Npc) -> Self {
        Self { npc, captured }
    }
}

impl Diff for DeleteNpcDiff {
    fn apply(&self, map: &mut LevelMap) -> Result<Box<dyn Diff>> {
        let restored = map.restore_npc(self.npc, self.captured.clone())?;
        Ok(Box::new(CreateNpcDiff::new(restored)))
    }

    fn description(&self) -> &str {
        "Delete NPC"
    }

    fn remap_npc(&mut self, from: &NpcRef, to: &NpcRef) {
        remap(&mut self.npc, from, to);
    }
}

/// Exchanges the editable fields of an NPC (image and script) with `fields`
#[derive(Debug, Clone)]
pub struct NpcFieldDiff {
    pub npc: NpcRef,
    pub fields: Npc,
}

impl NpcFieldDiff {
    pub fn new(npc: NpcRef, fields: Npc) -> Self {
        Self { npc, fields }
    }
}

impl Diff for NpcFieldDiff {
    fn apply(&self, map: &mut LevelMap) -> Result<Box<dyn Diff>> {
        let mut fields = self.fields.clone();
        map.npc_mut(&self.npc)?.swap_fields(&mut fields);
        Ok(Box::new(NpcFieldDiff::new(self.npc, fields)))
    }

    fn description(&self) -> &str {
        "Edit NPC"
    }

    fn remap_npc(&mut self, from: &NpcRef, to: &NpcRef) {
        remap(&mut self.npc, from, to);
    }
}

/// Moves an NPC to a global position in tiles, possibly into another level
#[derive(Debug, Clone)]
pub struct MoveNpcDiff {
    pub npc: NpcRef,
    pub x: f32,
    pub y: f32,
}

impl MoveNpcDiff {
    pub fn new(npc: NpcRef, x: f32, y: f32) -> Self {
        Self { npc, x, y }
    }
}

impl Diff for MoveNpcDiff {
    fn apply(&self, map: &mut LevelMap) -> Result<Box<dyn Diff>> {
        map.require_level(self.npc.level_x, self.npc.level_y)?;
        let (old_x, old_y) = map.global_npc_position(&self.npc)?;
        let mut npc = self.npc;
        map.move_npc(&mut npc, self.x, self.y)?;
        Ok(Box::new(MoveNpcDiff::new(npc, old_x, old_y)))
    }

    fn description(&self) -> &str {
        "Move NPC"
    }

    fn remap_npc(&mut self, from: &NpcRef, to: &NpcRef) {
        remap(&mut self.npc, from, to);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gmap_core::{Level, LevelSize, Tile};

    fn map_2x1() -> LevelMap {
        let size = LevelSize::new(8, 8);
        let mut map = LevelMap::new(size);
        map.set_level(Level::new(size), 0, 0);
        map.set_level(Level::new(size), 1, 0);
        map
    }

    fn region(map: &mut LevelMap, x: usize, y: usize, w: usize, h: usize) -> Vec<Tile> {
        let mut tiles = Vec::new();
        for ty in y..y + h {
            for tx in x..x + w {
                tiles.push(map.get_tile(tx, ty, 0).unwrap());
            }
        }
        tiles
    }

    #[test]
    fn test_tile_region_diff_round_trip() {
        let mut map = map_2x1();
        let diff = TileRegionDiff::new(2, 2, 0, TileGrid::filled(3, 3, Tile::new(5)));

        let inverse = diff.apply(&mut map).unwrap();
        assert!(region(&mut map, 2, 2, 3, 3).iter().all(|t| *t == Tile::new(5)));
        assert_eq!(map.get_tile(5, 2, 0).unwrap(), Tile::new(0));

        let redo = inverse.apply(&mut map).unwrap();
        assert!(region(&mut map, 2, 2, 3, 3).iter().all(|t| *t == Tile::new(0)));
        assert_eq!(redo.description(), "Edit Tiles");
    }

    #[test]
    fn test_tile_region_diff_spans_levels() {
        let mut map = map_2x1();
        let diff = TileRegionDiff::new(6, 0, 0, TileGrid::filled(4, 1, Tile::new(9)));
        diff.apply(&mut map).unwrap();
        assert_eq!(map.loaded_level(0, 0).unwrap().tile(7, 0, 0).unwrap(), Tile::new(9));
        assert_eq!(map.loaded_level(1, 0).unwrap().tile(1, 0, 0).unwrap(), Tile::new(9));
        assert_eq!(map.loaded_level(1, 0).unwrap().tile(2, 0, 0).unwrap(), Tile::new(0));
    }

    #[test]
    fn test_tile_region_diff_out_of_bounds_changes_nothing() {
        let mut map = map_2x1();
        let diff = TileRegionDiff::new(14, 0, 0, TileGrid::filled(3, 1, Tile::new(9)));
        assert!(matches!(
            diff.apply(&mut map),
            Err(MapError::OutOfBounds { .. })
        ));
        assert_eq!(map.get_tile(15, 0, 0).unwrap(), Tile::new(0));
    }

    #[test]
    fn test_tile_region_diff_skips_missing_levels() {
        let size = LevelSize::new(8, 8);
        let mut map = LevelMap::new(size);
        map.set_level(Level::new(size), 0, 0);
        map.set_size(2, 1);

        let diff = TileRegionDiff::new(6, 0, 0, TileGrid::filled(4, 1, Tile::new(3)));
        let inverse = diff.apply(&mut map).unwrap();
        assert_eq!(map.get_tile(7, 0, 0).unwrap(), Tile::new(3));
        inverse.apply(&mut map).unwrap();
        assert_eq!(map.get_tile(7, 0, 0).unwrap(), Tile::new(0));
    }

    #[test]
    fn test_empty_region_is_noop() {
        assert!(TileRegionDiff::new(0, 0, 0, TileGrid::new(0, 3)).is_noop());
        assert!(!TileRegionDiff::new(0, 0, 0, TileGrid::new(1, 1)).is_noop());
    }

    #[test]
    fn test_create_and_delete_npc_diffs() {
        let mut map = map_2x1();
        let npc = map.add_npc(1, 0, Npc::new("guard.png", "say hi\n")).unwrap();

        let undo_create = CreateNpcDiff::new(npc);
        let restore = undo_create.apply(&mut map).unwrap();
        assert!(map.loaded_level(1, 0).unwrap().npcs().is_empty());
        assert_eq!(restore.description(), "Delete NPC");

        let remove_again = restore.apply(&mut map).unwrap();
        let npcs = map.loaded_level(1, 0).unwrap().npcs();
        assert_eq!(npcs.len(), 1);
        assert_eq!(npcs[0].image, "guard.png");
        assert_ne!(npcs[0].id, npc.id);

        remove_again.apply(&mut map).unwrap();
        assert!(map.loaded_level(1, 0).unwrap().npcs().is_empty());
    }

    #[test]
    fn test_npc_field_diff_swaps_back() {
        let mut map = map_2x1();
        let npc = map.add_npc(0, 0, Npc::new("old.png", "old\n")).unwrap();

        let inverse = NpcFieldDiff::new(npc, Npc::new("new.png", "new\n"))
            .apply(&mut map)
            .unwrap();
        assert_eq!(map.npc(&npc).unwrap().image, "new.png");

        inverse.apply(&mut map).unwrap();
        let restored = map.npc(&npc).unwrap();
        assert_eq!(restored.image, "old.png");
        assert_eq!(restored.script, "old\n");
        assert_eq!(restored.id, npc.id);
    }

    #[test]
    fn test_move_npc_diff_across_levels_and_back() {
        let mut map = map_2x1();
        let mut original = Npc::new("a.png", "script\n");
        original.x = 14;
        original.y = 4;
        let npc = map.add_npc(0, 0, original.clone()).unwrap();

        let inverse = MoveNpcDiff::new(npc, 9.0, 2.5).apply(&mut map).unwrap();
        assert!(map.loaded_level(0, 0).unwrap().npcs().is_empty());
        let moved = &map.loaded_level(1, 0).unwrap().npcs()[0];
        assert_eq!((moved.x, moved.y), (2, 5));

        inverse.apply(&mut map).unwrap();
        assert!(map.loaded_level(1, 0).unwrap().npcs().is_empty());
        let back = &map.loaded_level(0, 0).unwrap().npcs()[0];
        assert!(back.same_content(&original));
    }

    #[test]
    fn test_remap_only_touches_matching_refs() {
        let from = NpcRef::new(0, 0, 1);
        let to = NpcRef::new(1, 0, 4);
        let mut diff = MoveNpcDiff::new(from, 0.0, 0.0);
        diff.remap_npc(&from, &to);
        assert_eq!(diff.npc, to);

        let mut other = NpcFieldDiff::new(NpcRef::new(0, 0, 2), Npc::default());
        other.remap_npc(&from, &to);
        assert_eq!(other.npc, NpcRef::new(0, 0, 2));
    }
}
