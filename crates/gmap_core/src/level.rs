//! Level containing tile layers, links, signs and NPCs

use crate::{LevelSize, MapError, Result, Tile, TileGrid};
use serde::{Deserialize, Serialize};

/// A warp area leading to another level
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    /// File name of the destination level
    pub destination: String,
    /// Arrival position; may be symbolic, e.g. `playerx`
    pub new_x: String,
    pub new_y: String,
}

/// A readable sign placed on a tile
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sign {
    pub x: i32,
    pub y: i32,
    /// Sign text, one `\n`-terminated line per row
    pub text: String,
}

/// A scripted object placed in a level
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Npc {
    /// Unique within the owning level only
    pub id: u32,
    /// Image file name, empty for the default image
    pub image: String,
    pub script: String,
    /// Position in half tiles
    pub x: i32,
    pub y: i32,
}

impl Npc {
    pub fn new(image: impl Into<String>, script: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            script: script.into(),
            ..Default::default()
        }
    }

    /// Position in tiles
    pub fn level_x(&self) -> f32 {
        self.x as f32 / 2.0
    }

    pub fn level_y(&self) -> f32 {
        self.y as f32 / 2.0
    }

    /// Set the position in tiles, rounding down to the nearest half tile
    pub fn set_level_x(&mut self, x: f32) {
        self.x = (x * 2.0).floor() as i32;
    }

    pub fn set_level_y(&mut self, y: f32) {
        self.y = (y * 2.0).floor() as i32;
    }

    /// Exchange the editable fields (image and script) with `other`
    pub fn swap_fields(&mut self, other: &mut Npc) {
        std::mem::swap(&mut self.image, &mut other.image);
        std::mem::swap(&mut self.script, &mut other.script);
    }

    /// Compare everything except the level-local id
    pub fn same_content(&self, other: &Npc) -> bool {
        self.image == other.image
            && self.script == other.script
            && self.x == other.x
            && self.y == other.y
    }
}

/// One level: equally sized tile layers plus placed objects
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Level {
    size: LevelSize,
    layers: Vec<TileGrid>,
    pub links: Vec<Link>,
    pub signs: Vec<Sign>,
    npcs: Vec<Npc>,
    next_npc_id: u32,
}

impl Level {
    /// Create a level with one layer of default tiles
    pub fn new(size: LevelSize) -> Self {
        Self::with_fill(size, Tile::default())
    }

    /// Create a level whose first layer is filled with `fill`
    pub fn with_fill(size: LevelSize, fill: Tile) -> Self {
        Self {
            size,
            layers: vec![TileGrid::filled(size.width, size.height, fill)],
            links: Vec::new(),
            signs: Vec::new(),
            npcs: Vec::new(),
            next_npc_id: 1,
        }
    }

    pub fn size(&self) -> LevelSize {
        self.size
    }

    pub fn width(&self) -> usize {
        self.size.width
    }

    pub fn height(&self) -> usize {
        self.size.height
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn layers(&self) -> &[TileGrid] {
        &self.layers
    }

    pub fn layer(&self, index: usize) -> Option<&TileGrid> {
        self.layers.get(index)
    }

    pub fn layer_mut(&mut self, index: usize) -> Option<&mut TileGrid> {
        self.layers.get_mut(index)
    }

    /// Get a layer, creating it and any missing layers below it from default tiles
    pub fn ensure_layer(&mut self, index: usize) -> &mut TileGrid {
        let LevelSize { width, height } = self.size;
        if index >= self.layers.len() {
            self.layers
                .resize_with(index + 1, || TileGrid::new(width, height));
        }
        &mut self.layers[index]
    }

    /// Insert a new layer filled with `fill` at `index` (clamped to the layer count)
    pub fn insert_layer(&mut self, index: usize, fill: Tile) {
        let index = index.min(self.layers.len());
        self.layers.insert(
            index,
            TileGrid::filled(self.size.width, self.size.height, fill),
        );
    }

    /// Remove a layer by index
    pub fn remove_layer(&mut self, index: usize) -> Option<TileGrid> {
        if index < self.layers.len() {
            Some(self.layers.remove(index))
        } else {
            None
        }
    }

    /// Tile at a level-local position. A missing layer reads as default tiles.
    pub fn tile(&self, x: usize, y: usize, layer: usize) -> Result<Tile> {
        self.check_bounds(x, y)?;
        match self.layers.get(layer) {
            Some(grid) => grid.tile(x, y),
            None => Ok(Tile::default()),
        }
    }

    /// Set a tile at a level-local position, creating the layer if needed
    pub fn set_tile(&mut self, x: usize, y: usize, layer: usize, tile: Tile) -> Result<()> {
        self.check_bounds(x, y)?;
        self.ensure_layer(layer).set_tile(x, y, tile)
    }

    fn check_bounds(&self, x: usize, y: usize) -> Result<()> {
        if x < self.size.width && y < self.size.height {
            Ok(())
        } else {
            Err(MapError::out_of_bounds(
                x as i64,
                y as i64,
                self.size.width,
                self.size.height,
            ))
        }
    }

    pub fn npcs(&self) -> &[Npc] {
        &self.npcs
    }

    /// Id the next added NPC will get
    pub fn next_npc_id(&self) -> u32 {
        self.next_npc_id
    }

    /// Make every NPC id at least `first`, renumbering all NPCs in order when
    /// one falls below it
    pub fn reserve_npc_ids(&mut self, first: u32) {
        if self.npcs.iter().any(|n| n.id < first) {
            for (npc, id) in self.npcs.iter_mut().zip(first..) {
                npc.id = id;
            }
            self.next_npc_id = first.saturating_add(self.npcs.len() as u32);
        }
        self.next_npc_id = self.next_npc_id.max(first);
    }

    /// Add an NPC, assigning it the next free id of this level
    pub fn add_npc(&mut self, mut npc: Npc) -> &mut Npc {
        npc.id = self.next_npc_id;
        self.next_npc_id += 1;
        self.npcs.push(npc);
        let last = self.npcs.len() - 1;
        &mut self.npcs[last]
    }

    /// Get NPC by ID
    pub fn npc(&self, id: u32) -> Option<&Npc> {
        self.npcs.iter().find(|n| n.id == id)
    }

    /// Get mutable NPC by ID
    pub fn npc_mut(&mut self, id: u32) -> Option<&mut Npc> {
        self.npcs.iter_mut().find(|n| n.id == id)
    }

    /// Remove an NPC by ID. Its id is never handed out again.
    pub fn remove_npc(&mut self, id: u32) -> Option<Npc> {
        self.npcs
            .iter()
            .position(|n| n.id == id)
            .map(|pos| self.npcs.remove(pos))
    }
}
