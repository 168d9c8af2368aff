//! Core data structures for gmap_editor
//!
//! This crate provides the document model of tile-based worlds:
//! - `Tile` / `TileGrid` - Tile indices, their two-character codes and rectangular grids
//! - `Level` - Tile layers plus links, signs and NPCs
//! - `nw` - Reading and writing `GLEVNW01` level files
//! - `LevelMapSource` - Where the levels of a map come from (`.gmap` descriptor or single file)
//! - `LevelMap` - A seamless grid of lazily loaded levels with global addressing

mod config;
mod error;
mod grid;
mod level;
mod map;
pub mod nw;
mod resolver;
mod source;
mod tile;

pub use config::{LevelSize, MapConfig};
pub use error::{MapError, Result};
pub use grid::TileGrid;
pub use level::{Level, Link, Npc, Sign};
pub use map::{LevelChanged, LevelMap, NpcRef, NpcRelocated};
pub use resolver::{FileResolver, FilesystemResolver, FILENAME_CACHE_FILE};
pub use source::{
    parse_gmap, split_csv_row, GmapSource, LevelMapSource, LevelNames, SingleLevelSource,
    GMAP_VERSION, MAX_MAP_CELLS,
};
pub use tile::{
    decode_tile_code, encode_tile_code, tile_image_position, tile_index_at, Tile,
    TILESET_PAGE_COLUMNS, TILESET_PAGE_ROWS, TILESET_PAGE_SIZE, TILE_CODE_ALPHABET,
    TILE_CODE_LEN, TRANSPARENT_CODE, TRANSPARENT_INDEX,
};
