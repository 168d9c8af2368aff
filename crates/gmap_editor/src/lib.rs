//! gmap_editor - Reversible editing for seamless level maps
//!
//! This crate provides the editing layer on top of `gmap_core`:
//! - Undo/redo through self-inverting diffs
//! - Tile paste, lift, copy and flood fill across level boundaries
//! - NPC creation, deletion, editing and cross-level moves
//! - Copy/paste clipboard
//! - Per-level unsaved tracking and saving
//!
//! # Usage
//!
//! ```rust,ignore
//! use gmap_editor::{EditorConfig, LevelDocument};
//! use gmap_core::{Tile, TileGrid};
//!
//! let config = EditorConfig::default();
//! let mut document = LevelDocument::open_gmap("world.gmap".as_ref(), &config)?;
//! document.paste_tiles(70, 10, &TileGrid::filled(3, 3, Tile::new(5)))?;
//! document.undo()?;
//! document.save_all()?;
//! ```

pub mod commands;
pub mod config;
pub mod document;

pub use commands::{Clipboard, Diff, EditLog};
pub use config::{ConfigError, EditorConfig};
pub use document::LevelDocument;
