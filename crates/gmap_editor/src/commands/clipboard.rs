//! Tile and NPC clipboard

use crate::document::LevelDocument;
use gmap_core::{Npc, Result, TileGrid};

/// Clipboard contents for copy/paste
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "bevy", derive(bevy::prelude::Resource))]
pub enum Clipboard {
    #[default]
    Empty,
    Tiles(TileGrid),
    Npc(Npc),
}

impl Clipboard {
    pub fn is_empty(&self) -> bool {
        matches!(self, Clipboard::Empty)
    }

    /// Copy a rectangle of the document's active layer
    pub fn copy_tiles(
        document: &mut LevelDocument,
        x: usize,
        y: usize,
        width: usize,
        height: usize,
    ) -> Result<Self> {
        Ok(Clipboard::Tiles(document.copy_tiles(x, y, width, height)?))
    }

    /// Paste at a global position in tiles.
    ///
    /// Tiles are anchored at the tile containing the position; NPCs keep
    /// half-tile precision. Returns false when nothing was pasted.
    pub fn paste(&self, document: &mut LevelDocument, x: f32, y: f32) -> Result<bool> {
        match self {
            Clipboard::Empty => Ok(false),
            Clipboard::Tiles(tiles) => {
                document.paste_tiles(x.floor() as i64, y.floor() as i64, tiles)
            }
            Clipboard::Npc(npc) => {
                document.create_npc(x, y, npc.clone())?;
                Ok(true)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EditorConfig;
    use gmap_core::Tile;

    #[test]
    fn test_paste_tiles_and_npc() {
        let mut document = LevelDocument::new_level(&EditorConfig::default());
        document
            .paste_tiles(0, 0, &TileGrid::filled(2, 1, Tile::new(11)))
            .unwrap();

        let clipboard = Clipboard::copy_tiles(&mut document, 0, 0, 2, 1).unwrap();
        assert!(clipboard.paste(&mut document, 10.7, 3.2).unwrap());
        assert_eq!(document.map_mut().get_tile(11, 3, 0).unwrap(), Tile::new(11));

        let npc = Clipboard::Npc(Npc::new("sign.png", "message hello\n"));
        assert!(npc.paste(&mut document, 4.5, 4.0).unwrap());
        let placed = &document.map().loaded_level(0, 0).unwrap().npcs()[0];
        assert_eq!((placed.x, placed.y), (9, 8));

        assert!(!Clipboard::Empty.paste(&mut document, 0.0, 0.0).unwrap());
        assert!(Clipboard::default().is_empty());
    }
}
