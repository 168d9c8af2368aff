//! Rectangular tile storage used for level layers, selections and undo snapshots

use crate::{MapError, Result, Tile};
use serde::{Deserialize, Serialize};

/// A width x height block of tiles, row-major, origin top-left
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TileGrid {
    width: usize,
    height: usize,
    tiles: Vec<Tile>,
}

impl TileGrid {
    /// Create a grid of default tiles
    pub fn new(width: usize, height: usize) -> Self {
        Self::filled(width, height, Tile::default())
    }

    /// Create a grid where every cell holds `tile`
    pub fn filled(width: usize, height: usize, tile: Tile) -> Self {
        Self {
            width,
            height,
            tiles: vec![tile; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// True when the grid covers no area
    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn contains(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height
    }

    #[inline]
    fn offset(&self, x: usize, y: usize) -> Result<usize> {
        if self.contains(x, y) {
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

    pub fn get(&self, x: usize, y: usize) -> Option<&Tile> {
        self.offset(x, y).ok().map(|i| &self.tiles[i])
    }

    pub fn get_mut(&mut self, x: usize, y: usize) -> Option<&mut Tile> {
        let i = self.offset(x, y).ok()?;
        Some(&mut self.tiles[i])
    }

    /// Tile at (x, y), failing with `OutOfBounds` outside the grid
    pub fn tile(&self, x: usize, y: usize) -> Result<Tile> {
        self.offset(x, y).map(|i| self.tiles[i])
    }

    pub fn set_tile(&mut self, x: usize, y: usize, tile: Tile) -> Result<()> {
        let i = self.offset(x, y)?;
        self.tiles[i] = tile;
        Ok(())
    }

    /// Reallocate to a new shape. Old contents are discarded, every cell becomes default.
    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.tiles.clear();
        self.tiles.resize(width * height, Tile::default());
    }

    pub fn fill(&mut self, tile: Tile) {
        self.tiles.fill(tile);
    }

    pub fn clear(&mut self) {
        self.resize(0, 0);
    }

    /// Copy out the `width` x `height` block starting at (x, y)
    pub fn region(&self, x: usize, y: usize, width: usize, height: usize) -> Result<TileGrid> {
        if width == 0 || height == 0 {
            return Ok(TileGrid::new(width, height));
        }
        // Check the far corner first so a partial copy never happens
        self.offset(x + width - 1, y + height - 1)?;

        let mut tiles = Vec::with_capacity(width * height);
        for row in y..y + height {
            let start = row * self.width + x;
            tiles.extend_from_slice(&self.tiles[start..start + width]);
        }
        Ok(TileGrid {
            width,
            height,
            tiles,
        })
    }

    /// Iterate rows top to bottom
    pub fn rows(&self) -> impl Iterator<Item = &[Tile]> {
        // chunks() panics on 0, an empty grid simply has no rows
        self.tiles.chunks(self.width.max(1))
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_grid() {
        let grid = TileGrid::new(4, 3);
        assert_eq!(grid.width(), 4);
        assert_eq!(grid.height(), 3);
        assert_eq!(grid.tiles().len(), 12);
        assert!(grid.tiles().iter().all(|t| *t == Tile::default()));
    }

    #[test]
    fn test_bounds_checked_access() {
        let mut grid = TileGrid::new(2, 2);
        grid.set_tile(1, 1, Tile::new(7)).unwrap();
        assert_eq!(grid.tile(1, 1).unwrap(), Tile::new(7));
        assert!(grid.get(2, 0).is_none());
        assert!(matches!(
            grid.set_tile(0, 2, Tile::new(1)),
            Err(MapError::OutOfBounds { x: 0, y: 2, .. })
        ));
    }

    #[test]
    fn test_resize_discards_contents() {
        let mut grid = TileGrid::filled(2, 2, Tile::new(9));
        grid.resize(3, 1);
        assert_eq!(grid.tiles().len(), 3);
        assert!(grid.tiles().iter().all(|t| t.index == 0));
    }

    #[test]
    fn test_region_copy() {
        let mut grid = TileGrid::new(4, 4);
        grid.set_tile(1, 1, Tile::new(5)).unwrap();
        grid.set_tile(2, 2, Tile::new(6)).unwrap();

        let region = grid.region(1, 1, 2, 2).unwrap();
        assert_eq!(region.tile(0, 0).unwrap(), Tile::new(5));
        assert_eq!(region.tile(1, 1).unwrap(), Tile::new(6));
        assert_eq!(region.tile(1, 0).unwrap(), Tile::default());

        assert!(grid.region(3, 3, 2, 1).is_err());
        assert!(grid.region(3, 3, 0, 0).unwrap().is_empty());
    }

    #[test]
    fn test_rows() {
        let mut grid = TileGrid::new(3, 2);
        grid.set_tile(2, 1, Tile::new(1)).unwrap();
        let rows: Vec<_> = grid.rows().collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1][2], Tile::new(1));
        assert_eq!(TileGrid::default().rows().count(), 0);
    }
}
