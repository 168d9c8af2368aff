//! Map-wide settings shared by every level of a map

use crate::Tile;
use serde::{Deserialize, Serialize};

/// Width and height of one level, in tiles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LevelSize {
    pub width: usize,
    pub height: usize,
}

impl LevelSize {
    pub const fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }
}

impl Default for LevelSize {
    /// Every GLEVNW01 level is 64x64
    fn default() -> Self {
        Self::new(64, 64)
    }
}

/// Map configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapConfig {
    pub level_width: usize,
    pub level_height: usize,
    /// Tile used for new levels and for cleared areas
    pub default_tile: Tile,
}

impl Default for MapConfig {
    fn default() -> Self {
        let size = LevelSize::default();
        Self {
            level_width: size.width,
            level_height: size.height,
            default_tile: Tile::default(),
        }
    }
}

impl MapConfig {
    pub fn level_size(&self) -> LevelSize {
        LevelSize::new(self.level_width, self.level_height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_map_config_default() {
        let config = MapConfig::default();
        assert_eq!(config.level_size(), LevelSize::new(64, 64));
        assert_eq!(config.default_tile, Tile::new(0));
    }
}
