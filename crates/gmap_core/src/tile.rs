//! Tiles and the radix-64 tile code used by level files

use crate::{MapError, Result};
use serde::{Deserialize, Serialize};

/// Tile index meaning "draw nothing, let lower layers show through"
pub const TRANSPARENT_INDEX: i32 = -1;

/// Alphabet of the tile code, one 6-bit digit per character
pub const TILE_CODE_ALPHABET: &[u8; 64] =
    b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/";

/// Characters per tile in a `BOARD` row (12 bits, indices 0..4095)
pub const TILE_CODE_LEN: usize = 2;

/// `BOARD` code value standing for a transparent tile (all 12 bits set)
pub const TRANSPARENT_CODE: u32 = (1 << (6 * TILE_CODE_LEN)) - 1;

// Tileset image layout: pages of 16x32 tiles stacked side by side
/// Tiles per tileset row within one page
pub const TILESET_PAGE_COLUMNS: u32 = 16;
/// Rows per tileset page
pub const TILESET_PAGE_ROWS: u32 = 32;
/// Tiles per tileset page
pub const TILESET_PAGE_SIZE: u32 = TILESET_PAGE_COLUMNS * TILESET_PAGE_ROWS;

/// A reference into the tileset image
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Tile {
    pub index: i32,
}

impl Tile {
    pub const fn new(index: i32) -> Self {
        Self { index }
    }

    pub const fn transparent() -> Self {
        Self {
            index: TRANSPARENT_INDEX,
        }
    }

    #[inline]
    pub fn is_transparent(&self) -> bool {
        self.index == TRANSPARENT_INDEX
    }

    /// Encode this tile as a `BOARD` code. Negative indices keep their low bits,
    /// so a transparent tile writes [`TRANSPARENT_CODE`].
    pub fn encode(&self) -> String {
        encode_tile_code(self.index as u32, TILE_CODE_LEN)
    }

    /// Decode a single `BOARD` code. [`TRANSPARENT_CODE`] reads back as a
    /// transparent tile.
    pub fn decode(code: &str) -> Result<Self> {
        match decode_tile_code(code)? {
            TRANSPARENT_CODE => Ok(Self::transparent()),
            index => Ok(Self::new(index as i32)),
        }
    }
}

/// Value of one tile code character, if it belongs to the alphabet
#[inline]
fn digit_value(c: u8) -> Option<u32> {
    match c {
        b'A'..=b'Z' => Some((c - b'A') as u32),
        b'a'..=b'z' => Some((c - b'a') as u32 + 26),
        b'0'..=b'9' => Some((c - b'0') as u32 + 52),
        b'+' => Some(62),
        b'/' => Some(63),
        _ => None,
    }
}

/// Decode a tile code, most significant character first
pub fn decode_tile_code(code: &str) -> Result<u32> {
    let mut value: u32 = 0;
    for c in code.bytes() {
        let digit = digit_value(c).ok_or_else(|| MapError::InvalidEncoding(code.to_string()))?;
        value = value
            .checked_mul(64)
            .map(|v| v | digit)
            .ok_or_else(|| MapError::InvalidEncoding(code.to_string()))?;
    }
    Ok(value)
}

/// Encode `value` as exactly `len` tile code characters.
///
/// Bits above `6 * len` are dropped, short values are padded with `'A'`.
pub fn encode_tile_code(value: u32, len: usize) -> String {
    (0..len)
        .rev()
        .map(|digit| {
            let shift = digit * 6;
            let bits = if shift >= 32 { 0 } else { (value >> shift) & 0x3F };
            TILE_CODE_ALPHABET[bits as usize] as char
        })
        .collect()
}

/// Position of a tile inside the tileset image, in tiles
#[inline]
pub fn tile_image_position(index: u32) -> (u32, u32) {
    let page = index / TILESET_PAGE_SIZE;
    let x = index % TILESET_PAGE_COLUMNS + page * TILESET_PAGE_COLUMNS;
    let y = index / TILESET_PAGE_COLUMNS - page * TILESET_PAGE_ROWS;
    (x, y)
}

/// Tile index at a position inside the tileset image
#[inline]
pub fn tile_index_at(x: u32, y: u32) -> u32 {
    (x / TILESET_PAGE_COLUMNS) * TILESET_PAGE_SIZE
        + x % TILESET_PAGE_COLUMNS
        + y * TILESET_PAGE_COLUMNS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_known_codes() {
        assert_eq!(decode_tile_code("AA").unwrap(), 0);
        assert_eq!(decode_tile_code("AB").unwrap(), 1);
        assert_eq!(decode_tile_code("BA").unwrap(), 64);
        assert_eq!(decode_tile_code("//").unwrap(), 4095);
        assert_eq!(decode_tile_code("").unwrap(), 0);
    }

    #[test]
    fn test_decode_rejects_foreign_characters() {
        assert!(matches!(
            decode_tile_code("A*"),
            Err(MapError::InvalidEncoding(code)) if code == "A*"
        ));
        assert!(decode_tile_code("A ").is_err());
    }

    #[test]
    fn test_code_round_trip() {
        for index in 0..4096 {
            let code = encode_tile_code(index, TILE_CODE_LEN);
            assert_eq!(code.len(), 2);
            assert_eq!(decode_tile_code(&code).unwrap(), index);
        }
    }

    #[test]
    fn test_encode_truncates_and_pads() {
        assert_eq!(encode_tile_code(1, 3), "AAB");
        assert_eq!(encode_tile_code(4096 + 5, 2), "AF");
        assert_eq!(Tile::transparent().encode(), "//");
    }

    #[test]
    fn test_transparent_tile_survives_encoding() {
        let code = Tile::transparent().encode();
        assert_eq!(Tile::decode(&code).unwrap(), Tile::transparent());
        assert_eq!(Tile::decode("/+").unwrap(), Tile::new(4094));
        assert_eq!(Tile::decode("AH").unwrap(), Tile::new(7));
    }

    #[test]
    fn test_tile_image_position() {
        assert_eq!(tile_image_position(0), (0, 0));
        assert_eq!(tile_image_position(15), (15, 0));
        assert_eq!(tile_image_position(16), (0, 1));
        assert_eq!(tile_image_position(511), (15, 31));
        assert_eq!(tile_image_position(512), (16, 0));
        assert_eq!(tile_image_position(1023), (31, 31));
    }

    #[test]
    fn test_tile_index_inverts_position() {
        for index in 0..4096 {
            let (x, y) = tile_image_position(index);
            assert_eq!(tile_index_at(x, y), index);
        }
    }

    #[test]
    fn test_default_tile_is_opaque() {
        let tile = Tile::default();
        assert_eq!(tile.index, 0);
        assert!(!tile.is_transparent());
        assert!(Tile::transparent().is_transparent());
    }
}
