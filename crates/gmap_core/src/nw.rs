//! Reading and writing of GLEVNW01 level files
//!
//! # File Format
//! ```text
//! GLEVNW01
//! BOARD x y width layer tilecodes
//! LINK destination x y width height new_x new_y
//! SIGN x y
//! ...sign text...
//! SIGNEND
//! NPC image x y
//! ...script...
//! NPCEND
//! ```
//!
//! Records may come in any order and unknown records are skipped. NPC
//! coordinates are written in half tiles, an image of `-` means "no image".

use crate::{Level, LevelSize, Link, MapError, Npc, Result, Sign, Tile, TILE_CODE_LEN};
use std::fmt::Write as _;
use std::path::Path;
use std::str::FromStr;

/// Header token of the level format
pub const NW_LEVEL_VERSION: &str = "GLEVNW01";

/// Highest layer count a `BOARD` record may ask for
pub const MAX_BOARD_LAYERS: usize = 256;

const SIGN_END: &str = "SIGNEND";
const NPC_END: &str = "NPCEND";
const NO_IMAGE: &str = "-";

type NumberedLines<'a> = std::iter::Enumerate<std::str::Lines<'a>>;

/// Read a level file from disk
pub fn load_level(path: &Path, size: LevelSize) -> Result<Level> {
    let content = std::fs::read_to_string(path).map_err(|e| MapError::io(path, e))?;
    let level = parse_level(&content, size)?;
    tracing::debug!(
        "Loaded level {:?} ({} layers, {} npcs)",
        path,
        level.layer_count(),
        level.npcs().len()
    );
    Ok(level)
}

/// Write a level file to disk
pub fn save_level(level: &Level, path: &Path) -> Result<()> {
    std::fs::write(path, write_level(level)).map_err(|e| MapError::io(path, e))?;
    tracing::debug!("Saved level {:?}", path);
    Ok(())
}

/// Parse the text of a level file
pub fn parse_level(text: &str, size: LevelSize) -> Result<Level> {
    let mut lines = text.lines().enumerate();

    let header = lines.next().map(|(_, line)| line).unwrap_or_default();
    if !header.starts_with(NW_LEVEL_VERSION) {
        return Err(MapError::VersionMismatch {
            expected: NW_LEVEL_VERSION,
            found: header.to_string(),
        });
    }

    let mut level = Level::new(size);
    while let Some((index, line)) = lines.next() {
        let line_no = index + 1;
        let mut fields = line.split_whitespace();
        let Some(kind) = fields.next() else {
            continue;
        };

        match kind {
            "BOARD" => parse_board(&mut level, line_no, &mut fields)?,
            "LINK" => {
                let link = Link {
                    destination: next_field(&mut fields, line_no, "destination")?,
                    x: next_field(&mut fields, line_no, "x")?,
                    y: next_field(&mut fields, line_no, "y")?,
                    width: next_field(&mut fields, line_no, "width")?,
                    height: next_field(&mut fields, line_no, "height")?,
                    new_x: next_field(&mut fields, line_no, "new x")?,
                    new_y: next_field(&mut fields, line_no, "new y")?,
                };
                level.links.push(link);
            }
            "SIGN" => {
                let x = next_field(&mut fields, line_no, "x")?;
                let y = next_field(&mut fields, line_no, "y")?;
                let (text, terminated) = read_block(&mut lines, SIGN_END);
                if !terminated {
                    return Err(MapError::MalformedRecord {
                        line: line_no,
                        message: format!("SIGN is missing its {}", SIGN_END),
                    });
                }
                level.signs.push(Sign { x, y, text });
            }
            "NPC" => {
                let image: String = next_field(&mut fields, line_no, "image")?;
                let x: f64 = next_field(&mut fields, line_no, "x")?;
                let y: f64 = next_field(&mut fields, line_no, "y")?;
                // The script may run up to the end of the file
                let (script, _) = read_block(&mut lines, NPC_END);
                level.add_npc(Npc {
                    id: 0,
                    image: if image == NO_IMAGE { String::new() } else { image },
                    script,
                    x: x.floor() as i32,
                    y: y.floor() as i32,
                });
            }
            other => {
                tracing::debug!("Skipping unknown level record {:?} on line {}", other, line_no)
            }
        }
    }

    Ok(level)
}

fn parse_board<'a>(
    level: &mut Level,
    line_no: usize,
    fields: &mut impl Iterator<Item = &'a str>,
) -> Result<()> {
    let start_x: usize = next_field(fields, line_no, "x")?;
    let y: usize = next_field(fields, line_no, "y")?;
    let width: usize = next_field(fields, line_no, "width")?;
    let layer: usize = next_field(fields, line_no, "layer")?;
    let data = fields.next().unwrap_or_default();

    let malformed = |message: String| MapError::MalformedRecord {
        line: line_no,
        message,
    };
    let expected_len = width
        .checked_mul(TILE_CODE_LEN)
        .ok_or_else(|| malformed(format!("BOARD width {} is too large", width)))?;
    if data.len() < expected_len {
        return Err(malformed(format!(
            "BOARD expects {} tile codes, found {} characters",
            width,
            data.len()
        )));
    }
    let end_x = start_x
        .checked_add(width)
        .ok_or_else(|| malformed(format!("BOARD x {} is too large", start_x)))?;
    if layer >= MAX_BOARD_LAYERS {
        return Err(malformed(format!("BOARD layer {} is too high", layer)));
    }
    if y >= level.height() || end_x > level.width() {
        return Err(malformed(format!(
            "BOARD row {} x {}..{} lies outside the level",
            y, start_x, end_x
        )));
    }

    let grid = level.ensure_layer(layer);
    for i in 0..width {
        let code = data
            .get(i * TILE_CODE_LEN..(i + 1) * TILE_CODE_LEN)
            .ok_or_else(|| MapError::InvalidEncoding(data.to_string()))?;
        grid.set_tile(start_x + i, y, Tile::decode(code)?)?;
    }
    Ok(())
}

fn next_field<'a, T: FromStr>(
    fields: &mut impl Iterator<Item = &'a str>,
    line_no: usize,
    name: &str,
) -> Result<T> {
    let value = fields.next().ok_or_else(|| MapError::MalformedRecord {
        line: line_no,
        message: format!("missing {}", name),
    })?;
    value.parse().map_err(|_| MapError::MalformedRecord {
        line: line_no,
        message: format!("invalid {} {:?}", name, value),
    })
}

/// Collect raw lines up to `end`. Returns the text and whether `end` was seen.
fn read_block(lines: &mut NumberedLines<'_>, end: &str) -> (String, bool) {
    let mut text = String::new();
    for (_, line) in lines.by_ref() {
        if line == end {
            return (text, true);
        }
        text.push_str(line);
        text.push('\n');
    }
    (text, false)
}

fn push_block(out: &mut String, text: &str, end: &str) {
    out.push_str(text);
    if !text.is_empty() && !text.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(end);
    out.push('\n');
}

/// Serialize a level to the text format
pub fn write_level(level: &Level) -> String {
    let mut out = String::new();
    out.push_str(NW_LEVEL_VERSION);
    out.push('\n');

    // Writing into a String cannot fail
    for (layer, grid) in level.layers().iter().enumerate() {
        for (y, row) in grid.rows().enumerate() {
            let codes: String = row.iter().map(Tile::encode).collect();
            let _ = writeln!(out, "BOARD 0 {} {} {} {}", y, row.len(), layer, codes);
        }
    }
    out.push('\n');

    if !level.links.is_empty() {
        for link in &level.links {
            let _ = writeln!(
                out,
                "LINK {} {} {} {} {} {} {}",
                link.destination, link.x, link.y, link.width, link.height, link.new_x, link.new_y
            );
        }
        out.push('\n');
    }

    for sign in &level.signs {
        let _ = writeln!(out, "SIGN {} {}", sign.x, sign.y);
        push_block(&mut out, &sign.text, SIGN_END);
        out.push('\n');
    }

    for npc in level.npcs() {
        let image = if npc.image.is_empty() {
            NO_IMAGE
        } else {
            npc.image.as_str()
        };
        let _ = writeln!(out, "NPC {} {} {}", image, npc.x, npc.y);
        push_block(&mut out, &npc.script, NPC_END);
        out.push('\n');
    }

    out
}
