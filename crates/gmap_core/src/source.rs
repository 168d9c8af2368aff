//! Where the levels of a map come from
//!
//! A [`LevelMapSource`] owns the grid of level names of a map and knows how to
//! turn a name into a file it can load from or save to. Two sources exist: a
//! single level file, and a GRMAP001 map descriptor listing a grid of levels.
//!
//! # Map descriptor format
//! ```text
//! GRMAP001
//! WIDTH 2
//! HEIGHT 1
//! LEVELNAMES
//! "west.nw","east.nw"
//! LEVELNAMESEND
//! ```

use crate::nw::{load_level, save_level};
use crate::{FileResolver, Level, LevelSize, MapError, Result};
use std::path::{Path, PathBuf};

/// Header token of the map descriptor format
pub const GMAP_VERSION: &str = "GRMAP001";

const LEVEL_NAMES_END: &str = "LEVELNAMESEND";

/// Largest number of cells a map descriptor may declare
pub const MAX_MAP_CELLS: usize = 1 << 20;

/// A resizable 2D table of level names, empty string meaning "no level"
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LevelNames {
    width: usize,
    height: usize,
    names: Vec<String>,
}

impl LevelNames {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            names: vec![String::new(); width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Name at (x, y), or "" outside the table
    pub fn get(&self, x: usize, y: usize) -> &str {
        if x < self.width && y < self.height {
            &self.names[y * self.width + x]
        } else {
            ""
        }
    }

    /// Set the name at (x, y). Does nothing outside the table.
    pub fn set(&mut self, x: usize, y: usize, name: impl Into<String>) {
        if x < self.width && y < self.height {
            self.names[y * self.width + x] = name.into();
        }
    }

    /// Change the shape, keeping every name that still fits
    pub fn resize(&mut self, width: usize, height: usize) {
        let mut names = vec![String::new(); width * height];
        for y in 0..self.height.min(height) {
            for x in 0..self.width.min(width) {
                names[y * width + x] = std::mem::take(&mut self.names[y * self.width + x]);
            }
        }
        self.width = width;
        self.height = height;
        self.names = names;
    }

    /// Number of cells naming a level
    pub fn level_count(&self) -> usize {
        self.names.iter().filter(|n| !n.is_empty()).count()
    }
}

/// Supplies the levels of a map by grid cell
pub trait LevelMapSource: Send + Sync {
    fn names(&self) -> &LevelNames;

    fn names_mut(&mut self) -> &mut LevelNames;

    /// Path of an existing file for `name`, if any
    fn resolve(&self, name: &str) -> Option<PathBuf>;

    /// Path a level called `name` should be written to
    fn save_path(&self, name: &str) -> PathBuf {
        self.resolve(name).unwrap_or_else(|| PathBuf::from(name))
    }

    fn width(&self) -> usize {
        self.names().width()
    }

    fn height(&self) -> usize {
        self.names().height()
    }

    /// Level name at a cell, "" when there is none or the cell is outside the table
    fn level_name(&self, x: usize, y: usize) -> &str {
        self.names().get(x, y)
    }

    fn set_level_name(&mut self, x: usize, y: usize, name: &str) {
        self.names_mut().set(x, y, name);
    }

    /// Load the level at a cell. `Ok(None)` when the cell names no level or the
    /// file cannot be found.
    fn load_level(&self, x: usize, y: usize, size: LevelSize) -> Result<Option<Level>> {
        let name = self.level_name(x, y);
        if name.is_empty() {
            return Ok(None);
        }
        match self.resolve(name) {
            Some(path) => load_level(&path, size).map(Some),
            None => {
                tracing::warn!("Level {:?} at ({}, {}) could not be found", name, x, y);
                Ok(None)
            }
        }
    }

    /// Save a level under the name of its cell. Cells without a name are skipped.
    fn save_level(&self, x: usize, y: usize, level: &Level) -> Result<()> {
        let name = self.level_name(x, y);
        if name.is_empty() {
            tracing::debug!("Not saving level ({}, {}): it has no file name", x, y);
            return Ok(());
        }
        save_level(level, &self.save_path(name))
    }
}

/// A map made of one level file
#[derive(Debug, Clone)]
pub struct SingleLevelSource {
    names: LevelNames,
}

impl SingleLevelSource {
    /// `path` may be empty for a level that was never saved
    pub fn new(path: impl AsRef<Path>) -> Self {
        let mut names = LevelNames::new(1, 1);
        names.set(0, 0, path.as_ref().to_string_lossy());
        Self { names }
    }
}

impl LevelMapSource for SingleLevelSource {
    fn names(&self) -> &LevelNames {
        &self.names
    }

    fn names_mut(&mut self) -> &mut LevelNames {
        &mut self.names
    }

    fn resolve(&self, name: &str) -> Option<PathBuf> {
        let path = PathBuf::from(name);
        path.is_file().then_some(path)
    }
}

/// A map whose level names come from a map descriptor
pub struct GmapSource {
    path: PathBuf,
    names: LevelNames,
    resolver: Box<dyn FileResolver>,
}

impl std::fmt::Debug for GmapSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GmapSource")
            .field("path", &self.path)
            .field("names", &self.names)
            .finish_non_exhaustive()
    }
}

impl GmapSource {
    /// Read a map descriptor from disk
    pub fn load(path: &Path, resolver: Box<dyn FileResolver>) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| MapError::io(path, e))?;
        let names = parse_gmap(&content)?;
        let source = Self::from_names(path, names, resolver);

        let found = source.resolved_count();
        if found == 0 {
            return Err(MapError::NoLevelsPresent);
        }
        tracing::info!(
            "Opened map {:?}: {}x{} cells, {} of {} levels found",
            path,
            source.names.width(),
            source.names.height(),
            found,
            source.names.level_count()
        );
        Ok(source)
    }

    pub fn from_names(
        path: impl Into<PathBuf>,
        names: LevelNames,
        resolver: Box<dyn FileResolver>,
    ) -> Self {
        Self {
            path: path.into(),
            names,
            resolver,
        }
    }

    /// Path of the map descriptor
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn descriptor_dir(&self) -> &Path {
        self.path.parent().unwrap_or_else(|| Path::new(""))
    }

    /// Number of cells whose level name resolves to an existing file
    pub fn resolved_count(&self) -> usize {
        (0..self.names.height())
            .flat_map(|y| (0..self.names.width()).map(move |x| (x, y)))
            .map(|(x, y)| self.names.get(x, y))
            .filter(|name| !name.is_empty() && self.resolve(name).is_some())
            .count()
    }
}

impl LevelMapSource for GmapSource {
    fn names(&self) -> &LevelNames {
        &self.names
    }

    fn names_mut(&mut self) -> &mut LevelNames {
        &mut self.names
    }

    fn resolve(&self, name: &str) -> Option<PathBuf> {
        if let Some(path) = self.resolver.resolve(name) {
            return Some(path);
        }
        let beside = self.descriptor_dir().join(name);
        if beside.is_file() {
            return Some(beside);
        }
        let raw = PathBuf::from(name);
        raw.is_file().then_some(raw)
    }

    fn save_path(&self, name: &str) -> PathBuf {
        self.resolve(name)
            .unwrap_or_else(|| self.descriptor_dir().join(name))
    }
}

/// Parse the text of a map descriptor into its name table
pub fn parse_gmap(text: &str) -> Result<LevelNames> {
    let mut lines = text.lines();

    let header = lines.next().unwrap_or_default();
    if !header.starts_with(GMAP_VERSION) {
        return Err(MapError::VersionMismatch {
            expected: GMAP_VERSION,
            found: header.to_string(),
        });
    }

    let mut names = LevelNames::default();
    while let Some(line) = lines.next() {
        let mut fields = line.split_whitespace();
        match fields.next() {
            Some("WIDTH") => {
                let width = parse_dimension(fields.next(), "WIDTH")?;
                check_shape(width, names.height())?;
                names.resize(width, names.height());
            }
            Some("HEIGHT") => {
                let height = parse_dimension(fields.next(), "HEIGHT")?;
                check_shape(names.width(), height)?;
                names.resize(names.width(), height);
            }
            Some("LEVELNAMES") => {
                let mut terminated = false;
                let mut y = 0;
                for row in lines.by_ref() {
                    if row.trim() == LEVEL_NAMES_END {
                        terminated = true;
                        break;
                    }
                    if row.trim().is_empty() {
                        continue;
                    }
                    let row_names = split_csv_row(row);
                    if y >= names.height() || row_names.len() > names.width() {
                        return Err(MapError::CorruptDescriptor(format!(
                            "level name row {} does not fit a {}x{} map",
                            y + 1,
                            names.width(),
                            names.height()
                        )));
                    }
                    for (x, name) in row_names.into_iter().enumerate() {
                        names.set(x, y, name);
                    }
                    y += 1;
                }
                if !terminated {
                    return Err(MapError::CorruptDescriptor(format!(
                        "LEVELNAMES block is missing its {}",
                        LEVEL_NAMES_END
                    )));
                }
            }
            Some(other) => tracing::debug!("Skipping unknown map record {:?}", other),
            None => {}
        }
    }

    if names.width() == 0 || names.height() == 0 || names.level_count() == 0 {
        return Err(MapError::NoLevelsPresent);
    }
    Ok(names)
}

fn parse_dimension(value: Option<&str>, record: &str) -> Result<usize> {
    value
        .and_then(|v| v.parse().ok())
        .ok_or_else(|| MapError::CorruptDescriptor(format!("{} needs a numeric value", record)))
}

fn check_shape(width: usize, height: usize) -> Result<()> {
    match width.checked_mul(height) {
        Some(cells) if cells <= MAX_MAP_CELLS => Ok(()),
        _ => Err(MapError::CorruptDescriptor(format!(
            "a {}x{} map exceeds {} cells",
            width, height, MAX_MAP_CELLS
        ))),
    }
}

/// Split one comma separated row. Values may be double quoted, `""` inside
/// quotes is a literal quote, and unquoted values are trimmed.
pub fn split_csv_row(row: &str) -> Vec<String> {
    let mut values = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut was_quoted = false;
    let mut chars = row.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if quoted => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    current.push('"');
                } else {
                    quoted = false;
                }
            }
            '"' if current.trim().is_empty() => {
                current.clear();
                quoted = true;
                was_quoted = true;
            }
            ',' if !quoted => {
                values.push(finish_value(&mut current, was_quoted));
                was_quoted = false;
            }
            c if was_quoted && !quoted && c.is_whitespace() => {}
            _ => current.push(c),
        }
    }
    values.push(finish_value(&mut current, was_quoted));
    values
}

fn finish_value(current: &mut String, was_quoted: bool) -> String {
    let value = std::mem::take(current);
    if was_quoted {
        value
    } else {
        value.trim().to_string()
    }
}
