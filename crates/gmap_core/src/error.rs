//! Error type shared by every loading, addressing and editing operation

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised by the document model
#[derive(Debug, Error)]
pub enum MapError {
    /// The header line did not start with the expected format token
    #[error("Version mismatch: expected {expected}, found {found:?}")]
    VersionMismatch { expected: &'static str, found: String },

    /// A tile code contained a character outside the radix-64 alphabet
    #[error("Invalid tile encoding: {0:?}")]
    InvalidEncoding(String),

    /// The map descriptor is malformed or a block is unterminated
    #[error("Corrupt map descriptor: {0}")]
    CorruptDescriptor(String),

    /// The map descriptor does not name a single level
    #[error("Map descriptor contains no levels")]
    NoLevelsPresent,

    /// A tile or level coordinate lies outside the current grid shape
    #[error("Coordinate ({x}, {y}) is outside the {width}x{height} grid")]
    OutOfBounds {
        x: i64,
        y: i64,
        width: usize,
        height: usize,
    },

    /// The referenced NPC does not exist in the expected level
    #[error("NPC {id} not found in level ({level_x}, {level_y})")]
    NotFound {
        level_x: usize,
        level_y: usize,
        id: u32,
    },

    /// A level record could not be parsed
    #[error("Malformed record on line {line}: {message}")]
    MalformedRecord { line: usize, message: String },

    /// Global addressing reached a cell that has no level
    #[error("No level loaded at map cell ({x}, {y})")]
    LevelNotLoaded { x: usize, y: usize },

    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl MapError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        MapError::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn out_of_bounds(x: i64, y: i64, width: usize, height: usize) -> Self {
        MapError::OutOfBounds {
            x,
            y,
            width,
            height,
        }
    }

    /// Whether this error describes a damaged or foreign file rather than a bad call
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            MapError::VersionMismatch { .. }
                | MapError::InvalidEncoding(_)
                | MapError::CorruptDescriptor(_)
                | MapError::NoLevelsPresent
                | MapError::MalformedRecord { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, MapError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_error_classification() {
        assert!(MapError::NoLevelsPresent.is_format_error());
        assert!(MapError::InvalidEncoding("*".to_string()).is_format_error());
        assert!(!MapError::out_of_bounds(-1, 0, 2, 2).is_format_error());
        assert!(!MapError::LevelNotLoaded { x: 0, y: 0 }.is_format_error());
    }

    #[test]
    fn test_display_names_coordinates() {
        let err = MapError::out_of_bounds(130, 5, 128, 64);
        assert_eq!(
            err.to_string(),
            "Coordinate (130, 5) is outside the 128x64 grid"
        );
    }
}
