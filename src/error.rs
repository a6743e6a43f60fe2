//! Error types, one enum per concern.

use crate::geometry::Vec2i;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MapError {
    #[error("map layout has no rows")]
    Empty,

    /// Every row of a layout must be as wide as the first.
    #[error("row {row} is {found} tiles wide, expected {expected}")]
    Ragged {
        row: usize,
        expected: usize,
        found: usize,
    },

    /// A border tile is passable, so rays could leave the grid.
    #[error("map border is open at ({x}, {y})")]
    Unenclosed { x: usize, y: usize },

    #[error("generator needs at least 5x5 blocks, got {width}x{height}")]
    BadDimensions { width: usize, height: usize },
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RaycastError {
    /// The DDA walk hit its step cap or left the grid without striking a wall.
    #[error("ray escaped the map at cell {cell:?} after {steps} steps")]
    Escaped { cell: Vec2i, steps: usize },
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TextureError {
    #[error("texture is {width}x{height} but has {len} pixels")]
    BadSize {
        width: usize,
        height: usize,
        len: usize,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("cannot read settings file: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot parse settings: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid setting: {0}")]
    Invalid(String),
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error(transparent)]
    Map(#[from] MapError),

    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error("cannot start render workers: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}
