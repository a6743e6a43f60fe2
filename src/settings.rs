//! Runtime configuration.
//!
//! Everything has a default; a JSON file may override any subset of fields.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::camera::Motion;
use crate::error::{MapError, SettingsError};
use crate::flashlight::{Flashlight, ShadingMode};
use crate::maze::{self, DungeonParams, START_CELL};
use crate::world::{DEFAULT_LAYOUT, Map};

/// Where the level comes from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MapSource {
    /// Hand-written rows of tile symbols.
    Literal { rows: Vec<String> },
    /// Generated maze with rooms.
    Maze(DungeonParams),
}

impl Default for MapSource {
    fn default() -> Self {
        MapSource::Literal {
            rows: DEFAULT_LAYOUT.iter().map(|r| r.to_string()).collect(),
        }
    }
}

impl MapSource {
    pub fn build(&self) -> Result<Map, MapError> {
        match self {
            MapSource::Literal { rows } => Map::from_rows(rows),
            MapSource::Maze(params) => maze::generate(params)?.to_map(),
        }
    }

    /// Spawn point and facing used when the settings do not name one.
    pub fn default_spawn(&self) -> ([f32; 2], [f32; 2]) {
        match self {
            MapSource::Literal { .. } => ([2.0, 2.0], [-1.0, 0.0]),
            MapSource::Maze(_) => (
                [START_CELL.0 as f32 + 0.5, START_CELL.1 as f32 + 0.5],
                [1.0, 0.0],
            ),
        }
    }

    pub fn describe(&self) -> String {
        match self {
            MapSource::Literal { rows } => format!("literal layout ({} rows)", rows.len()),
            MapSource::Maze(p) => format!("maze {}x{} seed {:#x}", p.width, p.height, p.seed),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// First-person framebuffer size. The window stretches it.
    pub view_width: usize,
    pub view_height: usize,
    /// Top-down view pixels per block.
    pub block_px: usize,
    /// Rays drawn in the top-down view.
    pub overlay_rays: usize,
    /// Camera-plane length; 0.66 is about a 66° field of view.
    pub fov_scale: f32,
    pub motion: Motion,
    /// Longest frame step fed to the player update, in seconds.
    pub max_dt: f32,
    /// Stripes per render phase; `None` uses the worker count.
    pub stripes: Option<usize>,
    /// Render workers; `None` uses the available parallelism.
    pub threads: Option<usize>,
    pub shading: ShadingMode,
    pub flashlight: Flashlight,
    pub textured_floor: bool,
    pub map: MapSource,
    /// Start position in blocks; `None` picks the map source default.
    pub spawn: Option<[f32; 2]>,
    pub facing: Option<[f32; 2]>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            view_width: 640,
            view_height: 480,
            block_px: 24,
            overlay_rays: 32,
            fov_scale: 0.66,
            motion: Motion::default(),
            max_dt: 0.1,
            stripes: None,
            threads: None,
            shading: ShadingMode::Directional,
            flashlight: Flashlight::default(),
            textured_floor: true,
            map: MapSource::default(),
            spawn: None,
            facing: None,
        }
    }
}

impl Settings {
    pub fn from_json(text: &str) -> Result<Self, SettingsError> {
        let settings: Settings = serde_json::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SettingsError> {
        Self::from_json(&std::fs::read_to_string(path)?)
    }

    pub fn to_json(&self) -> Result<String, SettingsError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        let invalid = |msg: &str| Err(SettingsError::Invalid(msg.to_string()));

        if self.view_width == 0 || self.view_height == 0 {
            return invalid("viewport must be at least 1x1");
        }
        if self.block_px == 0 {
            return invalid("block_px must be positive");
        }
        if !(self.fov_scale > 0.0) {
            return invalid("fov_scale must be positive");
        }
        if !(self.motion.radius > 0.0 && self.motion.radius < 0.5) {
            return invalid("motion.radius must be in (0, 0.5)");
        }
        if !(self.motion.move_rate >= 0.0) || !(self.motion.angular_velocity >= 0.0) {
            return invalid("motion rates must be non-negative");
        }
        if !(self.max_dt > 0.0) {
            return invalid("max_dt must be positive");
        }
        if self.stripes == Some(0) || self.threads == Some(0) {
            return invalid("stripes and threads must be positive when set");
        }
        if !(self.flashlight.penetration > 0.0) {
            return invalid("flashlight.penetration must be positive");
        }
        if let MapSource::Maze(p) = &self.map {
            if p.room_min < 3 || p.room_min > p.room_max {
                return invalid("maze rooms need 3 <= room_min <= room_max");
            }
        }
        Ok(())
    }
}
