//! Grid raycaster.
//!
//! A player walks a 2D tile map; each frame one ray per screen column is
//! traced through the grid to build a textured pseudo-3D view, with floor
//! and ceiling projected per row. Work is split into stripes and run on a
//! rayon pool. A top-down view shows the map, the player and the rays.

pub mod camera;
pub mod engine;
pub mod error;
pub mod flashlight;
pub mod floor;
pub mod geometry;
pub mod maze;
pub mod overlay;
pub mod raycast;
pub mod renderer;
pub mod scaler;
pub mod settings;
pub mod texture;
pub mod world;
