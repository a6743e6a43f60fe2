//! Per-column wall casting.
//!
//! Each screen column gets one ray from the player through the camera plane.
//! The ray walks the grid with DDA until it enters an impassable tile; the
//! distance used for projection is measured along the view direction, which
//! keeps straight walls straight.

use crate::camera::Player;
use crate::error::RaycastError;
use crate::flashlight::Lighting;
use crate::geometry::{Vec2f, Vec2i};
use crate::renderer::Viewport;
use crate::texture::TextureSource;
use crate::world::Map;

/// Smallest distance used for projection; keeps the line height finite.
pub const MIN_PERP_DIST: f32 = 1e-4;

/// Upper bound on a projected wall, in multiples of the viewport height.
pub const MAX_LINE_FACTOR: f32 = 64.0;

/// Which grid axis the ray crossed last before the hit.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Side {
    /// Stepped along X: an east/west-facing face.
    EastWest,
    /// Stepped along Y: a north/south-facing face.
    NorthSouth,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayHit {
    /// Impassable cell the ray entered.
    pub cell: Vec2i,
    pub side: Side,
    /// Distance along the view direction, not the Euclidean ray length.
    pub perp_dist: f32,
    pub ray_dir: Vec2f,
    /// Fractional hit position along the struck face, in `[0, 1)`.
    pub wall_x: f32,
}

impl RayHit {
    /// World-space hit point.
    pub fn point(&self, origin: Vec2f) -> Vec2f {
        origin + self.ray_dir * self.perp_dist
    }

    /// Texture column for a texture `tex_w` texels wide. Faces seen from the
    /// positive side of their axis are mirrored so every face reads the same
    /// way round.
    pub fn texture_column(&self, tex_w: usize) -> usize {
        let u = ((self.wall_x * tex_w as f32) as usize).min(tex_w - 1);
        let mirrored = match self.side {
            Side::EastWest => self.ray_dir.x > 0.0,
            Side::NorthSouth => self.ray_dir.y < 0.0,
        };
        if mirrored { tex_w - u - 1 } else { u }
    }
}

/// Camera-space offset of screen column `x`, in `[-1, 1)`.
#[inline]
pub fn camera_x(x: usize, view_width: usize) -> f32 {
    2.0 * x as f32 / view_width as f32 - 1.0
}

/// Walk the grid from `origin` along `dir` until an impassable tile.
///
/// The map is expected to be enclosed, which bounds the walk by
/// `width + height` steps. Exceeding that, or leaving the grid, is reported
/// as [`RaycastError::Escaped`] rather than looping forever.
pub fn cast_ray(map: &Map, origin: Vec2f, dir: Vec2f) -> Result<RayHit, RaycastError> {
    let mut cell = origin.to_cell();
    if !map.in_bounds(cell) {
        return Err(RaycastError::Escaped { cell, steps: 0 });
    }

    // A zero component gives an infinite delta, so that axis never wins.
    let delta = Vec2f::splat(1.0).div_elem(dir).abs();

    let (step_x, mut side_x) = if dir.x >= 0.0 {
        (1, (cell.x as f32 + 1.0 - origin.x) * delta.x)
    } else {
        (-1, (origin.x - cell.x as f32) * delta.x)
    };
    let (step_y, mut side_y) = if dir.y >= 0.0 {
        (1, (cell.y as f32 + 1.0 - origin.y) * delta.y)
    } else {
        (-1, (origin.y - cell.y as f32) * delta.y)
    };

    let limit = map.width() + map.height();
    for steps in 1..=limit {
        let side = if side_x < side_y {
            side_x += delta.x;
            cell.x += step_x;
            Side::EastWest
        } else {
            side_y += delta.y;
            cell.y += step_y;
            Side::NorthSouth
        };

        let Some(tile) = map.get(cell) else {
            return Err(RaycastError::Escaped { cell, steps });
        };
        if tile.passable {
            continue;
        }

        let (perp_dist, along) = match side {
            Side::EastWest => {
                let d = side_x - delta.x;
                (d, origin.y + d * dir.y)
            }
            Side::NorthSouth => {
                let d = side_y - delta.y;
                (d, origin.x + d * dir.x)
            }
        };
        return Ok(RayHit {
            cell,
            side,
            perp_dist,
            ray_dir: dir,
            wall_x: along - along.floor(),
        });
    }

    Err(RaycastError::Escaped { cell, steps: limit })
}

/// Cast the ray for screen column `x`.
#[inline]
pub fn cast_column(map: &Map, player: &Player, x: usize, view_width: usize) -> Result<RayHit, RaycastError> {
    cast_ray(map, player.position(), player.ray_direction(camera_x(x, view_width)))
}

/// Vertical extent of a wall slice, clipped to the viewport.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WallSpan {
    /// First covered row.
    pub start: usize,
    /// One past the last covered row.
    pub end: usize,
    /// Unclipped projected height in pixels.
    pub line_height: usize,
}

impl WallSpan {
    /// A slice covering the whole column.
    pub fn full(height: usize) -> Self {
        Self {
            start: 0,
            end: height,
            line_height: height,
        }
    }

    #[inline]
    pub fn contains(&self, y: usize) -> bool {
        y >= self.start && y < self.end
    }
}

/// Project a wall at `perp_dist` onto a viewport `height` rows tall, centred
/// on the midline. Distances at or below [`MIN_PERP_DIST`] (including NaN)
/// are clamped, and the height is capped at [`MAX_LINE_FACTOR`] screens.
pub fn project_wall(perp_dist: f32, height: usize) -> WallSpan {
    let h = height as f32;
    let dist = perp_dist.max(MIN_PERP_DIST);
    let line = (h / dist).min(h * MAX_LINE_FACTOR) as i64;
    let top = (height / 2) as i64 - line / 2;
    let start = top.max(0);
    let end = (top + line).min(height as i64).max(start);
    WallSpan {
        start: start as usize,
        end: end as usize,
        line_height: line as usize,
    }
}

/// Fill one column of a column-major wall layer with the textured slice.
///
/// `dst` holds the column's `view.height` pixels, top to bottom.
pub fn draw_column<T: TextureSource + ?Sized>(
    dst: &mut [u32],
    x: usize,
    hit: &RayHit,
    span: WallSpan,
    map: &Map,
    textures: &T,
    lighting: &Lighting,
    view: Viewport,
) {
    if lighting.culls(hit.perp_dist) {
        dst[span.start..span.end].fill(0);
        return;
    }

    let Some(tile) = map.get(hit.cell) else {
        return;
    };
    let (tex_w, tex_h) = textures.dimensions(tile.texture);
    let u = hit.texture_column(tex_w);

    let line = span.line_height.max(1) as f32;
    let step = tex_h as f32 / line;
    // Unclipped top row of the slice, matching `project_wall`.
    let top = (view.height / 2) as i64 - (span.line_height / 2) as i64;
    let mut tex_pos = (span.start as i64 - top) as f32 * step;

    for (y, px) in dst.iter_mut().enumerate().take(span.end).skip(span.start) {
        let v = (tex_pos.max(0.0) as usize).min(tex_h - 1);
        tex_pos += step;
        let texel = textures.sample(tile.texture, u, v);
        *px = lighting
            .wall(texel, hit.side, hit.perp_dist, x, y, view)
            .pack();
    }
}
