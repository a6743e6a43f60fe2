//! Top-down debug view: tiles, the player's collision square, its facing and
//! a fan of rays ending where they strike.

use crate::camera::Player;
use crate::geometry::Vec2f;
use crate::raycast::{self, camera_x};
use crate::renderer::Framebuffer;
use crate::texture::Color;
use crate::world::Map;

const GRID_LINE: Color = Color::rgb(90, 90, 90);
const RAY: Color = Color::YELLOW;
const PLAYER: Color = Color::RED;
const FACING: Color = Color::BLACK;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Overlay {
    /// Pixels per map block.
    pub block_px: usize,
    /// Rays in the fan; 0 disables it.
    pub rays: usize,
}

impl Overlay {
    pub fn new(block_px: usize, rays: usize) -> Self {
        Self { block_px, rays }
    }

    #[inline]
    fn to_px(&self, p: Vec2f) -> (i32, i32) {
        let s = self.block_px as f32;
        ((p.x * s) as i32, (p.y * s) as i32)
    }

    /// Redraw the whole view. `fb` is resized to the map's pixel size.
    pub fn draw(&self, fb: &mut Framebuffer, map: &Map, player: &Player, radius: f32) {
        let (w, h) = map.size_px(self.block_px);
        fb.resize(w, h);

        let b = self.block_px;
        for (cell, tile) in map.tiles() {
            let (x0, y0) = (cell.x as usize * b, cell.y as usize * b);
            let fill = tile.fill.pack();
            for y in y0..y0 + b {
                for x in x0..x0 + b {
                    let edge = x == x0 || y == y0;
                    fb.put(x as i32, y as i32, if edge { GRID_LINE.pack() } else { fill });
                }
            }
        }

        let origin = player.position();
        let (px, py) = self.to_px(origin);
        if self.rays > 0 {
            for i in 0..self.rays {
                let dir = player.ray_direction(camera_x(i, self.rays.max(2) - 1).min(1.0));
                if let Ok(hit) = raycast::cast_ray(map, origin, dir) {
                    let (ex, ey) = self.to_px(hit.point(origin));
                    draw_line(fb, px, py, ex, ey, RAY.pack());
                }
            }
        }

        let r = ((radius * b as f32) as i32).max(1);
        for y in py - r..=py + r {
            for x in px - r..=px + r {
                fb.put(x, y, PLAYER.pack());
            }
        }
        let (fx, fy) = self.to_px(origin + player.direction() * (radius * 2.5));
        draw_line(fb, px, py, fx, fy, FACING.pack());
    }
}

/// Integer Bresenham line, clipped per pixel.
pub fn draw_line(fb: &mut Framebuffer, mut x0: i32, mut y0: i32, x1: i32, y1: i32, px: u32) {
    let dx = (x1 - x0).abs();
    let dy = -(y1 - y0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        fb.put(x0, y0, px);
        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}
