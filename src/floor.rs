//! Floor and ceiling, one screen row at a time.
//!
//! Rows below the midline sample the floor; each row above it is the mirror
//! of a floor row and samples the ceiling at the same world position.

use crate::camera::Player;
use crate::flashlight::Lighting;
use crate::geometry::Vec2f;
use crate::renderer::Viewport;
use crate::texture::{Color, TextureId, TextureSource};

/// What the floor and ceiling look like.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Surfaces {
    pub textured: bool,
    pub floor: TextureId,
    pub ceiling: TextureId,
    pub floor_color: Color,
    pub ceiling_color: Color,
}

impl Surfaces {
    pub fn new(textured: bool) -> Self {
        Self {
            textured,
            ..Self::default()
        }
    }
}

impl Default for Surfaces {
    fn default() -> Self {
        Self {
            textured: true,
            floor: TextureId::GreyStone,
            ceiling: TextureId::Wood,
            floor_color: Color::LIGHT_GRAY,
            ceiling_color: Color::LIGHT_BLUE,
        }
    }
}

/// World-space walk for one floor row.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FloorRow {
    /// Camera distance to the floor seen on this row.
    pub distance: f32,
    /// World position under the leftmost column.
    pub start: Vec2f,
    /// World advance per screen column.
    pub step: Vec2f,
    pub is_ceiling: bool,
}

/// Set up screen row `y`. Rows on the horizon, where the floor is infinitely
/// far away, return `None`.
pub fn row_setup(player: &Player, y: usize, view: Viewport) -> Option<FloorRow> {
    let half = view.height / 2;
    let is_ceiling = y <= half;
    let floor_y = if is_ceiling { view.height - 1 - y } else { y };
    if floor_y <= half {
        return None;
    }

    let p = (floor_y - half) as f32;
    let distance = (view.height as f32 * 0.5) / p;

    let ray_left = player.direction() - player.plane();
    let ray_right = player.direction() + player.plane();
    let step = (ray_right - ray_left) * (distance / view.width as f32);
    let start = player.position() + ray_left * distance;

    Some(FloorRow {
        distance,
        start,
        step,
        is_ceiling,
    })
}

/// Paint screen row `y` into `dst`, which is `view.width` pixels long.
pub fn draw_row<T: TextureSource + ?Sized>(
    dst: &mut [u32],
    y: usize,
    player: &Player,
    surfaces: &Surfaces,
    textures: &T,
    lighting: &Lighting,
    view: Viewport,
) {
    let Some(row) = row_setup(player, y, view) else {
        let flat = if y <= view.height / 2 {
            surfaces.ceiling_color
        } else {
            surfaces.floor_color
        };
        for (x, px) in dst.iter_mut().enumerate() {
            *px = lighting.surface(flat, f32::INFINITY, x, y, view).pack();
        }
        return;
    };

    if lighting.culls(row.distance) {
        dst.fill(0);
        return;
    }

    let (tex, flat) = if row.is_ceiling {
        (surfaces.ceiling, surfaces.ceiling_color)
    } else {
        (surfaces.floor, surfaces.floor_color)
    };
    let (tw, th) = textures.dimensions(tex);

    let mut world = row.start;
    for (x, px) in dst.iter_mut().enumerate() {
        let c = if surfaces.textured {
            let f = world.fract();
            let u = ((tw as f32 * f.x) as usize).min(tw - 1);
            let v = ((th as f32 * f.y) as usize).min(th - 1);
            textures.sample(tex, u, v)
        } else {
            flat
        };
        world = world + row.step;
        *px = lighting.surface(c, row.distance, x, y, view).pack();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flashlight::{Flashlight, ShadingMode};
    use crate::texture::TextureBank;

    const VIEW: Viewport = Viewport {
        width: 8,
        height: 10,
    };

    fn player() -> Player {
        Player::new(Vec2f::new(2.5, 2.5), Vec2f::new(1.0, 0.0), 0.66)
    }

    #[test]
    fn horizon_rows_have_no_setup() {
        let p = player();
        assert!(row_setup(&p, 5, VIEW).is_none());
        assert!(row_setup(&p, 4, VIEW).is_none());
        assert!(row_setup(&p, 6, VIEW).is_some());
        assert!(row_setup(&p, 3, VIEW).is_some());
    }

    #[test]
    fn bottom_row_is_nearest() {
        let p = player();
        let bottom = row_setup(&p, 9, VIEW).unwrap();
        let upper = row_setup(&p, 6, VIEW).unwrap();
        assert_eq!(bottom.distance, 1.25);
        assert_eq!(upper.distance, 5.0);
        assert!(!bottom.is_ceiling);
    }

    #[test]
    fn ceiling_row_mirrors_floor_row() {
        let p = player();
        let floor = row_setup(&p, 8, VIEW).unwrap();
        let ceiling = row_setup(&p, 1, VIEW).unwrap();
        assert!(ceiling.is_ceiling);
        assert_eq!(floor.distance, ceiling.distance);
        assert_eq!(floor.start, ceiling.start);
        assert_eq!(floor.step, ceiling.step);
    }

    #[test]
    fn row_spans_camera_plane() {
        let p = player();
        let row = row_setup(&p, 9, VIEW).unwrap();
        let end = row.start + row.step * VIEW.width as f32;
        let expected = p.position() + (p.direction() + p.plane()) * row.distance;
        assert!((end - expected).length() < 1e-5);
    }

    #[test]
    fn flat_surfaces_when_untextured() {
        let bank = TextureBank::with_placeholders();
        let surfaces = Surfaces::new(false);
        let mut row = vec![0u32; VIEW.width];
        draw_row(&mut row, 9, &player(), &surfaces, &bank, &Lighting::Directional, VIEW);
        assert!(row.iter().all(|&px| px == Color::LIGHT_GRAY.pack()));
        draw_row(&mut row, 0, &player(), &surfaces, &bank, &Lighting::Directional, VIEW);
        assert!(row.iter().all(|&px| px == Color::LIGHT_BLUE.pack()));
    }

    #[test]
    fn midline_row_is_ceiling_on_both_paths() {
        let bank = TextureBank::with_placeholders();
        let surfaces = Surfaces::new(false);
        let mut row = vec![0u32; VIEW.width];
        // Row 5 is the midline: no setup, but still ceiling side.
        draw_row(&mut row, 5, &player(), &surfaces, &bank, &Lighting::Directional, VIEW);
        assert!(row.iter().all(|&px| px == Color::LIGHT_BLUE.pack()));
        draw_row(&mut row, 6, &player(), &surfaces, &bank, &Lighting::Directional, VIEW);
        assert!(row.iter().all(|&px| px == Color::LIGHT_GRAY.pack()));
    }

    #[test]
    fn flashlight_blacks_out_horizon() {
        let bank = TextureBank::with_placeholders();
        let lighting = Lighting::new(ShadingMode::Flashlight, Flashlight::default());
        let mut row = vec![1u32; VIEW.width];
        draw_row(&mut row, 5, &player(), &Surfaces::default(), &bank, &lighting, VIEW);
        assert!(row.iter().all(|&px| px == 0));
    }
}
