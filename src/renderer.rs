use std::ops::Range;

use rayon::iter::{IndexedParallelIterator, IntoParallelIterator, ParallelIterator};
use rayon::slice::ParallelSliceMut;

use crate::camera::Player;
use crate::flashlight::Lighting;
use crate::floor::{self, Surfaces};
use crate::raycast::{self, RayHit, WallSpan};
use crate::texture::TextureSource;
use crate::world::{Map, TileKind};

/// Size of the first-person view in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Viewport {
    pub width: usize,
    pub height: usize,
}

/// Row-major 0x00RRGGBB pixels, ready for presentation.
#[derive(Clone, Debug, PartialEq)]
pub struct Framebuffer {
    width: usize,
    height: usize,
    pixels: Vec<u32>,
}

impl Framebuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width * height],
        }
    }

    /// Reallocate only when the size changes.
    pub fn resize(&mut self, width: usize, height: usize) {
        if width != self.width || height != self.height {
            *self = Self::new(width, height);
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Pixels between the starts of consecutive rows.
    #[inline]
    pub fn stride(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn viewport(&self) -> Viewport {
        Viewport {
            width: self.width,
            height: self.height,
        }
    }

    #[inline]
    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    #[inline]
    pub fn pixels_mut(&mut self) -> &mut [u32] {
        &mut self.pixels
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> u32 {
        self.pixels[y * self.width + x]
    }

    /// Clipped write; off-screen coordinates are ignored.
    #[inline]
    pub fn put(&mut self, x: i32, y: i32, px: u32) {
        if x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height {
            self.pixels[y as usize * self.width + x as usize] = px;
        }
    }

    pub fn fill(&mut self, px: u32) {
        self.pixels.fill(px);
    }
}

/// Split `0..len` into at most `n` contiguous, non-empty, disjoint ranges
/// whose union is `0..len`. Leading stripes take the remainder.
pub fn stripes(len: usize, n: usize) -> Vec<Range<usize>> {
    let n = n.clamp(1, len.max(1));
    let base = len / n;
    let extra = len % n;
    let mut out = Vec::with_capacity(n);
    let mut start = 0;
    for i in 0..n {
        let size = base + usize::from(i < extra);
        out.push(start..start + size);
        start += size;
    }
    out
}

/// Cut `buf` into one sub-slice per stripe, `unit` elements per index.
fn split_by_stripes<'a, T>(mut buf: &'a mut [T], ranges: &[Range<usize>], unit: usize) -> Vec<&'a mut [T]> {
    let mut parts = Vec::with_capacity(ranges.len());
    for r in ranges {
        let (head, tail) = std::mem::take(&mut buf).split_at_mut(r.len() * unit);
        parts.push(head);
        buf = tail;
    }
    parts
}

/// Per-column result of the wall pass.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Column {
    pub span: WallSpan,
    /// `None` when the ray escaped the map.
    pub hit: Option<RayHit>,
}

/// Read-only state shared by every stripe of a frame.
pub struct Scene<'a, T: TextureSource + ?Sized> {
    pub map: &'a Map,
    pub player: &'a Player,
    pub textures: &'a T,
    pub lighting: &'a Lighting,
    pub surfaces: &'a Surfaces,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub wall_stripes: usize,
    pub floor_stripes: usize,
    pub escaped_rays: usize,
}

/// First-person renderer. Keeps its scratch layers between frames.
#[derive(Default)]
pub struct Renderer {
    /// Wall pixels, column-major so every wall stripe owns one contiguous run.
    wall_layer: Vec<u32>,
    columns: Vec<Column>,
}

impl Renderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wall results of the last frame, one per screen column.
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Render one frame into `frame`.
    ///
    /// Walls (column stripes) and floor/ceiling (row stripes) run as two
    /// parallel phases joined before compositing. Runs on the current rayon
    /// pool and returns once every stripe has finished.
    pub fn render<T: TextureSource + ?Sized>(
        &mut self,
        frame: &mut Framebuffer,
        scene: &Scene<'_, T>,
        stripe_count: usize,
    ) -> FrameStats {
        let view = frame.viewport();
        if view.width == 0 || view.height == 0 {
            return FrameStats::default();
        }
        self.wall_layer.resize(view.width * view.height, 0);
        self.columns.resize(view.width, Column::default());

        let wall_ranges = stripes(view.width, stripe_count);
        let floor_ranges = stripes(view.height, stripe_count);

        let Self {
            wall_layer,
            columns,
        } = self;
        let (escaped_rays, ()) = rayon::join(
            || cast_walls(wall_layer, columns, &wall_ranges, scene, view),
            || draw_floor(frame.pixels_mut(), &floor_ranges, scene, view),
        );

        composite(frame, &self.wall_layer, &self.columns);

        FrameStats {
            wall_stripes: wall_ranges.len(),
            floor_stripes: floor_ranges.len(),
            escaped_rays,
        }
    }
}

/// Wall phase. Returns the number of rays that escaped the map.
fn cast_walls<T: TextureSource + ?Sized>(
    wall_layer: &mut [u32],
    columns: &mut [Column],
    ranges: &[Range<usize>],
    scene: &Scene<'_, T>,
    view: Viewport,
) -> usize {
    let pixels = split_by_stripes(wall_layer, ranges, view.height);
    let cols = split_by_stripes(columns, ranges, 1);

    ranges
        .to_vec()
        .into_par_iter()
        .zip(pixels)
        .zip(cols)
        .map(|((range, pixels), cols)| {
            let mut escaped = 0;
            for (i, x) in range.enumerate() {
                let dst = &mut pixels[i * view.height..(i + 1) * view.height];
                cols[i] = match raycast::cast_column(scene.map, scene.player, x, view.width) {
                    Ok(hit) => {
                        let span = raycast::project_wall(hit.perp_dist, view.height);
                        raycast::draw_column(
                            dst,
                            x,
                            &hit,
                            span,
                            scene.map,
                            scene.textures,
                            scene.lighting,
                            view,
                        );
                        Column {
                            span,
                            hit: Some(hit),
                        }
                    }
                    Err(_) => {
                        // Full-height error stripe so the fault is visible.
                        dst.fill(TileKind::Unknown.tile().fill.pack());
                        escaped += 1;
                        Column {
                            span: WallSpan::full(view.height),
                            hit: None,
                        }
                    }
                };
            }
            escaped
        })
        .sum()
}

/// Floor/ceiling phase, written straight into the frame.
fn draw_floor<T: TextureSource + ?Sized>(
    pixels: &mut [u32],
    ranges: &[Range<usize>],
    scene: &Scene<'_, T>,
    view: Viewport,
) {
    let parts = split_by_stripes(pixels, ranges, view.width);
    ranges
        .to_vec()
        .into_par_iter()
        .zip(parts)
        .for_each(|(range, part)| {
            for (row, y) in part.chunks_mut(view.width).zip(range) {
                floor::draw_row(
                    row,
                    y,
                    scene.player,
                    scene.surfaces,
                    scene.textures,
                    scene.lighting,
                    view,
                );
            }
        });
}

/// Lay wall slices over the floor/ceiling, rows in parallel.
fn composite(frame: &mut Framebuffer, wall_layer: &[u32], columns: &[Column]) {
    let (w, h) = (frame.width, frame.height);
    frame
        .pixels
        .par_chunks_mut(w)
        .enumerate()
        .for_each(|(y, row)| {
            for (x, px) in row.iter_mut().enumerate() {
                if columns[x].span.contains(y) {
                    *px = wall_layer[x * h + y];
                }
            }
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flashlight::{Flashlight, ShadingMode};
    use crate::geometry::Vec2f;
    use crate::texture::{Color, TextureBank};
    use proptest::prelude::*;

    struct Fixture {
        map: Map,
        player: Player,
        textures: TextureBank,
        lighting: Lighting,
        surfaces: Surfaces,
    }

    impl Fixture {
        fn new(mode: ShadingMode) -> Self {
            Self {
                map: Map::demo().unwrap(),
                player: Player::new(Vec2f::new(2.0, 2.0), Vec2f::new(-1.0, 0.0), 0.66),
                textures: TextureBank::with_placeholders(),
                lighting: Lighting::new(mode, Flashlight::default()),
                surfaces: Surfaces::default(),
            }
        }

        fn scene(&self) -> Scene<'_, TextureBank> {
            Scene {
                map: &self.map,
                player: &self.player,
                textures: &self.textures,
                lighting: &self.lighting,
                surfaces: &self.surfaces,
            }
        }
    }

    #[test]
    fn stripes_examples() {
        assert_eq!(stripes(10, 3), vec![0..4, 4..7, 7..10]);
        assert_eq!(stripes(2, 8), vec![0..1, 1..2]);
        assert_eq!(stripes(5, 0), vec![0..5]);
        assert_eq!(stripes(0, 4), vec![0..0]);
    }

    #[test]
    fn framebuffer_put_clips() {
        let mut fb = Framebuffer::new(4, 3);
        fb.put(-1, 0, 7);
        fb.put(4, 0, 7);
        fb.put(3, 2, 7);
        assert_eq!(fb.get(3, 2), 7);
        assert_eq!(fb.pixels().iter().filter(|&&p| p == 7).count(), 1);
        assert_eq!(fb.stride(), 4);
    }

    #[test]
    fn center_column_shows_the_near_wall() {
        let fx = Fixture::new(ShadingMode::Directional);
        let mut frame = Framebuffer::new(64, 48);
        let mut r = Renderer::new();
        let stats = r.render(&mut frame, &fx.scene(), 4);

        assert_eq!(stats.escaped_rays, 0);
        assert_eq!(stats.wall_stripes, 4);
        let mid = r.columns()[32];
        let hit = mid.hit.unwrap();
        assert_eq!(hit.perp_dist, 1.0);
        // Wall one block away fills exactly one screen height.
        assert_eq!((mid.span.start, mid.span.end), (0, 48));
    }

    #[test]
    fn stripe_count_does_not_change_the_image() {
        for mode in [ShadingMode::Directional, ShadingMode::Flashlight] {
            let fx = Fixture::new(mode);
            let mut single = Framebuffer::new(96, 60);
            let mut many = Framebuffer::new(96, 60);
            Renderer::new().render(&mut single, &fx.scene(), 1);
            Renderer::new().render(&mut many, &fx.scene(), 7);
            assert_eq!(single, many);
        }
    }

    #[test]
    fn floor_visible_below_short_walls() {
        let mut fx = Fixture::new(ShadingMode::Directional);
        fx.surfaces = Surfaces::new(false);
        fx.player = Player::new(Vec2f::new(1.5, 3.5), Vec2f::new(1.0, 0.0), 0.66);
        let mut frame = Framebuffer::new(40, 40);
        Renderer::new().render(&mut frame, &fx.scene(), 3);
        // Looking down the long bottom corridor: the last row is floor.
        assert_eq!(frame.get(20, 39), Color::LIGHT_GRAY.pack());
        assert_eq!(frame.get(20, 0), Color::LIGHT_BLUE.pack());
    }

    #[test]
    fn escaped_rays_are_counted_and_flagged() {
        // Standing outside the grid makes every ray escape.
        let mut fx = Fixture::new(ShadingMode::Directional);
        fx.player = Player::new(Vec2f::new(-2.0, 2.0), Vec2f::new(1.0, 0.0), 0.66);
        let mut frame = Framebuffer::new(16, 8);
        let mut r = Renderer::new();
        let stats = r.render(&mut frame, &fx.scene(), 2);
        assert_eq!(stats.escaped_rays, 16);
        assert!(r.columns().iter().all(|c| c.hit.is_none()));
        assert_eq!(frame.get(0, 0), Color::PURPLE.pack());
    }

    proptest! {
        #[test]
        fn stripes_cover_exactly_once(len in 0usize..2000, n in 0usize..64) {
            let parts = stripes(len, n);
            let mut next = 0;
            for r in &parts {
                prop_assert_eq!(r.start, next);
                prop_assert!(len == 0 || !r.is_empty());
                next = r.end;
            }
            prop_assert_eq!(next, len);
            prop_assert!(parts.len() <= n.max(1));
        }
    }
}
