use rayon::{
    iter::{IndexedParallelIterator, ParallelIterator},
    slice::ParallelSliceMut,
};

use crate::renderer::Framebuffer;

/// Precomputed source neighbours and 8.8 fixed-point weights for stretching
/// a `src_w x src_h` framebuffer onto a `dst_w x dst_h` surface.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Stretch {
    src_w: usize,
    src_h: usize,
    x0: Vec<usize>,
    x1: Vec<usize>,
    wx: Vec<u32>,
    y0: Vec<usize>,
    y1: Vec<usize>,
    wy: Vec<u32>,
}

/// Neighbour pair and weight along one axis.
fn axis(dst: usize, src: usize) -> (Vec<usize>, Vec<usize>, Vec<u32>) {
    let scale = src as f32 / dst as f32;
    let last = src.saturating_sub(1);
    let mut lo = Vec::with_capacity(dst);
    let mut hi = Vec::with_capacity(dst);
    let mut w = Vec::with_capacity(dst);
    for i in 0..dst {
        let f = i as f32 * scale;
        let a = (f.floor() as usize).min(last);
        lo.push(a);
        hi.push((a + 1).min(last));
        w.push(((f - a as f32) * 256.0).round().clamp(0.0, 256.0) as u32);
    }
    (lo, hi, w)
}

impl Stretch {
    pub fn new(src_w: usize, src_h: usize, dst_w: usize, dst_h: usize) -> Self {
        let (x0, x1, wx) = axis(dst_w, src_w);
        let (y0, y1, wy) = axis(dst_h, src_h);
        Self {
            src_w,
            src_h,
            x0,
            x1,
            wx,
            y0,
            y1,
            wy,
        }
    }

    /// True when this table was built for these sizes.
    pub fn fits(&self, src_w: usize, src_h: usize, dst_w: usize, dst_h: usize) -> bool {
        self.src_w == src_w && self.src_h == src_h && self.x0.len() == dst_w && self.y0.len() == dst_h
    }

    /// Bilinear stretch of `src` into `dst` (row-major, `dst_w` wide).
    /// Destination rows are filled in parallel.
    pub fn apply(&self, src: &Framebuffer, dst: &mut [u32]) {
        let dw = self.x0.len();
        if dw == 0 || src.width() == 0 {
            return;
        }
        let sw = src.stride();
        let px = src.pixels();
        dst.par_chunks_mut(dw)
            .take(self.y0.len())
            .enumerate()
            .for_each(|(y, row)| {
                let row0 = self.y0[y] * sw;
                let row1 = self.y1[y] * sw;
                let wy = self.wy[y];
                for (x, out) in row.iter_mut().enumerate() {
                    let (a, b, wx) = (self.x0[x], self.x1[x], self.wx[x]);
                    let top = lerp_rgb(px[row0 + a], px[row0 + b], wx);
                    let bot = lerp_rgb(px[row1 + a], px[row1 + b], wx);
                    *out = lerp_rgb(top, bot, wy);
                }
            });
    }
}

/// Blend two 0x00RRGGBB pixels, `w256` in `[0, 256]`.
#[inline]
fn lerp_rgb(a: u32, b: u32, w256: u32) -> u32 {
    let inv = 256 - w256;
    // R and B share one multiply (00RR00BB), G goes alone.
    let rb = (((a & 0x00FF_00FF) * inv + (b & 0x00FF_00FF) * w256) >> 8) & 0x00FF_00FF;
    let g = (((a & 0x0000_FF00) * inv + (b & 0x0000_FF00) * w256) >> 8) & 0x0000_FF00;
    rb | g
}

/// Copy `src` unscaled into `dst` at `(left, top)`, clipped to the surface.
pub fn inset(dst: &mut [u32], dst_w: usize, dst_h: usize, src: &Framebuffer, left: usize, top: usize) {
    if left >= dst_w || top >= dst_h {
        return;
    }
    let w = src.width().min(dst_w - left);
    let h = src.height().min(dst_h - top);
    for y in 0..h {
        let s = &src.pixels()[y * src.stride()..][..w];
        dst[(top + y) * dst_w + left..][..w].copy_from_slice(s);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lerp_endpoints() {
        assert_eq!(lerp_rgb(0x00FF_0000, 0x0000_00FF, 0), 0x00FF_0000);
        assert_eq!(lerp_rgb(0x00FF_0000, 0x0000_00FF, 256), 0x0000_00FF);
        assert_eq!(lerp_rgb(0x0000_0000, 0x0000_FE00, 128), 0x0000_7F00);
    }

    #[test]
    fn identity_stretch_copies() {
        let mut src = Framebuffer::new(3, 2);
        src.pixels_mut().copy_from_slice(&[1, 2, 3, 4, 5, 6]);
        let s = Stretch::new(3, 2, 3, 2);
        let mut dst = vec![0; 6];
        s.apply(&src, &mut dst);
        assert_eq!(dst, vec![1, 2, 3, 4, 5, 6]);
        assert!(s.fits(3, 2, 3, 2));
        assert!(!s.fits(3, 2, 6, 4));
    }

    #[test]
    fn uniform_color_survives_upscale() {
        let mut src = Framebuffer::new(4, 4);
        src.fill(0x0012_3456);
        let mut dst = vec![0; 10 * 7];
        Stretch::new(4, 4, 10, 7).apply(&src, &mut dst);
        assert!(dst.iter().all(|&p| p == 0x0012_3456));
    }

    #[test]
    fn inset_clips_at_edges() {
        let mut src = Framebuffer::new(3, 3);
        src.fill(9);
        let mut dst = vec![0; 4 * 4];
        inset(&mut dst, 4, 4, &src, 2, 2);
        assert_eq!(dst.iter().filter(|&&p| p == 9).count(), 4);
        assert_eq!(dst[2 * 4 + 2], 9);
        assert_eq!(dst[0], 0);
    }
}
