//! Format-agnostic store of wall/floor textures.
//!
//! Decoding image files happens elsewhere: the bank starts with procedural
//! placeholders and accepts decoded replacements by id.

use crate::error::TextureError;

/// Edge length of the built-in textures.
pub const TEXTURE_SIZE: usize = 64;

/// 8-bit RGBA sample.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const WHITE: Color = Color::rgb(255, 255, 255);
    pub const BLUE: Color = Color::rgb(0, 0, 255);
    pub const GREEN: Color = Color::rgb(0, 128, 0);
    pub const ORANGE: Color = Color::rgb(255, 165, 0);
    pub const RED: Color = Color::rgb(178, 34, 34);
    pub const PURPLE: Color = Color::rgb(128, 0, 128);
    pub const MOSS: Color = Color::rgb(85, 107, 47);
    pub const TEAL: Color = Color::rgb(0, 128, 128);
    pub const LIGHT_BLUE: Color = Color::rgb(173, 216, 230);
    pub const LIGHT_GRAY: Color = Color::rgb(211, 211, 211);
    pub const YELLOW: Color = Color::rgb(255, 255, 0);

    #[inline]
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Framebuffer word: 0x00RRGGBB, which is what softbuffer presents.
    #[inline]
    pub const fn pack(self) -> u32 {
        (self.b as u32) | ((self.g as u32) << 8) | ((self.r as u32) << 16)
    }

    #[inline]
    pub const fn unpack(px: u32) -> Self {
        Self::rgb((px >> 16) as u8, (px >> 8) as u8, px as u8)
    }

    /// Multiply RGB by `k` in `[0, 1]`; alpha is kept.
    #[inline]
    pub fn scale(self, k: f32) -> Self {
        let k = k.clamp(0.0, 1.0);
        Self {
            r: (self.r as f32 * k) as u8,
            g: (self.g as f32 * k) as u8,
            b: (self.b as f32 * k) as u8,
            a: self.a,
        }
    }

    /// Half brightness, used for north/south wall faces.
    #[inline]
    pub const fn halve(self) -> Self {
        Self {
            r: self.r >> 1,
            g: self.g >> 1,
            b: self.b >> 1,
            a: self.a,
        }
    }

    fn lerp(self, other: Color, t: f32) -> Self {
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t) as u8;
        Self::rgb(mix(self.r, other.r), mix(self.g, other.g), mix(self.b, other.b))
    }
}

/// Every texture the renderer knows how to ask for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TextureId {
    Eagle,
    RedBrick,
    PurpleStone,
    GreyStone,
    BlueBrick,
    Mossy,
    Wood,
    ColorStone,
}

impl TextureId {
    pub const ALL: [TextureId; 8] = [
        TextureId::Eagle,
        TextureId::RedBrick,
        TextureId::PurpleStone,
        TextureId::GreyStone,
        TextureId::BlueBrick,
        TextureId::Mossy,
        TextureId::Wood,
        TextureId::ColorStone,
    ];

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Asset name an external loader would map to this id.
    pub fn name(self) -> &'static str {
        match self {
            TextureId::Eagle => "eagle",
            TextureId::RedBrick => "red_brick",
            TextureId::PurpleStone => "purple_stone",
            TextureId::GreyStone => "grey_stone",
            TextureId::BlueBrick => "blue_brick",
            TextureId::Mossy => "mossy",
            TextureId::Wood => "wood",
            TextureId::ColorStone => "color_stone",
        }
    }
}

/// Read-only texel lookup. Render stripes call this concurrently.
pub trait TextureSource: Sync {
    /// `(width, height)` of the texture behind `id`.
    fn dimensions(&self, id: TextureId) -> (usize, usize);

    /// Texel at column `u`, row `v`.
    fn sample(&self, id: TextureId, u: usize, v: usize) -> Color;
}

/// Row-major RGBA pixels.
#[derive(Clone, Debug, PartialEq)]
pub struct Texture {
    width: usize,
    height: usize,
    pixels: Vec<Color>,
}

impl Texture {
    pub fn from_pixels(width: usize, height: usize, pixels: Vec<Color>) -> Result<Self, TextureError> {
        if width == 0 || height == 0 || pixels.len() != width * height {
            return Err(TextureError::BadSize {
                width,
                height,
                len: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    fn generate(size: usize, f: impl Fn(usize, usize) -> Color) -> Self {
        let mut pixels = Vec::with_capacity(size * size);
        for y in 0..size {
            for x in 0..size {
                pixels.push(f(x, y));
            }
        }
        Self {
            width: size,
            height: size,
            pixels,
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

    /// Out-of-range coordinates wrap around.
    #[inline]
    pub fn sample(&self, u: usize, v: usize) -> Color {
        self.pixels[(v % self.height) * self.width + (u % self.width)]
    }
}

/// One texture per [`TextureId`].
pub struct TextureBank {
    data: Vec<Texture>,
}

impl TextureBank {
    /// Bank filled with procedural stand-ins for every id.
    pub fn with_placeholders() -> Self {
        let data = TextureId::ALL.iter().map(|&id| placeholder(id)).collect();
        Self { data }
    }

    /// Replace the texture behind `id`, e.g. with a decoded asset.
    pub fn insert(&mut self, id: TextureId, tex: Texture) {
        self.data[id.index()] = tex;
    }

    pub fn texture(&self, id: TextureId) -> &Texture {
        &self.data[id.index()]
    }
}

impl Default for TextureBank {
    fn default() -> Self {
        Self::with_placeholders()
    }
}

impl TextureSource for TextureBank {
    #[inline]
    fn dimensions(&self, id: TextureId) -> (usize, usize) {
        let t = self.texture(id);
        (t.width, t.height)
    }

    #[inline]
    fn sample(&self, id: TextureId, u: usize, v: usize) -> Color {
        self.texture(id).sample(u, v)
    }
}

/// Cheap integer hash for per-texel noise.
fn hash2(x: usize, y: usize, seed: u32) -> u32 {
    let mut h = (x as u32).wrapping_mul(0x27d4_eb2d) ^ (y as u32).wrapping_mul(0x1656_67b1) ^ seed;
    h ^= h >> 15;
    h = h.wrapping_mul(0x85eb_ca6b);
    h ^= h >> 13;
    h
}

fn bricks(x: usize, y: usize, brick: Color, mortar: Color) -> Color {
    const BRICK_W: usize = 16;
    const BRICK_H: usize = 8;
    let row = y / BRICK_H;
    let offset = if row % 2 == 0 { 0 } else { BRICK_W / 2 };
    let bx = (x + offset) % BRICK_W;
    let by = y % BRICK_H;
    if bx == 0 || by == 0 {
        return mortar;
    }
    let brick_id = row * 13 + ((x + offset) / BRICK_W) * 29;
    let shade = 0.75 + (hash2(brick_id, 0, 7) % 64) as f32 / 256.0;
    brick.scale(shade)
}

fn stone(x: usize, y: usize, base: Color, seed: u32) -> Color {
    let block = hash2(x / 4, y / 4, seed) % 48;
    let grain = hash2(x, y, seed ^ 0x9e37) % 24;
    base.scale(0.7 + (block + grain) as f32 / 240.0)
}

fn placeholder(id: TextureId) -> Texture {
    let n = TEXTURE_SIZE;
    match id {
        TextureId::BlueBrick => Texture::generate(n, |x, y| {
            bricks(x, y, Color::rgb(60, 80, 200), Color::rgb(40, 40, 50))
        }),
        TextureId::RedBrick => Texture::generate(n, |x, y| {
            bricks(x, y, Color::rgb(170, 60, 40), Color::rgb(60, 55, 50))
        }),
        TextureId::GreyStone => Texture::generate(n, |x, y| stone(x, y, Color::rgb(140, 140, 140), 1)),
        TextureId::PurpleStone => Texture::generate(n, |x, y| stone(x, y, Color::rgb(120, 50, 140), 2)),
        TextureId::Mossy => Texture::generate(n, |x, y| {
            let base = stone(x, y, Color::rgb(120, 120, 110), 3);
            if hash2(x / 2, y / 2, 4) % 3 == 0 {
                base.lerp(Color::MOSS, 0.7)
            } else {
                base
            }
        }),
        TextureId::ColorStone => Texture::generate(n, |x, y| {
            const TINTS: [Color; 4] = [Color::RED, Color::TEAL, Color::ORANGE, Color::PURPLE];
            let tint = TINTS[(hash2(x / 16, y / 16, 5) % 4) as usize];
            stone(x, y, Color::rgb(150, 150, 150), 6).lerp(tint, 0.35)
        }),
        TextureId::Wood => Texture::generate(n, |x, y| {
            let ring = ((x as f32 * 0.6 + (y as f32 * 0.15).sin() * 3.0).sin() + 1.0) * 0.5;
            Color::rgb(110, 70, 35).lerp(Color::rgb(160, 110, 60), ring)
        }),
        TextureId::Eagle => Texture::generate(n, |x, y| {
            let c = (n as f32 - 1.0) * 0.5;
            let (dx, dy) = (x as f32 - c, y as f32 - c);
            let r = (dx * dx + dy * dy).sqrt();
            if (18.0..22.0).contains(&r) {
                Color::YELLOW.scale(0.8)
            } else if r < 18.0 && dy.abs() < 3.0 + (dx.abs() * 0.3) && dx.abs() < 16.0 {
                Color::rgb(90, 60, 30)
            } else {
                stone(x, y, Color::rgb(100, 100, 120), 8)
            }
        }),
    }
}
