//! Wall and surface shading: flat directional shading or the flashlight.
//!
//! The flashlight is two factors multiplied together: fog, which fades to
//! black at the penetration range, and a vignette around the screen centre.

use serde::{Deserialize, Serialize};

use crate::raycast::Side;
use crate::renderer::Viewport;
use crate::texture::Color;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShadingMode {
    /// North/south faces at half brightness.
    #[default]
    Directional,
    /// Distance and screen-position attenuation.
    Flashlight,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Flashlight {
    pub fog: bool,
    pub vignette: bool,
    /// Distance in blocks at which fog reaches full black.
    pub penetration: f32,
    /// Normalised radius (0 = centre, 1 = corner) where the vignette is at half strength.
    pub beam_radius: f32,
    /// Slope of the vignette falloff around `beam_radius`.
    pub steepness: f32,
}

impl Default for Flashlight {
    fn default() -> Self {
        Self {
            fog: true,
            vignette: true,
            penetration: 6.0,
            beam_radius: 0.75,
            steepness: 3.0,
        }
    }
}

impl Flashlight {
    /// 1 at the eye, falling linearly to 0 at `penetration`.
    pub fn fog_factor(&self, distance: f32) -> f32 {
        if !self.fog {
            return 1.0;
        }
        if !(distance < self.penetration) {
            return 0.0;
        }
        (1.0 - distance.max(0.0) / self.penetration).clamp(0.0, 1.0)
    }

    /// Darkening by distance from the viewport centre.
    pub fn vignette_factor(&self, x: usize, y: usize, view: Viewport) -> f32 {
        if !self.vignette {
            return 1.0;
        }
        let cx = view.width as f32 * 0.5;
        let cy = view.height as f32 * 0.5;
        let (dx, dy) = (x as f32 + 0.5 - cx, y as f32 + 0.5 - cy);
        let r = (dx * dx + dy * dy).sqrt() / (cx * cx + cy * cy).sqrt().max(1.0);
        ((self.beam_radius - r) * self.steepness + 0.5).clamp(0.0, 1.0)
    }

    #[inline]
    pub fn beyond_range(&self, distance: f32) -> bool {
        self.fog && !(distance < self.penetration)
    }

    pub fn attenuate(&self, c: Color, distance: f32, x: usize, y: usize, view: Viewport) -> Color {
        let fog = self.fog_factor(distance);
        if fog <= 0.0 {
            return Color::BLACK;
        }
        let k = fog * self.vignette_factor(x, y, view);
        if k >= 1.0 { c } else { c.scale(k) }
    }
}

/// Shading chosen for a frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Lighting {
    Directional,
    Flashlight(Flashlight),
}

impl Lighting {
    pub fn new(mode: ShadingMode, flashlight: Flashlight) -> Self {
        match mode {
            ShadingMode::Directional => Lighting::Directional,
            ShadingMode::Flashlight => Lighting::Flashlight(flashlight),
        }
    }

    /// True when everything at `distance` is black, so sampling can be skipped.
    #[inline]
    pub fn culls(&self, distance: f32) -> bool {
        match self {
            Lighting::Directional => false,
            Lighting::Flashlight(f) => f.beyond_range(distance),
        }
    }

    pub fn wall(&self, c: Color, side: Side, distance: f32, x: usize, y: usize, view: Viewport) -> Color {
        match self {
            Lighting::Directional if side == Side::NorthSouth => c.halve(),
            Lighting::Directional => c,
            Lighting::Flashlight(f) => f.attenuate(c, distance, x, y, view),
        }
    }

    /// Floor and ceiling: no directional term.
    pub fn surface(&self, c: Color, distance: f32, x: usize, y: usize, view: Viewport) -> Color {
        match self {
            Lighting::Directional => c,
            Lighting::Flashlight(f) => f.attenuate(c, distance, x, y, view),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VIEW: Viewport = Viewport {
        width: 64,
        height: 48,
    };

    fn fog_only() -> Flashlight {
        Flashlight {
            vignette: false,
            ..Flashlight::default()
        }
    }

    #[test]
    fn fog_black_at_and_beyond_range() {
        let f = fog_only();
        let c = Color::rgb(200, 150, 100);
        assert_eq!(f.attenuate(c, f.penetration, 3, 3, VIEW), Color::BLACK);
        assert_eq!(f.attenuate(c, f.penetration * 3.0, 3, 3, VIEW), Color::BLACK);
        assert_eq!(f.attenuate(c, f32::INFINITY, 3, 3, VIEW), Color::BLACK);
    }

    #[test]
    fn fog_identity_at_eye() {
        let c = Color::rgb(200, 150, 100);
        assert_eq!(fog_only().attenuate(c, 0.0, 0, 0, VIEW), c);
    }

    #[test]
    fn fog_is_linear() {
        let f = fog_only();
        assert!((f.fog_factor(f.penetration / 2.0) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn vignette_darkens_corners() {
        let f = Flashlight {
            fog: false,
            ..Flashlight::default()
        };
        assert_eq!(f.vignette_factor(32, 24, VIEW), 1.0);
        assert_eq!(f.vignette_factor(0, 0, VIEW), 0.0);
    }

    #[test]
    fn factors_multiply() {
        let f = Flashlight::default();
        let c = Color::rgb(200, 200, 200);
        let (x, y) = (50, 40);
        let k = f.fog_factor(3.0) * f.vignette_factor(x, y, VIEW);
        assert_eq!(f.attenuate(c, 3.0, x, y, VIEW), c.scale(k));
    }

    #[test]
    fn directional_halves_north_south() {
        let c = Color::rgb(100, 100, 100);
        let l = Lighting::new(ShadingMode::Directional, Flashlight::default());
        assert_eq!(l.wall(c, Side::NorthSouth, 1.0, 0, 0, VIEW), c.halve());
        assert_eq!(l.wall(c, Side::EastWest, 1.0, 0, 0, VIEW), c);
        assert!(!l.culls(1e9));
    }

    #[test]
    fn flashlight_culls_beyond_range() {
        let l = Lighting::new(ShadingMode::Flashlight, Flashlight::default());
        assert!(l.culls(6.0));
        assert!(!l.culls(5.9));
    }
}
