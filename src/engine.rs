//! Game state plus the per-frame pipeline: input, movement, top-down view,
//! first-person view.

use std::time::{Duration, Instant};

use log::{debug, info, warn};

use crate::camera::{self, InputState, Player};
use crate::error::EngineError;
use crate::flashlight::{Lighting, ShadingMode};
use crate::floor::Surfaces;
use crate::geometry::Vec2f;
use crate::overlay::Overlay;
use crate::renderer::{FrameStats, Framebuffer, Renderer, Scene};
use crate::settings::Settings;
use crate::texture::TextureBank;
use crate::world::Map;

pub struct Engine {
    settings: Settings,
    map: Map,
    textures: TextureBank,
    player: Player,
    lighting: Lighting,
    surfaces: Surfaces,
    renderer: Renderer,
    overlay: Overlay,
    pool: rayon::ThreadPool,
    stripes: usize,
}

impl Engine {
    pub fn new(settings: Settings, textures: TextureBank) -> Result<Self, EngineError> {
        settings.validate()?;
        let map = settings.map.build()?;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(settings.threads.unwrap_or(0))
            .thread_name(|i| format!("render-{i}"))
            .build()?;
        let stripes = settings.stripes.unwrap_or_else(|| pool.current_num_threads());

        let player = spawn_player(&settings, &map);

        info!(
            "map: {} ({}x{} blocks)",
            settings.map.describe(),
            map.width(),
            map.height()
        );
        info!(
            "view {}x{}, {} render threads, {} stripes, {:?} shading",
            settings.view_width,
            settings.view_height,
            pool.current_num_threads(),
            stripes,
            settings.shading
        );
        debug!("spawned at {:?} facing {:?}", player.position(), player.direction());

        Ok(Self {
            lighting: Lighting::new(settings.shading, settings.flashlight),
            surfaces: Surfaces::new(settings.textured_floor),
            overlay: Overlay::new(settings.block_px, settings.overlay_rays),
            renderer: Renderer::new(),
            settings,
            map,
            textures,
            player,
            pool,
            stripes,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn map(&self) -> &Map {
        &self.map
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn stripes(&self) -> usize {
        self.stripes
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    /// Switch between plain side shading and the flashlight.
    pub fn toggle_flashlight(&mut self) {
        let mode = match self.lighting {
            Lighting::Directional => ShadingMode::Flashlight,
            Lighting::Flashlight(_) => ShadingMode::Directional,
        };
        info!("shading: {mode:?}");
        self.lighting = Lighting::new(mode, self.settings.flashlight);
    }

    /// Advance the player by `dt` seconds of held input.
    pub fn update(&mut self, input: &InputState, dt: f32) {
        self.player
            .update(input, dt, &self.map, &self.settings.motion);
    }

    pub fn draw_overlay(&self, fb: &mut Framebuffer) {
        self.overlay
            .draw(fb, &self.map, &self.player, self.settings.motion.radius);
    }

    /// Render the first-person view into `fb` on the engine's worker pool.
    pub fn render(&mut self, fb: &mut Framebuffer) -> FrameStats {
        let scene = Scene {
            map: &self.map,
            player: &self.player,
            textures: &self.textures,
            lighting: &self.lighting,
            surfaces: &self.surfaces,
        };
        let renderer = &mut self.renderer;
        let stripes = self.stripes;
        let stats = self.pool.install(|| renderer.render(fb, &scene, stripes));

        if stats.escaped_rays > 0 {
            warn!(
                "{} rays escaped the map from {:?}",
                stats.escaped_rays,
                self.player.position()
            );
        }
        stats
    }

    /// One full frame: move, redraw the top-down view, render.
    pub fn frame(
        &mut self,
        input: &InputState,
        dt: f32,
        view: &mut Framebuffer,
        top_down: &mut Framebuffer,
    ) -> FrameStats {
        self.update(input, dt);
        self.draw_overlay(top_down);
        self.render(view)
    }
}

/// Configured spawn if the collision square fits there, else the centre of
/// the first open cell that does.
fn spawn_player(settings: &Settings, map: &Map) -> Player {
    let (default_pos, default_dir) = settings.map.default_spawn();
    let [px, py] = settings.spawn.unwrap_or(default_pos);
    let [dx, dy] = settings.facing.unwrap_or(default_dir);
    let radius = settings.motion.radius;

    let mut position = Vec2f::new(px, py);
    if !camera::fits(position, map, radius) {
        let fallback = map
            .tiles()
            .filter(|(_, tile)| tile.passable)
            .map(|(cell, _)| cell.to_float::<f32>() + Vec2f::splat(0.5))
            .find(|&p| camera::fits(p, map, radius));
        match fallback {
            Some(p) => {
                warn!("spawn {position:?} is blocked, moving to {p:?}");
                position = p;
            }
            None => warn!("no open cell fits the player; spawning at {position:?}"),
        }
    }

    let mut direction = Vec2f::new(dx, dy);
    if !(direction.length_squared() > 0.0) || !direction.is_finite() {
        warn!("facing {direction:?} is degenerate, using +x");
        direction = Vec2f::new(1.0, 0.0);
    }
    Player::new(position, direction, settings.fov_scale)
}

/// Time delta of one frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tick {
    /// Seconds since the previous tick, capped.
    pub dt: f32,
    /// Instantaneous frame rate from the uncapped delta.
    pub fps: f32,
    /// Mean frame rate, produced once per second.
    pub average_fps: Option<f32>,
}

/// Frame timer. Caps the step handed to the simulation and reports a
/// one-second average frame rate.
#[derive(Clone, Debug)]
pub struct FrameClock {
    last: Instant,
    window_start: Instant,
    frames: u32,
    max_dt: f32,
}

impl FrameClock {
    const REPORT_EVERY: Duration = Duration::from_secs(1);

    pub fn new(now: Instant, max_dt: f32) -> Self {
        Self {
            last: now,
            window_start: now,
            frames: 0,
            max_dt,
        }
    }

    /// Restart timing, e.g. after the window was hidden.
    pub fn reset(&mut self, now: Instant) {
        *self = Self::new(now, self.max_dt);
    }

    pub fn tick(&mut self, now: Instant) -> Tick {
        let raw = now.saturating_duration_since(self.last).as_secs_f32();
        self.last = now;
        self.frames += 1;

        let window = now.saturating_duration_since(self.window_start);
        let average_fps = if window >= Self::REPORT_EVERY {
            let avg = self.frames as f32 / window.as_secs_f32();
            self.frames = 0;
            self.window_start = now;
            Some(avg)
        } else {
            None
        };

        Tick {
            dt: raw.min(self.max_dt),
            fps: if raw > 0.0 { 1.0 / raw } else { 0.0 },
            average_fps,
        }
    }
}
