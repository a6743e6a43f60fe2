use std::collections::HashSet;
use std::num::NonZeroU32;
use std::path::PathBuf;
use std::rc::Rc;
use std::time::Instant;

use anyhow::{Context, anyhow};
use clap::Parser;
use log::{error, info, trace};
use winit::application::ApplicationHandler;
use winit::dpi::LogicalSize;
use winit::event::{ElementState, KeyEvent, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use gridcaster::camera::{Action, InputState};
use gridcaster::engine::{Engine, FrameClock};
use gridcaster::flashlight::ShadingMode;
use gridcaster::maze::DungeonParams;
use gridcaster::renderer::Framebuffer;
use gridcaster::scaler::{self, Stretch};
use gridcaster::settings::{MapSource, Settings};
use gridcaster::texture::TextureBank;

/// Walk a grid map in a raycast first-person view.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// JSON settings file; missing fields keep their defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Play in a generated maze instead of the built-in layout.
    #[arg(long)]
    maze: bool,

    /// Maze seed (implies --maze).
    #[arg(long)]
    seed: Option<u64>,

    /// Stripes per render phase.
    #[arg(long)]
    stripes: Option<usize>,

    /// Render worker threads.
    #[arg(long)]
    threads: Option<usize>,

    /// Start with the flashlight on.
    #[arg(long)]
    flashlight: bool,

    /// Flat-coloured floor and ceiling.
    #[arg(long)]
    flat: bool,
}

impl Args {
    fn settings(&self) -> anyhow::Result<Settings> {
        let mut settings = match &self.config {
            Some(path) => Settings::load(path)
                .with_context(|| format!("loading settings from {}", path.display()))?,
            None => Settings::default(),
        };

        if self.maze || self.seed.is_some() {
            if !matches!(settings.map, MapSource::Maze(_)) {
                settings.map = MapSource::Maze(DungeonParams::default());
                settings.spawn = None;
                settings.facing = None;
            }
            if let (MapSource::Maze(params), Some(seed)) = (&mut settings.map, self.seed) {
                params.seed = seed;
            }
        }
        if self.stripes.is_some() {
            settings.stripes = self.stripes;
        }
        if self.threads.is_some() {
            settings.threads = self.threads;
        }
        if self.flashlight {
            settings.shading = ShadingMode::Flashlight;
        }
        if self.flat {
            settings.textured_floor = false;
        }

        settings.validate()?;
        Ok(settings)
    }
}

fn action_for(code: KeyCode) -> Option<Action> {
    match code {
        KeyCode::KeyW | KeyCode::ArrowUp => Some(Action::Forward),
        KeyCode::KeyS | KeyCode::ArrowDown => Some(Action::Back),
        KeyCode::KeyA => Some(Action::StrafeLeft),
        KeyCode::KeyD => Some(Action::StrafeRight),
        KeyCode::KeyQ | KeyCode::ArrowLeft => Some(Action::RotateLeft),
        KeyCode::KeyE | KeyCode::ArrowRight => Some(Action::RotateRight),
        _ => None,
    }
}

struct App {
    window: Option<Rc<Window>>,
    surface: Option<softbuffer::Surface<Rc<Window>, Rc<Window>>>,
    engine: Engine,

    // First-person view at its configured size, stretched to the window.
    view: Framebuffer,
    top_down: Framebuffer,
    show_top_down: bool,
    stretch: Stretch,

    keys_down: HashSet<KeyCode>,
    clock: FrameClock,

    // First fatal error; reported by main after the loop exits.
    error: Option<anyhow::Error>,
}

impl App {
    fn new(engine: Engine) -> Self {
        let s = engine.settings();
        let view = Framebuffer::new(s.view_width, s.view_height);
        let clock = FrameClock::new(Instant::now(), s.max_dt);
        Self {
            window: None,
            surface: None,
            engine,
            view,
            top_down: Framebuffer::new(0, 0),
            show_top_down: true,
            stretch: Stretch::default(),
            keys_down: HashSet::new(),
            clock,
            error: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        error!("{err:#}");
        self.error.get_or_insert(err);
        event_loop.exit();
    }

    fn open_window(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let (w, h) = (self.view.width() as f64, self.view.height() as f64);
        let attributes = Window::default_attributes()
            .with_title("gridcaster")
            .with_inner_size(LogicalSize::new(w * 1.5, h * 1.5));

        let window = Rc::new(event_loop.create_window(attributes).context("creating window")?);
        let context = softbuffer::Context::new(window.clone())
            .map_err(|e| anyhow!("softbuffer context: {e}"))?;
        let surface = softbuffer::Surface::new(&context, window.clone())
            .map_err(|e| anyhow!("softbuffer surface: {e}"))?;

        window.request_redraw();
        self.surface = Some(surface);
        self.window = Some(window);
        self.clock.reset(Instant::now());
        Ok(())
    }

    fn input(&self) -> InputState {
        self.keys_down
            .iter()
            .filter_map(|&k| action_for(k))
            .fold(InputState::default(), InputState::with)
    }

    fn key_pressed(&mut self, event_loop: &ActiveEventLoop, code: KeyCode) {
        match code {
            KeyCode::Escape => event_loop.exit(),
            KeyCode::KeyF => self.engine.toggle_flashlight(),
            KeyCode::Tab => self.show_top_down = !self.show_top_down,
            _ => {}
        }
    }

    fn redraw(&mut self, id: WindowId) -> anyhow::Result<()> {
        let tick = self.clock.tick(Instant::now());
        if let Some(fps) = tick.average_fps {
            info!("FPS: {fps:.1}");
        }

        let input = self.input();
        let stats = self
            .engine
            .frame(&input, tick.dt, &mut self.view, &mut self.top_down);
        trace!("{stats:?}, {:.1} fps", tick.fps);

        let (window, surface) = match (&self.window, &mut self.surface) {
            (Some(w), Some(s)) if w.id() == id => (w, s),
            _ => return Ok(()),
        };

        let size = window.inner_size();
        let (Some(nw), Some(nh)) = (NonZeroU32::new(size.width), NonZeroU32::new(size.height)) else {
            // Minimised.
            return Ok(());
        };
        let (dw, dh) = (size.width as usize, size.height as usize);
        surface
            .resize(nw, nh)
            .map_err(|e| anyhow!("resizing surface: {e}"))?;

        let (vw, vh) = (self.view.width(), self.view.height());
        if !self.stretch.fits(vw, vh, dw, dh) {
            self.stretch = Stretch::new(vw, vh, dw, dh);
        }

        let mut buf = surface
            .buffer_mut()
            .map_err(|e| anyhow!("surface buffer: {e}"))?;
        self.stretch.apply(&self.view, &mut buf);
        if self.show_top_down {
            scaler::inset(&mut buf, dw, dh, &self.top_down, 0, 0);
        }
        buf.present().map_err(|e| anyhow!("presenting frame: {e}"))?;

        window.request_redraw();
        Ok(())
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(err) = self.open_window(event_loop) {
            self.fail(event_loop, err);
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                info!("window closed");
                event_loop.exit();
            }

            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(code),
                        state,
                        repeat,
                        ..
                    },
                ..
            } => match state {
                ElementState::Pressed => {
                    if !repeat {
                        self.key_pressed(event_loop, code);
                    }
                    self.keys_down.insert(code);
                }
                ElementState::Released => {
                    self.keys_down.remove(&code);
                }
            },

            WindowEvent::Focused(false) => self.keys_down.clear(),

            WindowEvent::Resized(_) => {
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }

            WindowEvent::RedrawRequested => {
                if let Err(err) = self.redraw(id) {
                    self.fail(event_loop, err);
                }
            }

            _ => (),
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let settings = args.settings()?;
    let engine = Engine::new(settings, TextureBank::with_placeholders()).context("starting engine")?;

    let event_loop = EventLoop::new().context("creating event loop")?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(engine);
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
