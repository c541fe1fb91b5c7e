use anyhow::Result;
use glam::Vec2;
use std::path::Path;
use std::sync::Arc;
use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::ActiveEventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

use crate::config::AppConfig;
use crate::core::{Clock, FrameLoop, OrbitController, SceneContext, TickReport};
use crate::loaders::{AssetLoader, FileSource, LoadOutcome, LoadQueue};
use crate::render::{FrameStats, Presenter, SceneRenderer, SoftwareRenderer};
use crate::scene::SceneGraph;
use crate::scenes::{install_outcome, Demo};

const FPS_UPDATE_INTERVAL: f32 = 0.5;
/// Wheel distance of one line step when the platform reports pixels
const PIXELS_PER_LINE: f32 = 50.0;

/// A demo wired to its frame loop, asset queue and renderer. Shared by the
/// windowed app and headless runs.
pub struct Session {
    pub demo: Box<dyn Demo>,
    pub ctx: SceneContext,
    pub frame_loop: FrameLoop,
    pub queue: LoadQueue,
    pub renderer: SoftwareRenderer,
}

impl Session {
    /// Builds the demo scene and requests its assets
    pub fn new(config: &AppConfig) -> Self {
        let loader = AssetLoader::new(Arc::new(FileSource::new(config.assets.clone())));
        Self::with_loader(config, loader)
    }

    pub fn with_loader(config: &AppConfig, loader: AssetLoader) -> Self {
        let mut demo = config.scene.create();
        let viewport = config.viewport();
        let mut ctx = SceneContext::new(SceneGraph::new(), demo.camera(), viewport);
        let mut frame_loop = FrameLoop::new(config.frame_loop);
        demo.build(&mut ctx, &mut frame_loop);

        let renderer = SoftwareRenderer::new(viewport, config.render_scale).with_guides(demo.guides());
        let mut queue = LoadQueue::new(loader, config.load_timeout());
        for name in demo.assets() {
            queue.request(name);
        }
        log::info!(
            "{} scene built with {} node(s), {} asset(s) requested",
            demo.title(),
            ctx.scene.node_count(),
            queue.pending_count()
        );

        Self {
            demo,
            ctx,
            frame_loop,
            queue,
            renderer,
        }
    }

    /// Installs whatever finished loading since the last call
    pub fn install_ready(&mut self) -> usize {
        let outcomes = self.queue.poll();
        self.install_all(outcomes)
    }

    /// Blocks until every requested asset has settled and installs them
    pub fn install_all_pending(&mut self) -> usize {
        let outcomes = self.queue.wait_all();
        self.install_all(outcomes)
    }

    fn install_all(&mut self, outcomes: Vec<LoadOutcome>) -> usize {
        let mut installed = 0;
        for outcome in outcomes {
            if install_outcome(self.demo.as_mut(), &mut self.ctx, &mut self.frame_loop, outcome) {
                installed += 1;
            }
        }
        installed
    }

    pub fn start(&mut self) -> bool {
        self.frame_loop.start(&mut self.ctx)
    }

    /// Installs finished loads, then runs one tick
    pub fn tick(&mut self) -> Option<TickReport> {
        self.install_ready();
        self.frame_loop.tick(&mut self.ctx, &mut self.renderer)
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.ctx.resize(width, height);
        self.renderer.resize(self.ctx.viewport);
    }
}

/// Runs `frames` ticks without a window once all assets have settled,
/// optionally saving the last frame
pub fn run_headless(config: &AppConfig, frames: u64, snapshot: Option<&Path>) -> Result<()> {
    let mut session = Session::new(config);
    let installed = session.install_all_pending();
    log::info!("{} asset(s) installed before the first tick", installed);

    session.start();
    let mut skipped = 0;
    for _ in 0..frames {
        if let Some(report) = session.tick() {
            skipped += report.errors.len();
        }
    }
    session.frame_loop.stop();
    log::info!(
        "Headless run finished: {} tick(s), {} skipped mutation(s)",
        session.frame_loop.ticks(),
        skipped
    );

    if let Some(path) = snapshot {
        session.renderer.save_png(path)?;
    }
    Ok(())
}

/// Window, GPU presenter and input routing around a [`Session`]
pub struct App {
    config: AppConfig,
    window: Option<Arc<Window>>,
    presenter: Option<Presenter>,
    session: Session,
    orbit: OrbitController,
    clock: Clock,
    stats: FrameStats,
    frame_count: u32,
    fps_update_timer: f32,
}

impl App {
    pub fn new(config: AppConfig) -> Self {
        let session = Session::new(&config);
        Self {
            config,
            window: None,
            presenter: None,
            session,
            orbit: OrbitController::new(),
            clock: Clock::new(),
            stats: FrameStats::default(),
            frame_count: 0,
            fps_update_timer: 0.0,
        }
    }

    fn update_fps(&mut self, delta: f32) {
        self.frame_count += 1;
        self.fps_update_timer += delta;

        if self.fps_update_timer >= FPS_UPDATE_INTERVAL {
            self.stats.fps = self.frame_count as f32 / self.fps_update_timer;
            log::debug!("FPS: {:.1}", self.stats.fps);
            self.frame_count = 0;
            self.fps_update_timer = 0.0;
        }
    }

    fn shutdown(&mut self, event_loop: &ActiveEventLoop) {
        self.session.frame_loop.stop();
        event_loop.exit();
    }

    fn redraw(&mut self) {
        let delta = self.clock.tick();
        self.update_fps(delta);

        let Some(report) = self.session.tick() else {
            return;
        };
        self.stats.ticks = report.number;
        if let Some(picked) = &report.picked {
            self.stats.picked = picked.len();
        }
        self.stats.pending_loads = self.session.queue.pending_count();

        if let (Some(presenter), Some(window)) = (&mut self.presenter, &self.window) {
            let session = &mut self.session;
            let result = presenter.present(
                window,
                session.renderer.pixels(),
                session.renderer.dimensions(),
                &mut session.ctx.panel,
                &self.stats,
            );
            if let Err(e) = result {
                log::error!("Present failed: {:#}", e);
            }
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let window = match event_loop.create_window(
            Window::default_attributes()
                .with_title(format!("scene-loop: {}", self.session.demo.title()))
                .with_inner_size(winit::dpi::LogicalSize::new(self.config.width, self.config.height)),
        ) {
            Ok(w) => Arc::new(w),
            Err(e) => {
                log::error!("Failed to create window: {}", e);
                event_loop.exit();
                return;
            }
        };

        let mut presenter = match pollster::block_on(Presenter::new(window.clone())) {
            Ok(presenter) => presenter,
            Err(e) => {
                log::error!("Failed to initialize presenter: {:#}", e);
                event_loop.exit();
                return;
            }
        };
        presenter.set_ui_visible(self.config.show_ui);

        let size = window.inner_size();
        self.session.resize(size.width, size.height);
        self.session.start();
        self.clock.reset();

        self.window = Some(window);
        self.presenter = Some(presenter);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        // Let egui handle the event first
        if let (Some(presenter), Some(window)) = (&mut self.presenter, &self.window) {
            if presenter.handle_event(window, &event) {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested
            | WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        state: ElementState::Pressed,
                        physical_key: PhysicalKey::Code(KeyCode::Escape),
                        ..
                    },
                ..
            } => self.shutdown(event_loop),
            WindowEvent::Resized(size) => {
                if let Some(presenter) = &mut self.presenter {
                    presenter.resize(size.width, size.height);
                }
                self.session.resize(size.width, size.height);
            }
            WindowEvent::CursorMoved { position, .. } => {
                let (x, y) = (position.x as f32, position.y as f32);
                self.session.ctx.pointer_moved(x, y);
                if self.session.demo.orbit() {
                    self.orbit.cursor_moved(Vec2::new(x, y), &mut self.session.ctx.camera);
                }
            }
            WindowEvent::MouseInput {
                state,
                button: MouseButton::Left,
                ..
            } => self.orbit.set_dragging(state == ElementState::Pressed),
            WindowEvent::MouseWheel { delta, .. } if self.session.demo.orbit() => {
                let steps = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(p) => p.y as f32 / PIXELS_PER_LINE,
                };
                self.orbit.zoom(&mut self.session.ctx.camera, steps);
            }
            WindowEvent::RedrawRequested => self.redraw(),
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }
}
