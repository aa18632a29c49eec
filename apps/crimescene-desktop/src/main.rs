use anyhow::{Context as _, Result};
use clap::Parser;
use crimescene_common::PhysicsBackend;
use crimescene_kernel::FirstPersonCamera;
use crimescene_physics::FIXED_TIMESTEP;
use crimescene_render_wgpu::{FrameLights, WgpuRenderer};
use crimescene_scene::{Readiness, Scene, SceneConfig};
use egui::Context as EguiContext;
use glam::Mat4;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{DeviceEvent, ElementState, KeyEvent, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::PhysicalKey;
use winit::window::{CursorGrabMode, Window, WindowId};

/// Longest frame the simulation catches up on; slower frames run slow-motion.
const MAX_FRAME_DELTA: Duration = Duration::from_millis(100);

#[derive(Parser)]
#[command(name = "crimescene-desktop", about = "Walk through the crime scene")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Assets directory holding models/ and scene.yaml
    #[arg(long, default_value = "./assets")]
    assets: PathBuf,

    /// Scene config; defaults to <assets>/scene.yaml
    #[arg(long)]
    config: Option<PathBuf>,
}

/// Everything that is not GPU state.
struct AppState {
    scene: Scene,
    pointer_locked: bool,
    last_frame: Instant,
    // Fixed timestep
    tick_accumulator: f64,
    tick_rate: f64,
}

impl AppState {
    fn new(scene: Scene) -> Self {
        Self {
            scene,
            pointer_locked: false,
            last_frame: Instant::now(),
            tick_accumulator: 0.0,
            tick_rate: FIXED_TIMESTEP,
        }
    }

    /// Run as many fixed physics steps as `dt` covers, with `dt` capped at
    /// [`MAX_FRAME_DELTA`]. Returns the count.
    fn advance(&mut self, dt: f64) -> usize {
        self.tick_accumulator += dt.min(MAX_FRAME_DELTA.as_secs_f64());
        let mut steps = 0;
        while self.tick_accumulator >= self.tick_rate {
            self.tick_accumulator -= self.tick_rate;
            self.scene.step(self.tick_rate);
            steps += 1;
        }
        steps
    }

    /// Camera used for this frame, with the window's aspect ratio.
    fn view(&self, aspect: f64) -> (Mat4, glam::Vec3) {
        let (mut camera, body_position) = match self.scene.player() {
            Some(player) => {
                let position = self
                    .scene
                    .physics()
                    .pose(player.body())
                    .map_or(player.config().spawn, |pose| pose.position);
                (player.camera().clone(), position)
            }
            None => {
                let cfg = &self.scene.config().player;
                (FirstPersonCamera::new(cfg.camera.clone()), cfg.spawn)
            }
        };
        camera.aspect = aspect;
        let eye = camera.eye_position(body_position);
        (camera.view_projection(eye), eye.as_vec3())
    }

    fn lights(&self) -> FrameLights {
        FrameLights {
            ambient: self.scene.ambient().clone(),
            flashlight: self.scene.player().map(|p| p.flashlight().clone()),
        }
    }

    fn draw_ui(&self, ctx: &EguiContext) {
        match (self.scene.readiness(), self.scene.player()) {
            (Readiness::Ready, Some(player)) => crimescene_hud::overlay::draw(ctx, player.hud()),
            (Readiness::Failed, _) => {
                let reason = self.scene.failure().unwrap_or("unknown error");
                status_label(ctx, &format!("Failed to load the scene: {reason}"));
            }
            _ => status_label(ctx, "Loading..."),
        }
    }
}

fn status_label(ctx: &EguiContext, text: &str) {
    egui::Area::new(egui::Id::new("status"))
        .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
        .show(ctx, |ui| {
            ui.label(
                egui::RichText::new(text)
                    .color(egui::Color32::WHITE)
                    .size(24.0),
            );
        });
}

/// Window, surface and the two renderers.
struct Gpu {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    renderer: WgpuRenderer,
    egui_winit: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

impl Gpu {
    fn new(event_loop: &ActiveEventLoop, egui_ctx: &EguiContext, scene: &Scene) -> Result<Self> {
        let attrs = Window::default_attributes()
            .with_title("Crime Scene")
            .with_inner_size(PhysicalSize::new(1280u32, 720));
        let window = Arc::new(event_loop.create_window(attrs)?);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone())?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("no suitable GPU adapter")?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("crimescene_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))?;

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .context("surface reports no formats")?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let renderer = WgpuRenderer::new(
            &device,
            surface_format,
            config.width,
            config.height,
            &scene.config().ground,
        );

        let egui_winit = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&device, surface_format, None, 1, false);

        tracing::info!(
            "GPU initialized with {} backend",
            adapter.get_info().backend.to_str()
        );

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            renderer,
            egui_winit,
            egui_renderer,
        })
    }

    fn aspect(&self) -> f64 {
        self.config.width as f64 / self.config.height.max(1) as f64
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        self.config.width = size.width.max(1);
        self.config.height = size.height.max(1);
        self.surface.configure(&self.device, &self.config);
        self.renderer
            .resize(&self.device, self.config.width, self.config.height);
    }

    /// Grab and hide the cursor. Falls back to confining it where locking
    /// is unsupported.
    fn lock_pointer(&self) -> bool {
        let grabbed = self
            .window
            .set_cursor_grab(CursorGrabMode::Locked)
            .or_else(|_| self.window.set_cursor_grab(CursorGrabMode::Confined));
        match grabbed {
            Ok(()) => {
                self.window.set_cursor_visible(false);
                true
            }
            Err(e) => {
                tracing::warn!("pointer lock unavailable: {e}");
                false
            }
        }
    }

    fn release_pointer(&self) {
        if let Err(e) = self.window.set_cursor_grab(CursorGrabMode::None) {
            tracing::warn!("pointer release failed: {e}");
        }
        self.window.set_cursor_visible(true);
    }

    fn render_frame(&mut self, egui_ctx: &EguiContext, state: &AppState) {
        if !self.renderer.has_room() {
            if let Some(room) = state.scene.room() {
                self.renderer.upload_room(&self.device, room);
            }
        }

        let output = match self.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
                return;
            }
            Err(e) => {
                tracing::error!("surface error: {e}");
                return;
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let (view_proj, eye) = state.view(self.aspect());
        self.renderer.render(
            &self.device,
            &self.queue,
            &view,
            view_proj,
            eye,
            &state.lights(),
            &state.scene.draw_list(),
        );

        let raw_input = self.egui_winit.take_egui_input(&self.window);
        let full_output = egui_ctx.run(raw_input, |ctx| state.draw_ui(ctx));
        self.egui_winit
            .handle_platform_output(&self.window, full_output.platform_output);

        let paint_jobs = egui_ctx.tessellate(full_output.shapes, full_output.pixels_per_point);
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, image_delta) in &full_output.textures_delta.set {
            self.egui_renderer
                .update_texture(&self.device, &self.queue, *id, image_delta);
        }
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("egui_encoder"),
            });
        self.egui_renderer.update_buffers(
            &self.device,
            &self.queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );
        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();
            self.egui_renderer
                .render(&mut pass, &paint_jobs, &screen_descriptor);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }

        output.present();
    }
}

struct GpuApp {
    state: AppState,
    gpu: Option<Gpu>,
    egui_ctx: EguiContext,
}

impl GpuApp {
    fn new(scene: Scene) -> Self {
        Self {
            state: AppState::new(scene),
            gpu: None,
            egui_ctx: EguiContext::default(),
        }
    }

    fn frame(&mut self) {
        let now = Instant::now();
        let delta = (now - self.state.last_frame).min(MAX_FRAME_DELTA);
        self.state.last_frame = now;

        let before = self.state.scene.readiness();
        let readiness = self.state.scene.poll();
        if before != readiness {
            tracing::info!(?readiness, "scene state changed");
        }

        self.state.advance(delta.as_secs_f64());
        self.state.scene.before_render(now, delta);

        if let Some(gpu) = &mut self.gpu {
            gpu.render_frame(&self.egui_ctx, &self.state);
        }
    }
}

impl ApplicationHandler for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }
        match Gpu::new(event_loop, &self.egui_ctx, &self.state.scene) {
            Ok(gpu) => self.gpu = Some(gpu),
            Err(e) => {
                tracing::error!("graphics initialisation failed: {e:#}");
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if let Some(gpu) = &mut self.gpu {
            let response = gpu.egui_winit.on_window_event(&gpu.window, &event);
            if response.consumed && !self.state.pointer_locked {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(new_size);
                }
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: key_state,
                        ..
                    },
                ..
            } => {
                self.state
                    .scene
                    .handle_key(key, key_state == ElementState::Pressed);
            }
            WindowEvent::MouseInput {
                button,
                state: ElementState::Pressed,
                ..
            } => {
                let Some(gpu) = &self.gpu else { return };
                match button {
                    MouseButton::Left if !self.state.pointer_locked => {
                        self.state.pointer_locked = gpu.lock_pointer();
                    }
                    MouseButton::Middle if self.state.pointer_locked => {
                        gpu.release_pointer();
                        self.state.pointer_locked = false;
                    }
                    _ => {}
                }
            }
            WindowEvent::RedrawRequested => {
                self.frame();
                if let Some(gpu) = &self.gpu {
                    gpu.window.request_redraw();
                }
            }
            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: winit::event::DeviceId,
        event: DeviceEvent,
    ) {
        if let DeviceEvent::MouseMotion { delta } = event {
            if self.state.pointer_locked {
                self.state.scene.handle_mouse_motion(delta.0, delta.1);
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(gpu) = &self.gpu {
            gpu.window.request_redraw();
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!("crimescene-desktop starting");

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| cli.assets.join("scene.yaml"));
    let config = SceneConfig::load(&config_path)?;
    let room = config.room_path(&cli.assets);

    let mut scene = Scene::new(config)?;
    scene.start_loading(&room)?;

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = GpuApp::new(scene);
    event_loop.run_app(&mut app)?;

    Ok(())
}
