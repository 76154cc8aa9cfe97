use anyhow::{Context, Result};
use clap::Parser;
use egui::Context as EguiContext;
use glam::Vec2;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use vista_assets::{AssetSource, BuiltinAssets, DirAssets};
use vista_input::{DragTracker, PointerEvent};
use vista_render_wgpu::WgpuApi;
use vista_scene::{Demo, FrameTime, SceneConfig, SurfaceRenderer, create_renderer};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, KeyEvent, MouseButton, Touch, TouchPhase, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

#[derive(Parser)]
#[command(name = "vista-desktop", about = "Vista demo scenes in a desktop window")]
struct Cli {
    /// Scene to show: heightmap, particles or air-hockey
    #[arg(short, long, default_value = "heightmap")]
    demo: Demo,

    /// Directory with shaders/ and textures/ overriding the builtin assets
    #[arg(long)]
    assets: Option<PathBuf>,

    /// YAML scene configuration
    #[arg(long)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Scene-side state: the active renderer and the input feeding it.
struct AppState {
    demo: Demo,
    config: SceneConfig,
    assets: Box<dyn AssetSource>,
    renderer: Box<dyn SurfaceRenderer>,
    drag: DragTracker,
    cursor: Vec2,
    show_overlay: bool,
    /// Set when the surface is created; frame times count from here.
    started: Option<Instant>,
}

impl AppState {
    fn new(demo: Demo, config: SceneConfig, assets: Box<dyn AssetSource>) -> Self {
        let renderer = create_renderer(demo, &config);
        Self {
            demo,
            config,
            assets,
            renderer,
            drag: DragTracker::new(),
            cursor: Vec2::ZERO,
            show_overlay: true,
            started: None,
        }
    }

    fn surface_created(&mut self, api: &mut WgpuApi, width: u32, height: u32) -> Result<()> {
        self.renderer
            .on_surface_created(api, self.assets.as_ref())
            .with_context(|| format!("creating the {} scene", self.demo))?;
        self.renderer.on_surface_changed(api, width, height);
        self.started = Some(Instant::now());
        Ok(())
    }

    fn frame_time(&self) -> FrameTime {
        FrameTime::from_secs(self.started.map_or(0.0, |t| t.elapsed().as_secs_f32()))
    }

    fn switch_demo(&mut self, demo: Demo, api: &mut WgpuApi, width: u32, height: u32) -> Result<()> {
        tracing::info!(%demo, "switching demo");
        self.demo = demo;
        self.renderer.on_surface_destroyed(api);
        self.renderer = create_renderer(demo, &self.config);
        self.drag = DragTracker::new();
        self.surface_created(api, width, height)
    }

    fn pointer(&mut self, event: PointerEvent) {
        if let Some(drag) = self.drag.handle(event) {
            self.renderer.handle_touch_drag(drag.dx, drag.dy);
        }
    }

    fn draw_ui(&mut self, ctx: &EguiContext, api: &WgpuApi) -> Option<Demo> {
        if !self.show_overlay {
            return None;
        }
        let stats = self.renderer.stats();
        let mut selected = self.demo;

        egui::Window::new("Vista")
            .default_pos([12.0, 12.0])
            .resizable(false)
            .show(ctx, |ui| {
                egui::ComboBox::from_label("Demo")
                    .selected_text(self.demo.to_string())
                    .show_ui(ui, |ui| {
                        for demo in Demo::ALL {
                            ui.selectable_value(&mut selected, demo, demo.to_string());
                        }
                    });
                ui.separator();
                ui.label(format!("State: {:?}", self.renderer.state()));
                ui.label(format!("Frame: {}  Time: {:.1}s", stats.frames, stats.elapsed));
                ui.label(format!("Surface: {}x{}", stats.width, stats.height));
                ui.label(format!("Particles: {}", stats.live_particles));
                ui.label(format!(
                    "Draws: {}  Pipelines: {}",
                    api.last_frame_draws(),
                    api.pipeline_count()
                ));
                let (programs, buffers, textures) = api.resource_counts();
                ui.label(format!(
                    "Programs: {programs}  Buffers: {buffers}  Textures: {textures}"
                ));
                ui.separator();
                ui.small("F1: Toggle overlay | Tab: Next demo | LMB drag: Rotate");
            });

        (selected != self.demo).then_some(selected)
    }
}

/// Window, surface and GPU objects, created on the first `resumed`.
struct Gpu {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,
    api: WgpuApi,
    egui_winit: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

struct GpuApp {
    state: AppState,
    gpu: Option<Gpu>,
    egui_ctx: EguiContext,
    fatal: Option<anyhow::Error>,
}

impl GpuApp {
    fn new(state: AppState) -> Self {
        Self {
            state,
            gpu: None,
            egui_ctx: EguiContext::default(),
            fatal: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        tracing::error!("{err:#}");
        self.fatal = Some(err);
        event_loop.exit();
    }

    fn init_gpu(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let attrs = Window::default_attributes()
            .with_title(format!("Vista - {}", self.state.demo))
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
                label: Some("vista_device"),
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

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: surface_caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(wgpu::CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        tracing::info!(
            "GPU initialized with {} backend",
            adapter.get_info().backend.to_str()
        );

        let egui_winit = egui_winit::State::new(
            self.egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&device, surface_format, None, 1, false);

        let mut api = WgpuApi::new(device, queue, surface_format, config.width, config.height);
        self.state
            .surface_created(&mut api, config.width, config.height)?;

        self.gpu = Some(Gpu {
            window,
            surface,
            config,
            api,
            egui_winit,
            egui_renderer,
        });
        Ok(())
    }

    fn redraw(&mut self) -> Result<()> {
        let Some(gpu) = &mut self.gpu else {
            return Ok(());
        };

        let output = match gpu.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.surface.configure(gpu.api.device(), &gpu.config);
                return Ok(());
            }
            Err(e) => {
                tracing::error!("surface error: {e}");
                return Ok(());
            }
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let time = self.state.frame_time();
        self.state.renderer.on_draw_frame(&mut gpu.api, time)?;
        gpu.api.submit_frame(&view);

        let raw_input = gpu.egui_winit.take_egui_input(&gpu.window);
        let mut switch_to = None;
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            switch_to = self.state.draw_ui(ctx, &gpu.api);
        });
        gpu.egui_winit
            .handle_platform_output(&gpu.window, full_output.platform_output);

        let paint_jobs = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [gpu.config.width, gpu.config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        {
            let device = gpu.api.device();
            let queue = gpu.api.queue();
            for (id, image_delta) in &full_output.textures_delta.set {
                gpu.egui_renderer
                    .update_texture(device, queue, *id, image_delta);
            }
            let mut encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("egui_encoder"),
            });
            gpu.egui_renderer.update_buffers(
                device,
                queue,
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
                gpu.egui_renderer
                    .render(&mut pass, &paint_jobs, &screen_descriptor);
            }
            queue.submit(std::iter::once(encoder.finish()));
            for id in &full_output.textures_delta.free {
                gpu.egui_renderer.free_texture(id);
            }
        }

        output.present();

        if let Some(demo) = switch_to {
            let (w, h) = (gpu.config.width, gpu.config.height);
            self.state.switch_demo(demo, &mut gpu.api, w, h)?;
            gpu.window.set_title(&format!("Vista - {demo}"));
        }
        gpu.window.request_redraw();
        Ok(())
    }

    fn next_demo(&mut self) -> Result<()> {
        let Some(gpu) = &mut self.gpu else {
            return Ok(());
        };
        let i = Demo::ALL
            .iter()
            .position(|d| *d == self.state.demo)
            .unwrap_or(0);
        let demo = Demo::ALL[(i + 1) % Demo::ALL.len()];
        let (w, h) = (gpu.config.width, gpu.config.height);
        self.state.switch_demo(demo, &mut gpu.api, w, h)?;
        gpu.window.set_title(&format!("Vista - {demo}"));
        Ok(())
    }
}

impl ApplicationHandler for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }
        if let Err(e) = self.init_gpu(event_loop) {
            self.fail(event_loop, e);
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
            if response.consumed {
                return;
            }
        }

        let result = match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
                Ok(())
            }
            WindowEvent::Resized(new_size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.config.width = new_size.width.max(1);
                    gpu.config.height = new_size.height.max(1);
                    gpu.surface.configure(gpu.api.device(), &gpu.config);
                    self.state.renderer.on_surface_changed(
                        &mut gpu.api,
                        gpu.config.width,
                        gpu.config.height,
                    );
                }
                Ok(())
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: ElementState::Pressed,
                        repeat: false,
                        ..
                    },
                ..
            } => match key {
                KeyCode::F1 => {
                    self.state.show_overlay = !self.state.show_overlay;
                    Ok(())
                }
                KeyCode::Tab => self.next_demo(),
                KeyCode::Escape => {
                    event_loop.exit();
                    Ok(())
                }
                _ => Ok(()),
            },
            WindowEvent::MouseInput {
                button: MouseButton::Left,
                state: btn_state,
                ..
            } => {
                let event = match btn_state {
                    ElementState::Pressed => PointerEvent::Down(self.state.cursor),
                    ElementState::Released => PointerEvent::Up,
                };
                self.state.pointer(event);
                Ok(())
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.state.cursor = Vec2::new(position.x as f32, position.y as f32);
                self.state.pointer(PointerEvent::Move(self.state.cursor));
                Ok(())
            }
            WindowEvent::Touch(Touch {
                phase, location, ..
            }) => {
                let at = Vec2::new(location.x as f32, location.y as f32);
                let event = match phase {
                    TouchPhase::Started => PointerEvent::Down(at),
                    TouchPhase::Moved => PointerEvent::Move(at),
                    TouchPhase::Ended | TouchPhase::Cancelled => PointerEvent::Up,
                };
                self.state.pointer(event);
                Ok(())
            }
            WindowEvent::RedrawRequested => self.redraw(),
            _ => Ok(()),
        };

        if let Err(e) = result {
            self.fail(event_loop, e);
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

    let config = match &cli.config {
        Some(path) => SceneConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => SceneConfig::default(),
    };
    let assets: Box<dyn AssetSource> = match cli.assets {
        Some(dir) => {
            tracing::info!(root = %dir.display(), "using asset directory");
            Box::new(DirAssets::new(dir))
        }
        None => Box::new(BuiltinAssets::new()),
    };

    tracing::info!(demo = %cli.demo, "vista-desktop starting");

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = GpuApp::new(AppState::new(cli.demo, config, assets));
    event_loop.run_app(&mut app)?;

    match app.fatal {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
