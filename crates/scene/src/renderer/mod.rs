//! Surface renderers: one per demo scene.
//!
//! A host drives a renderer through the same lifecycle a GL surface view
//! does. `on_surface_created` builds every program, texture and buffer,
//! `on_surface_changed` runs on every resize, and `on_draw_frame` renders one
//! frame at an explicit [`FrameTime`]. Drag input arrives between frames on
//! the same thread. `on_surface_destroyed` hands every resource back before
//! the renderer is dropped or replaced.

mod air_hockey;
mod fountain;
mod heightmap;
mod particles;

pub use air_hockey::AirHockeyRenderer;
pub use fountain::Fountain;
pub use heightmap::HeightmapRenderer;
pub use particles::ParticlesRenderer;

use crate::config::SceneConfig;
use crate::error::SceneError;
use std::fmt;
use std::str::FromStr;
use vista_assets::AssetSource;
use vista_render::GraphicsApi;

/// Colour every scene clears to.
pub const CLEAR_COLOR: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

/// Seconds since the surface was created. The host owns the clock.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default)]
pub struct FrameTime {
    pub elapsed: f32,
}

impl FrameTime {
    pub fn from_secs(elapsed: f32) -> Self {
        Self { elapsed }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SurfaceState {
    #[default]
    Uninitialized,
    /// Resources exist; no frame drawn yet.
    SurfaceReady,
    Rendering,
}

/// Passes of the heightmap scene, in draw order. Opaque geometry comes
/// before the additively blended particles, which do not write depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawPass {
    Terrain,
    Skybox,
    Particles,
}

impl DrawPass {
    pub const ORDER: [DrawPass; 3] = [DrawPass::Terrain, DrawPass::Skybox, DrawPass::Particles];
}

/// Counters for overlays and the headless runner.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FrameStats {
    pub frames: u64,
    pub live_particles: usize,
    pub elapsed: f32,
    pub width: u32,
    pub height: u32,
}

impl FrameStats {
    pub(crate) fn record_frame(&mut self, time: FrameTime) {
        self.frames += 1;
        self.elapsed = time.elapsed;
    }
}

/// Lifecycle callbacks for a rendering surface.
pub trait SurfaceRenderer {
    fn name(&self) -> &'static str;

    fn state(&self) -> SurfaceState;

    fn stats(&self) -> FrameStats;

    /// Build all GPU-side resources. Called again after the surface is lost,
    /// which releases the previous resources and rebuilds from scratch.
    fn on_surface_created(
        &mut self,
        api: &mut dyn GraphicsApi,
        assets: &dyn AssetSource,
    ) -> Result<(), SceneError>;

    /// Release every program, buffer and texture and return to
    /// [`SurfaceState::Uninitialized`]. Does nothing if no surface exists.
    fn on_surface_destroyed(&mut self, api: &mut dyn GraphicsApi);

    /// Resize: sets the viewport and recomputes the projection only.
    fn on_surface_changed(&mut self, api: &mut dyn GraphicsApi, width: u32, height: u32);

    fn on_draw_frame(&mut self, api: &mut dyn GraphicsApi, time: FrameTime)
        -> Result<(), SceneError>;

    /// Drag delta in pixels since the previous pointer position.
    fn handle_touch_drag(&mut self, dx: f32, dy: f32);
}

/// The demo scenes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Demo {
    #[default]
    Heightmap,
    Particles,
    AirHockey,
}

impl Demo {
    pub const ALL: [Demo; 3] = [Demo::Heightmap, Demo::Particles, Demo::AirHockey];

    pub fn as_str(self) -> &'static str {
        match self {
            Demo::Heightmap => "heightmap",
            Demo::Particles => "particles",
            Demo::AirHockey => "air-hockey",
        }
    }
}

impl fmt::Display for Demo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Demo {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().replace('_', "-").as_str() {
            "heightmap" => Ok(Demo::Heightmap),
            "particles" => Ok(Demo::Particles),
            "air-hockey" | "airhockey" => Ok(Demo::AirHockey),
            other => Err(format!(
                "unknown demo `{other}` (expected one of: heightmap, particles, air-hockey)"
            )),
        }
    }
}

/// Build the renderer for `demo`.
pub fn create_renderer(demo: Demo, config: &SceneConfig) -> Box<dyn SurfaceRenderer> {
    match demo {
        Demo::Heightmap => Box::new(HeightmapRenderer::new(config.heightmap.clone())),
        Demo::Particles => Box::new(ParticlesRenderer::new(config.particles.clone())),
        Demo::AirHockey => Box::new(AirHockeyRenderer::new(config.air_hockey.clone())),
    }
}
