//! Demo scenes rendered through the [`vista_render::GraphicsApi`] contract.
//!
//! The crate is backend-agnostic: it builds programs, geometry and matrices
//! and issues GL-shaped calls. `vista-render-wgpu` turns those calls into GPU
//! work; [`vista_render::RecordingApi`] records them for tests and the
//! headless CLI.
//!
//! # Scenes
//! - [`Demo::Heightmap`]: terrain, skybox and a particle fountain under an
//!   orbiting camera.
//! - [`Demo::Particles`]: the fountain alone.
//! - [`Demo::AirHockey`]: a textured table and two mallets.

pub mod camera;
pub mod config;
mod error;
pub mod objects;
pub mod program;
pub mod renderer;
pub mod vertex_array;

pub use camera::{OrbitCamera, Projection};
pub use config::{ConfigError, SceneConfig};
pub use error::{GeometryError, ProgramError, SceneError};
pub use renderer::{
    Demo, DrawPass, FrameStats, FrameTime, SurfaceRenderer, SurfaceState, create_renderer,
};

pub fn crate_info() -> &'static str {
    "vista-scene v0.1.0"
}
