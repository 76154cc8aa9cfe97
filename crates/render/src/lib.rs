//! Rendering contract: a GLES2-shaped graphics interface the demo scenes talk to.
//!
//! # Invariants
//! - Scenes never reach a GPU directly; every call goes through [`GraphicsApi`].
//! - Uniform and attribute locations are resolved from program source once,
//!   at link time, with the same rules for every backend.
//!
//! [`RecordingApi`] is a headless backend that records each call. Tests and
//! the CLI use it to inspect frames; the wgpu backend executes the same calls.

mod api;
mod recording;
pub mod reflect;

pub use api::{
    ApiError, AttribPointer, AttributeLocation, Blend, BlendFactor, BufferId, DepthFunc,
    GraphicsApi, Primitive, ProgramId, ProgramSource, TextureId, TextureImage, UniformLocation,
    cube_face_size,
};
pub use recording::{Command, RecordingApi};
pub use reflect::ProgramReflection;

pub fn crate_info() -> &'static str {
    "vista-render v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crate_loads() {
        assert!(crate_info().contains("render"));
    }
}
