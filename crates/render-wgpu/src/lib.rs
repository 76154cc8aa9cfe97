//! wgpu backend for the vista rendering contract.
//!
//! [`WgpuApi`] implements [`vista_render::GraphicsApi`] on a wgpu device so
//! the demo scenes run unchanged on Vulkan, Metal, DX12 or GL.
//!
//! # Invariants
//! - One render pass per frame; draws run in the order they were issued.
//! - Every distinct state combination maps to exactly one cached pipeline.
//! - Shader compile errors surface from `create_program`, not at draw time.

mod gpu;
mod pipeline;

pub use gpu::WgpuApi;
