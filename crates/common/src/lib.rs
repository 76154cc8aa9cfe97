//! Shared types for the vista demo scenes.

mod types;

pub use types::{Color, SplitMix64};

/// Size in bytes of one `f32` vertex component.
pub const BYTES_PER_FLOAT: u32 = 4;

pub fn crate_info() -> &'static str {
    "vista-common v0.1.0"
}
