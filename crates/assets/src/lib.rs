//! Asset inputs for the demo scenes: WGSL shader sources and RGBA textures.
//!
//! Scenes ask an [`AssetSource`] for assets by name and never touch file
//! paths. [`BuiltinAssets`] embeds every shader and generates every texture
//! procedurally, so the demos run with no files on disk. [`DirAssets`] reads
//! overrides from a directory and falls back to the builtin set.
//!
//! # Layout
//! A directory asset root contains `shaders/<name>.wgsl` and
//! `textures/<name>.png`.

mod builtin;
mod dir;
pub mod names;
mod shaders;

pub use builtin::BuiltinAssets;
pub use dir::DirAssets;

use vista_render::{ApiError, ProgramSource, TextureImage};

/// Errors from asset lookups.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("image decode error: {0}")]
    Decode(#[from] image::ImageError),
    #[error("unknown asset: {0}")]
    Unknown(String),
    #[error(transparent)]
    Image(#[from] ApiError),
}

/// Named asset lookup.
pub trait AssetSource {
    /// Raw WGSL text for one shader stage.
    fn shader_source(&self, name: &str) -> Result<String, AssetError>;

    /// Decoded RGBA8 image.
    fn image(&self, name: &str) -> Result<TextureImage, AssetError>;

    /// Load both stages of a program.
    fn program_source(
        &self,
        label: &str,
        vertex: &str,
        fragment: &str,
    ) -> Result<ProgramSource, AssetError> {
        Ok(ProgramSource::new(
            label,
            self.shader_source(vertex)?,
            self.shader_source(fragment)?,
        ))
    }

    /// Load six cube-map faces given in +X, -X, +Y, -Y, +Z, -Z order.
    fn cube_map(&self, faces: [&str; 6]) -> Result<[TextureImage; 6], AssetError> {
        Ok([
            self.image(faces[0])?,
            self.image(faces[1])?,
            self.image(faces[2])?,
            self.image(faces[3])?,
            self.image(faces[4])?,
            self.image(faces[5])?,
        ])
    }
}

pub fn crate_info() -> &'static str {
    "vista-assets v0.1.0"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn program_source_pairs_stages() {
        let assets = BuiltinAssets::new();
        let src = assets
            .program_source(
                "heightmap",
                names::HEIGHTMAP_VERTEX_SHADER,
                names::HEIGHTMAP_FRAGMENT_SHADER,
            )
            .unwrap();
        assert_eq!(src.label, "heightmap");
        assert!(src.vertex.contains("fn vs_main"));
        assert!(src.fragment.contains("fn fs_main"));
    }

    #[test]
    fn cube_map_loads_six_faces() {
        let assets = BuiltinAssets::new();
        let faces = assets.cube_map(names::SKYBOX_FACES).unwrap();
        assert!(faces.iter().all(|f| f.width() == f.height()));
    }
}
