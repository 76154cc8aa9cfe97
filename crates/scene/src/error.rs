use vista_assets::AssetError;
use vista_render::ApiError;

/// Errors from shader program setup and use.
#[derive(Debug, thiserror::Error)]
pub enum ProgramError {
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("program `{0}` used before initialize")]
    NotReady(String),
    #[error("program `{program}` has no uniform `{name}`")]
    MissingUniform { program: String, name: &'static str },
    #[error("program `{program}` has no attribute `{name}`")]
    MissingAttribute { program: String, name: &'static str },
}

/// Errors from building geometry.
#[derive(Debug, thiserror::Error)]
pub enum GeometryError {
    #[error("heightmap must be at least 2x2, got {width}x{height}")]
    HeightmapTooSmall { width: u32, height: u32 },
    #[error("heightmap has {vertices} vertices, more than a 16-bit index buffer can address")]
    HeightmapTooLarge { vertices: usize },
    #[error("particle system capacity must be non-zero")]
    ZeroCapacity,
}

/// Errors surfaced through the renderer lifecycle.
#[derive(Debug, thiserror::Error)]
pub enum SceneError {
    #[error("draw requested before the surface was created")]
    SurfaceNotReady,
    #[error(transparent)]
    Program(#[from] ProgramError),
    #[error(transparent)]
    Geometry(#[from] GeometryError),
    #[error(transparent)]
    Asset(#[from] AssetError),
    #[error(transparent)]
    Api(#[from] ApiError),
}
