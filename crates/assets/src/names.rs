//! Asset names shared by the scenes and the asset sources.

pub const HEIGHTMAP_VERTEX_SHADER: &str = "heightmap_vertex";
pub const HEIGHTMAP_FRAGMENT_SHADER: &str = "heightmap_fragment";
pub const SKYBOX_VERTEX_SHADER: &str = "skybox_vertex";
pub const SKYBOX_FRAGMENT_SHADER: &str = "skybox_fragment";
pub const PARTICLE_VERTEX_SHADER: &str = "particle_vertex";
pub const PARTICLE_FRAGMENT_SHADER: &str = "particle_fragment";
pub const TEXTURE_VERTEX_SHADER: &str = "texture_vertex";
pub const TEXTURE_FRAGMENT_SHADER: &str = "texture_fragment";
pub const COLOR_VERTEX_SHADER: &str = "color_vertex";
pub const COLOR_FRAGMENT_SHADER: &str = "color_fragment";

pub const HEIGHTMAP: &str = "heightmap";
pub const PARTICLE_TEXTURE: &str = "particle_texture";
pub const AIR_HOCKEY_SURFACE: &str = "air_hockey_surface";

pub const SKYBOX_RIGHT: &str = "right";
pub const SKYBOX_LEFT: &str = "left";
pub const SKYBOX_TOP: &str = "top";
pub const SKYBOX_BOTTOM: &str = "bottom";
pub const SKYBOX_BACK: &str = "back";
pub const SKYBOX_FRONT: &str = "front";

/// Skybox faces in +X, -X, +Y, -Y, +Z, -Z order.
pub const SKYBOX_FACES: [&str; 6] = [
    SKYBOX_RIGHT,
    SKYBOX_LEFT,
    SKYBOX_TOP,
    SKYBOX_BOTTOM,
    SKYBOX_BACK,
    SKYBOX_FRONT,
];
