use crate::names;
use crate::shaders;
use crate::{AssetError, AssetSource};
use vista_render::TextureImage;

const HEIGHTMAP_SIZE: u32 = 64;
const SPRITE_SIZE: u32 = 32;
const SKY_FACE_SIZE: u32 = 128;
const TABLE_WIDTH: u32 = 128;
const TABLE_HEIGHT: u32 = 256;

/// Embedded shaders and procedurally generated textures.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinAssets;

impl BuiltinAssets {
    pub fn new() -> Self {
        Self
    }
}

impl AssetSource for BuiltinAssets {
    fn shader_source(&self, name: &str) -> Result<String, AssetError> {
        let source = match name {
            names::HEIGHTMAP_VERTEX_SHADER => shaders::HEIGHTMAP_VERTEX,
            names::HEIGHTMAP_FRAGMENT_SHADER => shaders::HEIGHTMAP_FRAGMENT,
            names::SKYBOX_VERTEX_SHADER => shaders::SKYBOX_VERTEX,
            names::SKYBOX_FRAGMENT_SHADER => shaders::SKYBOX_FRAGMENT,
            names::PARTICLE_VERTEX_SHADER => shaders::PARTICLE_VERTEX,
            names::PARTICLE_FRAGMENT_SHADER => shaders::PARTICLE_FRAGMENT,
            names::TEXTURE_VERTEX_SHADER => shaders::TEXTURE_VERTEX,
            names::TEXTURE_FRAGMENT_SHADER => shaders::TEXTURE_FRAGMENT,
            names::COLOR_VERTEX_SHADER => shaders::COLOR_VERTEX,
            names::COLOR_FRAGMENT_SHADER => shaders::COLOR_FRAGMENT,
            other => return Err(AssetError::Unknown(other.to_string())),
        };
        Ok(source.to_string())
    }

    fn image(&self, name: &str) -> Result<TextureImage, AssetError> {
        let image = match name {
            names::HEIGHTMAP => heightmap(),
            names::PARTICLE_TEXTURE => particle_sprite(),
            names::AIR_HOCKEY_SURFACE => table_surface(),
            names::SKYBOX_TOP => sky_face(SkyFace::Top),
            names::SKYBOX_BOTTOM => sky_face(SkyFace::Bottom),
            names::SKYBOX_LEFT
            | names::SKYBOX_RIGHT
            | names::SKYBOX_FRONT
            | names::SKYBOX_BACK => sky_face(SkyFace::Side),
            other => return Err(AssetError::Unknown(other.to_string())),
        };
        Ok(image)
    }
}

fn grey(v: f32) -> [u8; 4] {
    let g = (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    [g, g, g, 255]
}

fn lerp_rgb(a: [f32; 3], b: [f32; 3], t: f32) -> [u8; 4] {
    let c = |i: usize| ((a[i] + (b[i] - a[i]) * t).clamp(0.0, 1.0) * 255.0).round() as u8;
    [c(0), c(1), c(2), 255]
}

/// Rolling hills that fall off towards the edges.
fn heightmap() -> TextureImage {
    let n = HEIGHTMAP_SIZE as f32 - 1.0;
    TextureImage::from_fn(HEIGHTMAP_SIZE, HEIGHTMAP_SIZE, |x, y| {
        let u = x as f32 / n;
        let v = y as f32 / n;
        let waves = (u * 9.0).sin() * (v * 7.0).cos() * 0.25 + 0.35;
        let dx = u - 0.5;
        let dy = v - 0.5;
        let edge = ((dx * dx + dy * dy).sqrt() * 2.0).min(1.0);
        grey(waves * (1.0 - edge * 0.6) + edge * 0.4)
    })
}

/// Soft round sprite, bright in the middle.
fn particle_sprite() -> TextureImage {
    let half = SPRITE_SIZE as f32 / 2.0;
    TextureImage::from_fn(SPRITE_SIZE, SPRITE_SIZE, |x, y| {
        let dx = (x as f32 + 0.5 - half) / half;
        let dy = (y as f32 + 0.5 - half) / half;
        let falloff = (1.0 - (dx * dx + dy * dy).sqrt()).max(0.0);
        grey(falloff * falloff)
    })
}

enum SkyFace {
    Top,
    Bottom,
    Side,
}

fn sky_face(face: SkyFace) -> TextureImage {
    const ZENITH: [f32; 3] = [0.18, 0.36, 0.72];
    const HORIZON: [f32; 3] = [0.75, 0.85, 0.95];
    const GROUND: [f32; 3] = [0.22, 0.24, 0.20];
    let n = SKY_FACE_SIZE as f32 - 1.0;
    TextureImage::from_fn(SKY_FACE_SIZE, SKY_FACE_SIZE, |_, y| {
        let t = y as f32 / n;
        match face {
            SkyFace::Top => lerp_rgb(ZENITH, ZENITH, t),
            SkyFace::Bottom => lerp_rgb(GROUND, GROUND, t),
            SkyFace::Side if t < 0.5 => lerp_rgb(ZENITH, HORIZON, t * 2.0),
            SkyFace::Side => lerp_rgb(HORIZON, GROUND, (t - 0.5) * 2.0),
        }
    })
}

/// White table with a blue rim, red centre line and centre circle.
fn table_surface() -> TextureImage {
    const RIM: u32 = 6;
    let cx = TABLE_WIDTH as f32 / 2.0;
    let cy = TABLE_HEIGHT as f32 / 2.0;
    TextureImage::from_fn(TABLE_WIDTH, TABLE_HEIGHT, |x, y| {
        if x < RIM || y < RIM || x >= TABLE_WIDTH - RIM || y >= TABLE_HEIGHT - RIM {
            return [30, 60, 200, 255];
        }
        if y.abs_diff(TABLE_HEIGHT / 2) <= 1 {
            return [220, 30, 30, 255];
        }
        let d = ((x as f32 - cx).powi(2) + (y as f32 - cy).powi(2)).sqrt();
        if (d - 20.0).abs() < 1.5 {
            return [220, 30, 30, 255];
        }
        [245, 245, 245, 255]
    })
}
