use crate::{AssetError, AssetSource, BuiltinAssets};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use vista_render::TextureImage;

/// Assets read from a directory, falling back to [`BuiltinAssets`] for any
/// file that does not exist.
#[derive(Debug, Clone)]
pub struct DirAssets {
    root: PathBuf,
    fallback: BuiltinAssets,
}

impl DirAssets {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            fallback: BuiltinAssets::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn shader_path(&self, name: &str) -> PathBuf {
        self.root.join("shaders").join(format!("{name}.wgsl"))
    }

    fn image_path(&self, name: &str) -> PathBuf {
        self.root.join("textures").join(format!("{name}.png"))
    }
}

impl AssetSource for DirAssets {
    fn shader_source(&self, name: &str) -> Result<String, AssetError> {
        let path = self.shader_path(name);
        match std::fs::read_to_string(&path) {
            Ok(text) => {
                tracing::debug!(path = %path.display(), "loaded shader");
                Ok(text)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(name, "shader not on disk, using builtin");
                self.fallback.shader_source(name)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn image(&self, name: &str) -> Result<TextureImage, AssetError> {
        let path = self.image_path(name);
        if !path.exists() {
            tracing::debug!(name, "texture not on disk, using builtin");
            return self.fallback.image(name);
        }
        let rgba = image::open(&path)?.to_rgba8();
        let (width, height) = rgba.dimensions();
        tracing::debug!(path = %path.display(), width, height, "loaded texture");
        Ok(TextureImage::new(width, height, rgba.into_raw())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::names;

    #[test]
    fn missing_files_fall_back_to_builtin() {
        let tmp = tempfile::tempdir().unwrap();
        let assets = DirAssets::new(tmp.path());
        let builtin = BuiltinAssets::new();
        assert_eq!(
            assets.shader_source(names::SKYBOX_VERTEX_SHADER).unwrap(),
            builtin.shader_source(names::SKYBOX_VERTEX_SHADER).unwrap()
        );
        assert_eq!(
            assets.image(names::HEIGHTMAP).unwrap(),
            builtin.image(names::HEIGHTMAP).unwrap()
        );
    }

    #[test]
    fn shader_on_disk_wins() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join("shaders")).unwrap();
        std::fs::write(
            tmp.path().join("shaders").join("heightmap_vertex.wgsl"),
            "fn vs_main() {}",
        )
        .unwrap();
        let assets = DirAssets::new(tmp.path());
        assert_eq!(
            assets.shader_source(names::HEIGHTMAP_VERTEX_SHADER).unwrap(),
            "fn vs_main() {}"
        );
    }

    #[test]
    fn png_on_disk_is_decoded() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("textures");
        std::fs::create_dir_all(&dir).unwrap();
        let img = image::RgbaImage::from_pixel(3, 2, image::Rgba([10, 20, 30, 255]));
        img.save(dir.join("heightmap.png")).unwrap();

        let loaded = DirAssets::new(tmp.path()).image(names::HEIGHTMAP).unwrap();
        assert_eq!((loaded.width(), loaded.height()), (3, 2));
        assert_eq!(loaded.pixel(2, 1), [10, 20, 30, 255]);
    }

    #[test]
    fn corrupt_png_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("textures");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("particle_texture.png"), b"not a png").unwrap();
        let err = DirAssets::new(tmp.path())
            .image(names::PARTICLE_TEXTURE)
            .unwrap_err();
        assert!(matches!(err, AssetError::Decode(_)));
    }
}
